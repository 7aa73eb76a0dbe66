//! Client configuration.

use std::env;
use std::fmt;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Production endpoint of the OneSignal v1 REST API.
pub const DEFAULT_BASE_URL: &str = "https://onesignal.com/api/v1";

const DEFAULT_USER_AGENT: &str = concat!("onesignal-core/", env!("CARGO_PKG_VERSION"));

/// Settings for a `Client`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every resource path is resolved against.
    pub base_url: String,

    /// REST API key, sent as `Authorization: Basic <key>` when present.
    pub rest_api_key: Option<String>,

    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rest_api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field(
                "rest_api_key",
                &self.rest_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from the environment.
    ///
    /// - `ONESIGNAL_API_URL`: base URL override
    /// - `ONESIGNAL_REST_API_KEY`: REST API key (empty means unset)
    /// - `ONESIGNAL_USER_AGENT`: user agent override
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` if a variable is not valid UTF-8.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        if let Some(base_url) = read_var("ONESIGNAL_API_URL")? {
            config.base_url = base_url;
        }
        config.rest_api_key = read_var("ONESIGNAL_REST_API_KEY")?;
        if let Some(user_agent) = read_var("ONESIGNAL_USER_AGENT")? {
            config.user_agent = user_agent;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_rest_api_key(mut self, key: impl Into<String>) -> Self {
        self.rest_api_key = Some(key.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Parse and check the base URL.
    pub(crate) fn parsed_base_url(&self) -> ConfigResult<Url> {
        let invalid = |reason: &str| ConfigError::InvalidUrl(self.base_url.clone(), reason.to_string());

        let url = Url::parse(&self.base_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("URL must not have a query or fragment"));
        }
        Ok(url)
    }
}

fn read_var(name: &str) -> ConfigResult<Option<String>> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue(
            name.to_string(),
            "not valid UTF-8".to_string(),
        )),
    }
}

//! Shared request/response plumbing for every resource.
//!
//! # Design
//! `Client` holds the parsed base URL, the optional REST API key and an
//! injected `Transport`. It carries no mutable state between calls. Building
//! (`new_request`) and decoding (`decode`) are pure and available on any
//! `Client<T>`, including `Client<()>`, so a caller can perform the HTTP
//! round-trip itself. `send` chains build output through the transport and
//! back through `decode`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, ConfigResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path::ResourcePath;
use crate::players::Players;
use crate::transport::Transport;
use crate::types::ErrorResponse;

/// Pass as the body of `Client::new_request` for requests without one.
pub const NO_BODY: Option<&()> = None;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A decoded value together with the raw response it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub response: HttpResponse,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            response: self.response,
        }
    }
}

pub struct Client<T> {
    base_url: Url,
    rest_api_key: Option<String>,
    user_agent: String,
    transport: T,
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field(
                "rest_api_key",
                &self.rest_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl<T> Client<T> {
    /// # Errors
    /// `ConfigError::InvalidUrl` if the configured base URL is unusable.
    pub fn new(config: ClientConfig, transport: T) -> ConfigResult<Self> {
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            base_url,
            rest_api_key: config.rest_api_key.filter(|key| !key.is_empty()),
            user_agent: config.user_agent,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Accessor for the players resource.
    pub fn players(&self) -> Players<'_, T> {
        Players::new(self)
    }

    /// Build a request for `path`, serializing `body` as JSON when given.
    ///
    /// # Errors
    /// - `ApiError::InvalidPath` if the path cannot be joined onto the base URL
    /// - `ApiError::Serialization` if `body` fails to serialize
    pub fn new_request<B>(
        &self,
        method: HttpMethod,
        path: &ResourcePath,
        body: Option<&B>,
    ) -> ApiResult<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let url = path.resolve(&self.base_url)?;

        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), self.user_agent.clone()),
        ];
        if let Some(key) = &self.rest_api_key {
            headers.push(("authorization".to_string(), format!("Basic {key}")));
        }

        let body = match body {
            Some(body) => {
                let json = serde_json::to_string(body).map_err(ApiError::Serialization)?;
                headers.push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(json)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Turn a raw response into a typed value.
    ///
    /// # Errors
    /// - `ApiError::Status` for any non-2xx status, with the provider's
    ///   error messages when the body carries them
    /// - `ApiError::Deserialization` if a 2xx body does not match `D`
    pub fn decode<D: DeserializeOwned>(&self, response: HttpResponse) -> ApiResult<ApiResponse<D>> {
        if !response.is_success() {
            let messages = serde_json::from_str::<ErrorResponse>(&response.body)
                .map(ErrorResponse::into_messages)
                .unwrap_or_default();
            warn!(status = response.status, ?messages, "OneSignal returned an error status");
            return Err(ApiError::Status { response, messages });
        }

        match serde_json::from_str(&response.body) {
            Ok(data) => Ok(ApiResponse { data, response }),
            Err(source) => Err(ApiError::Deserialization { response, source }),
        }
    }
}

impl<T: Transport> Client<T> {
    /// Hand `request` to the transport without interpreting the status.
    ///
    /// # Errors
    /// `ApiError::Transport` if no response was obtained.
    pub fn execute(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Execute `request` and decode the response.
    pub fn send<D: DeserializeOwned>(&self, request: &HttpRequest) -> ApiResult<ApiResponse<D>> {
        let response = self.execute(request)?;
        self.decode(response)
    }
}

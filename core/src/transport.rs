//! The seam between request building and the network.
//!
//! `Client` never performs I/O itself; it hands each `HttpRequest` to a
//! `Transport`. Non-2xx statuses are data, not transport failures: a
//! transport must return them as an `HttpResponse` and leave status
//! interpretation to the client.

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use std::fmt;
    use std::time::Duration;

    use tracing::debug;
    use ureq::{Agent, RequestBuilder};

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Blocking transport backed by a shared `ureq::Agent`.
    ///
    /// The agent is configured with `http_status_as_error(false)` so 4xx/5xx
    /// responses come back as data.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl fmt::Debug for UreqTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("UreqTransport").finish_non_exhaustive()
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Bound every call (connect, send, receive) by `timeout`.
        pub fn with_timeout(timeout: Duration) -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let headers = request.headers.as_slice();

            let result = match (request.method, request.body.as_deref()) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
                (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(url), headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
                (HttpMethod::Put, Some(body)) => {
                    with_headers(self.agent.put(url), headers).send(body.as_bytes())
                }
                (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            };
            let mut response = result.map_err(map_error)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.body_mut().read_to_string().map_err(map_error)?;
            debug!(status, bytes = body.len(), "ureq exchange complete");

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

    fn with_headers<B>(
        mut builder: RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn map_error(err: ureq::Error) -> TransportError {
        match err {
            ureq::Error::Timeout(_) => TransportError::timeout(err.to_string()),
            other => TransportError::new(other.to_string()),
        }
    }
}

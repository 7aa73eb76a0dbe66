//! Typed client for the OneSignal players REST API.
//!
//! # Overview
//! Maps the provider's player schema to Rust types and wraps each players
//! endpoint in a thin operation: build the resource path, serialize the
//! body, hand the request to a `Transport`, decode the reply.
//!
//! # Design
//! - `Client` is stateless apart from configuration and the injected
//!   transport; `Players` only borrows it.
//! - Every operation has a pure `build_*` counterpart producing an
//!   `HttpRequest`, and `Client::decode` parses an `HttpResponse`, so the
//!   host can do the I/O itself (a `Client<()>` never touches the network).
//! - Optional request fields are `Option`s that are omitted when `None`.
//! - With the default `ureq` feature, `UreqTransport` executes requests with a
//!   blocking agent.
//!
//! # Example
//!
//! ```rust,no_run
//! use onesignal_core::{Client, ClientConfig, PlayerRequest, UreqTransport};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::from_env()?, UreqTransport::new())?;
//!
//! let player = client.players().get("1dd608f2-c6a1-11e3-851d-000c2940e62c")?;
//! println!("{} sessions", player.data.session_count);
//!
//! let payload = PlayerRequest {
//!     language: Some("en".to_string()),
//!     ..PlayerRequest::new("5eb5a37e-b458-11e3-ac11-000c2940e62c")
//! };
//! client.players().update(&player.data.id, &payload)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod path;
pub mod players;
pub mod transport;
pub mod types;

pub use client::{ApiResponse, Client, NO_BODY};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult, ConfigError, ConfigResult, ErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use path::ResourcePath;
pub use players::Players;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    DeviceType, Player, PlayerCreateResponse, PlayerCsvExportOptions, PlayerCsvExportResponse,
    PlayerListOptions, PlayerListResponse, PlayerOnFocusOptions, PlayerOnPurchaseOptions,
    PlayerOnSessionOptions, PlayerRequest, Purchase, SuccessResponse,
};

//! Gateway client for the Phillet wallet.
//!
//! Single point of outbound communication with the gateway service:
//! - bearer credential injection from the active session
//! - one silent refresh-and-retry on `401 Unauthorized`
//! - uniform error normalisation ([`GatewayError`]) for every endpoint
//!
//! The HTTP layer sits behind the [`Transport`] trait; [`ReqwestTransport`]
//! is the production implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod routes;
pub mod transport;

pub use client::GatewayClient;
pub use config::{ClientConfig, ConfigError, RefreshPolicy};
pub use error::GatewayError;
pub use http::ReqwestTransport;
pub use reqwest::Method;
pub use routes::{ApiFlavor, Endpoint};
pub use transport::{GatewayRequest, RawResponse, Transport};

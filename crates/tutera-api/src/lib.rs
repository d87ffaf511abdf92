// tutera-api: Async Rust client for the home-automation processor REST API

pub mod auth;
pub mod client;
mod endpoints;
pub mod error;
mod login;
pub mod models;
pub mod transport;

pub use auth::{AUTH_KEY_HEADER, AUTH_TOKEN_HEADER, SessionContext, SessionKey, processor_url};
pub use client::{ControllerClient, extract_list};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

//! HTTP gateway exposing the solve pipeline with bearer auth and a health
//! endpoint.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;

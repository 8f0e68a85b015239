//! Vision LLM transport adapter: one request shape, two interchangeable backends.

pub mod any;
pub mod compatible;
pub mod error;
pub mod gemini;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;

pub use error::LlmError;
pub use provider::{VisionProvider, VisionRequest};

//! Infrastructure layer module
//!
//! Cross-cutting concerns that sit outside the domain:
//! - Configuration management (figment)
//! - Logging (tracing)

pub mod config;
pub mod logging;

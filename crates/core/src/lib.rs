//! Agro core library
//!
//! Foundational pieces shared by every agro crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Workspace configuration and capability provider settings

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, CapabilityConfig, ModelsConfig};
pub use error::{AppError, AppResult};

//! Logging setup.
//!
//! All logs go to stderr; stdout carries answers and JSON output only.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Install the global tracing subscriber.
///
/// `log_level` takes precedence over `RUST_LOG`; `info` is the fallback.
/// Color is off when `no_color` is set or `NO_COLOR` is present.
///
/// # Example
/// ```no_run
/// use agro_core::logging::init_logging;
///
/// init_logging(Some("debug"), false).expect("logging already initialized");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter_str, e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && color_allowed());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

fn color_allowed() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_config_error() {
        let result = init_logging(Some("agro=loud"), true);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

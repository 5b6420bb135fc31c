//! # Swap Telemetry
//!
//! Structured logging for the cross-chain swap runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swap_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `xswap` | Service name in logs |
//! | `XSWAP_LOG_LEVEL` | `info` | Log level filter |
//! | `XSWAP_JSON_LOGS` | `false` | JSON output |
//! | `XSWAP_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The log filter could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and announce the service.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;

    let rendered =
        serde_json::to_string(&config).map_err(|e| TelemetryError::Config(e.to_string()))?;
    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        config = %rendered,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Span carrying the order being processed.
///
/// # Example
///
/// ```rust,ignore
/// let _span = swap_span!("run", order = %hex).entered();
/// ```
#[macro_export]
macro_rules! swap_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "xswap");
    }
}

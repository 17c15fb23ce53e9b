//! Logging setup.
//!
//! Nothing is installed unless `AMD_LOG` or `RUST_LOG` is set. `AMD_LOG`
//! wins when both are present and uses the same filter syntax, e.g.
//!
//! ```bash
//! AMD_LOG=amd_transform=trace amd transform src/main.js
//! AMD_LOG=debug AMD_LOG_FORMAT=json amd deps src/main.js
//! ```
//!
//! Output always goes to stderr; stdout carries the transformed module.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("AMD_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn build_filter() -> EnvFilter {
    match std::env::var("AMD_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber if logging was asked for.
pub fn init() {
    if std::env::var_os("AMD_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

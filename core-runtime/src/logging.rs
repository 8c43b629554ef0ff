//! # Logging & Tracing Infrastructure
//!
//! Structured logging with the `tracing` crate:
//! - Pretty, JSON and compact output formats
//! - Crate-level filtering through `EnvFilter` (honours `RUST_LOG`)
//! - Helpers that keep credentials and query strings out of log lines
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::time::LogLevel;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug);
//! init_logging(config)?;
//!
//! tracing::info!(phase = "Scanning", "Sync started");
//! ```

use crate::error::{Error, Result};
use bridge_traits::time::LogLevel;
use std::io;
use tracing_subscriber::{
    filter::EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Crates whose events are shown at the configured level; dependencies stay at `warn`.
const WORKSPACE_CRATES: &[&str] = &[
    "muziko_sync_workspace",
    "core_runtime",
    "core_sync",
    "core_library",
    "core_metadata",
    "core_service",
    "bridge_desktop",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Minimum log level for workspace crates
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_sync=trace,core_metadata=debug")
    pub filter: Option<String>,
    /// Emit span enter/exit events
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: false,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called once during startup; later calls return [`Error::Config`].
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let init = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_span_events(span_events(&config))
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(config.enable_spans)
                    .with_span_list(config.enable_spans)
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_span_events(span_events(&config))
                    .with_writer(io::stdout),
            )
            .try_init(),
    };

    init.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn span_events(config: &LoggingConfig) -> FmtSpan {
    if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Some(custom_filter) = &config.filter {
        return EnvFilter::try_new(custom_filter)
            .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)));
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = config.level.as_str();
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect();
    directives.extend(
        ["h2=warn", "hyper=warn", "reqwest=warn", "sqlx=warn", "lofty=warn"]
            .iter()
            .map(|d| d.to_string()),
    );

    EnvFilter::try_new(directives.join(","))
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Replace the value of credential-like fields with `[REDACTED]`.
///
/// ```ignore
/// use core_runtime::logging::redact_if_sensitive;
///
/// tracing::debug!(authorization = %redact_if_sensitive("authorization", &header), "Token request");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
        "credential",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}

/// Drop the query string from a URL before logging it.
///
/// Search queries carry artist and track names, and token endpoints may carry
/// credentials, so only scheme, host and path are kept.
pub fn redact_url(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Strip full file paths to basename only
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

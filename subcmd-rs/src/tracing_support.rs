//! Tracing and logging support.
//!
//! The dispatcher logs its parse and dispatch decisions at `debug` and
//! `trace` level through the `tracing` crate. With the `tracing` feature
//! (on by default) this module also sets up a subscriber writing to stderr,
//! so handler output on stdout stays clean.

pub use tracing;

#[cfg(feature = "tracing")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    util::TryInitError, EnvFilter, Layer,
};

/// Tracing output format.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line format.
    Pretty,

    /// Single-line format (default for command-line tools).
    Compact,

    /// JSON format.
    Json,
}

/// Tracing configuration.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter.
    ///
    /// If None, uses RUST_LOG environment variable or defaults to "warn".
    pub level: Option<tracing::Level>,

    /// Output format.
    pub format: TracingFormat,

    /// Include timestamps in output.
    pub timestamps: bool,

    /// Include target module names in output.
    pub target: bool,

    /// Include thread IDs in output.
    pub thread_ids: bool,
}

#[cfg(feature = "tracing")]
impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Compact,
            timestamps: false,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "tracing")]
fn env_filter(level: Option<tracing::Level>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

#[cfg(feature = "tracing")]
fn fmt_layer<S>(config: &TracingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = fmt::layer::<S>()
        .with_writer(std::io::stderr)
        .with_target(config.target)
        .with_thread_ids(config.thread_ids);

    match (config.format, config.timestamps) {
        (TracingFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingFormat::Compact, true) => layer.compact().boxed(),
        (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingFormat::Json, true) => layer.json().boxed(),
        (TracingFormat::Json, false) => layer.json().without_time().boxed(),
    }
}

/// Initialize tracing subscriber with default settings.
///
/// Uses RUST_LOG environment variable for level filtering and defaults to
/// "warn" when it is not set.
///
/// # Environment Variables
///
/// - `RUST_LOG=subcmd=debug` - Show command selection and nested dispatch
/// - `RUST_LOG=subcmd=trace` - Also show every parse error and literal-mode switch
#[cfg(feature = "tracing")]
pub fn init_subscriber() -> Result<(), TryInitError> {
    init_subscriber_with_config(TracingConfig::default())
}

/// Initialize tracing subscriber with custom configuration.
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```ignore
/// use subcmd::{init_subscriber_with_config, TracingConfig, TracingFormat};
///
/// init_subscriber_with_config(TracingConfig {
///     format: TracingFormat::Json,
///     timestamps: true,
///     ..Default::default()
/// })?;
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(config.level))
        .with(fmt_layer(&config))
        .try_init()
}

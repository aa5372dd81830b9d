//! Subscriber installation.
//!
//! [`TracingSetup`] configures the global `tracing` subscriber used by every
//! Interpose crate: dispatch phases are logged at `trace`, swallowed
//! failures at `debug`, discovery at `info`, and unobserved async failures
//! at `warn`.
//!
//! # Example
//!
//! ```
//! use interpose_tracing::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! // Local runs: pretty output with every dispatch phase
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty)
//!     .with_dispatch_phases(true)
//!     .init();
//!
//! // Deployed: JSON lines, proxies at debug, everything else at info
//! let deployed = TracingSetup::new()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("interpose_proxy=debug");
//! assert_eq!(deployed.level(), Level::INFO);
//! ```

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Target of the dispatcher's phase events.
const DISPATCH_TARGET: &str = "interpose_proxy::dispatch";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, colored, for local runs.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Builder for the global subscriber.
#[derive(Debug, Clone)]
pub struct TracingSetup {
    level: Level,
    format: TracingFormat,
    /// Extra `target=level` directives, applied after the base level.
    directives: Option<String>,
    dispatch_phases: bool,
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::default(),
            directives: None,
            dispatch_phases: false,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// A setup logging at `info` with pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base level for every target.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets how events are rendered.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Adds `EnvFilter` directives such as `"info,interpose_proxy=debug"`.
    ///
    /// A filter that fails to parse is ignored and the base level applies.
    #[must_use]
    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Logs every dispatcher phase transition at `trace`, whatever the base
    /// level.
    #[must_use]
    pub fn with_dispatch_phases(mut self, enabled: bool) -> Self {
        self.dispatch_phases = enabled;
        self
    }

    /// Emits span enter and exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The base level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// The output format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// The filter this setup installs.
    fn filter(&self) -> EnvFilter {
        let mut directives = self.level.as_str().to_ascii_lowercase();
        if let Some(extra) = &self.directives {
            directives.push(',');
            directives.push_str(extra);
        }
        if self.dispatch_phases {
            directives.push_str(&format!(",{DISPATCH_TARGET}=trace"));
        }

        EnvFilter::try_new(&directives).unwrap_or_else(|err| {
            tracing::warn!(%directives, error = %err, "invalid tracing filter ignored");
            EnvFilter::new(self.level.as_str().to_ascii_lowercase())
        })
    }

    fn output(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let spans = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(spans);

        match self.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the subscriber.
    ///
    /// Returns `false` if a global subscriber was already installed, in
    /// which case nothing changes.
    pub fn init(&self) -> bool {
        let installed = tracing_subscriber::registry()
            .with(self.output())
            .with(self.filter())
            .try_init()
            .is_ok();

        if installed {
            tracing::info!(
                level = %self.level,
                format = ?self.format,
                dispatch_phases = self.dispatch_phases,
                "tracing initialized"
            );
        }
        installed
    }
}

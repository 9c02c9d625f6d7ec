/*!
 * Structured Tracing
 * Subscriber setup and drain spans using the tracing crate
 */

use std::time::Instant;
use tracing::{debug, field, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Drains slower than this are reported as slow
const SLOW_DRAIN_MS: u128 = 10;

/// Initialize structured tracing
///
/// Output goes to stderr so stdout stays free for callers that speak a
/// line protocol over it.
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SIGNALS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SIGNALS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    // try_init: a host may already own the global subscriber
    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Span covering one drain of the pending signal log
pub struct DrainSpan {
    span: tracing::Span,
    start: Instant,
    invoked: usize,
    discarded: usize,
}

impl DrainSpan {
    pub fn new() -> Self {
        let span = span!(
            Level::DEBUG,
            "signal_drain",
            invoked = field::Empty,
            discarded = field::Empty,
            duration_us = field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            invoked: 0,
            discarded: 0,
        }
    }

    /// Count one handler invocation
    pub fn record_invoked(&mut self) {
        self.invoked += 1;
    }

    /// Count one occurrence dropped without a handler
    pub fn record_discarded(&mut self) {
        self.discarded += 1;
    }

    pub fn invoked(&self) -> usize {
        self.invoked
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Default for DrainSpan {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DrainSpan {
    fn drop(&mut self) {
        if self.invoked == 0 && self.discarded == 0 {
            return;
        }

        let duration = self.start.elapsed();
        self.span.record("invoked", self.invoked);
        self.span.record("discarded", self.discarded);
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_DRAIN_MS {
            warn!(
                invoked = self.invoked,
                discarded = self.discarded,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow signal drain detected"
            );
        } else {
            debug!(
                invoked = self.invoked,
                discarded = self.discarded,
                duration_us = duration.as_micros() as u64,
                "signal drain completed"
            );
        }
    }
}

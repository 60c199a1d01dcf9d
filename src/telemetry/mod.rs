//! Tracing subscriber setup.
//!
//! Opt-in: hosts that already install their own subscriber skip this
//! entirely. Everything the crate logs goes through `tracing`, so any
//! subscriber works; this helper just wires the layers the demos use.

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber with an environment-driven filter.
///
/// The filter honors `RUST_LOG`; without it, warnings are shown globally
/// and this crate logs at info. Span close events are logged so the span
/// around each walk shows its duration. Calling this twice is a no-op.
pub fn init() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,millpass=info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init();
}

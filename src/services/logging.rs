use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install a console subscriber. `RUST_LOG` wins over the built-in
/// `ollama_chat=info,tool=info` filter. Calling it twice is a no-op.
pub fn init_default_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,ollama_chat=info,tool=info"));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE);

    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}

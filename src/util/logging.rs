/// Initialize logging with tracing
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at info, or debug
/// when `debug` is set. Output goes to stderr so stdout stays free for the
/// wrapped command.
pub fn init_logging(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if debug {
        "trapper_sender=debug"
    } else {
        "trapper_sender=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

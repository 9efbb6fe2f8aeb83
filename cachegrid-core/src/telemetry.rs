use tracing_subscriber::EnvFilter;

/// Initializes a `tracing-subscriber` `fmt` layer for demos and examples.
///
/// This crate never calls this itself — library code only ever
/// `tracing::instrument`s, it does not install a global subscriber. Binaries
/// that want to see the crate's structured logs call this once at startup.
/// Respects `RUST_LOG`, defaulting to `info` when unset.
pub fn init_demo_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

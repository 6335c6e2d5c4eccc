use tracing_subscriber::EnvFilter;

/// Installs the process-wide `tracing` subscriber. Every library crate in
/// the workspace only ever emits `tracing` events; only this binary ever
/// installs a subscriber, per `SPEC_FULL.md` §1.
///
/// Verbosity defaults to `info` and is overridable with `RUST_LOG`, matching
/// `tracing-subscriber`'s usual convention (and the teacher's own services).
pub fn install() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

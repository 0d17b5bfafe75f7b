use crate::args::LogLevel;

/// Initialise `env_logger` on stderr.
///
/// An explicit `--log-level` wins; otherwise `RUST_LOG` applies, falling
/// back to `info`.
pub fn init_logging(level: Option<LogLevel>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level.as_filter());
    }
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis();
    let _ = builder.try_init();
}

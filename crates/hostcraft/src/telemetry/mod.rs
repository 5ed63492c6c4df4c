pub mod log_filter;

use hostcraft_config::LoggingConfig;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::Filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::HostcraftError;

pub use log_filter::HostcraftLogFilter;

/// Installs the global subscriber. Output goes to stderr so it lands in the
/// journal next to the server output. `RUST_LOG`, when set, replaces the
/// configured filter.
pub fn init_logging(config: &LoggingConfig) -> Result<(), HostcraftError> {
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => install(config, env_filter),
        Err(_) => install(config, HostcraftLogFilter::from_config(config).create_filter_fn()),
    }
}

fn install<F>(config: &LoggingConfig, filter: F) -> Result<(), HostcraftError>
where
    F: Filter<Registry> + Send + Sync + 'static,
{
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(config.use_color)
        .with_target(config.show_target);

    if config.show_timestamp {
        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer.without_time().with_filter(filter))
            .try_init()
    }
    .map_err(|e| HostcraftError::Logging(e.to_string()))
}

use color_eyre::{Result, eyre::WrapErr};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// `filter` uses the `EnvFilter` directive syntax, e.g. `info,domain=debug`.
pub fn init(filter: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(filter)
        .wrap_err_with(|| format!("Invalid log filter {filter:?}"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(ErrorLayer::default())
        .try_init()
        .wrap_err("Failed to install the tracing subscriber")?;

    Ok(())
}

use config::builder::DefaultState;
use config::ConfigBuilder;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{Config, DatabaseSettings, LoggingSettings, ServerSettings};

/// Prefix of the environment variables that override file settings,
/// e.g. `TRADE_DIARY__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "TRADE_DIARY";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at
/// `path` (optional), then `TRADE_DIARY__<SECTION>__<KEY>` environment
/// variables. The result is validated before it is returned.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
    from_sources(builder)
}

fn from_sources(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

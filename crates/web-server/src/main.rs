use anyhow::Context;

// This main function is the entry point when running `cargo run -p web-server`.
// It loads configuration and serves the API from PostgreSQL.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = configuration::load_config("config.toml").context("Failed to load config.toml")?;
    let _log_guard = configuration::init_tracing(&config.logging)?;

    let store = web_server::open_store(&config, false).await?;
    web_server::run_server(&config, store).await
}

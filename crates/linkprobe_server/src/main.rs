use anyhow::Context;
use engine_logging::engine_info;
use linkprobe_engine::CheckEngine;
use linkprobe_server::{config_path, load_config, serve, CONFIG_ENV};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok());
    let config = load_config(path.as_deref()).context("loading configuration")?;
    engine_logging::initialize(&config.logging);
    if let Some(path) = &path {
        engine_info!("configuration from {}", path.display());
    }

    let engine = CheckEngine::new(config.fetch_settings(), config.engine_settings())
        .context("building HTTP client")?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    serve(listener, engine).await.context("server failed")?;
    Ok(())
}

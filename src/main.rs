use anyhow::Result;
use product_catalog::config::Config;
use product_catalog::server::Server;
use product_catalog::store::Storage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenv::dotenv().ok();

    // Prints usage or the offending variable and exits on bad input.
    let config = Config::from_env().unwrap_or_else(|e| e.exit());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("product_catalog={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rate_limit = config.rate_limit();
    tracing::info!(
        addr = %config.addr,
        env = %config.env,
        rate_limit_enabled = rate_limit.enabled,
        rate_limit_requests = rate_limit.requests_per_window,
        rate_limit_window = %humantime::format_duration(rate_limit.window),
        "Starting product catalog service"
    );

    let server = Server::new(config, Storage::in_memory())?;
    server.run().await?;

    Ok(())
}

use reverb::client;
use reverb::config::{Config, Mode};
use reverb::server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        mode = ?config.mode,
        read_cap = config.read_cap,
        "starting reverb"
    );

    match config.mode {
        Mode::Serve => {
            let server = Server::bind(&config).await?;
            server
                .serve_with_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("shutdown signal received");
                })
                .await?;
        }
        Mode::Connect => {
            client::run(&config.endpoint(), config.read_cap).await?;
        }
    }

    Ok(())
}

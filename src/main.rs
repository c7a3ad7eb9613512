use atcrec::application::ejecutar_cli;
use atcrec::infrastructure::config::expandir_tilde;
use atcrec::infrastructure::{AppConfig, InfrastructureError, LiveAtcClient};
use atcrec::presentation::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("atcrec=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(ruta) => AppConfig::load_from(&expandir_tilde(ruta))?,
        None => AppConfig::load(),
    };
    let result: Result<LiveAtcClient, InfrastructureError> = LiveAtcClient::new(&config);
    let client = match result {
        Ok(client) => client,
        Err(e) => anyhow::bail!("Failed to initialize LiveATC client: {}", e),
    };

    ejecutar_cli(cli, config, client).await?;

    Ok(())
}

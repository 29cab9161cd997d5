use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use telmon::commands::{AskCommand, EchoCommand, SessionsCommand, StatusCommand};
use telmon::{Config, Service};

#[derive(Parser, Debug)]
#[command(name = "telmon", about = "Telnet monitor console")]
struct Args {
    /// TOML configuration file (defaults to TELNET_SERVICE_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env(),
    };
    if let Some(port) = args.port {
        cfg.port = port;
    }

    let service = Arc::new(Service::new(cfg));
    service.register_command(StatusCommand);
    service.register_command(EchoCommand);
    service.register_command(AskCommand);
    service.register_command(SessionsCommand::new(&service));

    let shutdown = service.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, shutting down");
            shutdown.terminate();
        }
    });

    service.run().await?;
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!("{e}"))?;

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info,telmon=debug"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}

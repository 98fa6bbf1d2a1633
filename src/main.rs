use anyhow::Result;
use clap::Parser;
use gemini_relay::ai::GeminiHttpClient;
use gemini_relay::models::Config;
use gemini_relay::relay::Relay;
use gemini_relay::server;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Relay chat messages to the Gemini API")]
struct CliArgs {
    /// Address to listen on. Overrides RELAY_HOST.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on. Overrides RELAY_PORT.
    #[arg(long)]
    port: Option<u16>,
}

impl CliArgs {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

async fn run(args: CliArgs) -> gemini_relay::Result<()> {
    let config = args.apply(Config::from_env()?);
    let relay = Relay::new(Box::new(GeminiHttpClient::new()?));
    server::serve(server::router(Arc::new(relay)), &config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gemini-relay");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Relay failed: {}", e);
            std::process::exit(1);
        }
    }
}

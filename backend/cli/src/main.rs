mod api;
mod check_cmd;
mod sign_cmd;
mod status_cmd;
mod terminal_output;
mod wiring;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use relaybot_channels::ChannelAdapter;
use relaybot_config::{
    BotConfig, apply_env_overrides, env::ENV_LINE_CHANNEL_SECRET, env::ENV_PORT, load_and_prepare,
    load_config, process_env, resolve_config_path,
};
use relaybot_logging::init_logger;

use terminal_output::note_error;

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(about = "relaybot: LINE bot answering text with a chat model and race-card images with OCR")]
#[command(version)]
struct Cli {
    /// Config file [default: ~/.relaybot/config.yaml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the config and environment without starting
    CheckConfig,
    /// Compute or verify the X-Line-Signature of a webhook body
    Sign {
        /// Body file; stdin when omitted or "-"
        #[arg(short, long)]
        body: Option<PathBuf>,
        /// Channel secret [default: $LINE_CHANNEL_SECRET]
        #[arg(long)]
        secret: Option<String>,
        /// Signature to check instead of printing one
        #[arg(long)]
        verify: Option<String>,
    },
    /// Query the health endpoint of a running server
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal in production.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Serve { port } => {
            let mut env = process_env();
            if let Some(port) = port {
                env.insert(ENV_PORT.to_string(), port.to_string());
            }
            let prepared = match load_and_prepare(Some(&config_path), &env).await {
                Ok(prepared) => prepared,
                Err(e) => {
                    for line in format!("{e:#}").lines() {
                        note_error(line);
                    }
                    std::process::exit(1);
                }
            };
            init_logger(&wiring::logging_options(&prepared.config));
            for warning in &prepared.warnings {
                warn!(path = %warning.path, message = %warning.message, "Config warning");
            }
            run_server(prepared.config).await?;
        }
        Commands::CheckConfig => {
            if !check_cmd::run(&config_path, &process_env()).await? {
                std::process::exit(1);
            }
        }
        Commands::Sign { body, secret, verify } => {
            let secret = secret
                .or_else(|| std::env::var(ENV_LINE_CHANNEL_SECRET).ok())
                .with_context(|| format!("pass --secret or set {ENV_LINE_CHANNEL_SECRET}"))?;
            sign_cmd::run(body.as_deref(), &secret, verify.as_deref())?;
        }
        Commands::Status { port } => {
            let port = match port {
                Some(port) => port,
                None => {
                    let config = load_config(&config_path).await?;
                    apply_env_overrides(config, &process_env())?.server.port()
                }
            };
            status_cmd::run(port).await?;
        }
    }

    Ok(())
}

async fn run_server(config: BotConfig) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind(), config.server.port());
    info!(
        addr = %addr,
        webhook = config.server.webhook_path(),
        provider = config.chat.provider(),
        ocr = config.ocr.engine(),
        "Starting relaybot"
    );

    let adapter = wiring::build_line_adapter(&config)?;
    adapter.start().await?;

    let app = api::build_router(adapter.build_router()).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(api::shutdown_signal())
        .await?;

    info!("relaybot stopped");
    Ok(())
}

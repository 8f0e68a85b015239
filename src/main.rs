use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tutorlens_core::config::Config;
use tutorlens_core::{Language, Solver, locale};
use tutorlens_gateway::GatewayServer;

#[derive(Parser)]
#[command(
    name = "tutorlens",
    version,
    about = "Photo tutoring: vision LLM in, explanation and quiz out"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a photographed question and print the result as JSON
    Solve {
        /// Image file (jpeg, png, or webp)
        image: PathBuf,

        /// Interface language for the explanation and error messages
        #[arg(long, default_value = "en")]
        lang: Language,
    },
    /// Run the HTTP gateway
    Serve {
        /// Bind address, overrides the config file
        #[arg(long)]
        bind: Option<String>,

        /// Port, overrides the config file
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    let config = Config::load(&config_path)?;

    match cli.command {
        Command::Solve { image, lang } => solve(&config, &image, lang).await,
        Command::Serve { bind, port } => serve(config, bind, port).await,
    }
}

async fn solve(config: &Config, image_path: &Path, lang: Language) -> anyhow::Result<()> {
    let solver = Solver::from_config(config)?;
    let image = std::fs::read(image_path)
        .with_context(|| format!("failed to read image {}", image_path.display()))?;
    let mime = mime_for_path(image_path);

    match solver.solve(&image, mime, lang).await {
        Ok(analysis) => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("solve failed: {e}");
            eprintln!("{}", locale::user_message(&e, lang));
            std::process::exit(1);
        }
    }
}

async fn serve(config: Config, bind: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let solver = Arc::new(Solver::from_config(&config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let bind = bind.unwrap_or(config.gateway.bind);
    let port = port.unwrap_or(config.gateway.port);

    GatewayServer::new(&bind, port, solver, shutdown_rx)
        .with_access_code(config.gateway.access_code)
        .with_max_body_size(config.gateway.max_body_bytes)
        .serve()
        .await?;
    Ok(())
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        // jpg, jpeg, and unknown extensions all go out as jpeg
        _ => "image/jpeg",
    }
}

fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }
    if let Ok(path) = std::env::var("TUTORLENS_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

mod channel_commands;

use std::{path::PathBuf, process::ExitCode};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    hgpost_client::{SendOutcome, SessionClient},
    hgpost_config::{PosterConfig, discover_config_path, load_config},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "hgpost", about = "Publish posts to session-authenticated forum channels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (JSON, TOML or YAML). Defaults to ./hgpost.json or
    /// ~/.config/hgpost/hgpost.json.
    #[arg(long, global = true, env = "HGPOST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a message to a destination.
    Send {
        /// Destination name from the config's `issues`.
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        message: String,
        /// Image URL to attach.
        #[arg(long)]
        image: Option<String>,
    },
    /// List configured destinations.
    Channels,
    /// Log in and fetch a csrf token to verify credentials.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn resolve_config(explicit: Option<PathBuf>) -> anyhow::Result<PosterConfig> {
    let path = explicit
        .or_else(discover_config_path)
        .context("no config file found; pass --config or create ./hgpost.json")?;
    load_config(&path)
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "hgpost starting");
    let config = resolve_config(cli.config)?;

    match cli.command {
        Commands::Send { to, message, image } => {
            let mut client = SessionClient::connect(&config).context("login failed")?;
            let images: Vec<&str> = image.iter().map(String::as_str).collect();
            let outcome = client.send(&message, &to, &images)?;
            Ok(report(&outcome))
        },
        Commands::Channels => {
            channel_commands::list(&config);
            Ok(ExitCode::SUCCESS)
        },
        Commands::Check => {
            let mut client = SessionClient::connect(&config).context("login failed")?;
            client.session_mut().refresh()?;
            println!("Logged in to {}", client.session().base_url());
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn report(outcome: &SendOutcome) -> ExitCode {
    match outcome {
        SendOutcome::Delivered => {
            println!("Sent.");
            ExitCode::SUCCESS
        },
        SendOutcome::Skipped => {
            println!("Destination is inactive, nothing sent.");
            ExitCode::SUCCESS
        },
        SendOutcome::Rejected { status } => {
            warn!(status, "post rejected");
            eprintln!("Post rejected with HTTP {status}.");
            ExitCode::FAILURE
        },
        SendOutcome::UploadFailed { reason } => {
            eprintln!("Image upload failed: {reason}");
            ExitCode::FAILURE
        },
    }
}

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cheers_client::session::FileStore;
use cheers_core::rules::GameMode;

mod client;
mod tui;

#[derive(Clone, Copy, ValueEnum)]
enum CliMode {
    /// Fixed 5 rounds, score decides winners and losers.
    Family,
    /// No round limit, third drink loses.
    Drunk,
}

impl From<CliMode> for GameMode {
    fn from(mode: CliMode) -> GameMode {
        match mode {
            CliMode::Family => GameMode::Family,
            CliMode::Drunk => GameMode::Drunk,
        }
    }
}

#[derive(Parser)]
#[command(name = "cheers")]
#[command(about = "Join a Cheers party game room", long_about = None)]
struct Cli {
    /// Game server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Player name (skips the join form)
    #[arg(short, long)]
    name: Option<String>,

    /// Game mode
    #[arg(short, long, value_enum, default_value = "family")]
    mode: CliMode,

    /// Session file path (defaults to ~/.cheers-session.json)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Write logs to this file (the terminal is in raw mode, so logging
    /// is off without it)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        match std::fs::File::create(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(
                        EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| EnvFilter::new("info")),
                    )
                    .with_writer(file)
                    .with_ansi(false)
                    .init();
            }
            Err(e) => eprintln!("Cannot open log file: {}", e),
        }
    }

    let session_path = cli.session_file.unwrap_or_else(FileStore::default_path);
    if let Err(e) = client::start_client(
        &cli.server,
        cli.name.as_deref(),
        cli.mode.into(),
        session_path,
    )
    .await
    {
        eprintln!("Error: {}", e);
    }
}

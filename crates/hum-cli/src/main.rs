use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "hum", version, about = "Hum a melody, get MIDI back")]
struct Cli {
    /// Print diagnostic output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Record a clip, send it for analysis, and keep the returned MIDI
    Record {
        /// Input device to record from (default: system default)
        #[arg(long)]
        device: Option<String>,
    },
    /// List audio input devices
    Devices,
    /// Check whether the analysis service is reachable and ready
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional; real environment variables win.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if cli.verbose {
        hum_core::set_verbose(true);
    } else {
        hum_core::verbose::init_verbose_from_env();
    }

    match cli.command.unwrap_or(Command::Record { device: None }) {
        Command::Record { device } => commands::record::run(device).await,
        Command::Devices => commands::devices::run(),
        Command::Status => commands::status::run().await,
    }
}

//! CLI entry point for fmod-importer.
//!
//! The binary stands in for the UI collaborator: it chooses the folder,
//! invokes connect and import on the core, and prints the status stream.
//!
//! # Usage
//!
//! Import a folder of audio files:
//! ```bash
//! fmod-importer import ./sfx --host 127.0.0.1 --port 3663
//! ```
//!
//! Check the connection and print the open project:
//! ```bash
//! fmod-importer probe
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use fmod_importer::{Importer, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fmod-importer")]
#[command(about = "Bulk audio-asset import into FMOD Studio over its scripting console", long_about = None)]
struct Cli {
    /// Configuration name under config/ (without extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Console host, overriding the configuration
    #[arg(long, global = true)]
    host: Option<String>,

    /// Console port, overriding the configuration
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder and import its audio files as events
    Import {
        /// Folder to scan recursively for audio files
        folder: PathBuf,

        /// Directory containing the script assets
        #[arg(long)]
        scripts: Option<PathBuf>,
    },

    /// Connect and report the open project, without importing
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::new(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.console.host = host;
    }
    if let Some(port) = cli.port {
        settings.console.port = port;
    }

    match cli.command {
        Commands::Import { folder, scripts } => {
            if let Some(scripts) = scripts {
                settings.scripts_dir = scripts.display().to_string();
            }
            run_import(settings, folder).await
        }
        Commands::Probe => run_probe(settings).await,
    }
}

async fn run_import(settings: Settings, folder: PathBuf) -> Result<()> {
    let host = settings.console.host.clone();
    let port = settings.console.port;
    let (mut importer, status_rx) = Importer::new(settings);
    let printer = spawn_status_printer(status_rx);

    importer.connect(&host, port).await?;
    importer.import_folder(&folder).await?;
    importer.disconnect();

    drop(importer);
    let _ = printer.await;
    Ok(())
}

async fn run_probe(settings: Settings) -> Result<()> {
    let host = settings.console.host.clone();
    let port = settings.console.port;
    let (mut importer, status_rx) = Importer::new(settings);
    let printer = spawn_status_printer(status_rx);

    importer.connect(&host, port).await?;
    match importer.project_path() {
        Some(path) => println!("Open project: {}", path),
        None => println!("Connected, but no project path could be resolved."),
    }
    importer.disconnect();

    drop(importer);
    let _ = printer.await;
    Ok(())
}

fn spawn_status_printer(
    mut status_rx: tokio::sync::mpsc::UnboundedReceiver<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            println!("[status] {}", status);
        }
    })
}

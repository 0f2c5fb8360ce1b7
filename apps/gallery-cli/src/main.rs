//! `morphgallery` command-line entry point.

mod commands;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use morphgallery_client::DEFAULT_BASE_URL;

#[derive(Debug, Parser)]
#[command(name = "morphgallery", version, about = "Small self-hosted image gallery")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the gallery over HTTP.
    Serve(ServeArgs),
    /// List the images of a gallery.
    List(RemoteArgs),
    /// Upload images one after another.
    Upload(UploadArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Directory holding the images.
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Address to listen on.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Largest accepted upload, in bytes.
    #[arg(long)]
    pub max_size: Option<u64>,
    /// Public root URL used in item links.
    #[arg(long)]
    pub public_url: Option<String>,
    /// Write the effective settings to the config file.
    #[arg(long, default_value_t = false)]
    pub save_config: bool,
}

#[derive(Debug, Args)]
pub struct RemoteArgs {
    /// Gallery root URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,
    /// Files to upload, in order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,morphgallery=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => commands::serve(args).await,
        Command::List(args) => commands::list(args).await,
        Command::Upload(args) => commands::upload(args).await,
    }
}

use std::path::PathBuf;

use anyhow::Context;
use backdrop_store::{Ingestor, StoreLayout, mime_for, resolve_address};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backdrop", about = "Ingest image archives and resolve gallery addresses")]
struct Cli {
    /// Storage root for sessions and staging.
    #[arg(long, global = true, default_value = ".backdrop")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract an uploaded zip of images into a fresh session.
    Ingest {
        archive: PathBuf,

        /// Maximum number of images accepted per upload.
        #[arg(long, default_value_t = backdrop_store::DEFAULT_MAX_IMAGES)]
        max_images: usize,
    },
    /// Resolve a public address back to its on-disk image.
    Resolve { address: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let layout = StoreLayout::builder().root(&cli.root).build();

    match cli.command {
        Command::Ingest {
            archive,
            max_images,
        } => {
            let bytes = std::fs::read(&archive)
                .with_context(|| format!("reading {}", archive.display()))?;
            let filename = archive
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();

            let outcome = Ingestor::new(layout)
                .max_images(max_images)
                .ingest(&bytes, filename)
                .await
                .context("ingesting archive")?;

            println!("session: {}", outcome.session_id);
            for address in &outcome.addresses {
                println!("{address}");
            }
        }
        Command::Resolve { address } => {
            let location = resolve_address(&layout, &address)
                .with_context(|| format!("resolving '{address}'"))?;
            println!("{} ({})", location.display(), mime_for(&location));
        }
    }

    Ok(())
}

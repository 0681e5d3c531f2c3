//! Command-line interface.
//!
//! The settings GUI starts `dcplus --background` to run the idle watcher and
//! overlay scheduler. `--preview` flashes demo overlays for the current
//! selection, and running without flags prints a status report.

pub mod background;
pub mod preview;
pub mod status;

use crate::libs::logging;
use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run the idle watcher and overlay scheduler until terminated
    #[arg(long, conflicts_with = "preview")]
    background: bool,

    /// Show demo overlays on the selected monitors for a few seconds
    #[arg(long)]
    preview: bool,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        if cli.background {
            return background::cmd().await;
        }

        // Messages only reach this logger when DCPLUS_DEBUG or RUST_LOG is set.
        logging::init_console();
        if cli.preview {
            preview::cmd().await
        } else {
            status::cmd()
        }
    }
}

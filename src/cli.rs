use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "harvid")]
#[command(author, version, about = "Reassemble a video from a HAR network capture")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the fragments named in a capture and reassemble the video
    Download {
        /// Path to the .har capture file
        #[arg(required = true)]
        har: PathBuf,

        /// Output identifier; derived from the capture file name if omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Overwrite an existing output without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List the fragment locators a capture would yield
    Scan {
        /// Path to the .har capture file
        #[arg(required = true)]
        har: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,
}

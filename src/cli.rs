use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use archflow::core::Engine;

#[derive(Parser)]
#[command(name = "archflow")]
#[command(about = "Layered architecture-flow diagrams from any source tree")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default archflow.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Analyze a source tree and print a summary
    Analyze {
        /// Source directory to analyze
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print or write the flow diagram
    Diagram {
        /// Source directory to analyze
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip generative augmentation even when enabled
        #[arg(long)]
        no_augment: bool,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path } => engine.init(path).await,
            Commands::Analyze { path, json } => engine.analyze(path, json).await,
            Commands::Diagram { path, output, no_augment } => {
                engine.diagram(path, output, no_augment).await
            }
        }
    }
}

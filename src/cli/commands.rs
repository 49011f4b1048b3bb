use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `DraftForge` - corpus-grounded draft generation over pluggable backends.
#[derive(Parser, Debug)]
#[command(name = "draftforge")]
#[command(version = "0.1.0")]
#[command(about = "Outline and draft long-form text through a quality gate.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an outline and draft for a topic
    Generate {
        /// Topic to write about
        topic: String,

        /// Backend to use (stub, interactive, file-exchange, remote)
        #[arg(short, long)]
        backend: Option<String>,

        /// Enqueue all section requests up front instead of one at a time
        #[arg(long)]
        batch: bool,

        /// Corpus file (JSON lines) overriding the configured one
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Answer pending file-exchange requests from the terminal
    Respond {
        /// Keep polling for new requests instead of draining once
        #[arg(short, long)]
        watch: bool,
    },

    /// Inspect recorded generation runs
    History {
        #[command(subcommand)]
        history_command: HistoryCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List recorded runs
    List {
        /// Only runs with this status (complete, partial)
        #[arg(long)]
        status: Option<String>,

        /// Only runs whose topic contains this text
        #[arg(long)]
        topic: Option<String>,
    },

    /// Print one run in full
    Show {
        /// Run id
        id: String,
    },

    /// Re-export a recorded draft as Markdown
    Export {
        /// Run id
        id: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a recorded run
    Delete {
        /// Run id
        id: String,
    },
}

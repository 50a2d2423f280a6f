use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (Debug level) for troubleshooting.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a ZIP archive into a directory tree
    Extract {
        /// Input archive: a file path, or an asset name when --bundle is given
        input: String,

        /// Read the input as a read-only bundled asset from this directory
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Output directory (created if absent)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Delete the source archive after a successful extraction
        #[arg(long)]
        delete_source: bool,
    },
    /// Copy a source byte-for-byte to a destination file with progress
    Stage {
        /// Input: a file path, or an asset name when --bundle is given
        input: String,

        /// Read the input as a read-only bundled asset from this directory
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Destination file path
        output: PathBuf,
    },
    /// List archive entries without extracting
    List {
        /// Input archive file
        input: PathBuf,
    },
    /// Patch one entry inside an encrypted archive and swap it in place
    Rewrite {
        /// The encrypted archive to rewrite
        archive: Option<PathBuf>,

        /// Archive password
        #[arg(short, long)]
        password: Option<String>,

        /// Entry to replace, matched by exact file name anywhere in the tree
        #[arg(short, long)]
        entry: Option<String>,

        /// File whose bytes become the new entry content
        #[arg(long, conflicts_with = "server_url")]
        content: Option<PathBuf>,

        /// Render the built-in settings template with this server URL
        #[arg(long)]
        server_url: Option<String>,

        /// Scratch directory, owned exclusively by the job and wiped on exit
        #[arg(long)]
        scratch: Option<PathBuf>,

        /// TOML job file supplying any of the values above
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

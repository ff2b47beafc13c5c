use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Match-play tournament scoring")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Run the document server the remote store talks to
    ServeDocs {
        /// Port number
        #[arg(short, long, default_value_t = 8090)]
        port: u16,
        /// SQLite file (defaults to DATABASE_PATH, then docstore.db)
        #[arg(short, long)]
        database: Option<String>,
    },
    /// List tournaments in the configured store
    List,
    /// Print a tournament's scoreboard
    Scoreboard {
        /// Tournament id
        id: String,
    },
    /// Copy a file store directory into the document server
    Migrate {
        /// Source directory (defaults to DATA_DIR, then ./data)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Document server URL (defaults to DOCSTORE_URL)
        #[arg(long)]
        remote_url: Option<String>,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tfvc_cli::ResolveStrategy;
use tfvc_cli::config::Overrides;
use tfvc_cli::constants::DEFAULT_HISTORY_LIMIT;

/// tfvc: run TFVC (tf) operations and show their results
#[derive(Parser, Debug)]
#[command(name = "tfvc", about, long_about = None)]
pub struct Cli {
    /// config file (default: <config dir>/tfvc-cli/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// path to the tf executable
    #[arg(long, global = true)]
    pub tf_path: Option<PathBuf>,

    /// local directory mapped in the workspace
    #[arg(long, global = true)]
    pub local_root: Option<PathBuf>,

    /// server folder mapped to the local root, e.g. $/Project
    #[arg(long, global = true)]
    pub server_root: Option<String>,

    /// workspace name
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    /// team project collection url
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// print records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// echo every tf invocation
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// don't ask for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// get the latest version of the workspace
    Get,

    /// list pending changes
    Status,

    /// pend adds for new files
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// check in pending changes
    Checkin {
        /// check-in comment (prompted for when omitted)
        #[arg(short, long)]
        message: Option<String>,

        /// only these files (default: everything pending)
        files: Vec<String>,
    },

    /// undo pending changes
    Undo {
        /// only these files (default: everything pending)
        paths: Vec<String>,
    },

    /// list branches
    Branches {
        /// branch or folder to inspect (default: server root)
        path: Option<String>,
    },

    /// pend a new branch
    Branch {
        source: String,
        target: String,

        /// branch from this changeset instead of latest
        #[arg(short, long)]
        changeset: Option<u64>,
    },

    /// merge one branch into another
    Merge {
        source: String,
        target: String,

        /// merge only this changeset
        #[arg(short, long)]
        changeset: Option<u64>,
    },

    /// resolve merge conflicts automatically
    Resolve {
        path: Option<String>,

        #[arg(short, long, value_enum, default_value = "accept-merge")]
        strategy: ResolveStrategy,
    },

    /// show changeset history
    History {
        path: Option<String>,

        /// number of changesets to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },

    /// show a single changeset
    Changeset { id: u64 },

    /// pend changes that undo a changeset
    Rollback { id: u64 },

    /// write a file as of a changeset to a temporary file and print its path
    View {
        path: String,

        /// changeset to view
        #[arg(short, long, conflicts_with = "previous")]
        changeset: Option<u64>,

        /// the revision before this changeset
        #[arg(long)]
        previous: Option<u64>,
    },

    /// make sure the local root is mapped in the workspace
    Map,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            tf_path: self.tf_path.clone(),
            local_root: self.local_root.clone(),
            workspace: self.workspace.clone(),
            server_url: self.collection.clone(),
            server_root: self.server_root.clone(),
        }
    }
}

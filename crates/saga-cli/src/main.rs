mod cmd_files;
mod cmd_locate;
mod cmd_sessions;
mod cmd_status;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use saga_core::config::EngineConfig;
use saga_index::JournalIndex;
use saga_journal::JournalStore;

#[derive(Parser)]
#[command(name = "saga", version, about = "Session activity journal for developers")]
struct Cli {
    /// Project root (journal and path normalization are relative to it)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,
    /// Journal file (overrides the configured path)
    #[arg(long, global = true)]
    journal: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List journal sessions, newest first
    Sessions {
        /// Maximum number of sessions to show (0 = unlimited)
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List files across all sessions with combined change counts
    Files {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the journal line for a change, optionally scoped
    Locate {
        /// Change timestamp as written in the journal (e.g. 09:01:00)
        #[arg(long)]
        time: String,
        /// Change description, exact text
        #[arg(long)]
        desc: String,
        /// Session header to scope to (e.g. "Session 2026-03-05 09:00:00")
        #[arg(long)]
        session: Option<String>,
        /// File path to scope to within the session
        #[arg(long)]
        file: Option<String>,
    },
    /// Show journal location and totals
    Status,
}

/// Open the index over the configured (or overridden) journal file.
fn open_index(root: &Path, journal: Option<&Path>) -> anyhow::Result<JournalIndex> {
    let config = EngineConfig::load(&root.join(".saga/config.json"));
    let path = match journal {
        Some(p) => p.to_path_buf(),
        None => config.journal_file(root),
    };
    let store = JournalStore::new(path, &config.journal_title);
    JournalIndex::new(store, Some(root.to_path_buf()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Sessions { limit, json } => cmd_sessions::execute(&cmd_sessions::SessionsParams {
            root: &cli.root,
            journal: cli.journal.as_deref(),
            limit,
            json,
        }),
        Command::Files { json } => cmd_files::execute(&cmd_files::FilesParams {
            root: &cli.root,
            journal: cli.journal.as_deref(),
            json,
        }),
        Command::Locate {
            time,
            desc,
            session,
            file,
        } => cmd_locate::execute(&cmd_locate::LocateParams {
            root: &cli.root,
            journal: cli.journal.as_deref(),
            time: &time,
            desc: &desc,
            session: session.as_deref(),
            file: file.as_deref(),
        }),
        Command::Status => cmd_status::execute(&cli.root, cli.journal.as_deref()),
    }
}

#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};
use clap_complete::Shell;

use crate::config;
use crate::task::model::Task;
use crate::task::storage::TaskStore;
use crate::tui;

#[derive(Debug, Parser)]
#[command(
    name = "invar",
    version,
    about = "Personal task tracker with a version-controlled store"
)]
struct Cli {
    /// Create a task and exit, without entering the interactive view.
    #[arg(short = 'n', long = "new", value_name = "TEXT")]
    new: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the change history of the task store.
    Log {
        /// Emit the history as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts.
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

#[must_use]
pub fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completion { shell }) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "invar", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load()?;
    let dir = config::expand_path(&cfg.storage.dir)?;
    let store = TaskStore::open(dir).context("failed to open task store")?;

    if let Some(text) = cli.new {
        return quick_add(&store, &text);
    }

    match cli.command {
        Some(Commands::Log { json }) => print_log(&store, json),
        Some(Commands::Completion { .. }) => Ok(()), // handled above
        None => {
            if !tui::is_tty() {
                anyhow::bail!("interactive mode requires a terminal; try --new or `invar log`");
            }
            tui::app::run(cfg, store)
        }
    }
}

fn quick_add(store: &TaskStore, text: &str) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("task text must not be empty");
    }
    let task = Task::new(text);
    store.save(&task).context("failed to save task")?;
    println!("Created task {}", task.short_id());
    Ok(())
}

fn print_log(store: &TaskStore, json: bool) -> anyhow::Result<()> {
    let commits = store.log().context("failed to read task history")?;
    if json {
        let out = serde_json::to_string_pretty(&commits)?;
        println!("{out}");
        return Ok(());
    }
    if commits.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    for commit in commits {
        println!("{}  {}  {}", commit.hash, commit.date, commit.message);
    }
    Ok(())
}

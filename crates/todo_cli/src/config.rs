//! Command-line and environment configuration.
//!
//! Precedence: explicit flag > environment variable > built-in default.
//! Blank environment values count as unset.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todo_core::ItemFilter;

const DEFAULT_DB_FILE_NAME: &str = "todo.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "todo-logs";

/// Command-line task list backed by a local SQLite slot.
#[derive(Parser, Debug)]
#[command(version, about = "Local task list")]
pub struct CliArgs {
    /// Database file holding the `todos` slot.
    #[arg(long, env = "TODO_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, env = "TODO_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, env = "TODO_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add an item at the top of the list.
    Add { title: String },
    /// Show items and the remaining count.
    List {
        #[arg(long, default_value = "all")]
        filter: ItemFilter,
    },
    /// Flip one item between active and completed.
    Toggle { id: String },
    /// Complete every item, or reopen all when nothing remains.
    ToggleAll,
    /// Change an item's title.
    Rename { id: String, title: String },
    /// Delete one item.
    Remove { id: String },
    /// Delete all completed items.
    ClearCompleted,
    /// Print the core version.
    Version,
}

/// Settings resolved from [`CliArgs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(args: &CliArgs) -> Self {
        Self {
            db_path: non_blank_path(args.db_path.as_ref())
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_dir: non_blank_path(args.log_dir.as_ref())
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
            log_level: args
                .log_level
                .as_deref()
                .map(str::trim)
                .filter(|level| !level.is_empty())
                .unwrap_or(todo_core::default_log_level())
                .to_string(),
        }
    }
}

fn non_blank_path(path: Option<&PathBuf>) -> Option<PathBuf> {
    path.filter(|path| !path.as_os_str().to_string_lossy().trim().is_empty())
        .cloned()
}

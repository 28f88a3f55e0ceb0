//! `todo` command-line driver.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the store.
//! - Map each subcommand onto one store operation and render the result.
//!
//! # Invariants
//! - Blank titles are refused here before the store is called.
//! - Every mutating command re-renders from the store listener, never from
//!   local state.

mod config;

use clap::Parser;
use config::{CliArgs, Command, Settings};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;
use todo_core::db::{open_db, DbError};
use todo_core::{
    validate_title, Item, ItemFilter, ItemId, SlotRepository, SqliteSlotRepository, StoreError,
    TodoStore,
};

#[derive(Debug)]
enum CliError {
    Db(DbError),
    Store(StoreError),
    BlankTitle,
    UnknownId(String),
    AmbiguousId { prefix: String, matches: usize },
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "cannot open database: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::UnknownId(prefix) => write!(f, "no item matches `{prefix}`"),
            Self::AmbiguousId { prefix, matches } => {
                write!(f, "`{prefix}` matches {matches} items; use a longer prefix")
            }
        }
    }
}

impl Error for CliError {}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = Settings::resolve(&args);

    if let Err(err) = todo_core::init_logging(
        &settings.log_level,
        &settings.log_dir.to_string_lossy(),
    ) {
        eprintln!("warning: logging disabled: {err}");
    }

    match run(args.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            warn!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, settings: &Settings) -> Result<(), CliError> {
    if let Command::Version = command {
        println!("todo_core version={}", todo_core::core_version());
        return Ok(());
    }

    let conn = open_db(&settings.db_path)?;
    let mut store = TodoStore::open(SqliteSlotRepository::new(&conn))?;
    info!(
        "event=cli_command module=cli status=start items={}",
        store.len()
    );

    if let Command::List { filter } = command {
        print!("{}", render(&store, filter));
        return Ok(());
    }

    store.subscribe(|store| print!("{}", render(store, ItemFilter::All)));
    apply(&mut store, command)
}

fn apply<R: SlotRepository>(store: &mut TodoStore<R>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Add { title } => {
            ensure_title(&title)?;
            store.add(title)?;
        }
        Command::Toggle { id } => {
            let id = resolve_id(store, &id)?;
            store.toggle_one(&id)?;
        }
        Command::ToggleAll => {
            let completed = store.remaining_count() > 0;
            store.toggle_all(completed)?;
        }
        Command::Rename { id, title } => {
            ensure_title(&title)?;
            let id = resolve_id(store, &id)?;
            store.update_title(&id, title)?;
        }
        Command::Remove { id } => {
            let id = resolve_id(store, &id)?;
            store.remove(&id)?;
        }
        Command::ClearCompleted => store.clear_completed()?,
        Command::List { .. } | Command::Version => {}
    }
    Ok(())
}

fn ensure_title(title: &str) -> Result<(), CliError> {
    validate_title(title).map_err(|_| CliError::BlankTitle)
}

/// Accepts a full id or a prefix matching exactly one item.
fn resolve_id<R: SlotRepository>(store: &TodoStore<R>, raw: &str) -> Result<ItemId, CliError> {
    let raw = raw.trim();
    if let Some(item) = store.get(&ItemId::new(raw)) {
        return Ok(item.id.clone());
    }

    let matches: Vec<&ItemId> = store
        .items()
        .iter()
        .map(|item| &item.id)
        .filter(|id| !raw.is_empty() && id.as_str().starts_with(raw))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => Err(CliError::UnknownId(raw.to_string())),
        many => Err(CliError::AmbiguousId {
            prefix: raw.to_string(),
            matches: many.len(),
        }),
    }
}

fn render<R: SlotRepository>(store: &TodoStore<R>, filter: ItemFilter) -> String {
    let mut out = String::new();
    for item in store.filtered(filter) {
        out.push_str(&render_item(&item));
        out.push('\n');
    }

    let remaining = store.remaining_count();
    let mut footer = Vec::new();
    if remaining > 0 {
        footer.push(remaining_label(remaining));
    }
    if filter != ItemFilter::All {
        footer.push(format!("(filter: {filter})"));
    }
    if !footer.is_empty() {
        out.push_str(&footer.join(" "));
        out.push('\n');
    }
    out
}

fn render_item(item: &Item) -> String {
    let mark = if item.completed { 'x' } else { ' ' };
    format!("[{mark}] {} {}", item.id, item.title)
}

fn remaining_label(remaining: usize) -> String {
    if remaining == 1 {
        "1 item left".to_string()
    } else {
        format!("{remaining} items left")
    }
}

mod app_logic;
mod core;

use crate::app_logic::{GalleryCommand, GalleryEvent, GallerySession};
use crate::core::config::APP_NAME;
use crate::core::{
    ColumnId, ConfigManagerOperations, CoreConfigManager, CoreFileSystemScanner,
    CoreSessionStore, DirectoryTree, FileSystemScannerOperations, GalleryConfig, SearchIndex,
    SessionState, SessionStoreError, SessionStoreOperations, dropdown_levels,
    load_tree_document, save_tree_document,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Once};
use std::thread;
use std::time::Instant;

static LOGGING_INIT: Once = Once::new();

/*
 * Installs the terminal logger. Safe to call more than once (tests may call it from
 * several threads); only the first call has any effect.
 */
pub fn initialize_logging(level: LevelFilter) {
    LOGGING_INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_target_level(LevelFilter::Off)
            .set_thread_level(LevelFilter::Off)
            .build();
        if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Synchronized multi-column image gallery.", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a tree document from an image directory
    Scan {
        dir: PathBuf,
        /// Write the tree document here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print path completions for a partial path
    Suggest {
        #[arg(long)]
        tree: Option<PathBuf>,
        query: String,
    },
    /// Build a session, apply the given edits and print what every column shows
    Show(ShowArgs),
    /// List named sessions stored in a project directory
    Sessions { project: PathBuf },
}

/*
 * COL is a column position (counting from 0) in the layout the session starts
 * with. Typed paths settle first; the remaining edits are applied in the order the
 * options are listed here.
 */
#[derive(Args, Debug)]
struct ShowArgs {
    #[arg(long)]
    tree: Option<PathBuf>,
    /// Session state JSON file to start from
    #[arg(long, conflicts_with = "session")]
    state: Option<PathBuf>,
    /// Project directory holding named sessions
    #[arg(long)]
    project: Option<PathBuf>,
    /// Named session inside --project to start from
    #[arg(long, requires = "project")]
    session: Option<String>,
    /// Column path templates (repeatable); default layout when omitted
    #[arg(long = "column")]
    columns: Vec<String>,
    /// Type a path into a column, as COL=PATH
    #[arg(long = "type", value_parser = parse_column_text)]
    typed: Vec<(usize, String)>,
    /// Rename a column, as COL=TITLE
    #[arg(long = "title", value_parser = parse_column_text)]
    titles: Vec<(usize, String)>,
    /// Take the first completion of QUERY for a column, as COL=QUERY
    #[arg(long = "complete", value_parser = parse_column_text)]
    completions: Vec<(usize, String)>,
    /// Stop a column's dropdown level from following other columns, as COL:LEVEL
    #[arg(long = "no-sync", value_parser = parse_column_level)]
    no_sync: Vec<(usize, usize)>,
    /// Choose a dropdown value, as COL:LEVEL=VALUE
    #[arg(long = "select", value_parser = parse_dropdown_choice)]
    selections: Vec<DropdownChoice>,
    /// Steps to move the global image focus (negative moves back)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    step: isize,
    /// Step through one column's own images, as COL:STEPS
    #[arg(long = "column-step", value_parser = parse_column_step)]
    column_steps: Vec<(usize, isize)>,
    /// New column order as a comma-separated list of positions
    #[arg(long, value_delimiter = ',')]
    order: Vec<usize>,
    /// Delete the column at this position (repeatable)
    #[arg(long)]
    delete: Vec<usize>,
    /// Switch dark mode on or off
    #[arg(long)]
    dark: Option<bool>,
    /// Print the resulting state JSON
    #[arg(long)]
    json: bool,
    /// Save the resulting state as a named session inside --project
    #[arg(long, requires = "project")]
    save_as: Option<String>,
    /// Write the resulting state JSON to this file
    #[arg(long)]
    save_state: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
struct DropdownChoice {
    column: usize,
    level: usize,
    value: String,
}

fn parse_position(text: &str) -> Result<usize, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("'{text}' is not a column position"))
}

fn parse_column_text(arg: &str) -> Result<(usize, String), String> {
    let (column, text) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected COL=TEXT, got '{arg}'"))?;
    Ok((parse_position(column)?, text.to_string()))
}

fn parse_column_level(arg: &str) -> Result<(usize, usize), String> {
    let (column, level) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected COL:LEVEL, got '{arg}'"))?;
    let level = level
        .trim()
        .parse()
        .map_err(|_| format!("'{level}' is not a dropdown level"))?;
    Ok((parse_position(column)?, level))
}

fn parse_dropdown_choice(arg: &str) -> Result<DropdownChoice, String> {
    let (target, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected COL:LEVEL=VALUE, got '{arg}'"))?;
    let (column, level) = parse_column_level(target)?;
    Ok(DropdownChoice {
        column,
        level,
        value: value.to_string(),
    })
}

fn parse_column_step(arg: &str) -> Result<(usize, isize), String> {
    let (column, steps) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected COL:STEPS, got '{arg}'"))?;
    let steps = steps
        .trim()
        .parse()
        .map_err(|_| format!("'{steps}' is not a step count"))?;
    Ok((parse_position(column)?, steps))
}

fn load_config(config_manager: &dyn ConfigManagerOperations) -> GalleryConfig {
    match config_manager.load_config(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Main: Using default configuration: {e}");
            GalleryConfig::default()
        }
    }
}

/*
 * Loads the tree named on the command line, or the one remembered in the config.
 * A successfully loaded explicit path becomes the remembered one.
 */
fn load_tree(
    explicit: Option<&Path>,
    config: &mut GalleryConfig,
    config_manager: &dyn ConfigManagerOperations,
) -> Result<DirectoryTree, Box<dyn Error>> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.tree_document.clone())
        .ok_or("No tree document given and none remembered; pass --tree")?;
    let tree = load_tree_document(&path)?;
    if config.tree_document.as_deref() != Some(path.as_path()) {
        config.tree_document = Some(path);
        if let Err(e) = config_manager.save_config(APP_NAME, config) {
            log::warn!("Main: Could not remember tree document: {e}");
        }
    }
    Ok(tree)
}

fn run_scan(dir: &Path, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let tree = CoreFileSystemScanner::new().scan_directory(dir)?;
    match output {
        Some(path) => {
            save_tree_document(path, &tree)?;
            let (dirs, images, docs) = tree.statistics();
            println!("Wrote {path:?}: {dirs} directories, {images} images, {docs} documents.");
        }
        None => println!("{}", serde_json::to_string_pretty(&tree)?),
    }
    Ok(())
}

fn run_suggest(tree: &DirectoryTree, query: &str, limit: usize) {
    for suggestion in SearchIndex::new(tree).suggest(query).into_iter().take(limit) {
        println!("{}", suggestion.input_text());
    }
}

fn initial_state(
    store: &dyn SessionStoreOperations,
    state: Option<&Path>,
    project: Option<&Path>,
    session: Option<&str>,
) -> Option<Result<SessionState, SessionStoreError>> {
    match (state, project, session) {
        (Some(path), _, _) => Some(store.load_session_from_path(path)),
        (None, Some(project), Some(name)) => Some(store.load_session(project, name)),
        _ => None,
    }
}

fn print_session(session: &GallerySession) {
    let index = session.image_index();
    println!("Master list: {:?}", index.master_list());
    match index.focused_filename() {
        Some(name) => println!("Focus: {} ({name})", index.global_index()),
        None => println!("Focus: none"),
    }
    for column in session.columns() {
        let title = if column.title().is_empty() {
            column.id().as_str()
        } else {
            column.title()
        };
        println!("[{title}] {}", column.path_template());
        let levels = dropdown_levels(
            session.tree(),
            column.path_template(),
            column.selections(),
            column.sync_disabled(),
        );
        for level in levels {
            println!(
                "  level {}: {:?} selected={:?}{}",
                level.index,
                level.options,
                level.current_value(),
                if level.sync_enabled { "" } else { " (no sync)" }
            );
        }
        if let Some(display) = session.display_for(column.id()) {
            println!("  {}", display.message());
        }
    }
}

fn column_at(order: &[ColumnId], position: usize) -> Result<ColumnId, Box<dyn Error>> {
    order
        .get(position)
        .cloned()
        .ok_or_else(|| format!("No column at position {position}").into())
}

/* Ticks the session until no typed path is waiting for its quiet period. */
fn settle_path_input(session: &mut GallerySession) {
    while let Some(deadline) = session.next_timer_deadline() {
        thread::sleep(deadline.saturating_duration_since(Instant::now()));
        session.handle_event(GalleryEvent::TimerTick {
            now: Instant::now(),
        });
    }
}

/* Turns the edit options into renderer events, in the order `ShowArgs` documents. */
fn dispatch_edits(
    session: &mut GallerySession,
    args: &ShowArgs,
    order: &[ColumnId],
) -> Result<(), Box<dyn Error>> {
    let typed_at = Instant::now();
    for (position, text) in &args.typed {
        session.handle_event(GalleryEvent::PathTyped {
            column_id: column_at(order, *position)?,
            text: text.clone(),
            at: typed_at,
        });
    }
    settle_path_input(session);

    for (position, title) in &args.titles {
        session.handle_event(GalleryEvent::ColumnTitleChanged {
            column_id: column_at(order, *position)?,
            title: title.clone(),
        });
    }
    for (position, query) in &args.completions {
        let column_id = column_at(order, *position)?;
        let Some(suggestion) = session.suggestions_for(query).into_iter().next() else {
            return Err(format!("No completion for '{query}'").into());
        };
        session.handle_event(GalleryEvent::SuggestionChosen {
            column_id,
            suggestion,
        });
    }
    for (position, level) in &args.no_sync {
        session.handle_event(GalleryEvent::LevelSyncToggled {
            column_id: column_at(order, *position)?,
            level: *level,
            enabled: false,
        });
    }
    for choice in &args.selections {
        session.handle_event(GalleryEvent::DropdownChanged {
            column_id: column_at(order, choice.column)?,
            level: choice.level,
            value: choice.value.clone(),
        });
    }
    if args.step != 0 {
        session.handle_event(GalleryEvent::NavigateGlobal {
            direction: args.step,
        });
    }
    for (position, steps) in &args.column_steps {
        session.handle_event(GalleryEvent::NavigateColumn {
            column_id: column_at(order, *position)?,
            direction: *steps,
        });
    }
    if !args.order.is_empty() {
        let reordered = args
            .order
            .iter()
            .map(|position| column_at(order, *position))
            .collect::<Result<Vec<_>, _>>()?;
        session.handle_event(GalleryEvent::ColumnsReordered { order: reordered });
    }
    for position in &args.delete {
        session.handle_event(GalleryEvent::ColumnDeleted {
            column_id: column_at(order, *position)?,
        });
    }
    if let Some(enabled) = args.dark {
        session.handle_event(GalleryEvent::DarkModeToggled { enabled });
    }
    Ok(())
}

fn run_show(
    tree: DirectoryTree,
    config: GalleryConfig,
    store: &dyn SessionStoreOperations,
    args: &ShowArgs,
) -> Result<(), Box<dyn Error>> {
    let tree = Arc::new(tree);
    let loaded = initial_state(
        store,
        args.state.as_deref(),
        args.project.as_deref(),
        args.session.as_deref(),
    );

    let mut session = match loaded {
        None if !args.columns.is_empty() => {
            let mut session = GallerySession::new(tree, config);
            for path in &args.columns {
                session.handle_event(GalleryEvent::ColumnAdded {
                    path_template: Some(path.clone()),
                });
            }
            session
        }
        loaded => GallerySession::load_state_or_default(tree, config, loaded),
    };
    let order: Vec<ColumnId> = session.columns().iter().map(|c| c.id().clone()).collect();
    dispatch_edits(&mut session, args, &order)?;

    let mut latest_state = None;
    while let Some(command) = session.try_dequeue_command() {
        match command {
            GalleryCommand::PersistState(state) => latest_state = Some(state),
            GalleryCommand::RenderSuggestions {
                column_id,
                candidates,
            } if !candidates.is_empty() => {
                let texts: Vec<String> = candidates.iter().map(|s| s.input_text()).collect();
                println!("Suggestions for {column_id}: {}", texts.join(", "));
            }
            other => log::trace!("Main: {other:?}"),
        }
    }
    print_session(&session);

    let final_state = latest_state.unwrap_or_else(|| session.to_session_state());
    if args.json {
        println!("{}", final_state.to_json()?);
    }
    if let Some(path) = &args.save_state {
        store.save_session_to_path(path, &final_state)?;
        println!("Saved state to {path:?}.");
    }
    if let (Some(project), Some(name)) = (&args.project, &args.save_as) {
        store.save_session(project, name, &final_state)?;
        println!("Saved session '{name}'.");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config_manager = CoreConfigManager::new();
    let store = CoreSessionStore::new();
    match &cli.command {
        Command::Scan { dir, output } => run_scan(dir, output.as_deref()),
        Command::Suggest { tree, query } => {
            let mut config = load_config(&config_manager);
            let tree = load_tree(tree.as_deref(), &mut config, &config_manager)?;
            run_suggest(&tree, query, config.max_suggestions);
            Ok(())
        }
        Command::Show(args) => {
            let mut config = load_config(&config_manager);
            let tree = load_tree(args.tree.as_deref(), &mut config, &config_manager)?;
            run_show(tree, config, &store, args)
        }
        Command::Sessions { project } => {
            for name in store.list_sessions(project)? {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    initialize_logging(level);
    log::debug!("Main: {cli:?}");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Main: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

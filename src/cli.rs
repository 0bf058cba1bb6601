//! Command-line interface (§6). Every subcommand operates against
//! `.code-graph/` under the current directory; `query`'s read-only
//! subcommands delegate to [`crate::mcp::tools_core`] so the CLI and the
//! MCP tool server can never answer the same question differently.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{self, ProjectPaths};
use crate::error::{GraphError, Result};
use crate::graph::store::GraphStore;
use crate::mcp::tools_core;
use crate::observability;
use crate::resolver::Resolver;
use crate::scanner::{Scanner, SyncStats};
use crate::types::ProjectConfig;
use crate::watcher::FileWatcher;

#[derive(Parser)]
#[command(
    name = "code-graph",
    version,
    about = "Persistent, queryable symbol graph for TypeScript/JavaScript, Python and Java, exposed as an MCP tool server",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create `.code-graph/` in the current directory.
    Init {
        /// Overwrite an existing `.code-graph/config.json`.
        #[arg(long)]
        force: bool,
    },
    /// Walk the project, re-index changed files, and reconcile deletions.
    Sync {
        #[arg(long)]
        quiet: bool,
        /// Accepted for protocol parity; a full walk with hash-based
        /// skipping is the only sync mode this scanner performs.
        #[arg(long)]
        full: bool,
        #[arg(long)]
        skip_resolve: bool,
    },
    /// Re-index one file, or a newline-separated list of files.
    Update {
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        files: Option<String>,
    },
    /// Inspect the graph.
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },
    /// Run the MCP tool server over stdio.
    Serve {
        /// Accepted for protocol parity — stdio MCP is the only transport
        /// this server speaks.
        #[arg(long)]
        mcp: bool,
    },
    /// Watch the project and reconcile files as they change.
    Watch {
        #[arg(long)]
        quiet: bool,
    },
    /// Run the resolver pass over currently-unresolved edges.
    Resolve {
        #[arg(long)]
        quiet: bool,
    },
    /// Print project and store status.
    Status,
    /// Inspect the MCP request/response audit log.
    Logs {
        #[command(subcommand)]
        logs: LogsCommand,
    },
}

#[derive(Subcommand)]
pub enum QueryCommand {
    /// Total node/edge/file counts, broken down by type and language.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// A file's symbols plus the edges that cross its boundary.
    File {
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Node names matching a substring.
    Search {
        term: String,
        #[arg(long)]
        json: bool,
    },
    /// Every definition of a symbol plus its usage edges.
    Refs {
        symbol: String,
        #[arg(long)]
        json: bool,
    },
    /// Resolved callers of the first function/method matching a name.
    Callers {
        symbol: String,
        #[arg(long)]
        json: bool,
    },
    /// Resolved callees of the first function/method matching a name.
    Callees {
        symbol: String,
        #[arg(long)]
        json: bool,
    },
    /// Every node of a given type.
    Type {
        node_type: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum LogsCommand {
    /// List dates with an audit log file.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Per-tool call counts for one day (default: today).
    Summary {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the last N lines of one day's log (default: today).
    Tail {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = 20)]
        tail: usize,
        #[arg(long)]
        json: bool,
    },
    /// Delete one day's log file (default: today).
    Clear {
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the path of one day's log file (default: today), whether or
    /// not it exists yet.
    Path {
        #[arg(long)]
        date: Option<String>,
    },
}

/// Run a parsed [`Cli`] against the project rooted at `project_root`.
pub fn run(cli: Cli, project_root: &Path) -> Result<()> {
    match cli.command {
        Command::Init { force } => init(project_root, force),
        Command::Sync {
            quiet,
            full: _,
            skip_resolve,
        } => sync(project_root, quiet, skip_resolve),
        Command::Update { file, files } => update(project_root, file, files),
        Command::Query { query } => run_query(project_root, query),
        Command::Serve { mcp: _ } => serve(project_root),
        Command::Watch { quiet } => watch(project_root, quiet),
        Command::Resolve { quiet } => resolve(project_root, quiet),
        Command::Status => status(project_root),
        Command::Logs { logs } => run_logs(logs),
    }
}

fn paths(project_root: &Path) -> ProjectPaths {
    ProjectPaths::new(project_root)
}

fn open_store(project_root: &Path) -> Result<(ProjectPaths, ProjectConfig, GraphStore)> {
    let paths = paths(project_root);
    paths.require_initialised()?;
    let project_config = config::load_config(&paths)?;
    let store = GraphStore::new(&paths.db_path)?;
    Ok((paths, project_config, store))
}

fn init(project_root: &Path, force: bool) -> Result<()> {
    let paths = config::init_project(project_root, ProjectConfig::default(), force)?;
    println!(
        "{} initialised project at {}",
        style("✓").green(),
        paths.code_graph_dir.display()
    );
    Ok(())
}

/// A ticking spinner for the duration of a blocking sync/resolve pass —
/// `full_sync`/`resolve` report no incremental progress, so a steady-tick
/// spinner is the only honest indicator available.
fn spinner(quiet: bool, message: &'static str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    Some(bar)
}

fn print_sync_stats(stats: &SyncStats) {
    println!(
        "processed {}, skipped {}, deleted {}, errors {}",
        style(stats.processed).green(),
        stats.skipped,
        stats.deleted,
        if stats.errors.is_empty() {
            style(0).green()
        } else {
            style(stats.errors.len()).red()
        }
    );
    for (path, message) in &stats.errors {
        eprintln!("  {} {path}: {message}", style("!").red());
    }
}

fn sync(project_root: &Path, quiet: bool, skip_resolve: bool) -> Result<()> {
    let (paths, project_config, store) = open_store(project_root)?;
    let bar = spinner(quiet, "syncing");
    let scanner = Scanner::new(&store, &paths.root, project_config);
    let stats = scanner.full_sync()?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    if !quiet {
        print_sync_stats(&stats);
    }

    if !skip_resolve {
        let resolve_stats = Resolver::new(&store)?.resolve()?;
        if !quiet {
            println!(
                "resolved {}, ambiguous {}, unresolved {}",
                style(resolve_stats.resolved).green(),
                resolve_stats.ambiguous,
                resolve_stats.unresolved
            );
        }
    }
    Ok(())
}

fn update(project_root: &Path, file: Option<String>, files: Option<String>) -> Result<()> {
    let targets = match (file, files) {
        (Some(single), _) => vec![PathBuf::from(single)],
        (None, Some(list)) => list.lines().map(PathBuf::from).collect(),
        (None, None) => {
            return Err(GraphError::bad_arguments(
                "update requires --file <path> or --files <newline-list>",
            ))
        }
    };
    let (paths, project_config, store) = open_store(project_root)?;
    let scanner = Scanner::new(&store, &paths.root, project_config);
    let stats = scanner.update(&targets)?;
    print_sync_stats(&stats);
    Ok(())
}

fn resolve(project_root: &Path, quiet: bool) -> Result<()> {
    let (_paths, _config, store) = open_store(project_root)?;
    let stats = Resolver::new(&store)?.resolve()?;
    if !quiet {
        println!(
            "resolved {}, ambiguous {}, unresolved {}",
            style(stats.resolved).green(),
            stats.ambiguous,
            stats.unresolved
        );
    }
    Ok(())
}

fn watch(project_root: &Path, quiet: bool) -> Result<()> {
    let (paths, project_config, store) = open_store(project_root)?;
    let scanner = Scanner::new(&store, &paths.root, project_config);
    let watcher = FileWatcher::new(&paths.root)?;
    if !quiet {
        println!("watching {} (ctrl-c to stop)", paths.root.display());
    }
    while let Some(changed) = watcher.recv() {
        let stats = scanner.update(&changed)?;
        if !quiet {
            print_sync_stats(&stats);
        }
        Resolver::new(&store)?.resolve()?;
    }
    Ok(())
}

fn serve(project_root: &Path) -> Result<()> {
    let (paths, _config, store) = open_store(project_root)?;
    observability::init_logging();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| GraphError::other(format!("failed to start async runtime: {e}")))?;
    runtime
        .block_on(crate::mcp::server::run_server(store, paths.root.clone()))
        .map_err(|e| GraphError::other(e.to_string()))
}

fn status(project_root: &Path) -> Result<()> {
    let paths = paths(project_root);
    if !paths.is_initialised() {
        println!("{} not initialised (run `code-graph init`)", style("✗").red());
        return Err(GraphError::NotInitialised {
            path: paths.config_path,
        });
    }
    let project_config = config::load_config(&paths)?;
    let store = GraphStore::new(&paths.db_path)?;
    let stats = store.stats()?;
    let resolution = store.resolution_stats()?;
    println!("project root   {}", paths.root.display());
    println!("languages      {:?}", project_config.languages);
    println!("nodes          {}", stats.total_nodes);
    println!("edges          {}", stats.total_edges);
    println!("files          {}", stats.total_files);
    println!(
        "resolved/unresolved  {}/{}",
        resolution.resolved_edges, resolution.unresolved_edges
    );
    Ok(())
}

fn run_query(project_root: &Path, query: QueryCommand) -> Result<()> {
    let (_paths, _config, store) = open_store(project_root)?;
    let (value, json) = match query {
        QueryCommand::Stats { json } => (tools_core::handle_get_graph_stats(&store)?, json),
        QueryCommand::File { path, json } => {
            (tools_core::handle_get_file_context(&store, &path)?, json)
        }
        QueryCommand::Search { term, json } => {
            (tools_core::handle_search_symbols(&store, &term)?, json)
        }
        QueryCommand::Refs { symbol, json } => {
            (tools_core::handle_find_references(&store, &symbol)?, json)
        }
        QueryCommand::Callers { symbol, json } => {
            let graph = tools_core::handle_get_call_graph(&store, &symbol)?;
            (graph["callers"].clone(), json)
        }
        QueryCommand::Callees { symbol, json } => {
            let graph = tools_core::handle_get_call_graph(&store, &symbol)?;
            (graph["callees"].clone(), json)
        }
        QueryCommand::Type { node_type, json } => {
            (tools_core::handle_get_by_type(&store, &node_type)?, json)
        }
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", serde_json::to_string(&value)?);
    }
    Ok(())
}

fn run_logs(command: LogsCommand) -> Result<()> {
    match command {
        LogsCommand::Path { date } => {
            let path = log_path_for_date(date)?;
            println!("{}", path.display());
            Ok(())
        }
        LogsCommand::List { json } => logs_list(json),
        LogsCommand::Summary { date, json } => logs_summary(date, json),
        LogsCommand::Tail { date, tail, json } => logs_tail(date, tail, json),
        LogsCommand::Clear { date } => logs_clear(date),
    }
}

fn logs_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| GraphError::other("could not determine home directory"))?
        .home_dir()
        .to_path_buf();
    Ok(home.join(".code-graph").join("logs"))
}

fn log_path_for_date(date: Option<String>) -> Result<PathBuf> {
    let now = match date {
        Some(d) => parse_log_date(&d)?,
        None => observability::now_utc(),
    };
    observability::log_path_for(now)
        .ok_or_else(|| GraphError::other("could not determine home directory"))
}

fn parse_log_date(date: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    let naive = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| GraphError::bad_arguments(format!("invalid --date {date}: {e}")))?;
    let naive_datetime = naive
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| GraphError::bad_arguments(format!("invalid --date {date}")))?;
    Ok(chrono::DateTime::from_naive_utc_and_offset(naive_datetime, chrono::Utc))
}

fn logs_list(json: bool) -> Result<()> {
    let dir = logs_dir()?;
    let mut dates = Vec::new();
    if dir.is_dir() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(date) = name.strip_prefix("mcp-").and_then(|s| s.strip_suffix(".jsonl")) {
                dates.push(date.to_string());
            }
        }
    }
    dates.sort();
    if json {
        println!("{}", serde_json::to_string_pretty(&dates)?);
    } else if dates.is_empty() {
        println!("no logs yet");
    } else {
        for date in dates {
            println!("{date}");
        }
    }
    Ok(())
}

fn read_log_lines(date: Option<String>) -> Result<Vec<serde_json::Value>> {
    let path = log_path_for_date(date)?;
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

fn logs_summary(date: Option<String>, json: bool) -> Result<()> {
    let records = read_log_lines(date)?;
    let mut by_tool: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for record in &records {
        if record["type"] == "request" {
            if let Some(tool) = record["tool"].as_str() {
                *by_tool.entry(tool.to_string()).or_default() += 1;
            }
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&by_tool)?);
    } else if by_tool.is_empty() {
        println!("no calls logged");
    } else {
        for (tool, count) in &by_tool {
            println!("{tool}  {count}");
        }
    }
    Ok(())
}

fn logs_tail(date: Option<String>, tail: usize, json: bool) -> Result<()> {
    let records = read_log_lines(date)?;
    let start = records.len().saturating_sub(tail);
    let slice = &records[start..];
    if json {
        println!("{}", serde_json::to_string_pretty(slice)?);
    } else {
        for record in slice {
            println!("{record}");
        }
    }
    Ok(())
}

fn logs_clear(date: Option<String>) -> Result<()> {
    let path = log_path_for_date(date)?;
    if path.is_file() {
        std::fs::remove_file(&path)?;
        println!("removed {}", path.display());
    } else {
        println!("no log at {}", path.display());
    }
    Ok(())
}

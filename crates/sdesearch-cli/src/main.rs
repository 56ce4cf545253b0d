//! # `SdeSearch` Command-Line Interface
//!
//! This binary provides a terminal front end to the [`sdesearch_core`] library,
//! letting users discover enterprise geodatabase connections, load and cache their
//! catalogs, search them and inspect individual datasets.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It acts as a thin façade: it parses arguments, configures logging, builds a
//! [`SearchSession`] over snapshot-backed sessions and delegates to command handlers.
//!
//! # Available Commands
//!
//! - `connections` - List discovered connection files
//! - `load` - Load (or refresh) the catalog of a connection
//! - `search` - Search the catalog of a connection
//! - `details` - Show fields and metadata of one dataset
//! - `cache` - Inspect or clear the catalog cache of a connection
//! - `theme` - Show or set the panel theme preference

mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use sdesearch_core::{SdeSearchError, SearchSession};
use sdesearch_core::cache::Theme;
use sdesearch_core::filter::{SearchScopes, TypeVisibility};
use sdesearch_core::model::ConnectionDescriptor;
use sdesearch_core::settings::Settings;
use sdesearch_core_common::ProjectItem;
use sdesearch_snapshot::SnapshotSessionFactory;

#[derive(Parser)]
#[command(
    name = "sdesearch",
    version,
    about = "Browse, cache and search enterprise geodatabase catalogs",
    long_about = "SdeSearch discovers .sde connection files, caches the catalog of each \
                  geodatabase on disk and searches it by name, alias and metadata."
)]
/// Command-line arguments and options for the `SdeSearch` CLI.
///
/// Global flags control logging verbosity and override the settings otherwise taken
/// from the environment.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Directory holding catalog cache files.
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Home folder of the current project.
    #[arg(long, global = true, value_name = "DIR")]
    project_home: Option<PathBuf>,

    /// Profile-wide connections folder.
    #[arg(long, global = true, value_name = "DIR")]
    profile_connections: Option<PathBuf>,

    /// Schema snapshot serving every connection, instead of `<connection>.json` sidecars.
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Database item registered with the project (repeatable).
    #[arg(long = "project-item", global = true, value_name = "PATH")]
    project_items: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `SdeSearch` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Lists connection files found in the project, the project folder and the profile folder.
    Connections,

    /// Loads the catalog of a connection, from cache when possible.
    Load {
        /// Connection name or path to an `.sde` file.
        #[arg(value_name = "CONNECTION")]
        connection: String,

        /// Ignores the cache and enumerates the database again.
        #[arg(short, long)]
        refresh: bool,
    },

    /// Searches the catalog of a connection.
    ///
    /// All whitespace-separated terms must match. An empty query or `*` lists everything.
    Search {
        /// Connection name or path to an `.sde` file.
        #[arg(value_name = "CONNECTION")]
        connection: String,

        /// Search terms.
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,

        /// Also match metadata text (description, tags, credits...).
        #[arg(short, long)]
        metadata: bool,

        /// Do not match names and aliases.
        #[arg(long)]
        no_name: bool,

        /// Hide feature classes.
        #[arg(long)]
        no_feature_classes: bool,

        /// Hide tables.
        #[arg(long)]
        no_tables: bool,

        /// Hide feature datasets.
        #[arg(long)]
        no_datasets: bool,

        /// Ignores the cache and enumerates the database again.
        #[arg(short, long)]
        refresh: bool,
    },

    /// Shows the fields and metadata of one dataset.
    Details {
        /// Connection name or path to an `.sde` file.
        #[arg(value_name = "CONNECTION")]
        connection: String,

        /// Fully qualified dataset name.
        #[arg(value_name = "NAME")]
        name: String,

        /// Prints only the dataset path.
        #[arg(long)]
        path: bool,
    },

    /// Manages the catalog cache of a connection.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Shows the theme preference, or sets it when a value is given.
    Theme {
        /// `dark` or `light`.
        #[arg(value_name = "THEME")]
        theme: Option<Theme>,
    },
}

/// Cache operations.
#[derive(Subcommand)]
enum CacheAction {
    /// Prints the cache file of a connection.
    Path {
        /// Connection name or path to an `.sde` file.
        #[arg(value_name = "CONNECTION")]
        connection: String,
    },
    /// Deletes the cache file of a connection.
    Clear {
        /// Connection name or path to an `.sde` file.
        #[arg(value_name = "CONNECTION")]
        connection: String,
    },
}

/// Entry point for the `SdeSearch` command-line interface.
///
/// This function parses command-line arguments, configures the logging system based on
/// verbosity flags, and dispatches to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut session = build_session(&cli)?;
    watch_progress(&session);

    let result = run(cli.command, &mut session).await;
    if let Some(hint) = result
        .as_ref()
        .err()
        .and_then(|e| e.downcast_ref::<SdeSearchError>())
        .and_then(SdeSearchError::recovery_suggestion)
    {
        warn!("{hint}");
    }
    result
}

/// Dispatches a subcommand to its handler.
async fn run(command: Commands, session: &mut SearchSession) -> Result<()> {
    match command {
        Commands::Connections => handle_connections(session).await?,
        Commands::Load {
            connection,
            refresh,
        } => {
            info!("Loading catalog of {connection}");
            handle_load(session, &connection, refresh).await?;
        },
        Commands::Search {
            connection,
            query,
            metadata,
            no_name,
            no_feature_classes,
            no_tables,
            no_datasets,
            refresh,
        } => {
            let scopes = SearchScopes {
                by_name: !no_name,
                by_metadata: metadata,
            };
            let visibility = TypeVisibility {
                feature_classes: !no_feature_classes,
                tables: !no_tables,
                feature_datasets: !no_datasets,
            };
            handle_search(session, &connection, &query, scopes, visibility, refresh).await?;
        },
        Commands::Details {
            connection,
            name,
            path,
        } => handle_details(session, &connection, &name, path).await?,
        Commands::Cache { action } => handle_cache(session, action).await?,
        Commands::Theme { theme } => handle_theme(session, theme)?,
    }

    Ok(())
}

/// Builds settings from the environment, applies flag overrides and opens a session.
fn build_session(cli: &Cli) -> Result<SearchSession> {
    let mut settings = Settings::from_env()?;
    if let Some(dir) = &cli.cache_dir {
        settings = settings.with_cache_dir(dir);
    }
    if let Some(dir) = &cli.project_home {
        settings = settings.with_project_home(dir);
    }
    if let Some(dir) = &cli.profile_connections {
        settings = settings.with_profile_connections_dir(Some(dir.clone()));
    }
    debug!("Settings: {settings:?}");

    let factory = Arc::new(match &cli.snapshot {
        Some(file) => SnapshotSessionFactory::from_file(file),
        None => SnapshotSessionFactory::sidecar(),
    });
    let project: Vec<ProjectItem> = cli.project_items.iter().map(|p| project_item(p)).collect();

    Ok(SearchSession::new(
        settings,
        factory.clone(),
        factory,
        Arc::new(project),
    ))
}

fn project_item(path: &Path) -> ProjectItem {
    ProjectItem {
        name: path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned()),
        path: path.to_path_buf(),
    }
}

/// Logs progress text published by the session until it is dropped.
fn watch_progress(session: &SearchSession) {
    let mut progress = session.progress();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let text = progress.borrow_and_update().clone();
            if !text.is_empty() {
                info!("{text}");
            }
        }
    });
}

/// Finds a connection by display name or file name, falling back to a manual path.
async fn resolve_connection(
    session: &mut SearchSession,
    connection: &str,
) -> Result<ConnectionDescriptor> {
    session.refresh_connections().await?;
    let known = session
        .connections()
        .iter()
        .find(|c| {
            c.name.eq_ignore_ascii_case(connection)
                || c.path
                    .file_name()
                    .is_some_and(|f| f.to_string_lossy().eq_ignore_ascii_case(connection))
        })
        .cloned();
    match known {
        Some(conn) => Ok(conn),
        None => {
            debug!("'{connection}' is not a discovered connection, trying it as a path");
            Ok(session.add_manual_connection(connection)?)
        },
    }
}

async fn load(session: &mut SearchSession, connection: &str, refresh: bool) -> Result<()> {
    let conn = resolve_connection(session, connection).await?;
    let outcome = session.load_catalog(&conn, refresh).await?;
    if let Some(error) = &outcome.connection_error {
        return Err(anyhow!("{}", error.user_message()));
    }
    for failure in &outcome.failures {
        warn!("{failure}");
    }
    if outcome.skipped_items > 0 {
        warn!("{} unreadable item(s) were skipped", outcome.skipped_items);
    }
    Ok(())
}

async fn handle_connections(session: &mut SearchSession) -> Result<()> {
    session.refresh_connections().await?;
    println!("{}", session.status());
    display::display_connections(session.connections());
    Ok(())
}

async fn handle_load(session: &mut SearchSession, connection: &str, refresh: bool) -> Result<()> {
    load(session, connection, refresh).await?;
    println!("{}", session.status());
    Ok(())
}

async fn handle_search(
    session: &mut SearchSession,
    connection: &str,
    query: &str,
    scopes: SearchScopes,
    visibility: TypeVisibility,
    refresh: bool,
) -> Result<()> {
    load(session, connection, refresh).await?;
    session.set_scopes(scopes)?;
    session.set_visibility(visibility)?;
    session.set_query(query)?;
    println!("{}", session.status());
    display::display_entries(&session.results());
    Ok(())
}

async fn handle_details(
    session: &mut SearchSession,
    connection: &str,
    name: &str,
    path_only: bool,
) -> Result<()> {
    load(session, connection, false).await?;
    if path_only {
        println!("{}", session.dataset_uri(name)?);
        return Ok(());
    }
    let details = session.resolve_details(name).await?;
    display::display_details(&details);
    if let Some(error) = details.error {
        return Err(error.into());
    }
    Ok(())
}

async fn handle_cache(session: &mut SearchSession, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Path { connection } => {
            let conn = resolve_connection(session, &connection).await?;
            println!("{}", session.cache().file_for(&conn.path).display());
        },
        CacheAction::Clear { connection } => {
            let conn = resolve_connection(session, &connection).await?;
            if session.cache().invalidate(&conn.path)? {
                println!("Cleared cache of {}", conn.name);
            } else {
                println!("No cache for {}", conn.name);
            }
        },
    }
    Ok(())
}

fn handle_theme(session: &SearchSession, theme: Option<Theme>) -> Result<()> {
    match theme {
        Some(theme) => {
            session.cache().save_theme(theme)?;
            println!("Theme set to {theme}");
        },
        None => println!("{}", session.cache().load_theme()),
    }
    Ok(())
}

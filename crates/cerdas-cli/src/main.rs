//! cerdas: command-line front end for the document search service.
//!
//! Every command prints pretty JSON on stdout. Commands that search run the
//! session startup first, so the remembered document (or the newest one)
//! is active, just as when the search page opens.

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use cerdas_client::{ClientConfig, HttpBackend};
use cerdas_session::{JsonFileStore, SearchSession};

#[derive(Parser)]
#[command(name = "cerdas")]
#[command(author, version, about = "Search, upload and manage documents on a cerdas backend")]
#[command(propagate_version = true)]
struct Cli {
    /// Backend base URL (overrides config and CERDAS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (default: <config dir>/cerdas/client.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preference file remembering the active document
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the active document and show it
    Start,

    /// List all documents
    List,

    /// Make a document the active one
    Switch {
        /// Document id
        id: String,
    },

    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },

    /// Edit a document's uploader and tags
    Edit {
        /// Document id
        id: String,

        /// New uploader name (default: keep current)
        #[arg(long)]
        uploaded_by: Option<String>,

        /// Comma-separated tags replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },

    /// Upload and index a file
    Upload {
        /// File to upload
        path: PathBuf,

        /// Uploader name (backend default when omitted)
        #[arg(long)]
        uploaded_by: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Suggest words from the active document
    Suggest {
        /// Word prefix
        prefix: String,
    },

    /// Search the active document for a phrase
    Search {
        /// Phrase to search for
        query: String,
    },

    /// List all distinct tags
    Tags,

    /// Show catalog statistics
    Stats,

    /// Show statistics and the most recent documents
    Overview,

    /// Show which document the backend has indexed
    Status,

    /// Forget the remembered active document
    Forget,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::load().context("Failed to load config")?,
    };
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(state) = &cli.state {
        config.state_path = Some(state.clone());
    }
    config.validate()?;
    Ok(config)
}

fn open_session(config: ClientConfig) -> anyhow::Result<SearchSession> {
    let store = JsonFileStore::new(config.resolved_state_path());
    let backend = HttpBackend::new(config)?;
    Ok(SearchSession::new(Arc::new(backend), Arc::new(store)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let mut session = open_session(config)?;

    match cli.command {
        Commands::Start => cmd_start(&mut session).await,
        Commands::List => cmd_list(&mut session).await,
        Commands::Switch { id } => cmd_switch(&mut session, &id).await,
        Commands::Delete { id } => cmd_delete(&mut session, &id).await,
        Commands::Edit {
            id,
            uploaded_by,
            tags,
        } => cmd_edit(&mut session, &id, uploaded_by, tags).await,
        Commands::Upload {
            path,
            uploaded_by,
            tags,
        } => cmd_upload(&mut session, &path, uploaded_by, tags).await,
        Commands::Suggest { prefix } => cmd_suggest(&mut session, prefix).await,
        Commands::Search { query } => cmd_search(&mut session, query).await,
        Commands::Tags => print_json(&session.tags().await?),
        Commands::Stats => print_json(&session.stats().await?),
        Commands::Overview => print_json(&session.overview().await?),
        Commands::Status => print_json(&session.server_status().await?),
        Commands::Forget => {
            session.forget_remembered()?;
            print_json(&json!({ "forgotten": true }))
        }
    }
}

async fn cmd_start(session: &mut SearchSession) -> anyhow::Result<()> {
    let started = session.startup().await?;
    print_json(&json!({
        "session": started,
        "documents": session.catalog().len(),
    }))
}

async fn cmd_list(session: &mut SearchSession) -> anyhow::Result<()> {
    session.refresh_catalog().await?;
    print_json(&*session.catalog().documents())
}

async fn cmd_switch(session: &mut SearchSession, id: &str) -> anyhow::Result<()> {
    let switched = session.switch_document(id).await?;
    print_json(&switched)
}

async fn cmd_delete(session: &mut SearchSession, id: &str) -> anyhow::Result<()> {
    session.startup().await?;
    let message = session.delete_document(id).await?;
    print_json(&json!({
        "message": message,
        "session": session.session(),
    }))
}

async fn cmd_edit(
    session: &mut SearchSession,
    id: &str,
    uploaded_by: Option<String>,
    tags: Option<String>,
) -> anyhow::Result<()> {
    session.refresh_catalog().await?;
    let form = session.open_edit(id)?;
    if let Some(uploaded_by) = uploaded_by {
        form.uploaded_by = uploaded_by;
    }
    if let Some(tags) = tags {
        form.tags = tags;
    }
    let message = session.save_edit().await?;
    let document = session.catalog().lookup(id).ok().cloned();
    print_json(&json!({
        "message": message,
        "document": document,
    }))
}

async fn cmd_upload(
    session: &mut SearchSession,
    path: &Path,
    uploaded_by: Option<String>,
    tags: Option<String>,
) -> anyhow::Result<()> {
    let form = session.upload_form_mut();
    form.select_file(path);
    form.uploaded_by = uploaded_by.unwrap_or_default();
    form.tags = tags.unwrap_or_default();

    let message = session
        .upload()
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    print_json(&json!({
        "message": message,
        "documents": session.catalog().len(),
    }))
}

async fn cmd_suggest(session: &mut SearchSession, prefix: String) -> anyhow::Result<()> {
    session.startup().await?;
    let suggestions = session.type_query(prefix).await?;
    print_json(suggestions)
}

async fn cmd_search(session: &mut SearchSession, query: String) -> anyhow::Result<()> {
    let started = session.startup().await?;
    session.on_query_change(query);
    match session.submit().await?.cloned() {
        Some(result) => print_json(&json!({
            "document": started.label,
            "query": session.search().query(),
            "result": result,
        })),
        None => anyhow::bail!("Nothing to search for"),
    }
}

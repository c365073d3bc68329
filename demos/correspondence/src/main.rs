//! Correspondence register demo
//!
//! Drives RecordSync caches for the register's five record types against
//! in-memory services.
//!
//! # Commands
//!
//! - `list` - Fetch and print one page of a record type
//! - `walkthrough` - Create, update, select and delete a document
//! - `workflow` - Run a protected document workflow action

mod records;
mod server;

use clap::{Parser, Subcommand};
use recordsync_cache::{FieldPatch, Filter, Record};
use recordsync_engine::{
    DetailSync, LoopbackClient, MemoryRecordService, SecureClient, SecureClientConfig,
};
use records::{DocumentFilter, RecordKind, SearchFilter};
use serde_json::json;
use server::{RegistryServer, TOKEN_PATH};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Correspondence register demo.
#[derive(Parser)]
#[command(name = "correspondence")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print one page of a record type
    List {
        /// Record type
        #[arg(value_enum)]
        kind: RecordKind,

        /// Page to fetch
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Records per page
        #[arg(short = 'n', long, default_value = "5")]
        page_size: u32,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create, update, select and delete a document
    Walkthrough,

    /// Run a protected document workflow action
    Workflow {
        /// Document to act on
        #[arg(short, long, default_value = "1")]
        id: u64,

        /// Action (dispatch, receive, archive)
        #[arg(short, long, default_value = "dispatch")]
        action: String,

        /// Expire the server token before the call
        #[arg(short, long)]
        expire: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::List {
            kind,
            page,
            page_size,
            search,
        } => list(kind, page, page_size, search).await?,
        Commands::Walkthrough => walkthrough().await?,
        Commands::Workflow { id, action, expire } => workflow(id, &action, expire).await?,
    }

    Ok(())
}

async fn list(
    kind: RecordKind,
    page: u32,
    page_size: u32,
    search: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    match kind {
        RecordKind::Documents => {
            let seed = records::documents()?;
            list_one::<_, DocumentFilter>("documents", seed, page, page_size, search).await
        }
        RecordKind::Agencies => {
            list_one::<_, SearchFilter>("agencies", records::agencies()?, page, page_size, search)
                .await
        }
        RecordKind::Vendors => {
            list_one::<_, SearchFilter>("vendors", records::vendors()?, page, page_size, search)
                .await
        }
        RecordKind::Projects => {
            list_one::<_, SearchFilter>("projects", records::projects()?, page, page_size, search)
                .await
        }
        RecordKind::Users => {
            let service = records::service(records::users()?);
            let orchestrator = records::user_orchestrator(&service, page_size);
            if let Some(term) = search {
                orchestrator.set_filters(&FieldPatch::new().set("search", term));
            }
            orchestrator.set_page(page, None);
            orchestrator.refetch().await?;
            records::print_page("users", &orchestrator);
            Ok(())
        }
    }
}

async fn list_one<R, F>(
    label: &str,
    seed: Vec<R>,
    page: u32,
    page_size: u32,
    search: Option<String>,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: Record<Key = u64>,
    F: Filter + Default,
{
    let service = records::service(seed);
    let orchestrator = records::orchestrator::<R, F>(&service, page_size);
    if let Some(term) = search {
        orchestrator.set_filters(&FieldPatch::new().set("search", term));
    }
    orchestrator.set_page(page, None);
    orchestrator.refetch().await?;
    records::print_page(label, &orchestrator);
    Ok(())
}

async fn walkthrough() -> Result<(), Box<dyn std::error::Error>> {
    let service = records::service(records::documents()?);
    let documents = records::orchestrator::<_, DocumentFilter>(&service, 5);

    documents.refetch().await?;
    records::print_page("documents", &documents);

    let created = documents
        .handle_create(json!({
            "reference": "MOF/0099",
            "subject": "Tender evaluation minutes",
            "agency_id": 3,
            "status": "draft",
        }))
        .await?;
    if let Some(doc) = &created {
        info!(id = doc.id, "created document");
        documents.select_item(Some(doc.clone()));

        documents
            .handle_update(&doc.id, json!({"status": "sent"}))
            .await?;
        if let Some(selected) = documents.selected_item() {
            info!(id = selected.id, status = %selected.status, "selection follows update");
        }

        let detail = DetailSync::new(Arc::clone(documents.cache()), Arc::clone(&service));
        detail.load(&doc.id).await?;
        if let Some(current) = detail.data() {
            info!(id = current.id, subject = %current.subject, "detail view");
        }

        documents.handle_delete(doc.id).await?;
    }
    records::print_page("documents after walkthrough", &documents);

    documents.set_filters(&FieldPatch::new().set("status", "sent"));
    documents.refetch().await?;
    records::print_page("sent documents", &documents);

    let users = records::service(records::users()?);
    let user_orchestrator = records::user_orchestrator(&users, 5);
    user_orchestrator.refetch().await?;
    user_orchestrator
        .handle_update(&"2".to_string(), json!({"role": "director"}))
        .await?;
    records::print_page("users", &user_orchestrator);
    Ok(())
}

async fn workflow(id: u64, action: &str, expire: bool) -> Result<(), Box<dyn std::error::Error>> {
    let documents: Arc<MemoryRecordService<records::Document>> =
        records::service(records::documents()?);

    let mut config = SecureClientConfig::from_env().with_token_endpoint(TOKEN_PATH);
    if config.base_url.is_empty() {
        config.base_url = "https://registry.example.gov/api".into();
    }
    let server = RegistryServer::new(Arc::clone(&documents))
        .enforcing(!config.skip_replay_protection);
    let client = SecureClient::new(config, LoopbackClient::new(server));

    client.ensure_token().await?;
    if expire {
        client.client().server().expire_token();
    }

    let endpoint = format!("{}/documents/workflow", client.config().base_url);
    let updated = client.request(&endpoint, action, Some(json!({"id": id}))).await?;
    println!("{}", serde_json::to_string_pretty(&updated)?);

    let stats = client.stats();
    info!(
        requests = stats.requests,
        token_fetches = stats.token_fetches,
        retries = stats.retries,
        rotations = stats.rotations,
        "secure client stats"
    );
    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use snipstore::{
    purge_collection, Credentials, FirestoreClient, DEFAULT_FIRESTORE_BASE, PURGE_PAGE_SIZE,
};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "snipstore-purge",
    about = "Delete every document from the snippet knowledge base collections"
)]
struct PurgeCli {
    /// Google Cloud project that owns the Firestore database
    #[arg(long, env = "SNIPSTORE_PROJECT_ID")]
    project_id: String,

    /// OAuth access token used directly, bypassing other credential sources
    #[arg(long, env = "SNIPSTORE_ACCESS_TOKEN")]
    access_token: Option<String>,

    /// Service-account key file used to mint an access token; without it
    /// (or a token) the platform's ambient identity is used
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials_file: Option<PathBuf>,

    /// Collections to purge, comma separated
    #[arg(long, env = "SNIPSTORE_COLLECTIONS", default_value = "snippets,sources")]
    collections: String,

    /// Documents fetched and deleted per batch
    #[arg(long, env = "SNIPSTORE_PAGE_SIZE", default_value_t = PURGE_PAGE_SIZE)]
    page_size: usize,

    /// Seconds before each Firestore request times out
    #[arg(long, env = "SNIPSTORE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Base URL for the Firestore REST API
    #[arg(long, env = "SNIPSTORE_FIRESTORE_BASE", default_value = DEFAULT_FIRESTORE_BASE)]
    firestore_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish()
        .try_init();

    let cli = PurgeCli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs.max(1));

    let credentials = Credentials::from_sources(cli.access_token, cli.credentials_file);
    let token = credentials
        .resolve_token(timeout)
        .await
        .context("failed to resolve Firestore credentials")?;
    let store = FirestoreClient::admin(cli.firestore_base, cli.project_id, &token, timeout)?;

    for collection in cli.collections.split(',').map(str::trim) {
        if collection.is_empty() {
            continue;
        }
        println!("Deleting {collection} collection...");
        let stats = purge_collection(&store, collection, cli.page_size).await?;
        println!(
            "{collection} collection deleted ({} documents in {} batches).",
            stats.documents_deleted, stats.batches_committed
        );
    }
    Ok(())
}

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use snipstore::{
    seed_snippets, DocumentStore, FirestoreClient, WebAppConfig, DEFAULT_FIRESTORE_BASE,
};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "snipstore-seed",
    about = "Populate the snippets collection with the starter records"
)]
struct SeedCli {
    /// Browser API key authorizing client-mode requests
    #[arg(long, env = "SNIPSTORE_API_KEY")]
    api_key: String,

    /// Authentication domain of the project
    #[arg(long, env = "SNIPSTORE_AUTH_DOMAIN")]
    auth_domain: String,

    /// Google Cloud project that owns the Firestore database
    #[arg(long, env = "SNIPSTORE_PROJECT_ID")]
    project_id: String,

    /// Default storage bucket of the project
    #[arg(long, env = "SNIPSTORE_STORAGE_BUCKET")]
    storage_bucket: String,

    /// Cloud messaging sender id
    #[arg(long, env = "SNIPSTORE_MESSAGING_SENDER_ID")]
    messaging_sender_id: String,

    /// Registered application id
    #[arg(long, env = "SNIPSTORE_APP_ID")]
    app_id: String,

    /// Collection receiving the starter records
    #[arg(long, env = "SNIPSTORE_COLLECTION", default_value = "snippets")]
    collection: String,

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

    let cli = SeedCli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs.max(1));

    let config = WebAppConfig::new(
        cli.api_key,
        cli.auth_domain,
        cli.project_id,
        cli.storage_bucket,
        cli.messaging_sender_id,
        cli.app_id,
    )
    .context("invalid web app configuration")?;
    let store = FirestoreClient::with_web_config(cli.firestore_base, &config, timeout)?;

    let inserted = seed_snippets(&store, &cli.collection).await?;
    let total = store
        .count(&cli.collection)
        .await
        .with_context(|| format!("failed to count documents in '{}'", cli.collection))?;
    println!(
        "Database populated successfully! Inserted {inserted} snippets ({total} now in '{}').",
        cli.collection
    );
    Ok(())
}

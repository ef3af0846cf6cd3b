#![warn(missing_docs)]
//! Core library entry points for the snipstore maintenance tooling.

pub mod config;
pub mod firestore;
pub mod model;
pub mod purge;
pub mod seed;
pub mod store;

pub use config::{Credentials, WebAppConfig};
pub use firestore::{FirestoreClient, DEFAULT_FIRESTORE_BASE};
pub use model::{ArrayValue, Document, Value};
pub use purge::{purge_collection, PurgeStats, ORDER_BY_DOC_ID, PURGE_PAGE_SIZE};
pub use seed::{seed_snippets, SeedRecord, SEED_SNIPPETS};
pub use store::DocumentStore;

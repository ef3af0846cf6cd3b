//! Document-store interface implemented by the Firestore client and test fakes.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Document, Value};

/// Minimal collection-oriented document store surface used by the
/// maintenance routines.
///
/// Every call suspends until the remote store answers; implementations do
/// not retry on their own.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches up to `limit` documents from `collection`, ordered ascending
    /// by `order_by`.
    async fn query_page(
        &self,
        collection: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Document>>;

    /// Deletes every referenced document as one atomic batch: all of them
    /// are removed, or none are.
    async fn delete_batch(&self, names: &[String]) -> Result<()>;

    /// Creates one document with the given fields, returning its
    /// server-assigned resource name.
    async fn insert(&self, collection: &str, fields: BTreeMap<String, Value>) -> Result<String>;

    /// Counts the documents currently in `collection`.
    async fn count(&self, collection: &str) -> Result<u64>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store used by unit tests, with injectable failures.

    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use crate::model::{Document, Value};
    use crate::store::DocumentStore;

    #[derive(Default)]
    struct State {
        collections: BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>,
        next_id: u64,
        fetches: usize,
        delete_calls: usize,
        insert_calls: usize,
    }

    /// Collection-per-name map keyed by full resource names. Names embed a
    /// monotonic zero-padded counter, so map order matches insertion order
    /// and mirrors the real store's `__name__` ascending scans.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        state: Mutex<State>,
        fail_delete_on: Option<usize>,
        fail_insert_on: Option<usize>,
    }

    impl MemoryStore {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Makes the `call`-th (1-based) delete_batch call fail instead of
        /// committing.
        pub(crate) fn with_delete_failure(mut self, call: usize) -> Self {
            self.fail_delete_on = Some(call);
            self
        }

        /// Makes the `call`-th (1-based) insert call fail instead of
        /// writing.
        pub(crate) fn with_insert_failure(mut self, call: usize) -> Self {
            self.fail_insert_on = Some(call);
            self
        }

        /// Preloads `count` empty-bodied documents into `collection`.
        pub(crate) fn preload(&self, collection: &str, count: usize) {
            let mut state = self.state.lock().unwrap();
            for _ in 0..count {
                let name = next_name(&mut state, collection);
                state
                    .collections
                    .entry(collection.to_string())
                    .or_default()
                    .insert(name, BTreeMap::new());
            }
        }

        pub(crate) fn fetches(&self) -> usize {
            self.state.lock().unwrap().fetches
        }

        pub(crate) fn delete_calls(&self) -> usize {
            self.state.lock().unwrap().delete_calls
        }

        pub(crate) fn documents(&self, collection: &str) -> Vec<Document> {
            let state = self.state.lock().unwrap();
            state
                .collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(name, fields)| Document {
                            name: name.clone(),
                            fields: fields.clone(),
                            create_time: None,
                            update_time: None,
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    fn next_name(state: &mut State, collection: &str) -> String {
        let id = state.next_id;
        state.next_id += 1;
        format!("projects/demo/databases/(default)/documents/{collection}/doc{id:05}")
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn query_page(
            &self,
            collection: &str,
            _order_by: &str,
            limit: usize,
        ) -> Result<Vec<Document>> {
            let mut state = self.state.lock().unwrap();
            state.fetches += 1;
            let page = state
                .collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .take(limit)
                        .map(|(name, fields)| Document {
                            name: name.clone(),
                            fields: fields.clone(),
                            create_time: None,
                            update_time: None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(page)
        }

        async fn delete_batch(&self, names: &[String]) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.delete_calls += 1;
            if self.fail_delete_on == Some(state.delete_calls) {
                bail!("injected delete failure on call {}", state.delete_calls);
            }
            for name in names {
                for docs in state.collections.values_mut() {
                    docs.remove(name);
                }
            }
            Ok(())
        }

        async fn insert(
            &self,
            collection: &str,
            fields: BTreeMap<String, Value>,
        ) -> Result<String> {
            let mut state = self.state.lock().unwrap();
            state.insert_calls += 1;
            if self.fail_insert_on == Some(state.insert_calls) {
                bail!("injected insert failure on call {}", state.insert_calls);
            }
            let name = next_name(&mut state, collection);
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(name.clone(), fields);
            Ok(name)
        }

        async fn count(&self, collection: &str) -> Result<u64> {
            let state = self.state.lock().unwrap();
            Ok(state
                .collections
                .get(collection)
                .map(|docs| docs.len() as u64)
                .unwrap_or(0))
        }
    }
}

//! Batched deletion of whole collections.

use anyhow::{Context, Result};
use tracing::info;

use crate::store::DocumentStore;

/// Documents fetched and deleted per batch. Bounds both memory use and the
/// size of each atomic commit.
pub const PURGE_PAGE_SIZE: usize = 20;

/// Field the purge scan orders by: the document identifier itself.
pub const ORDER_BY_DOC_ID: &str = "__name__";

/// Totals accumulated over one purge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Documents removed from the collection.
    pub documents_deleted: usize,
    /// Delete batches committed.
    pub batches_committed: usize,
}

/// Deletes every document in `collection`, one bounded page at a time.
///
/// Each pass fetches up to `page_size` documents ordered ascending by
/// document identifier, deletes the whole page as one atomic batch, and
/// re-queries. Deleted documents no longer satisfy the ordered query, so
/// the scan needs no cursor; an empty page means the collection is empty.
///
/// Any fetch or delete error aborts the run immediately. Batches already
/// committed stay deleted; the failed page and everything after it remain.
pub async fn purge_collection<S>(
    store: &S,
    collection: &str,
    page_size: usize,
) -> Result<PurgeStats>
where
    S: DocumentStore + ?Sized,
{
    anyhow::ensure!(page_size >= 1, "page size must be at least 1");
    let mut stats = PurgeStats::default();
    loop {
        let page = store
            .query_page(collection, ORDER_BY_DOC_ID, page_size)
            .await
            .with_context(|| format!("failed to fetch a page from '{collection}'"))?;
        if page.is_empty() {
            return Ok(stats);
        }
        let names: Vec<String> = page.into_iter().map(|doc| doc.name).collect();
        store
            .delete_batch(&names)
            .await
            .with_context(|| format!("failed to delete a batch from '{collection}'"))?;
        stats.documents_deleted += names.len();
        stats.batches_committed += 1;
        info!(
            collection,
            batch = names.len(),
            total = stats.documents_deleted,
            "committed delete batch"
        );
    }
}

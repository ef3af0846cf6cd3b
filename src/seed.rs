//! Starter records inserted into the snippets collection.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::debug;

use crate::model::Value;
use crate::store::DocumentStore;

/// One starter record inserted by the seed routine.
#[derive(Debug, Clone, Copy)]
pub struct SeedRecord {
    /// Snippet body.
    pub text: &'static str,
    /// Topic labels, in display order.
    pub labels: &'static [&'static str],
}

/// The fixed demonstration snippets. Inserted as-is on every run; the
/// routine never deduplicates against existing documents.
pub const SEED_SNIPPETS: &[SeedRecord] = &[
    SeedRecord {
        text: "When writing Python code, always adhere to the PEP 8 style guide. This includes using 4 spaces for indentation, limiting lines to 79 characters, and using snake_case for variable and function names. Consistent styling makes code more readable and maintainable.",
        labels: &["python", "pep8", "style-guide", "coding-conventions"],
    },
    SeedRecord {
        text: "For JavaScript projects, use Prettier to automatically format your code. This eliminates debates about style and ensures consistency across the entire codebase. Configure it to run on save and as a pre-commit hook.",
        labels: &["javascript", "prettier", "code-formatting", "tooling"],
    },
    SeedRecord {
        text: "In React, prefer functional components and hooks over class-based components. Functional components are more concise, easier to test, and align better with the modern React paradigm. Use the `useState` and `useEffect` hooks for state and side effects.",
        labels: &["react", "javascript", "functional-components", "hooks"],
    },
    SeedRecord {
        text: "When designing a REST API, use clear and consistent naming conventions for your endpoints. Use plural nouns for resource collections (e.g., `/users`, `/products`) and standard HTTP methods (GET, POST, PUT, DELETE) for operations.",
        labels: &["rest-api", "api-design", "best-practices"],
    },
    SeedRecord {
        text: "Always include a `.gitignore` file in your Git repositories. This file tells Git which files and directories to ignore, such as `node_modules`, build artifacts, and environment-specific files. This keeps your repository clean and focused on the source code.",
        labels: &["git", "version-control", "gitignore"],
    },
];

/// Inserts every seed record into `collection`, stamping `created_at` at
/// the moment of each insert and zeroing both feedback counters.
///
/// Inserts run sequentially; the first failure aborts the rest. Returns the
/// number of records inserted.
pub async fn seed_snippets<S>(store: &S, collection: &str) -> Result<usize>
where
    S: DocumentStore + ?Sized,
{
    for (idx, record) in SEED_SNIPPETS.iter().enumerate() {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Value::string(record.text));
        fields.insert(
            "labels".to_string(),
            Value::string_array(record.labels.iter().copied()),
        );
        fields.insert("created_at".to_string(), Value::timestamp(Utc::now()));
        fields.insert("thumbs_up".to_string(), Value::integer(0));
        fields.insert("thumbs_down".to_string(), Value::integer(0));
        let name = store.insert(collection, fields).await.with_context(|| {
            format!(
                "failed to insert seed snippet {} of {}",
                idx + 1,
                SEED_SNIPPETS.len()
            )
        })?;
        debug!(name = %name, "inserted seed snippet");
    }
    Ok(SEED_SNIPPETS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "current_thread")]
    async fn one_run_inserts_five_zeroed_snippets() {
        let store = MemoryStore::new();
        let started = Utc::now();

        let inserted = seed_snippets(&store, "snippets").await.expect("seed succeeds");
        let finished = Utc::now();

        assert_eq!(inserted, 5);
        assert_eq!(store.count("snippets").await.unwrap(), 5);
        for doc in store.documents("snippets") {
            assert_eq!(doc.field("thumbs_up").and_then(Value::as_integer), Some(0));
            assert_eq!(doc.field("thumbs_down").and_then(Value::as_integer), Some(0));
            let created_at = doc
                .field("created_at")
                .and_then(Value::as_timestamp)
                .expect("created_at present");
            assert!(created_at >= started && created_at <= finished);
            let text = doc.field("text").and_then(Value::as_str).expect("text present");
            let record = SEED_SNIPPETS
                .iter()
                .find(|record| record.text == text)
                .expect("text matches a seed record");
            let labels: Vec<&str> = doc
                .field("labels")
                .and_then(Value::as_array)
                .expect("labels present")
                .iter()
                .filter_map(Value::as_str)
                .collect();
            assert_eq!(labels, record.labels);
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn second_run_duplicates_every_record() {
        let store = MemoryStore::new();

        seed_snippets(&store, "snippets").await.expect("first run");
        seed_snippets(&store, "snippets").await.expect("second run");

        let docs = store.documents("snippets");
        assert_eq!(docs.len(), 10);
        // Content duplicates, identifiers never do.
        for record in SEED_SNIPPETS {
            let copies = docs
                .iter()
                .filter(|doc| doc.field("text").and_then(Value::as_str) == Some(record.text))
                .count();
            assert_eq!(copies, 2, "{:?}", &record.text[..30]);
        }
        let mut names: Vec<&str> = docs.iter().map(|doc| doc.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn insert_failure_aborts_remaining_records() {
        let store = MemoryStore::new().with_insert_failure(3);

        let err = seed_snippets(&store, "snippets")
            .await
            .expect_err("third insert fails");

        assert!(err.to_string().contains("seed snippet 3 of 5"));
        assert_eq!(store.count("snippets").await.unwrap(), 2);
    }
}

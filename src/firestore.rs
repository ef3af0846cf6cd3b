//! Firestore REST client for the maintenance tools.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::WebAppConfig;
use crate::model::{Document, Value};
use crate::store::DocumentStore;

/// Production endpoint of the Firestore REST API.
pub const DEFAULT_FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

/// Async client for one project's default Firestore database.
///
/// Admin mode attaches a bearer token to every request; client mode appends
/// the web API key as a query parameter. Each maintenance binary builds its
/// own client and drops it on exit.
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
}

impl FirestoreClient {
    /// Builds an admin-mode client from a resolved bearer token.
    pub fn admin<B, P>(
        base_url: B,
        project_id: P,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self>
    where
        B: Into<String>,
        P: Into<String>,
    {
        let project_id = project_id.into();
        anyhow::ensure!(!project_id.trim().is_empty(), "missing project id");
        anyhow::ensure!(
            !access_token.trim().is_empty(),
            "missing Firestore access token"
        );
        let mut headers = default_headers();
        let bearer = format!("Bearer {}", access_token.trim());
        let mut auth =
            HeaderValue::from_str(&bearer).context("invalid Firestore access token")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        Ok(Self {
            http: build_http(headers, timeout)?,
            base_url: check_base_url(base_url.into())?,
            project_id,
            api_key: None,
        })
    }

    /// Builds a client-mode client from the web app config bundle.
    pub fn with_web_config<B>(
        base_url: B,
        config: &WebAppConfig,
        timeout: Duration,
    ) -> Result<Self>
    where
        B: Into<String>,
    {
        anyhow::ensure!(!config.api_key.trim().is_empty(), "missing web API key");
        anyhow::ensure!(!config.project_id.trim().is_empty(), "missing project id");
        Ok(Self {
            http: build_http(default_headers(), timeout)?,
            base_url: check_base_url(base_url.into())?,
            project_id: config.project_id.clone(),
            api_key: Some(config.api_key.trim().to_string()),
        })
    }

    /// Resource prefix of the default database's documents.
    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    /// POSTs `body` to `url` and returns the response, turning any non-2xx
    /// status into an error carrying status and body.
    async fn post_json<T: Serialize>(
        &self,
        url: String,
        body: &T,
        what: &str,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        let resp = request
            .send()
            .await
            .with_context(|| format!("failed to call Firestore {what}"))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        anyhow::bail!("Firestore {what} failed ({status}): {body}");
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn build_http(headers: HeaderMap, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .context("failed to build Firestore HTTP client")
}

fn check_base_url(base_url: String) -> Result<String> {
    anyhow::ensure!(
        base_url.starts_with("http://") || base_url.starts_with("https://"),
        "Firestore base URL must be an http(s) URL"
    );
    Ok(base_url.trim_end_matches('/').to_string())
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn query_page(
        &self,
        collection: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        // Cursor-less scan: every page re-queries from the head of the
        // remaining documents. Deleted documents drop out of the ordered
        // result set, so the query body never carries an offset or cursor.
        let body = RunQueryRequest {
            structured_query: StructuredQuery {
                from: [CollectionSelector {
                    collection_id: collection,
                }],
                order_by: [Order {
                    field: FieldReference {
                        field_path: order_by,
                    },
                    direction: "ASCENDING",
                }],
                limit,
            },
        };
        let resp = self
            .post_json(format!("{}:runQuery", self.documents_root()), &body, "runQuery")
            .await?;
        // An empty result still yields one row carrying only a readTime.
        let rows: Vec<RunQueryRow> = resp
            .json()
            .await
            .context("failed to parse Firestore runQuery response")?;
        Ok(rows.into_iter().filter_map(|row| row.document).collect())
    }

    async fn delete_batch(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let body = CommitRequest {
            writes: names
                .iter()
                .map(|name| DeleteWrite { delete: name })
                .collect(),
        };
        self.post_json(format!("{}:commit", self.documents_root()), &body, "commit")
            .await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: BTreeMap<String, Value>) -> Result<String> {
        let body = CreateDocumentRequest { fields };
        let resp = self
            .post_json(
                format!("{}/{}", self.documents_root(), collection),
                &body,
                "createDocument",
            )
            .await?;
        let document: Document = resp
            .json()
            .await
            .context("failed to parse Firestore createDocument response")?;
        Ok(document.name)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let body = AggregationRequest {
            structured_aggregation_query: StructuredAggregationQuery {
                structured_query: AggregationScope {
                    from: [CollectionSelector {
                        collection_id: collection,
                    }],
                },
                aggregations: [Aggregation {
                    alias: "total",
                    count: CountAggregation {},
                }],
            },
        };
        let resp = self
            .post_json(
                format!("{}:runAggregationQuery", self.documents_root()),
                &body,
                "runAggregationQuery",
            )
            .await?;
        let rows: Vec<AggregationRow> = resp
            .json()
            .await
            .context("failed to parse Firestore aggregation response")?;
        let total = rows
            .into_iter()
            .find_map(|row| row.result)
            .and_then(|result| {
                result
                    .aggregate_fields
                    .get("total")
                    .and_then(Value::as_integer)
            })
            .ok_or_else(|| anyhow!("Firestore aggregation response missing the total count"))?;
        anyhow::ensure!(total >= 0, "Firestore returned a negative count: {total}");
        Ok(total as u64)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery<'a> {
    from: [CollectionSelector<'a>; 1],
    order_by: [Order<'a>; 1],
    limit: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
}

#[derive(Serialize)]
struct Order<'a> {
    field: FieldReference<'a>,
    direction: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference<'a> {
    field_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    writes: Vec<DeleteWrite<'a>>,
}

#[derive(Serialize)]
struct DeleteWrite<'a> {
    delete: &'a str,
}

#[derive(Serialize)]
struct CreateDocumentRequest {
    fields: BTreeMap<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregationRequest<'a> {
    structured_aggregation_query: StructuredAggregationQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredAggregationQuery<'a> {
    structured_query: AggregationScope<'a>,
    aggregations: [Aggregation<'a>; 1],
}

#[derive(Serialize)]
struct AggregationScope<'a> {
    from: [CollectionSelector<'a>; 1],
}

#[derive(Serialize)]
struct Aggregation<'a> {
    alias: &'a str,
    count: CountAggregation,
}

#[derive(Serialize)]
struct CountAggregation {}

#[derive(Debug, Deserialize)]
struct AggregationRow {
    #[serde(default)]
    result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResult {
    #[serde(default)]
    aggregate_fields: BTreeMap<String, Value>,
}

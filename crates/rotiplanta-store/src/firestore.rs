//! Firestore REST client for exact-match queries.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use rotiplanta_core::{Error, Result, StoreConfig};
use rotiplanta_text::UserProfile;

use crate::value::decode_fields;
use crate::ProfileStore;

const EMAIL_FIELD: &str = "email";

/// Client for one collection of a Firestore database.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    collection: String,
    access_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            collection: config.collection.clone(),
            access_token: config.access_token.clone(),
        }
    }

    fn run_query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents:runQuery",
            self.base_url, self.project_id
        )
    }

    /// Documents whose `field` equals `value`, at most `limit` of them.
    pub async fn query_eq(
        &self,
        field: &str,
        value: &str,
        limit: u32,
    ) -> Result<Vec<Map<String, Value>>> {
        let body = equality_query(&self.collection, field, value, limit);
        debug!("Querying {} where {} == {}", self.collection, field, value);

        let mut request = self.client.post(self.run_query_url()).json(&body);
        if let Some(token) = &self.access_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Store(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Firestore query failed with {}: {}", status, text);
            return Err(Error::Store(format!("API error {}: {}", status, text)));
        }

        let results: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Invalid query response: {}", e)))?;
        Ok(documents_from_results(&results))
    }
}

/// `runQuery` body for `field == value` in `collection`.
pub fn equality_query(collection: &str, field: &str, value: &str, limit: u32) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": { "stringValue": value }
                }
            },
            "limit": limit
        }
    })
}

/// Entries without a `document` (the read-time marker of an empty result)
/// are skipped.
fn documents_from_results(results: &[Value]) -> Vec<Map<String, Value>> {
    results
        .iter()
        .filter_map(|entry| entry.get("document"))
        .map(|document| {
            document
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default()
        })
        .collect()
}

#[async_trait]
impl ProfileStore for FirestoreClient {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let profile = self
            .query_eq(EMAIL_FIELD, email, 1)
            .await?
            .into_iter()
            .next()
            .map(UserProfile::from);
        info!(
            "Profile lookup for {}: {}",
            email,
            if profile.is_some() { "found" } else { "not found" }
        );
        Ok(profile)
    }
}

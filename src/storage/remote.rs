use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value as JsonValue;
use url::Url;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::adapter::{
    apply_changes, matches_filter, matches_scope, stamp_new, EntityKind, Filter, Scope,
    StorageAdapter,
};

/// Remote document-store backend over a REST API. The store only supports
/// equality filters on top-level fields, so date ranges and substring
/// search are applied in memory after a broader equality fetch. Document
/// ids are generated client-side so the stored record is complete without
/// depending on the server's response shape.
pub struct RemoteDocAdapter {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RemoteDocAdapter {
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap();
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn collection_url(&self, kind: EntityKind) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("remote base url can hold a path")
            .pop_if_empty()
            .push(kind.collection());
        url
    }

    fn document_url(&self, kind: EntityKind, id: &str) -> Url {
        let mut url = self.collection_url(kind);
        url.path_segments_mut()
            .expect("remote base url can hold a path")
            .push(id);
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn fetch_document(
        &self,
        kind: EntityKind,
        id: &str,
        scope: Option<&Scope>,
    ) -> Result<Option<JsonValue>> {
        let response = self
            .request(Method::GET, self.document_url(kind, id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: JsonValue = response.error_for_status()?.json().await?;
        if !matches_scope(&document, scope) {
            return Ok(None);
        }
        Ok(Some(document))
    }
}

/// Renders an equality value as a query parameter the document store can
/// match on.
fn equality_param(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl StorageAdapter for RemoteDocAdapter {
    async fn initialize(&self) -> Result<()> {
        // Document stores need no schema; a ping verifies reachability.
        self.request(Method::GET, self.base_url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn insert(&self, kind: EntityKind, record: JsonValue) -> Result<JsonValue> {
        let mut record = record;
        stamp_new(&mut record, Uuid::new_v4().to_string())?;
        self.request(Method::POST, self.collection_url(kind))
            .json(&record)
            .send()
            .await?
            .error_for_status()?;
        Ok(record)
    }

    async fn get_by_id<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>> {
        self.fetch_document(kind, id, scope).await
    }

    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<JsonValue>> {
        let mut url = self.collection_url(kind);
        for (field, value) in &filter.equals {
            url.query_pairs_mut().append_pair(field, &equality_param(value));
        }
        let mut documents: Vec<JsonValue> = self
            .request(Method::GET, url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        // The equality pushdown is an optimization, not a guarantee; the
        // full filter is re-evaluated here.
        documents.retain(|document| matches_filter(document, filter));
        Ok(documents)
    }

    async fn update<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        changes: JsonValue,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>> {
        let Some(mut document) = self.fetch_document(kind, id, scope).await? else {
            return Ok(None);
        };
        apply_changes(&mut document, &changes)?;
        self.request(Method::PUT, self.document_url(kind, id))
            .json(&document)
            .send()
            .await?
            .error_for_status()?;
        Ok(Some(document))
    }

    async fn delete<'a>(&self, kind: EntityKind, id: &str, scope: Option<&'a Scope>) -> Result<bool> {
        if self.fetch_document(kind, id, scope).await?.is_none() {
            return Ok(false);
        }
        let response = self
            .request(Method::DELETE, self.document_url(kind, id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        Ok(true)
    }
}

//! Items HTTP API - the mutation collaborator.
//!
//! Creates and deletes go straight to the backend; their effect on the local
//! collection arrives later as a socket notification.

use futures::future::BoxFuture;
use futures::FutureExt;
use plank_engine::{NewRecord, Record, RecordId};

use crate::error::MutationError;

/// Calls against `{api_base_url}/api/items`.
pub trait ItemsApi: Send + Sync {
    /// `GET /api/items`: the full listing, newest first.
    fn list(&self) -> BoxFuture<'_, Result<Vec<Record>, MutationError>>;

    /// `POST /api/items`
    fn create(&self, item: NewRecord) -> BoxFuture<'_, Result<(), MutationError>>;

    /// `DELETE /api/items/{id}`
    fn delete(&self, id: RecordId) -> BoxFuture<'_, Result<(), MutationError>>;
}

/// [`ItemsApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpItemsApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpItemsApi {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base_url)
    }

    pub fn with_client(http: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/api/items", self.base_url)
    }

    fn item_url(&self, id: RecordId) -> String {
        format!("{}/api/items/{}", self.base_url, id)
    }
}

/// Map a non-2xx response to [`MutationError::Status`], keeping its body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, MutationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MutationError::Status {
        status: status.as_u16(),
        body,
    })
}

impl ItemsApi for HttpItemsApi {
    fn list(&self) -> BoxFuture<'_, Result<Vec<Record>, MutationError>> {
        async move {
            let response = self.http.get(self.items_url()).send().await?;
            let items: Vec<Record> = ensure_success(response).await?.json().await?;
            Ok::<_, MutationError>(items)
        }
        .boxed()
    }

    fn create(&self, item: NewRecord) -> BoxFuture<'_, Result<(), MutationError>> {
        async move {
            let response = self.http.post(self.items_url()).json(&item).send().await?;
            ensure_success(response).await?;
            Ok::<_, MutationError>(())
        }
        .boxed()
    }

    fn delete(&self, id: RecordId) -> BoxFuture<'_, Result<(), MutationError>> {
        async move {
            let response = self.http.delete(self.item_url(id)).send().await?;
            ensure_success(response).await?;
            Ok::<_, MutationError>(())
        }
        .boxed()
    }
}

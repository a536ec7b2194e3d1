use serde_json::json;

use crate::error::InkpadError;
use crate::pipeline::{ApiClient, ApiRequest};

/// Recycle bin: deleted notes and files until they are restored or purged.
pub struct RecycleApi<'a> {
    client: &'a ApiClient,
}

impl<'a> RecycleApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn items(&self) -> Result<serde_json::Value, InkpadError> {
        self.client.get("/recycle/items").await
    }

    pub async fn restore(&self, ids: &[String]) -> Result<serde_json::Value, InkpadError> {
        let request = ApiRequest::post("/recycle/restore").json(&json!({ "ids": ids }))?;
        self.client.send(request).await
    }

    /// Delete items for good. The ids travel in the body of the DELETE.
    pub async fn purge(&self, ids: &[String]) -> Result<serde_json::Value, InkpadError> {
        if ids.is_empty() {
            return Err(InkpadError::InvalidRequest("No items to purge".into()));
        }
        let request = ApiRequest::delete("/recycle/permanent").json(&json!({ "ids": ids }))?;
        self.client.send(request).await
    }
}

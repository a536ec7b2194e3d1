use serde_json::json;

use crate::error::InkpadError;
use crate::pipeline::{ApiClient, ApiRequest};

use super::types::{ListQuery, Listing, Note, NoteDraft, NotePatch};

pub struct NotesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> NotesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, draft: &NoteDraft) -> Result<Note, InkpadError> {
        self.client.send_as(ApiRequest::post("/notes/").json(draft)?).await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Note>, InkpadError> {
        let listing: Listing<Note> = self
            .client
            .send_as(query.apply(ApiRequest::get("/notes/")))
            .await?;
        Ok(listing.into_vec())
    }

    pub async fn get(&self, id: &str) -> Result<Note, InkpadError> {
        self.client.send_as(ApiRequest::get(note_path(id))).await
    }

    pub async fn update(&self, id: &str, patch: &NotePatch) -> Result<Note, InkpadError> {
        if patch.is_empty() {
            return Err(InkpadError::InvalidRequest(
                "Nothing to update: give a title or content".into(),
            ));
        }
        self.client
            .send_as(ApiRequest::put(note_path(id)).json(patch)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<serde_json::Value, InkpadError> {
        self.client.send(ApiRequest::delete(note_path(id))).await
    }

    /// Link uploaded files to a note.
    pub async fn attach(
        &self,
        id: &str,
        file_ids: &[String],
    ) -> Result<serde_json::Value, InkpadError> {
        self.link(id, "attach", file_ids).await
    }

    pub async fn detach(
        &self,
        id: &str,
        file_ids: &[String],
    ) -> Result<serde_json::Value, InkpadError> {
        self.link(id, "detach", file_ids).await
    }

    async fn link(
        &self,
        id: &str,
        action: &str,
        file_ids: &[String],
    ) -> Result<serde_json::Value, InkpadError> {
        if file_ids.is_empty() {
            return Err(InkpadError::InvalidRequest(format!(
                "No file ids given to {action}"
            )));
        }
        let request = ApiRequest::post(format!("{}/{action}", note_path(id))).json(&json!(file_ids))?;
        self.client.send(request).await
    }
}

fn note_path(id: &str) -> String {
    format!("/notes/{}", id.trim_matches('/'))
}

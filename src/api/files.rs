use std::path::Path;

use crate::error::InkpadError;
use crate::pipeline::{ApiClient, ApiRequest, UploadPart};

use super::types::ListQuery;

/// Multipart field the upload endpoint reads files from.
pub const UPLOAD_FIELD: &str = "file";

pub struct FilesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> FilesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn upload(&self, parts: Vec<UploadPart>) -> Result<serde_json::Value, InkpadError> {
        if parts.is_empty() {
            return Err(InkpadError::InvalidRequest("No files to upload".into()));
        }
        self.client
            .send(ApiRequest::post("/files/").multipart(parts))
            .await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<serde_json::Value, InkpadError> {
        self.client
            .send(query.apply(ApiRequest::get("/files/")))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<serde_json::Value, InkpadError> {
        self.client
            .send(ApiRequest::delete(format!("/files/{}", id.trim_matches('/'))))
            .await
    }
}

/// Read a file from disk into an upload part named after the file.
pub async fn part_from_path(path: &Path) -> Result<UploadPart, InkpadError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| InkpadError::InvalidRequest(format!("Not a file: {}", path.display())))?;
    Ok(UploadPart {
        field: UPLOAD_FIELD.to_string(),
        mime: guess_mime(&file_name).map(str::to_string),
        file_name,
        bytes,
    })
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    Some(match ext.as_str() {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => return None,
    })
}

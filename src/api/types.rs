use serde::{Deserialize, Deserializer, Serialize};

use crate::pipeline::ApiRequest;

/// A note as returned by the service.
///
/// Timestamps are kept as the server sends them; the service emits naive
/// datetimes without an offset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

/// Partial update; unset fields are left alone by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Listing parameters shared by notes and files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Append the set parameters to a request's query string.
    pub fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.query("page", page);
        }
        if let Some(size) = self.size {
            request = request.query("size", size);
        }
        if let Some(search) = &self.search {
            request = request.query("search", search);
        }
        request
    }
}

/// List endpoints answer either a bare array or `{"items": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Plain(Vec<T>),
    Paged { items: Vec<T> },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Plain(items) | Listing::Paged { items } => items,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

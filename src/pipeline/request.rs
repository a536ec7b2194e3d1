use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

use crate::error::InkpadError;

/// Everything needed to (re)issue one HTTP call.
///
/// Paths are relative to the API root (`/notes/1`, `/auth/login`); the
/// transport owns the base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub id: Uuid,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<UploadPart>),
}

/// One file in a multipart upload. Bytes are owned so the request can be replayed.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, InkpadError> {
        let value = serde_json::to_value(body).map_err(|e| {
            InkpadError::InvalidRequest(format!("Cannot serialize request body: {e}"))
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    #[must_use]
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<UploadPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a header, case-insensitive on the name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }
}

/// A response as reported by the transport, before classification.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed JSON body. Empty bodies are `Null`; non-JSON bodies are a string.
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body rendered back to text for error messages.
    pub fn body_text(&self) -> String {
        match &self.body {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A request threaded through the pipeline together with its retry flag.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub request: ApiRequest,
    pub retried: bool,
}

impl Attempt {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }

    /// The same request, marked as already retried once.
    pub fn into_retry(self) -> Self {
        Self {
            request: self.request,
            retried: true,
        }
    }
}

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::InkpadError;
use crate::pipeline::{ApiRequest, ApiResponse, RequestBody};
use crate::transport::Transport;

/// reqwest-backed transport.
///
/// Request paths are appended to `root_url` (`https://host/api/v1`). The
/// client keeps a cookie jar so a refresh endpoint that relies on an
/// HTTP-only cookie works across calls.
pub struct HttpTransport {
    client: reqwest::Client,
    root_url: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("root_url", &self.root_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// Rejects cleartext `http://` URLs unless `allow_http` is `true` or the
    /// host is a loopback address.
    pub fn new(
        root_url: &str,
        headers: &HashMap<String, String>,
        allow_http: bool,
        timeout: Duration,
    ) -> Result<Self, InkpadError> {
        let url = reqwest::Url::parse(root_url)
            .map_err(|e| connect_error(format!("Invalid URL '{root_url}': {e}")))?;

        match url.scheme() {
            "https" => {}
            "http" if allow_http || is_loopback(&url) => {}
            "http" => {
                return Err(connect_error(format!(
                    "Cleartext HTTP is not allowed for '{root_url}'. \
                     Use https:// or set allowHttp in the config."
                )));
            }
            scheme => {
                return Err(connect_error(format!(
                    "Unsupported URL scheme '{scheme}' in '{root_url}'"
                )));
            }
        }

        let mut header_map = HeaderMap::new();
        header_map.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| connect_error(format!("Invalid header name '{key}': {e}")))?;
            let val = HeaderValue::from_str(value)
                .map_err(|e| connect_error(format!("Invalid header value for '{key}': {e}")))?;
            header_map.insert(name, val);
        }

        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| InkpadError::Transport(Box::new(e)))?;

        Ok(Self {
            client,
            root_url: root_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Absolute URL for a request: root + path, then the query pairs.
    pub fn url_for(&self, request: &ApiRequest) -> Result<reqwest::Url, InkpadError> {
        let joined = if request.path.starts_with('/') {
            format!("{}{}", self.root_url, request.path)
        } else {
            format!("{}/{}", self.root_url, request.path)
        };
        let mut url = reqwest::Url::parse(&joined).map_err(|e| {
            InkpadError::InvalidRequest(format!("Invalid request path '{}': {e}", request.path))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    fn build(&self, request: &ApiRequest) -> Result<reqwest::RequestBuilder, InkpadError> {
        let url = self.url_for(request)?;
        let mut http_req = self
            .client
            .request(request.method.clone(), url)
            .header("X-Request-Id", request.id.to_string());

        for (name, value) in &request.headers {
            http_req = http_req.header(name.as_str(), value.as_str());
        }

        http_req = match &request.body {
            RequestBody::Empty => http_req,
            RequestBody::Json(value) => http_req.json(value),
            RequestBody::Form(fields) => http_req.form(fields),
            RequestBody::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for part in parts {
                    let mut file = reqwest::multipart::Part::bytes(part.bytes.clone())
                        .file_name(part.file_name.clone());
                    if let Some(mime) = &part.mime {
                        file = file.mime_str(mime).map_err(|e| {
                            InkpadError::InvalidRequest(format!(
                                "Invalid content type '{mime}' for {}: {e}",
                                part.file_name
                            ))
                        })?;
                    }
                    form = form.part(part.field.clone(), file);
                }
                http_req.multipart(form)
            }
        };
        Ok(http_req)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, InkpadError> {
        let response = self
            .build(request)?
            .send()
            .await
            .map_err(|e| InkpadError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| InkpadError::Transport(Box::new(e)))?;

        tracing::debug!(request_id = %request.id, status, path = %request.path, "Response received");

        Ok(ApiResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }
}

/// Empty bodies become `null`; anything that is not JSON is kept as a string.
fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

fn is_loopback(url: &reqwest::Url) -> bool {
    let host = url.host_str().unwrap_or_default();
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

fn connect_error(message: String) -> InkpadError {
    InkpadError::Transport(message.into())
}

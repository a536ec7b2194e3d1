use super::request::ApiRequest;

/// Endpoints that never carry a bearer token and never trigger a refresh.
#[derive(Debug, Clone)]
pub struct NoAuthPaths {
    paths: Vec<String>,
}

impl NoAuthPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for p in paths {
            let p = normalize(p.as_ref());
            if p != "/" && !normalized.contains(&p) {
                normalized.push(p);
            }
        }
        Self { paths: normalized }
    }

    /// Whether a request path hits one of the no-auth endpoints.
    ///
    /// Query strings, fragments and a trailing slash are ignored. A match is
    /// either the whole path or a suffix that starts on a segment boundary, so
    /// `/v1/auth/login?next=/` matches `/auth/login` but `/auth/login-history`
    /// does not.
    pub fn matches(&self, request_path: &str) -> bool {
        let path = normalize(request_path);
        // Every stored path starts with '/', so a suffix match is always
        // aligned to a segment.
        self.paths.iter().any(|p| path.ends_with(p.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

/// Strip query and fragment, drop trailing slashes, force a leading slash.
fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Decides per request whether to attach the credential.
#[derive(Debug, Clone)]
pub struct OutboundStage {
    no_auth: NoAuthPaths,
}

impl OutboundStage {
    pub fn new(no_auth: NoAuthPaths) -> Self {
        Self { no_auth }
    }

    pub fn no_auth(&self) -> &NoAuthPaths {
        &self.no_auth
    }

    /// Attach `Authorization: Bearer <token>` unless the path is a no-auth
    /// endpoint or no token is held.
    pub fn decorate(&self, mut request: ApiRequest, token: Option<&str>) -> ApiRequest {
        if self.no_auth.matches(&request.path) {
            return request;
        }
        if let Some(token) = token {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        request
    }
}

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineSettings;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// One `inkpad.json` as written on disk. Every field is optional so that
/// several files can be layered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub allow_http: Option<bool>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSection {
    #[serde(default)]
    pub login_path: Option<String>,
    #[serde(default)]
    pub register_path: Option<String>,
    #[serde(default)]
    pub refresh_path: Option<String>,
    #[serde(default)]
    pub logout_path: Option<String>,
    #[serde(default)]
    pub no_auth_paths: Option<Vec<String>>,
    #[serde(default)]
    pub token_field: Option<String>,
    #[serde(default)]
    pub expired_statuses: Option<Vec<u16>>,
}

impl ConfigFile {
    /// Fill every field this file leaves unset from `lower`.
    /// Fields already set here are kept (earlier sources win).
    pub fn merge_from(&mut self, lower: ConfigFile) {
        fill(&mut self.base_url, lower.base_url);
        fill(&mut self.api_version, lower.api_version);
        fill(&mut self.allow_http, lower.allow_http);
        fill(&mut self.timeout_ms, lower.timeout_ms);
        for (name, value) in lower.headers {
            self.headers.entry(name).or_insert(value);
        }

        let auth = &mut self.auth;
        fill(&mut auth.login_path, lower.auth.login_path);
        fill(&mut auth.register_path, lower.auth.register_path);
        fill(&mut auth.refresh_path, lower.auth.refresh_path);
        fill(&mut auth.logout_path, lower.auth.logout_path);
        fill(&mut auth.no_auth_paths, lower.auth.no_auth_paths);
        fill(&mut auth.token_field, lower.auth.token_field);
        fill(&mut auth.expired_statuses, lower.auth.expired_statuses);
    }
}

fn fill<T>(slot: &mut Option<T>, lower: Option<T>) {
    if slot.is_none() {
        *slot = lower;
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InkpadConfig {
    pub base_url: String,
    pub api_version: String,
    pub allow_http: bool,
    pub timeout_ms: u64,
    pub headers: HashMap<String, String>,
    pub auth: AuthConfig,
    /// Files that contributed, highest precedence first.
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub login_path: String,
    pub register_path: String,
    pub refresh_path: String,
    pub logout_path: String,
    pub no_auth_paths: Vec<String>,
    pub token_field: String,
    pub expired_statuses: Vec<u16>,
}

impl Default for InkpadConfig {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

impl From<ConfigFile> for InkpadConfig {
    fn from(file: ConfigFile) -> Self {
        let auth = file.auth;
        Self {
            base_url: file.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: file
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            allow_http: file.allow_http.unwrap_or(false),
            timeout_ms: file.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            headers: file.headers,
            auth: AuthConfig {
                login_path: auth.login_path.unwrap_or_else(|| "/auth/login".into()),
                register_path: auth.register_path.unwrap_or_else(|| "/auth/register".into()),
                refresh_path: auth.refresh_path.unwrap_or_else(|| "/auth/refresh".into()),
                logout_path: auth.logout_path.unwrap_or_else(|| "/auth/logout".into()),
                no_auth_paths: auth.no_auth_paths.unwrap_or_default(),
                token_field: auth.token_field.unwrap_or_else(|| "access_token".into()),
                expired_statuses: auth.expired_statuses.unwrap_or_else(|| vec![401]),
            },
            sources: Vec::new(),
        }
    }
}

impl InkpadConfig {
    /// Base URL with the API version appended once: `http://host/api/v1`.
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        if version.is_empty() || base.ends_with(&format!("/{version}")) {
            base.to_string()
        } else {
            format!("{base}/{version}")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured no-auth paths plus the login, register and refresh endpoints.
    pub fn no_auth_paths(&self) -> Vec<String> {
        let mut paths = self.auth.no_auth_paths.clone();
        for p in [
            &self.auth.login_path,
            &self.auth.register_path,
            &self.auth.refresh_path,
        ] {
            if !paths.contains(p) {
                paths.push(p.clone());
            }
        }
        paths
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            no_auth_paths: self.no_auth_paths(),
            login_path: self.auth.login_path.clone(),
            register_path: self.auth.register_path.clone(),
            refresh_path: self.auth.refresh_path.clone(),
            logout_path: self.auth.logout_path.clone(),
            token_field: self.auth.token_field.clone(),
            expired_statuses: self.auth.expired_statuses.clone(),
        }
    }
}

pub mod http_mock;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use inkpad::config::InkpadConfig;
use inkpad::{ApiClient, MemoryStore, Runtime};

/// Config pointing at a mock server. `allowHttp` is unnecessary for loopback.
#[allow(dead_code)]
pub fn mock_config(server_uri: &str) -> InkpadConfig {
    InkpadConfig {
        base_url: format!("{server_uri}/api"),
        timeout_ms: 5_000,
        ..InkpadConfig::default()
    }
}

/// A client over the real HTTP transport with an in-memory store and a
/// counting navigator.
#[allow(dead_code)]
pub struct TestClient {
    pub runtime: Runtime,
    pub store: Arc<MemoryStore>,
    pub logins: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(server_uri: &str, token: Option<&str>) -> Self {
        let store = Arc::new(match token {
            Some(t) => MemoryStore::with_token(t),
            None => MemoryStore::new(),
        });
        let logins = Arc::new(AtomicUsize::new(0));
        let counter = logins.clone();
        let runtime = Runtime::with_config(
            mock_config(server_uri),
            store.clone(),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
        Self {
            runtime,
            store,
            logins,
        }
    }

    pub fn client(&self) -> &ApiClient {
        self.runtime.client()
    }

    pub fn login_redirects(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

/// Create a temp home directory with an `inkpad.json` pointing at `server_uri`.
#[allow(dead_code)]
pub fn temp_home(server_uri: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let config = serde_json::json!({
        "baseUrl": format!("{server_uri}/api"),
        "apiVersion": "v1",
        "timeoutMs": 5000
    });
    std::fs::write(
        config_path(dir.path()),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
    dir
}

#[allow(dead_code)]
pub fn config_path(home: &Path) -> PathBuf {
    home.join("inkpad.json")
}

#[allow(dead_code)]
pub fn credentials_path(home: &Path) -> PathBuf {
    home.join("credentials.json")
}

/// Seed a stored session as the CLI would have written it.
#[allow(dead_code)]
pub fn write_credentials(home: &Path, access_token: &str) {
    let json = serde_json::json!({
        "accessToken": access_token,
        "tokenType": "bearer",
        "savedAt": "2026-01-01T00:00:00Z"
    });
    std::fs::write(credentials_path(home), json.to_string()).unwrap();
}

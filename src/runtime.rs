use std::sync::Arc;

use crate::auth::{CredentialStore, FileStore, LoginPrompt, Navigator};
use crate::config::{credentials_path, load_config, InkpadConfig};
use crate::error::InkpadError;
use crate::pipeline::ApiClient;
use crate::transport::Transport;
use crate::transports::HttpTransport;

/// A configured client plus the config it was built from.
#[derive(Debug)]
pub struct Runtime {
    config: InkpadConfig,
    client: ApiClient,
}

impl Runtime {
    /// Load and merge all config sources, then build the HTTP client with a
    /// file-backed credential store and the terminal login prompt.
    pub fn from_config(cli_config: Option<&str>) -> Result<Self, InkpadError> {
        let config = load_config(cli_config)?;
        let store = Arc::new(FileStore::open(credentials_path()));
        Self::with_config(config, store, Arc::new(LoginPrompt))
    }

    /// Build a runtime over the HTTP transport from an existing config.
    pub fn with_config(
        config: InkpadConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, InkpadError> {
        let transport = HttpTransport::new(
            &config.api_root(),
            &config.headers,
            config.allow_http,
            config.timeout(),
        )?;
        Ok(Self::with_transport(config, Arc::new(transport), store, navigator))
    }

    /// Build a runtime over any transport.
    pub fn with_transport(
        config: InkpadConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let client = ApiClient::new(transport, store, navigator, config.pipeline_settings());
        tracing::debug!(root = %config.api_root(), "Runtime ready");
        Self { config, client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn config(&self) -> &InkpadConfig {
        &self.config
    }
}

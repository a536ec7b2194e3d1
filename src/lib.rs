pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod transport;
pub mod transports;

pub use auth::{CredentialStore, FileStore, LoginPrompt, MemoryStore, Navigator};
pub use config::{load_config, InkpadConfig};
pub use error::InkpadError;
pub use pipeline::{ApiClient, ApiRequest, ApiResponse, PipelineSettings};
pub use runtime::Runtime;
pub use transport::Transport;
pub use transports::HttpTransport;

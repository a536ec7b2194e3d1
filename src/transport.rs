use async_trait::async_trait;

use crate::error::InkpadError;
use crate::pipeline::{ApiRequest, ApiResponse};

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one HTTP call.
    ///
    /// Any status the server answers with is returned as a response; only
    /// failures to get an answer at all (DNS, connect, timeout, broken body)
    /// are errors.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, InkpadError>;
}

use crate::auth::TokenResponse;
use crate::error::InkpadError;
use crate::pipeline::{ApiClient, ApiRequest};

/// Account endpoints: register, login, refresh, logout.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<serde_json::Value, InkpadError> {
        let path = self.client.settings().register_path.clone();
        self.client
            .send(ApiRequest::post(path).form(&[("username", username), ("password", password)]))
            .await
    }

    /// Log in with a form post and keep the issued tokens in the store.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, InkpadError> {
        let settings = self.client.settings();
        let body = self
            .client
            .send(
                ApiRequest::post(settings.login_path.clone())
                    .form(&[("username", username), ("password", password)]),
            )
            .await?;
        let token = TokenResponse::from_body(&body, &settings.token_field)?;

        let store = self.client.store();
        store.set(&token.access_token);
        store.set_refresh_token(token.refresh_token.as_deref());
        tracing::info!(username, "Logged in");
        Ok(token)
    }

    /// Refresh the access token now. Returns the new token.
    pub async fn refresh(&self) -> Result<String, InkpadError> {
        self.client.refresh().await
    }

    /// Tell the server to end the session, then drop the local credential
    /// whatever the server said.
    pub async fn logout(&self) -> Result<(), InkpadError> {
        let path = self.client.settings().logout_path.clone();
        let result = self.client.send(ApiRequest::post(path)).await;
        self.client.store().clear();
        result.map(|_| ())
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.store().get().is_some()
    }
}

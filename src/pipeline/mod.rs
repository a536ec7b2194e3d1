//! Authenticated request pipeline.
//!
//! Every call goes through two stages around the transport:
//!
//! - **outbound**: attach `Authorization: Bearer <token>` unless the path is a
//!   no-auth endpoint (login, register, refresh)
//! - **inbound**: hand back the body on 2xx; on an expired-token status run a
//!   single-flight refresh and replay the request with the new token
//!
//! While one refresh is in flight, every other request that fails
//! authentication waits in a FIFO queue. When the refresh settles the queue is
//! drained in one step: on success the waiters are replayed in arrival order
//! (the request that triggered the refresh goes last), on failure the
//! credential is cleared, the navigator is sent to login once and every waiter
//! is rejected with the refresh error.

pub mod outbound;
pub mod refresh;
pub mod request;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use crate::auth::{CredentialStore, Navigator, TokenResponse};
use crate::error::InkpadError;
use crate::transport::Transport;

pub use outbound::{NoAuthPaths, OutboundStage};
pub use refresh::{Admission, Drained, PendingRequest, RefreshOutcome, RefreshState, RefreshStatus};
pub use request::{ApiRequest, ApiResponse, Attempt, RequestBody, UploadPart};

/// Knobs for the auth behavior of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Paths that never get a bearer token and never trigger a refresh.
    pub no_auth_paths: Vec<String>,
    pub login_path: String,
    pub register_path: String,
    pub refresh_path: String,
    pub logout_path: String,
    /// Field of the refresh response holding the new access token.
    pub token_field: String,
    /// Statuses that mean "access token expired or invalid".
    pub expired_statuses: Vec<u16>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            no_auth_paths: vec![
                "/auth/login".to_string(),
                "/auth/register".to_string(),
                "/auth/refresh".to_string(),
            ],
            login_path: "/auth/login".to_string(),
            register_path: "/auth/register".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            logout_path: "/auth/logout".to_string(),
            token_field: "access_token".to_string(),
            expired_statuses: vec![401],
        }
    }
}

/// Client for the service API. Cheap to clone; clones share the credential
/// store and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    outbound: OutboundStage,
    settings: PipelineSettings,
    state: Mutex<RefreshState>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("refresh_path", &self.inner.settings.refresh_path)
            .field("no_auth", &self.inner.outbound.no_auth())
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        settings: PipelineSettings,
    ) -> Self {
        // The refresh endpoint must never carry the (expired) bearer token.
        let no_auth = NoAuthPaths::new(
            settings
                .no_auth_paths
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(settings.refresh_path.as_str())),
        );
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                navigator,
                outbound: OutboundStage::new(no_auth),
                settings,
                state: Mutex::new(RefreshState::new()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.inner.settings
    }

    /// Whether a refresh call is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().is_refreshing()
    }

    /// Number of requests waiting for the in-flight refresh.
    pub fn queued(&self) -> usize {
        self.lock_state().queued()
    }

    /// Send a request and return the response body.
    pub async fn send(&self, request: ApiRequest) -> Result<serde_json::Value, InkpadError> {
        Ok(self.send_full(request).await?.body)
    }

    /// Send a request and deserialize the response body.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, InkpadError> {
        let path = request.path.clone();
        let body = self.send(request).await?;
        serde_json::from_value(body).map_err(|e| {
            InkpadError::ProtocolError(format!("Unexpected response from {path}: {e}"))
        })
    }

    /// Send a request and return the whole response, status and headers included.
    pub async fn send_full(&self, request: ApiRequest) -> Result<ApiResponse, InkpadError> {
        let attempt = Attempt::new(request);
        match self.dispatch(&attempt, None).await {
            Ok(response) => Ok(response),
            Err(err) if self.needs_refresh(&attempt, &err) => self.refresh_and_replay(attempt).await,
            Err(err) => Err(err),
        }
    }

    pub async fn get(&self, path: &str) -> Result<serde_json::Value, InkpadError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn delete(&self, path: &str) -> Result<serde_json::Value, InkpadError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Refresh the access token now and return the new one.
    ///
    /// Joins the refresh already in flight if there is one, so an explicit
    /// refresh never races the automatic one. A failed refresh clears the
    /// credential and navigates to login like any other refresh failure.
    pub async fn refresh(&self) -> Result<String, InkpadError> {
        let (watcher, rx) = oneshot::channel();
        if self.lock_state().watch(watcher) {
            tracing::debug!("Explicit token refresh, starting refresh");
            let client = self.clone();
            tokio::spawn(async move { client.run_refresh_cycle(None).await });
        } else {
            tracing::debug!("Explicit token refresh, joining refresh in flight");
        }

        match rx.await {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(cause)) => Err(InkpadError::RefreshFailed(cause)),
            Err(_) => Err(unsettled()),
        }
    }

    /// Call the refresh endpoint and store the new token. Returns the token.
    async fn call_refresh_endpoint(&self) -> Result<String, InkpadError> {
        let mut request = ApiRequest::post(self.inner.settings.refresh_path.clone());
        if let Some(refresh_token) = self.inner.store.refresh_token() {
            request = request.json(&serde_json::json!({ "refresh_token": refresh_token }))?;
        }

        tracing::debug!(request_id = %request.id, path = %request.path, "Requesting token refresh");
        let response = self.inner.transport.send(&request).await?;
        let response = inbound(response, &request)?;
        let token = TokenResponse::from_body(&response.body, &self.inner.settings.token_field)?;

        self.inner.store.set(&token.access_token);
        if token.refresh_token.is_some() {
            self.inner.store.set_refresh_token(token.refresh_token.as_deref());
        }
        Ok(token.access_token)
    }

    /// One pass through outbound stage, transport and inbound stage.
    ///
    /// `token` overrides the stored credential, which is how replays pin the
    /// token their refresh produced.
    async fn dispatch(
        &self,
        attempt: &Attempt,
        token: Option<&str>,
    ) -> Result<ApiResponse, InkpadError> {
        let stored = match token {
            Some(_) => None,
            None => self.inner.store.get(),
        };
        let token = token.or(stored.as_deref());
        let request = self.inner.outbound.decorate(attempt.request.clone(), token);

        tracing::debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            retried = attempt.retried,
            authorized = request.header_value("authorization").is_some(),
            "Dispatching request"
        );

        let response = self.inner.transport.send(&request).await?;
        inbound(response, &request)
    }

    fn needs_refresh(&self, attempt: &Attempt, err: &InkpadError) -> bool {
        let Some(status) = err.status() else {
            return false;
        };
        self.inner.settings.expired_statuses.contains(&status)
            && !attempt.retried
            && !self.inner.outbound.no_auth().matches(&attempt.request.path)
    }

    async fn refresh_and_replay(&self, attempt: Attempt) -> Result<ApiResponse, InkpadError> {
        let request_id = attempt.request.id;
        let (pending, rx) = PendingRequest::new(attempt.into_retry());

        // Check-and-set in one critical section: only one caller can see Idle.
        let admission = self.lock_state().admit(pending);
        match admission {
            Admission::Start(trigger) => {
                tracing::debug!(%request_id, "Access token rejected, starting refresh");
                // The cycle runs on its own task so queued callers settle even
                // if this caller stops polling.
                let client = self.clone();
                tokio::spawn(async move { client.run_refresh_cycle(Some(trigger)).await });
            }
            Admission::Queued(position) => {
                tracing::debug!(%request_id, position, "Refresh in flight, request queued");
            }
        }

        rx.await.unwrap_or_else(|_| Err(unsettled()))
    }

    async fn run_refresh_cycle(self, trigger: Option<PendingRequest>) {
        let mut cycle = Cycle {
            client: &self,
            trigger,
            settled: false,
        };

        match self.call_refresh_endpoint().await {
            Ok(token) => {
                let Drained { queue, watchers } = cycle.settle();
                tracing::info!(replays = queue.len(), "Access token refreshed");
                for watcher in watchers {
                    let _ = watcher.send(Ok(token.clone()));
                }

                let this = &self;
                let token = token.as_str();
                let replays = queue.into_iter().map(|pending| async move {
                    let outcome = this.dispatch(&pending.attempt, Some(token)).await;
                    pending.resolve(outcome.map_err(|err| this.expired_after_retry(err)));
                });
                // join_all polls in order, so replays hit the transport in FIFO order.
                futures::future::join_all(replays).await;
            }
            Err(err) => {
                tracing::warn!("Token refresh failed: {err}");
                // Back to Idle before anything that could unwind.
                let Drained { queue, watchers } = cycle.settle();
                self.inner.store.clear();
                self.inner.navigator.navigate_to_login();

                let cause = Arc::new(err);
                for watcher in watchers {
                    let _ = watcher.send(Err(cause.clone()));
                }
                for pending in queue {
                    pending.resolve(Err(InkpadError::RefreshFailed(cause.clone())));
                }
            }
        }
    }

    /// A replayed request rejected with an expired-token status means the
    /// fresh token was refused too.
    fn expired_after_retry(&self, err: InkpadError) -> InkpadError {
        match err.status() {
            Some(status) if self.inner.settings.expired_statuses.contains(&status) => {
                InkpadError::AuthExpired(Box::new(err))
            }
            _ => err,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One refresh cycle's claim on the refresh state. If the cycle unwinds
/// before settling, dropping it resets the state to `Idle`; the abandoned
/// callers see their responders dropped.
struct Cycle<'a> {
    client: &'a ApiClient,
    trigger: Option<PendingRequest>,
    settled: bool,
}

impl Cycle<'_> {
    /// Reset to `Idle` and take everyone waiting: queued requests in arrival
    /// order, then the trigger.
    fn settle(&mut self) -> Drained {
        let mut drained = self.client.lock_state().settle();
        drained.queue.extend(self.trigger.take());
        self.settled = true;
        drained
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let abandoned = self.client.lock_state().settle();
            tracing::warn!(
                queued = abandoned.queue.len(),
                "Refresh cycle ended without settling"
            );
        }
    }
}

fn unsettled() -> InkpadError {
    InkpadError::Transport("refresh cycle ended without settling the request".into())
}

/// Keep 2xx responses, turn everything else into an `Http` error naming the request.
fn inbound(response: ApiResponse, request: &ApiRequest) -> Result<ApiResponse, InkpadError> {
    if response.is_success() {
        return Ok(response);
    }
    tracing::debug!(
        request_id = %request.id,
        status = response.status,
        path = %request.path,
        "Request failed"
    );
    Err(InkpadError::Http {
        status: response.status,
        method: request.method.clone(),
        path: request.path.clone(),
        body: response.body_text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};

    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        path: String,
        auth: Option<String>,
        body: Option<serde_json::Value>,
    }

    enum RefreshReply {
        Token(serde_json::Value),
        Status(u16),
    }

    /// Accepts `Bearer <valid>` on protected paths and answers 401 otherwise.
    struct ScriptedTransport {
        valid: String,
        refresh_reply: RefreshReply,
        forced: HashMap<String, u16>,
        refused_with_valid_token: HashMap<String, u16>,
        seen: std::sync::Mutex<Vec<Seen>>,
        refresh_calls: AtomicUsize,
        refresh_started: Notify,
        gate: Semaphore,
    }

    impl ScriptedTransport {
        fn new(valid: &str, refresh_reply: RefreshReply) -> Self {
            Self {
                valid: valid.to_string(),
                refresh_reply,
                forced: HashMap::new(),
                refused_with_valid_token: HashMap::new(),
                seen: std::sync::Mutex::new(Vec::new()),
                refresh_calls: AtomicUsize::new(0),
                refresh_started: Notify::new(),
                gate: Semaphore::new(Semaphore::MAX_PERMITS),
            }
        }

        /// Hold refresh calls until `release` is called.
        fn gated(mut self) -> Self {
            self.gate = Semaphore::new(0);
            self
        }

        fn force(mut self, path: &str, status: u16) -> Self {
            self.forced.insert(path.to_string(), status);
            self
        }

        /// Answer `status` on `path` even when the token is valid.
        fn refuse_valid(mut self, path: &str, status: u16) -> Self {
            self.refused_with_valid_token.insert(path.to_string(), status);
            self
        }

        fn release(&self) {
            self.gate.add_permits(1);
        }

        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }

        fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, InkpadError> {
            let auth = request.header_value("authorization").map(str::to_string);
            let body = match &request.body {
                RequestBody::Json(v) => Some(v.clone()),
                _ => None,
            };
            self.seen.lock().unwrap().push(Seen {
                path: request.path.clone(),
                auth: auth.clone(),
                body,
            });

            if request.path == "/auth/refresh" {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                self.refresh_started.notify_one();
                self.gate.acquire().await.unwrap().forget();
                return Ok(match &self.refresh_reply {
                    RefreshReply::Token(body) => ApiResponse::new(200, body.clone()),
                    RefreshReply::Status(s) => {
                        ApiResponse::new(*s, json!({"detail": "refresh token expired"}))
                    }
                });
            }
            if request.path == "/boom" {
                return Err(InkpadError::Transport("connection reset".into()));
            }
            if let Some(status) = self.forced.get(&request.path) {
                return Ok(ApiResponse::new(*status, json!({"detail": "forced"})));
            }
            if request.path.starts_with("/auth/")
                || auth.as_deref() == Some(&format!("Bearer {}", self.valid))
            {
                if let Some(status) = self.refused_with_valid_token.get(&request.path) {
                    return Ok(ApiResponse::new(*status, json!({"detail": "refused"})));
                }
                return Ok(ApiResponse::new(200, json!({"path": request.path})));
            }
            Ok(ApiResponse::new(401, json!({"detail": "Invalid token"})))
        }
    }

    struct Harness {
        client: ApiClient,
        transport: Arc<ScriptedTransport>,
        store: Arc<MemoryStore>,
        logouts: Arc<AtomicUsize>,
    }

    fn harness(transport: ScriptedTransport, token: Option<&str>) -> Harness {
        let transport = Arc::new(transport);
        let store = Arc::new(match token {
            Some(t) => MemoryStore::with_token(t),
            None => MemoryStore::new(),
        });
        let logouts = Arc::new(AtomicUsize::new(0));
        let counter = logouts.clone();
        let client = ApiClient::new(
            transport.clone(),
            store.clone(),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            PipelineSettings::default(),
        );
        Harness {
            client,
            transport,
            store,
            logouts,
        }
    }

    fn refresh_ok(token: &str) -> RefreshReply {
        RefreshReply::Token(json!({"access_token": token, "token_type": "bearer"}))
    }

    async fn wait_for_queue(client: &ApiClient, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while client.queued() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("requests never reached the refresh queue");
    }

    fn spawn_get(
        client: &ApiClient,
        path: &'static str,
    ) -> tokio::task::JoinHandle<Result<serde_json::Value, InkpadError>> {
        let client = client.clone();
        tokio::spawn(async move { client.get(path).await })
    }

    #[tokio::test]
    async fn protected_request_carries_current_token() {
        let h = harness(ScriptedTransport::new("T1", refresh_ok("T2")), Some("T1"));
        let body = h.client.get("/notes/1").await.unwrap();
        assert_eq!(body, json!({"path": "/notes/1"}));
        assert_eq!(h.transport.seen()[0].auth.as_deref(), Some("Bearer T1"));
        assert_eq!(h.transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn no_auth_requests_never_carry_token() {
        let h = harness(ScriptedTransport::new("T1", refresh_ok("T2")), Some("T1"));
        h.client
            .send(ApiRequest::post("/auth/login?x=1").form(&[("username", "ada")]))
            .await
            .unwrap();
        h.client.send(ApiRequest::post("/auth/register")).await.unwrap();
        assert!(h.transport.seen().iter().all(|s| s.auth.is_none()));
    }

    #[tokio::test]
    async fn send_full_keeps_envelope() {
        let h = harness(ScriptedTransport::new("T1", refresh_ok("T2")), Some("T1"));
        let response = h.client.send_full(ApiRequest::get("/notes/1")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body["path"], "/notes/1");
    }

    #[tokio::test]
    async fn send_as_deserializes_body() {
        #[derive(serde::Deserialize)]
        struct Echo {
            path: String,
        }
        let h = harness(ScriptedTransport::new("T1", refresh_ok("T2")), Some("T1"));
        let echo: Echo = h.client.send_as(ApiRequest::get("/notes/7")).await.unwrap();
        assert_eq!(echo.path, "/notes/7");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_replayed() {
        let h = harness(ScriptedTransport::new("T2", refresh_ok("T2")), Some("T1"));
        let body = h.client.get("/notes/1").await.unwrap();
        assert_eq!(body["path"], "/notes/1");
        assert_eq!(h.transport.refresh_calls(), 1);
        assert_eq!(h.store.get().as_deref(), Some("T2"));

        let auths: Vec<Option<String>> = h.transport.seen().into_iter().map(|s| s.auth).collect();
        assert_eq!(
            auths,
            vec![Some("Bearer T1".to_string()), None, Some("Bearer T2".to_string())]
        );
        assert!(!h.client.is_refreshing());
    }

    #[tokio::test]
    async fn concurrent_failures_share_one_refresh_and_replay_in_order() {
        let h = harness(
            ScriptedTransport::new("T2", refresh_ok("T2")).gated(),
            Some("T1"),
        );

        let a = spawn_get(&h.client, "/notes/1");
        h.transport.refresh_started.notified().await;
        assert!(h.client.is_refreshing());

        let b = spawn_get(&h.client, "/files/2");
        wait_for_queue(&h.client, 1).await;
        let c = spawn_get(&h.client, "/notes/3");
        wait_for_queue(&h.client, 2).await;

        h.transport.release();

        assert_eq!(a.await.unwrap().unwrap()["path"], "/notes/1");
        assert_eq!(b.await.unwrap().unwrap()["path"], "/files/2");
        assert_eq!(c.await.unwrap().unwrap()["path"], "/notes/3");

        assert_eq!(h.transport.refresh_calls(), 1);
        let replayed: Vec<String> = h
            .transport
            .seen()
            .into_iter()
            .filter(|s| s.auth.as_deref() == Some("Bearer T2"))
            .map(|s| s.path)
            .collect();
        assert_eq!(replayed, vec!["/files/2", "/notes/3", "/notes/1"]);
        assert!(!h.client.is_refreshing());
        assert_eq!(h.client.queued(), 0);
    }

    #[tokio::test]
    async fn refresh_failure_rejects_everyone_and_logs_out_once() {
        let h = harness(
            ScriptedTransport::new("T2", RefreshReply::Status(401)).gated(),
            Some("T1"),
        );

        let a = spawn_get(&h.client, "/notes/1");
        h.transport.refresh_started.notified().await;
        let b = spawn_get(&h.client, "/files/2");
        wait_for_queue(&h.client, 1).await;
        let c = spawn_get(&h.client, "/notes/3");
        wait_for_queue(&h.client, 2).await;

        h.transport.release();

        for handle in [a, b, c] {
            let err = handle.await.unwrap().unwrap_err();
            match err {
                InkpadError::RefreshFailed(cause) => {
                    assert_eq!(cause.status(), Some(401));
                    assert_eq!(cause.path(), Some("/auth/refresh"));
                }
                other => panic!("expected RefreshFailed, got {other:?}"),
            }
        }

        assert!(h.store.get().is_none());
        assert_eq!(h.logouts.load(Ordering::SeqCst), 1);
        assert_eq!(h.transport.refresh_calls(), 1);
        assert!(!h.client.is_refreshing());
        // Nothing was replayed.
        assert_eq!(h.transport.seen().len(), 4);
    }

    #[tokio::test]
    async fn request_failing_after_retry_is_not_retried_again() {
        // The server never accepts any token.
        let h = harness(ScriptedTransport::new("never", refresh_ok("T2")), Some("T1"));
        let err = h.client.get("/notes/1").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.code(), "auth_expired");
        assert_eq!(h.transport.refresh_calls(), 1);
        let hits = h
            .transport
            .seen()
            .iter()
            .filter(|s| s.path == "/notes/1")
            .count();
        assert_eq!(hits, 2);
        assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_failures_propagate_untouched() {
        let h = harness(
            ScriptedTransport::new("T1", refresh_ok("T2")).force("/notes/404", 404),
            Some("T1"),
        );
        let err = h.client.get("/notes/404").await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        let err = h.client.get("/boom").await.unwrap_err();
        assert!(matches!(err, InkpadError::Transport(_)));

        assert_eq!(h.transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn unauthorized_login_does_not_refresh() {
        let h = harness(
            ScriptedTransport::new("T1", refresh_ok("T2")).force("/auth/login", 401),
            None,
        );
        let err = h.client.send(ApiRequest::post("/auth/login")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(h.transport.refresh_calls(), 0);
        assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stored_refresh_token_is_sent_and_rotated() {
        let h = harness(
            ScriptedTransport::new(
                "T2",
                RefreshReply::Token(json!({"access_token": "T2", "refresh_token": "R2"})),
            ),
            Some("T1"),
        );
        h.store.set_refresh_token(Some("R1"));

        h.client.get("/notes/1").await.unwrap();

        let refresh = h
            .transport
            .seen()
            .into_iter()
            .find(|s| s.path == "/auth/refresh")
            .unwrap();
        assert_eq!(refresh.body, Some(json!({"refresh_token": "R1"})));
        assert_eq!(h.store.refresh_token().as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn malformed_refresh_response_counts_as_failure() {
        let h = harness(
            ScriptedTransport::new("T2", RefreshReply::Token(json!({"detail": "ok"}))),
            Some("T1"),
        );
        let err = h.client.get("/notes/1").await.unwrap_err();
        match err {
            InkpadError::RefreshFailed(cause) => {
                assert!(matches!(*cause, InkpadError::ProtocolError(_)))
            }
            other => panic!("expected RefreshFailed, got {other:?}"),
        }
        assert!(h.store.get().is_none());
        assert_eq!(h.logouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn queued_requests_settle_when_trigger_is_dropped() {
        let h = harness(
            ScriptedTransport::new("T2", refresh_ok("T2")).gated(),
            Some("T1"),
        );
        let a = spawn_get(&h.client, "/notes/1");
        h.transport.refresh_started.notified().await;
        let b = spawn_get(&h.client, "/files/2");
        wait_for_queue(&h.client, 1).await;

        a.abort();
        h.transport.release();

        assert_eq!(b.await.unwrap().unwrap()["path"], "/files/2");
        assert!(!h.client.is_refreshing());
    }

    #[tokio::test]
    async fn later_expiry_starts_a_new_cycle() {
        let h = harness(ScriptedTransport::new("T2", refresh_ok("T2")), Some("T1"));
        h.client.get("/notes/1").await.unwrap();
        h.store.set("stale");
        h.client.get("/notes/2").await.unwrap();
        assert_eq!(h.transport.refresh_calls(), 2);
        assert_eq!(h.store.get().as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn each_replay_settles_with_its_own_outcome() {
        let h = harness(
            ScriptedTransport::new("T2", refresh_ok("T2"))
                .refuse_valid("/files/2", 404)
                .gated(),
            Some("T1"),
        );

        let a = spawn_get(&h.client, "/notes/1");
        h.transport.refresh_started.notified().await;
        let b = spawn_get(&h.client, "/files/2");
        wait_for_queue(&h.client, 1).await;
        let c = spawn_get(&h.client, "/notes/3");
        wait_for_queue(&h.client, 2).await;

        h.transport.release();

        assert_eq!(a.await.unwrap().unwrap()["path"], "/notes/1");
        let err = b.await.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.code(), "http_error");
        assert_eq!(c.await.unwrap().unwrap()["path"], "/notes/3");

        assert_eq!(h.transport.refresh_calls(), 1);
        assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
        assert_eq!(h.store.get().as_deref(), Some("T2"));
    }

    fn login_page_unavailable() {
        panic!("login page unavailable");
    }

    #[tokio::test]
    async fn panicking_navigator_does_not_wedge_refresh_state() {
        let transport = Arc::new(ScriptedTransport::new("T2", RefreshReply::Status(401)));
        let store = Arc::new(MemoryStore::with_token("T1"));
        let client = ApiClient::new(
            transport.clone(),
            store.clone(),
            Arc::new(login_page_unavailable),
            PipelineSettings::default(),
        );

        let err = client.get("/notes/1").await.unwrap_err();
        assert!(matches!(err, InkpadError::Transport(_)), "got {err:?}");
        assert!(!client.is_refreshing());
        assert!(store.get().is_none());

        store.set("T1");
        let second = tokio::time::timeout(Duration::from_secs(2), client.get("/notes/2"))
            .await
            .expect("second request never settled");
        assert!(second.is_err());
        assert!(!client.is_refreshing());
        assert_eq!(transport.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn explicit_refresh_stores_and_returns_token() {
        let h = harness(
            ScriptedTransport::new("T2", RefreshReply::Token(json!({"access_token": "T2", "refresh_token": "R2"}))),
            Some("T1"),
        );
        assert_eq!(h.client.refresh().await.unwrap(), "T2");
        assert_eq!(h.store.get().as_deref(), Some("T2"));
        assert_eq!(h.store.refresh_token().as_deref(), Some("R2"));
        assert!(!h.client.is_refreshing());
        // Nothing to replay.
        assert_eq!(h.transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn explicit_refresh_joins_the_cycle_in_flight() {
        let h = harness(
            ScriptedTransport::new("T2", refresh_ok("T2")).gated(),
            Some("T1"),
        );

        let a = spawn_get(&h.client, "/notes/1");
        h.transport.refresh_started.notified().await;

        // The watcher registers on the first poll, before the gate opens.
        let (explicit, ()) = tokio::join!(h.client.refresh(), async { h.transport.release() });

        assert_eq!(explicit.unwrap(), "T2");
        assert_eq!(a.await.unwrap().unwrap()["path"], "/notes/1");
        assert_eq!(h.transport.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn explicit_refresh_failure_logs_out() {
        let h = harness(
            ScriptedTransport::new("T2", RefreshReply::Status(401)),
            Some("T1"),
        );
        let err = h.client.refresh().await.unwrap_err();
        match err {
            InkpadError::RefreshFailed(cause) => assert_eq!(cause.status(), Some(401)),
            other => panic!("expected RefreshFailed, got {other:?}"),
        }
        assert!(h.store.get().is_none());
        assert_eq!(h.logouts.load(Ordering::SeqCst), 1);
        assert!(!h.client.is_refreshing());
    }

    #[test]
    fn refresh_path_is_always_no_auth() {
        let transport = Arc::new(ScriptedTransport::new("T1", refresh_ok("T2")));
        let client = ApiClient::new(
            transport,
            Arc::new(MemoryStore::new()),
            Arc::new(|| {}),
            PipelineSettings {
                no_auth_paths: vec![],
                refresh_path: "/session/renew".into(),
                ..PipelineSettings::default()
            },
        );
        assert!(client.inner.outbound.no_auth().matches("/session/renew"));
        assert!(!client.inner.outbound.no_auth().matches("/auth/login"));
    }
}

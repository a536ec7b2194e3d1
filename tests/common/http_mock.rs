use std::time::Duration;

use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a protected resource: 200 with `body` for `Bearer <valid>`, 401 for
/// anything else.
#[allow(dead_code)]
pub async fn mount_protected(
    server: &MockServer,
    http_method: &str,
    route: &str,
    valid: &str,
    body: serde_json::Value,
) {
    Mock::given(method(http_method))
        .and(path(route))
        .and(header("authorization", format!("Bearer {valid}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"detail": "Invalid token"})),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

/// Every protected `/api/v1/...` route answers 401 unless a more specific
/// mock matched first.
#[allow(dead_code)]
pub async fn mount_reject_all(server: &MockServer) {
    Mock::given(path_regex(r"^/api/v1/(notes|files|recycle)"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"detail": "Invalid token"})),
        )
        .with_priority(20)
        .mount(server)
        .await;
}

/// Refresh endpoint that hands out `token` after `delay`, expected `calls` times.
#[allow(dead_code)]
pub async fn mount_refresh(server: &MockServer, token: &str, delay: Duration, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": token, "token_type": "bearer"}))
                .set_delay(delay),
        )
        .expect(calls)
        .mount(server)
        .await;
}

/// Refresh endpoint that rejects the session.
#[allow(dead_code)]
pub async fn mount_refresh_rejected(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"detail": "Refresh token expired"}))
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Login endpoint issuing `token`.
#[allow(dead_code)]
pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"access_token": token, "token_type": "bearer"}),
        ))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn note_json(id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": "u1",
        "title": title,
        "content": format!("content of {title}"),
        "created_at": "2026-03-01T10:00:00",
        "updated_at": "2026-03-01T10:00:00"
    })
}

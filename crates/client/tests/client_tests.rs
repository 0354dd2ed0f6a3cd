//! Integration tests for the resilient request client: credential
//! injection, refresh-needed handling, single-flight coordination, and the
//! relogin wipe.

use dailyfeed_client::config::ServicesConfig;
use dailyfeed_client::http::{HttpClient, RequestSpec};
use dailyfeed_core::storage::keys;
use dailyfeed_core::{MemoryStorage, SessionStorage};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with(server_uri: &str) -> (Arc<MemoryStorage>, HttpClient) {
    let storage = Arc::new(MemoryStorage::new());
    let client = HttpClient::builder()
        .services(ServicesConfig::single_origin(server_uri))
        .storage(storage.clone())
        .build()
        .unwrap();
    (storage, client)
}

#[tokio::test]
async fn bearer_header_attached_when_token_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "tok").await.unwrap();

    let response = client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unauthenticated_request_omits_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let (_, client) = client_with(&server.uri());
    client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn refresh_needed_triggers_refresh_and_one_retry() {
    let server = MockServer::start().await;

    // First pass with the stale token signals refresh.
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer oldtok"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Token-Refresh-Needed", "true")
                .set_body_json(json!({"stale": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Bearer newtok"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer newtok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fresh": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "oldtok").await.unwrap();

    let response = client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"fresh": true}));
    assert_eq!(
        storage.get(keys::TOKEN).await.unwrap().as_deref(),
        Some("newtok")
    );
}

#[tokio::test]
async fn refresh_failure_returns_original_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Token-Refresh-Needed", "true")
                .set_body_json(json!({"original": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "oldtok").await.unwrap();

    let response = client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();

    // The caller sees the pre-refresh response, not a refresh error.
    assert!(response.headers().contains_key("X-Token-Refresh-Needed"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"original": true}));
    assert_eq!(
        storage.get(keys::TOKEN).await.unwrap().as_deref(),
        Some("oldtok")
    );
}

#[tokio::test]
async fn skip_refresh_opts_out_of_refresh_handling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-Token-Refresh-Needed", "true"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "tok").await.unwrap();

    client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())).skip_refresh())
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_requests_share_a_single_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer oldtok"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-Token-Refresh-Needed", "true"),
        )
        .mount(&server)
        .await;
    // The delay keeps the refresh outstanding while every request observes
    // the signal; exactly one refresh call may arrive.
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Authorization", "Bearer newtok")
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer newtok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "oldtok").await.unwrap();

    let url = format!("{}/api/posts", server.uri());
    let calls = (0..8).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move { client.execute(RequestSpec::get(url)).await }
    });
    let responses = futures::future::join_all(calls).await;

    for response in responses {
        let body: serde_json::Value = response.unwrap().json().await.unwrap();
        assert_eq!(body, json!({"ok": true}));
    }
    assert_eq!(
        storage.get(keys::TOKEN).await.unwrap().as_deref(),
        Some("newtok")
    );
}

#[tokio::test]
async fn sequential_refreshes_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-Token-Refresh-Needed", "true"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Bearer tok2"))
        .expect(2)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "tok1").await.unwrap();

    let url = format!("{}/api/posts", server.uri());
    client.execute(RequestSpec::get(url.clone())).await.unwrap();
    client.execute(RequestSpec::get(url)).await.unwrap();
    // expect(2) on the refresh mock verifies two independent refresh calls.
}

#[tokio::test]
async fn refresh_call_carries_cookie_set_at_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/authentication/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Authorization", "Bearer t1")
                .insert_header("Set-Cookie", "refresh_token=r1; Path=/; HttpOnly")
                .set_body_json(json!({"memberId": 1, "handle": "kim"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-Token-Refresh-Needed", "true"),
        )
        .mount(&server)
        .await;
    // The jar shared between the session store and the request client is
    // what gets the login-time cookie onto the refresh call.
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .and(header("cookie", "refresh_token=r1"))
        .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Bearer t2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    let credentials = dailyfeed_core::LoginCredentials {
        email: "a@b.com".to_string(),
        password: "x".to_string(),
    };
    client.session().login(&credentials).await.unwrap();

    client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();
    assert_eq!(
        storage.get(keys::TOKEN).await.unwrap().as_deref(),
        Some("t2")
    );
}

#[tokio::test]
async fn relogin_signal_on_refresh_response_does_not_force_logout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Token-Refresh-Needed", "true")
                .set_body_json(json!({"original": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    // A refresh response carrying signal headers is not re-interpreted; the
    // failed refresh only means the caller gets the original response back.
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Relogin-Required", "true"))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    storage.put(keys::TOKEN, "oldtok").await.unwrap();
    let relogin_fired = Arc::new(AtomicBool::new(false));
    let hook_flag = relogin_fired.clone();
    let client = HttpClient::builder()
        .services(ServicesConfig::single_origin(server.uri()))
        .storage(storage.clone())
        .on_relogin(move || hook_flag.store(true, Ordering::SeqCst))
        .build()
        .unwrap();

    let response = client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"original": true}));
    assert!(!relogin_fired.load(Ordering::SeqCst));
    assert_eq!(
        storage.get(keys::TOKEN).await.unwrap().as_deref(),
        Some("oldtok")
    );
}

#[tokio::test]
async fn relogin_required_wipes_session_and_fires_hook() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Relogin-Required", "true"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/after"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    storage.put(keys::TOKEN, "oldtok").await.unwrap();
    storage.put(keys::USER_EMAIL, "a@b.com").await.unwrap();

    let relogin_fired = Arc::new(AtomicBool::new(false));
    let hook_flag = relogin_fired.clone();
    let client = HttpClient::builder()
        .services(ServicesConfig::single_origin(server.uri()))
        .storage(storage.clone())
        .on_relogin(move || hook_flag.store(true, Ordering::SeqCst))
        .build()
        .unwrap();

    client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();

    assert!(relogin_fired.load(Ordering::SeqCst));
    assert_eq!(storage.get(keys::TOKEN).await.unwrap(), None);
    assert_eq!(storage.get(keys::USER_EMAIL).await.unwrap(), None);

    // Follow-up calls no longer carry the old token.
    client
        .execute(RequestSpec::get(format!("{}/after", server.uri())))
        .await
        .unwrap();
    let requests = server.received_requests().await.unwrap();
    let after = requests
        .iter()
        .find(|r| r.url.path() == "/after")
        .expect("follow-up request not recorded");
    assert!(!after.headers.contains_key("authorization"));
}

#[tokio::test]
async fn relogin_check_precedes_refresh_check() {
    let server = MockServer::start().await;
    // Both signals set: relogin wins, no refresh call goes out.
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Relogin-Required", "true")
                .insert_header("X-Token-Refresh-Needed", "true"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "tok").await.unwrap();

    client
        .execute(RequestSpec::get(format!("{}/api/posts", server.uri())))
        .await
        .unwrap();
    assert_eq!(storage.get(keys::TOKEN).await.unwrap(), None);
}

#[tokio::test]
async fn retry_reuses_method_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer oldtok"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-Token-Refresh-Needed", "true"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh"))
        .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Bearer newtok"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer newtok"))
        .and(wiremock::matchers::body_json(json!({"content": "hello"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, client) = client_with(&server.uri());
    storage.put(keys::TOKEN, "oldtok").await.unwrap();

    let response = client
        .execute(RequestSpec::post_json(
            format!("{}/api/posts", server.uri()),
            json!({"content": "hello"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

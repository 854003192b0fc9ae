//! X API client tests against a mock server.

use std::time::Duration;

use serde_json::json;
use watcher::twitter::{PostId, PostKind, PostSource, XClient, XClientConfig};
use watcher::FetchError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, user_id: Option<&str>) -> XClient {
    let mut config = XClientConfig::new("test-bearer");
    config.api_base = server.uri();
    config.user_id = user_id.map(ToString::to_string);
    config.timeout = Duration::from_secs(2);
    XClient::new(config).unwrap()
}

async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/rustlang"))
        .and(header("authorization", "Bearer test-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "777", "name": "Rust Language", "username": "rustlang"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_resolves_handle_and_classifies() {
    let server = MockServer::start().await;
    mount_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/2/users/777/tweets"))
        .and(query_param("max_results", "20"))
        .and(query_param("tweet.fields", "created_at,referenced_tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "105", "text": "newest", "created_at": "2025-09-18T12:05:00.000Z"},
                {"id": "102", "text": "middle", "created_at": "2025-09-18T12:02:00.000Z"},
                {
                    "id": "101",
                    "text": "@someone thanks",
                    "created_at": "2025-09-18T12:01:00.000Z",
                    "referenced_tweets": [{"type": "replied_to", "id": "50"}]
                },
                {
                    "id": "100",
                    "text": "RT @other: hi",
                    "created_at": "2025-09-18T12:00:00.000Z",
                    "referenced_tweets": [{"type": "retweeted", "id": "49"}]
                },
                {
                    "id": "99",
                    "text": "look at this",
                    "created_at": "2025-09-18T11:59:00.000Z",
                    "referenced_tweets": [{"type": "quoted", "id": "48"}]
                }
            ],
            "meta": {"result_count": 5, "newest_id": "105", "oldest_id": "99"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = client(&server, None).fetch_recent("@rustlang").await.unwrap();

    let kinds: Vec<(u64, PostKind)> = posts.iter().map(|p| (p.id.get(), p.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (105, PostKind::Original),
            (102, PostKind::Original),
            (101, PostKind::Reply),
            (100, PostKind::Retweet),
            (99, PostKind::Quote),
        ]
    );
    assert_eq!(posts[0].author, "rustlang");
    assert_eq!(posts[0].permalink(), "https://x.com/rustlang/status/105");
    assert_eq!(posts[0].created_at.to_rfc3339(), "2025-09-18T12:05:00+00:00");
}

#[tokio::test]
async fn test_configured_user_id_skips_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/rustlang"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/42/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "text": "hi", "created_at": "2025-01-01T00:00:00.000Z"}],
            "meta": {"result_count": 1}
        })))
        .mount(&server)
        .await;

    let posts = client(&server, Some("42")).fetch_recent("rustlang").await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, PostId::new(1));
}

#[tokio::test]
async fn test_empty_timeline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/42/tweets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
        )
        .mount(&server)
        .await;

    let posts = client(&server, Some("42")).fetch_recent("rustlang").await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = client(&server, Some("42"))
        .fetch_recent("rustlang")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Auth { status: 401, .. }));
}

#[tokio::test]
async fn test_forbidden_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = client(&server, None).fetch_recent("rustlang").await.unwrap_err();
    assert!(matches!(err, FetchError::Auth { status: 403, .. }));
}

#[tokio::test]
async fn test_too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("x-rate-limit-reset", "1758200000"),
        )
        .mount(&server)
        .await;

    let err = client(&server, Some("42"))
        .fetch_recent("rustlang")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::RateLimited {
            reset_at: Some(1_758_200_000)
        }
    ));
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;

    let err = client(&server, Some("42"))
        .fetch_recent("rustlang")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transient(msg) if msg.contains("503")));
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"meta": {"result_count": 0}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = client(&server, Some("42"))
        .fetch_recent("rustlang")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transient(_)));
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server, Some("42"))
        .fetch_recent("rustlang")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_tweet_without_created_at_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/42/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "105", "text": "no timestamp"}],
            "meta": {"result_count": 1}
        })))
        .mount(&server)
        .await;

    let err = client(&server, Some("42"))
        .fetch_recent("rustlang")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unknown_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/nobody_here"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "title": "Not Found Error",
                "detail": "Could not find user with username: [nobody_here]."
            }]
        })))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .fetch_recent("nobody_here")
        .await
        .unwrap_err();
    match err {
        FetchError::InvalidResponse(msg) => assert!(msg.contains("Could not find user")),
        other => panic!("unexpected error: {other}"),
    }
}

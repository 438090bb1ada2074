use mockito::Matcher;
use redsum_reddit::{RedditClient, RedditConfig, ThreadFetcher};
use redsum_types::FetchError;
use serde_json::json;

const THREAD_URL: &str = "https://www.reddit.com/r/rust/comments/abc123/async_question/";

fn client_for(server: &mockito::ServerGuard) -> RedditClient {
    RedditClient::new(RedditConfig::default().with_base_url(server.url())).unwrap()
}

fn thread_body() -> String {
    json!([
        { "kind": "Listing", "data": { "children": [{
            "kind": "t3",
            "data": { "title": "Async question", "selftext": "How do I join futures?", "subreddit": "rust" }
        }]}},
        { "kind": "Listing", "data": { "children": [
            { "kind": "t1", "data": { "body": "Use join_all.", "replies": "" } }
        ]}}
    ])
    .to_string()
}

#[tokio::test]
async fn test_fetch_thread() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/r/rust/comments/abc123/.json")
        .match_query(Matcher::Any)
        .match_header("user-agent", Matcher::Regex("^redsum/".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(thread_body())
        .create_async()
        .await;

    let thread = client_for(&server).fetch(THREAD_URL).await.unwrap();

    assert_eq!(thread.title, "Async question");
    assert_eq!(thread.subreddit, "rust");
    assert_eq!(thread.selftext.as_deref(), Some("How do I join futures?"));
    assert_eq!(thread.comment_bodies, vec!["Use join_all."]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_thread_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/r/rust/comments/abc123/.json")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let err = client_for(&server).fetch(THREAD_URL).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)));
}

#[tokio::test]
async fn test_server_error_is_retryable_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/r/rust/comments/abc123/.json")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream busy")
        .create_async()
        .await;

    let err = client_for(&server).fetch(THREAD_URL).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 503,
            body: "upstream busy".to_string()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_url_never_hits_network() {
    let server = mockito::Server::new_async().await;
    let err = client_for(&server)
        .fetch("https://example.com/r/rust/comments/abc123/")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

//! Integration tests for mutual-graph
//!
//! These drive a whole crawl through the public API, from the token to the
//! rendered graph, against an in-memory API.

use async_trait::async_trait;
use mutual_graph::api::{ApiClient, HttpResponse, RetryPolicy, Transport, UserId};
use mutual_graph::crawl::{CrawlStatus, Crawler};
use mutual_graph::graph::{build_graph, to_dot, to_json};
use mutual_graph::{CrawlError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// Serves a fixed body per path, rate limiting each path `throttle` times first
struct FakeApi {
    bodies: HashMap<String, String>,
    throttle: usize,
    seen: std::sync::Mutex<HashMap<String, usize>>,
    requests: AtomicUsize,
}

impl FakeApi {
    fn new(throttle: usize) -> Self {
        Self {
            bodies: HashMap::new(),
            throttle,
            seen: std::sync::Mutex::new(HashMap::new()),
            requests: AtomicUsize::new(0),
        }
    }

    fn with(mut self, path: &str, body: &str) -> Self {
        self.bodies.insert(path.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn get(&self, url: &Url, credential: &str) -> Result<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let path = url.path().trim_start_matches('/').to_string();

        if credential != "good-token" {
            return Ok(HttpResponse {
                status: 401,
                body: br#"{"message": "401: Unauthorized", "code": 0}"#.to_vec(),
            });
        }

        let body = self
            .bodies
            .get(&path)
            .ok_or_else(|| CrawlError::Transport(format!("unexpected request for {}", path)))?;

        if path != "users/@me" {
            let mut seen = self.seen.lock().unwrap();
            let count = seen.entry(path.clone()).or_insert(0);
            *count += 1;
            if *count <= self.throttle {
                return Ok(HttpResponse {
                    status: 429,
                    body: br#"{"message": "You are being rate limited.", "retry_after": 0.2, "global": false}"#
                        .to_vec(),
                });
            }
        }

        Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }
}

fn user(id: &str, name: &str) -> String {
    format!(
        r#"{{"id": "{id}", "username": "{name}", "global_name": null, "avatar": null,
            "discriminator": "0", "public_flags": 0}}"#
    )
}

fn relationship(id: &str, name: &str, kind: i64) -> String {
    format!(r#"{{"id": "{id}", "type": {kind}, "nickname": null, "user": {}}}"#, user(id, name))
}

/// Me (1) with accepted friends 2 and 3 and a pending request from 4
fn fake_api(throttle: usize) -> FakeApi {
    FakeApi::new(throttle)
        .with("users/@me", &user("1", "me"))
        .with(
            "users/@me/relationships",
            &format!(
                "[{}, {}, {}]",
                relationship("2", "alice", 1),
                relationship("3", "bob", 1),
                relationship("4", "mallory", 3)
            ),
        )
        .with(
            "users/2/relationships",
            &format!("[{}, {}]", relationship("1", "me", 1), relationship("3", "bob", 1)),
        )
        .with("users/3/relationships", &format!("[{}]", relationship("1", "me", 1)))
        .with("users/4/relationships", &format!("[{}]", relationship("2", "alice", 1)))
}

fn crawler(api: Arc<FakeApi>) -> Crawler {
    let client = ApiClient::new(
        api,
        Url::parse("http://api.test/").unwrap(),
        RetryPolicy::default(),
    );
    Crawler::new(client, 8)
}

#[tokio::test(start_paused = true)]
async fn test_crawl_builds_expected_graph() {
    let api = Arc::new(fake_api(2));
    let mut crawler = crawler(api.clone());

    let session = crawler.crawl("good-token\n").await.unwrap();
    assert_eq!(session.identity.connections.len(), 3);

    let (identity, events, status) = session.collect().await;
    assert_eq!(status, CrawlStatus::Completed);
    assert_eq!(events.len(), 3);
    assert!(events.last().unwrap().is_last());

    let graph = build_graph(&identity, &events);
    assert_eq!(graph.nodes().len(), 2);

    let alice = graph.node(&UserId::from("2")).unwrap();
    assert_eq!(alice.label, "alice");
    assert_eq!(
        alice.neighbors.iter().map(UserId::as_str).collect::<Vec<_>>(),
        vec!["1", "3"]
    );
    let bob = graph.node(&UserId::from("3")).unwrap();
    assert_eq!(bob.neighbors.iter().map(UserId::as_str).collect::<Vec<_>>(), vec!["1"]);

    // mallory is only a pending request, so her list is crawled but not graphed
    assert!(graph.node(&UserId::from("4")).is_none());

    let dot = to_dot(&graph);
    assert_eq!(dot.matches(" -> ").count(), 3);
    assert!(!dot.contains("mallory"));

    let json: serde_json::Value = serde_json::from_str(&to_json(&graph).unwrap()).unwrap();
    assert_eq!(json["nodes"]["3"]["label"], "bob");

    // The identity call is never throttled; each of the 4 relationship lists
    // is throttled twice before it answers
    assert_eq!(api.requests.load(Ordering::SeqCst), 1 + 4 * 3);
}

#[tokio::test]
async fn test_bad_token_is_an_authentication_error() {
    let api = Arc::new(fake_api(0));
    let mut crawler = crawler(api.clone());

    let err = crawler.crawl("stolen-token").await.err().unwrap();
    assert!(err.is_authentication());
    assert_eq!(api.requests.load(Ordering::SeqCst), 1);
}

mod common;

use std::time::Duration;

use common::harness::{TestServerConfig, spawn_test_server};
use serde_json::{Value, json};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const POLL_ATTEMPTS: usize = 200;

async fn poll_until_terminal(client: &reqwest::Client, base: &str, job_id: &str) -> Value {
    for _ in 0..POLL_ATTEMPTS {
        let body: Value = client
            .get(format!("{base}/v1/jobs/{job_id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if body["status"] == "completed" || body["status"] == "failed" {
            return body;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

#[tokio::test]
async fn test_submitted_claim_is_verified_by_worker() {
    let server = spawn_test_server(TestServerConfig::default()).await.unwrap();
    let client = reqwest::Client::new();
    let base = server.url();

    let response = client
        .post(format!("{base}/v1/claims"))
        .json(&json!({"query": "Vaccines cause autism"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    let body: Value = response.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = poll_until_terminal(&client, &base, &job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["result"]["verdict"], "mostly_false");
    assert_eq!(job["result"]["search_engine"], "Brave");
    assert!(!job["result"]["sources"].as_array().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_paraphrase_after_completion_is_served_from_cache() {
    let server = spawn_test_server(TestServerConfig::default()).await.unwrap();
    let client = reqwest::Client::new();
    let base = server.url();

    let body: Value = client
        .post(format!("{base}/v1/claims"))
        .json(&json!({"query": "The earth is flat"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();
    poll_until_terminal(&client, &base, &job_id).await;

    let response = client
        .post(format!("{base}/v1/claims"))
        .json(&json!({"query": "the Earth is FLAT!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "cache");
    assert_eq!(body["query"], "The earth is flat");
    assert_eq!(server.store.job_count(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_misinformation_verdicts_feed_top_list() {
    let server = spawn_test_server(TestServerConfig::default()).await.unwrap();
    let client = reqwest::Client::new();
    let base = server.url();

    let body: Value = client
        .post(format!("{base}/v1/claims"))
        .json(&json!({"query": "5G towers spread viruses"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();
    poll_until_terminal(&client, &base, &job_id).await;

    let body: Value = client
        .get(format!("{base}/v1/analytics/top-misinformation?limit=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["query"], "5G towers spread viruses");
    assert_eq!(items[0]["count"], 1);
    assert_eq!(items[0]["verdict"], "mostly_false");

    server.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoints_over_tcp() {
    let server = spawn_test_server(TestServerConfig::default()).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/healthz", server.url()))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("x-verity-status").unwrap(),
        "healthy"
    );

    let response = client
        .get(format!("{}/ready", server.url()))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    server.shutdown().await;
}

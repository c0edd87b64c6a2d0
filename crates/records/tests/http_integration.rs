use records::{
    AppendResponse, GatewayServiceConfig, KvStore, StorageBackend, Variant, create_gateway_state,
    create_router,
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct TestServer {
    base_url: String,
    _temp_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_test_server(config: GatewayServiceConfig) -> TestServer {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = create_gateway_state(&config, temp_dir.path())
        .await
        .expect("Failed to create gateway state");
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read bound addr");
    let base_url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Gateway test server exited unexpectedly");
    });

    TestServer {
        base_url,
        _temp_dir: temp_dir,
        handle,
    }
}

async fn append(client: &reqwest::Client, url: &str, record: &Value) -> AppendResponse {
    let resp = client
        .post(url)
        .json(record)
        .send()
        .await
        .expect("append request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("append response should parse")
}

async fn list(client: &reqwest::Client, url: &str) -> Vec<Value> {
    let resp = client.get(url).send().await.expect("list request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    resp.json().await.expect("list body should be a json array")
}

#[tokio::test]
async fn test_sqlite_backup_lifecycle() {
    let server = start_test_server(GatewayServiceConfig::default()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/", server.base_url);

    assert!(list(&client, &url).await.is_empty());

    let first = json!({ "timestamp": "2024-01-01T00:00:00Z", "phone": "123" });
    let created = append(&client, &url, &first).await;
    assert!(created.success);
    assert!(
        created.key.parse::<u64>().is_ok(),
        "timestamp policy should produce numeric keys, got {}",
        created.key
    );

    let records = list(&client, &url).await;
    assert_eq!(records, vec![first.clone()]);

    let second = json!({ "timestamp": "2024-02-01T00:00:00Z", "phone": "456" });
    let created_again = append(&client, &url, &second).await;
    assert_ne!(created.key, created_again.key);

    let records = list(&client, &url).await;
    assert_eq!(records, vec![second, first]);
}

#[tokio::test]
async fn test_query_variant_with_uuid_keys() {
    let mut config = GatewayServiceConfig::for_variant(Variant::PhoneQuery);
    config.key_policy = records::KeyPolicy::Uuid;
    config.storage.backend = StorageBackend::Memory;

    let server = start_test_server(config).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/queries", server.base_url);

    let record = json!({ "timestamp": "2024-05-05 10:00:00", "number": "10086" });
    let created = append(&client, &url, &record).await;
    assert!(uuid_like(&created.key), "unexpected key {}", created.key);

    assert_eq!(list(&client, &url).await, vec![record]);

    let welcome: Value = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("welcome request failed")
        .json()
        .await
        .expect("welcome body should be json");
    assert_eq!(welcome["message"], "Phone Query Worker");
}

#[tokio::test]
async fn test_malformed_post_and_preflight() {
    let server = start_test_server(GatewayServiceConfig::default()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/", server.base_url);

    let resp = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{\"timestamp\": ")
        .send()
        .await
        .expect("malformed request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body should be json");
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{}/anything", server.base_url))
        .send()
        .await
        .expect("preflight request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["access-control-allow-methods"],
        "GET, POST, OPTIONS"
    );
    assert_eq!(resp.headers()["access-control-allow-headers"], "Content-Type");
    assert!(resp.headers().get("content-type").is_none());
    assert!(resp.bytes().await.expect("preflight body").is_empty());

    assert!(list(&client, &url).await.is_empty());
}

#[tokio::test]
async fn test_records_survive_restart_on_sqlite() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = GatewayServiceConfig::default();

    {
        let state = create_gateway_state(&config, temp_dir.path())
            .await
            .expect("first state");
        state
            .store
            .put("1", r#"{"timestamp":"2024-01-01T00:00:00Z"}"#)
            .await
            .expect("seed record");
    }

    let state = create_gateway_state(&config, temp_dir.path())
        .await
        .expect("second state");
    let report = records::collect_records(state.store.as_ref(), 10).await;
    assert_eq!(report.records.len(), 1);
}

fn uuid_like(key: &str) -> bool {
    key.len() == 36 && key.chars().filter(|c| *c == '-').count() == 4
}

//! Integration tests for per-resource locking in the HTTP client.
//!
//! These tests run real requests against a mock server and check that
//! mutating requests with the same resource key never overlap, while reads,
//! keyless requests and requests for other keys are left alone.

use std::time::{Duration, Instant};

use api_client::clients::{DataType, HttpClient, HttpMethod, HttpRequest};
use api_client::{BaseUrl, ClientConfig, HttpError, ResourceKey, ResourceLockManager};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DELAY: Duration = Duration::from_millis(250);

fn create_client(server: &MockServer, locks: ResourceLockManager) -> HttpClient {
    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpClient::new(&config, locks).unwrap()
}

fn put(path: &str, key: &str) -> HttpRequest {
    HttpRequest::builder(HttpMethod::Put, path)
        .body(json!({"value": "v"}))
        .body_type(DataType::Json)
        .resource_key(ResourceKey::new(key).unwrap())
        .build()
        .unwrap()
}

fn delete(path: &str, key: &str) -> HttpRequest {
    HttpRequest::builder(HttpMethod::Delete, path)
        .resource_key(ResourceKey::new(key).unwrap())
        .build()
        .unwrap()
}

async fn mount_slow(server: &MockServer, http_method: &str, status: u16) {
    Mock::given(method(http_method))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({"msg": "ok"}))
                .set_delay(DELAY),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Serialization
// ============================================================================

#[tokio::test]
async fn test_same_key_mutations_are_serialized() {
    let server = MockServer::start().await;
    mount_slow(&server, "PUT", 200).await;
    mount_slow(&server, "DELETE", 200).await;

    let client = create_client(&server, ResourceLockManager::new());

    let started = Instant::now();
    let (a, b) = tokio::join!(
        client.request(put("stores/st-1/keys/a", "st-1")),
        client.request(delete("stores/st-1/keys/b", "st-1")),
    );
    let elapsed = started.elapsed();

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert!(
        elapsed >= DELAY * 2,
        "same-key requests overlapped: finished in {elapsed:?}"
    );
}

#[tokio::test]
async fn test_clients_sharing_a_manager_serialize_against_each_other() {
    let server = MockServer::start().await;
    mount_slow(&server, "PUT", 200).await;

    let locks = ResourceLockManager::new();
    let first = create_client(&server, locks.clone());
    let second = create_client(&server, locks);

    let started = Instant::now();
    let (a, b) = tokio::join!(
        first.request(put("stores/st-1", "st-1")),
        second.request(put("stores/st-1", "st-1")),
    );

    assert!(a.is_ok() && b.is_ok());
    assert!(started.elapsed() >= DELAY * 2);
}

#[tokio::test]
async fn test_lock_is_held_while_request_is_in_flight() {
    let server = MockServer::start().await;
    mount_slow(&server, "PUT", 200).await;

    let locks = ResourceLockManager::new();
    let client = create_client(&server, locks.clone());
    let key = ResourceKey::new("st-1").unwrap();

    let (result, locked_mid_flight) = tokio::join!(
        client.request(put("stores/st-1", "st-1")),
        async {
            tokio::time::sleep(DELAY / 2).await;
            let mutex = locks.get(&key);
            let locked = mutex.try_lock().is_err();
            locked
        }
    );

    assert!(result.is_ok());
    assert!(locked_mid_flight);
    assert!(locks.get(&key).try_lock().is_ok());
}

// ============================================================================
// Requests That Are Not Locked
// ============================================================================

#[tokio::test]
async fn test_different_keys_run_in_parallel() {
    let server = MockServer::start().await;
    mount_slow(&server, "PUT", 200).await;

    let client = create_client(&server, ResourceLockManager::new());

    let started = Instant::now();
    let (a, b) = tokio::join!(
        client.request(put("stores/st-1", "st-1")),
        client.request(put("stores/st-2", "st-2")),
    );
    let elapsed = started.elapsed();

    assert!(a.is_ok() && b.is_ok());
    assert!(
        elapsed < DELAY * 2,
        "different keys were serialized: finished in {elapsed:?}"
    );
}

#[tokio::test]
async fn test_reads_are_not_locked_even_with_a_key() {
    let server = MockServer::start().await;
    mount_slow(&server, "GET", 200).await;

    let locks = ResourceLockManager::new();
    let client = create_client(&server, locks.clone());
    let key = ResourceKey::new("st-1").unwrap();

    let request = HttpRequest::builder(HttpMethod::Get, "stores/st-1")
        .resource_key(key.clone())
        .build()
        .unwrap();

    let (result, free_mid_flight) = tokio::join!(client.request(request), async {
        tokio::time::sleep(DELAY / 2).await;
        let mutex = locks.get(&key);
        let free = mutex.try_lock().is_ok();
        free
    });

    assert!(result.is_ok());
    assert!(free_mid_flight);
}

#[tokio::test]
async fn test_keyless_mutations_are_not_serialized() {
    let server = MockServer::start().await;
    mount_slow(&server, "DELETE", 204).await;

    let client = create_client(&server, ResourceLockManager::new());
    let keyless = || {
        HttpRequest::builder(HttpMethod::Delete, "stores/st-1")
            .build()
            .unwrap()
    };

    let started = Instant::now();
    let (a, b) = tokio::join!(client.request(keyless()), client.request(keyless()));

    assert!(a.is_ok() && b.is_ok());
    assert!(started.elapsed() < DELAY * 2);
}

// ============================================================================
// Release On Failure
// ============================================================================

#[tokio::test]
async fn test_lock_released_after_error_response() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/stores/st-1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"errors": "boom"})))
        .mount(&server)
        .await;

    let locks = ResourceLockManager::new();
    let client = create_client(&server, locks.clone());

    let result = client.request(put("stores/st-1", "st-1")).await;

    match result {
        Err(HttpError::Response(err)) => {
            assert_eq!(err.code, 500);
            assert!(err.message.contains("boom"));
        }
        other => panic!("expected a response error, got {other:?}"),
    }
    assert!(locks
        .get(&ResourceKey::new("st-1").unwrap())
        .try_lock()
        .is_ok());
}

#[tokio::test]
async fn test_lock_released_after_transport_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let locks = ResourceLockManager::new();
    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let client = HttpClient::new(&config, locks.clone()).unwrap();

    let result = client.request(put("stores/st-1", "st-1")).await;

    assert!(matches!(result, Err(HttpError::Network(_))));
    assert!(locks
        .get(&ResourceKey::new("st-1").unwrap())
        .try_lock()
        .is_ok());
}

#[tokio::test]
async fn test_pool_reclaims_entries_after_requests() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let locks = ResourceLockManager::new();
    let client = create_client(&server, locks.clone());

    for i in 0..5 {
        let key = format!("st-{i}");
        client
            .request(put(&format!("stores/{key}"), &key))
            .await
            .unwrap();
    }

    assert_eq!(locks.pool().live_len(), 0);
    assert_eq!(locks.pool().prune(), 5);
    assert!(locks.pool().is_empty());
}

//! HTTP client for API communication.
//!
//! This module provides the [`HttpClient`] type. It is the transport side of
//! the per-resource locking contract: mutating requests that name a resource
//! are serialized per resource key.

use std::collections::HashMap;

use crate::clients::errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::{BaseUrl, ClientConfig, PageSize};
use crate::locks::ResourceLockManager;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for making requests to the API.
///
/// The client handles:
/// - URL construction from the configured base URL
/// - Default headers including User-Agent
/// - Per-resource locking of mutating requests
/// - Error serialization for non-2xx responses
///
/// It does not retry; a failed request is returned to the caller as-is.
///
/// # Locking
///
/// A mutating request (anything but GET) whose options carry a
/// [`ResourceKey`](crate::ResourceKey) holds that key's lock from before the
/// request is sent until the response body has been read. The lock is released
/// on every path, including network errors and error responses. Clients built
/// from clones of the same [`ResourceLockManager`] serialize against each
/// other.
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use api_client::{BaseUrl, ClientConfig, ResourceKey, ResourceLockManager};
/// use api_client::clients::{DataType, HttpClient, HttpMethod, HttpRequest};
///
/// let config = ClientConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com")?)
///     .build()?;
/// let client = HttpClient::new(&config, ResourceLockManager::new())?;
///
/// let request = HttpRequest::builder(HttpMethod::Put, "resources/stores/st-1")
///     .body(serde_json::json!({"name": "renamed"}))
///     .body_type(DataType::Json)
///     .resource_key(ResourceKey::new("st-1")?)
///     .build()?;
///
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Base URL relative paths are joined onto.
    base_url: BaseUrl,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Shared per-resource lock pool.
    locks: ResourceLockManager,
    /// Default page-size hint for cursor walks.
    page_size: Option<PageSize>,
    /// Page cap for link-following walks.
    max_link_pages: Option<usize>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL, user agent prefix and timeout
    /// * `locks` - The lock manager shared by every client that may mutate
    ///   the same resources
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying reqwest client cannot
    /// be created (e.g., TLS initialization failure).
    pub fn new(config: &ClientConfig, locks: ResourceLockManager) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}api-client-core v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            default_headers,
            locks,
            page_size: config.page_size(),
            max_link_pages: config.max_link_pages(),
        })
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the lock manager this client serializes through.
    #[must_use]
    pub const fn locks(&self) -> &ResourceLockManager {
        &self.locks
    }

    /// Returns the default page-size hint for cursor walks.
    #[must_use]
    pub const fn page_size(&self) -> Option<PageSize> {
        self.page_size
    }

    /// Returns the page cap for link-following walks.
    #[must_use]
    pub const fn max_link_pages(&self) -> Option<usize> {
        self.max_link_pages
    }

    /// Sends an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = if request.is_absolute() {
            request.path.clone()
        } else {
            self.base_url.join(&request.path)
        };

        let mut headers = self.default_headers.clone();
        if let Some(body_type) = &request.body_type {
            headers.insert(
                "Content-Type".to_string(),
                body_type.as_content_type().to_string(),
            );
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        // Held until the body is read; dropped on every return path.
        let guard = if request.http_method.is_mutating() {
            self.locks.acquire(&request.options).await
        } else {
            None
        };

        tracing::debug!(
            method = %request.http_method,
            url = %url,
            locked = guard.is_some(),
            "sending request"
        );

        let res = req_builder.send().await?;
        let final_url = res.url().to_string();
        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body = res.bytes().await?.to_vec();

        if let Some(guard) = guard {
            guard.release();
        }

        let response = HttpResponse::new(code, res_headers, body).with_url(final_url);

        if let Some(reason) = response.deprecation_reason() {
            tracing::warn!(
                "Deprecated request to {}, received deprecation: {}",
                request.path,
                reason
            );
        }

        if response.is_ok() {
            return Ok(response);
        }

        Err(HttpError::Response(HttpResponseError {
            code,
            message: Self::serialize_error(&response),
            error_reference: response.request_id().map(String::from),
        }))
    }

    /// Sends a GET request to a URL, such as a pagination link.
    ///
    /// Absolute URLs are fetched as given (normalised only); no query parameters are
    /// added. Relative URLs are resolved against the base URL as a directory,
    /// so `events?page=2` under `https://host/v1` becomes
    /// `https://host/v1/events?page=2` and `/events` becomes
    /// `https://host/events`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::InvalidUrl`] if the URL cannot be
    /// resolved, otherwise the same errors as [`request`](Self::request).
    pub async fn get_url(&self, url: impl Into<String>) -> Result<HttpResponse, HttpError> {
        let url = self.resolve_url(&url.into())?;
        let request = HttpRequest::builder(HttpMethod::Get, url).build()?;
        self.request(request).await
    }

    /// Resolves `url` against the base URL treated as a directory.
    fn resolve_url(&self, url: &str) -> Result<String, InvalidHttpRequestError> {
        let invalid = || InvalidHttpRequestError::InvalidUrl {
            url: url.to_string(),
        };
        let base = reqwest::Url::parse(&format!("{}/", self.base_url)).map_err(|_| invalid())?;
        base.join(url).map(String::from).map_err(|_| invalid())
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Serializes the error fields of a response body to a JSON string.
    fn serialize_error(response: &HttpResponse) -> String {
        let body = response.body_json();
        let mut error_body = serde_json::Map::new();

        for field in ["errors", "error", "msg", "detail", "raw_body"] {
            if let Some(value) = body.get(field) {
                error_body.insert(field.to_string(), value.clone());
            }
        }

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config(base: &str) -> ClientConfig {
        ClientConfig::builder()
            .base_url(BaseUrl::new(base).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_construction() {
        let client = HttpClient::new(
            &create_test_config("https://api.example.com/v1"),
            ResourceLockManager::new(),
        )
        .unwrap();

        assert_eq!(client.base_url().as_ref(), "https://api.example.com/v1");
        assert!(client.page_size().is_none());
        assert!(client.max_link_pages().is_none());
    }

    #[test]
    fn test_list_defaults_come_from_config() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::new("https://api.example.com").unwrap())
            .page_size(PageSize::new(100).unwrap())
            .max_link_pages(10)
            .build()
            .unwrap();
        let client = HttpClient::new(&config, ResourceLockManager::new()).unwrap();

        assert_eq!(client.page_size().map(PageSize::get), Some(100));
        assert_eq!(client.max_link_pages(), Some(10));
    }

    #[test]
    fn test_user_agent_header_format() {
        let client = HttpClient::new(
            &create_test_config("https://api.example.com"),
            ResourceLockManager::new(),
        )
        .unwrap();

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.contains("api-client-core v"));
        assert!(user_agent.contains("Rust"));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::new("https://api.example.com").unwrap())
            .user_agent_prefix("MyApp/1.0")
            .build()
            .unwrap();
        let client = HttpClient::new(&config, ResourceLockManager::new()).unwrap();

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("MyApp/1.0 | "));
    }

    #[test]
    fn test_accept_header_is_json() {
        let client = HttpClient::new(
            &create_test_config("https://api.example.com"),
            ResourceLockManager::new(),
        )
        .unwrap();

        assert_eq!(
            client.default_headers().get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_resolve_url_keeps_base_path() {
        let client = HttpClient::new(
            &create_test_config("http://127.0.0.1:8080/api/v1"),
            ResourceLockManager::new(),
        )
        .unwrap();

        assert_eq!(
            client.resolve_url("events?page=2").unwrap(),
            "http://127.0.0.1:8080/api/v1/events?page=2"
        );
        assert_eq!(
            client.resolve_url("/events/page/2").unwrap(),
            "http://127.0.0.1:8080/events/page/2"
        );
        assert_eq!(
            client.resolve_url("https://other.example.com/p2").unwrap(),
            "https://other.example.com/p2"
        );
    }

    #[test]
    fn test_serialize_error_collects_known_fields() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["req-1".to_string()]);
        let body = serde_json::to_vec(&serde_json::json!({
            "msg": "Bad request",
            "detail": "name is required",
            "ignored": true
        }))
        .unwrap();

        let message = HttpClient::serialize_error(&HttpResponse::new(400, headers, body));
        let parsed: serde_json::Value = serde_json::from_str(&message).unwrap();

        assert_eq!(parsed["msg"], "Bad request");
        assert_eq!(parsed["detail"], "name is required");
        assert!(parsed.get("ignored").is_none());
        assert!(parsed["error_reference"]
            .as_str()
            .unwrap()
            .contains("req-1"));
    }

    #[test]
    fn test_clients_share_lock_manager() {
        let locks = ResourceLockManager::new();
        let config = create_test_config("https://api.example.com");
        let a = HttpClient::new(&config, locks.clone()).unwrap();
        let b = HttpClient::new(&config, locks).unwrap();

        let key = crate::ResourceKey::new("k").unwrap();
        assert!(std::sync::Arc::ptr_eq(
            &a.locks().get(&key),
            &b.locks().get(&key)
        ));
    }
}

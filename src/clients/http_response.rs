//! HTTP response types.
//!
//! This module provides the [`HttpResponse`] type for accessing response
//! data. The body is kept as raw bytes so callers can parse it more than once
//! (for example the pagination links and then the typed payload).

use std::collections::HashMap;

use serde::de::DeserializeOwned;

/// An HTTP response.
///
/// Header names are stored lowercase; a header may have multiple values.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers.
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: Vec<u8>,
    /// The final URL the response came from, after redirects.
    pub url: Option<String>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(code: u16, headers: HashMap<String, Vec<String>>, body: Vec<u8>) -> Self {
        Self {
            code,
            headers,
            body,
            url: None,
        }
    }

    /// Records the URL the response came from.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    ///
    /// This ID is useful for debugging and should be included in error reports.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `Deprecation` header value, if present.
    #[must_use]
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.header("deprecation")
    }

    /// Decodes the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Decodes the body as a JSON value.
    ///
    /// An empty body becomes an empty object; a body that is not JSON becomes
    /// `{"raw_body": "<text>"}`.
    #[must_use]
    pub fn body_json(&self) -> serde_json::Value {
        if self.body.is_empty() {
            return serde_json::json!({});
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| {
            serde_json::json!({ "raw_body": String::from_utf8_lossy(&self.body) })
        })
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in pairs {
            map.entry((*name).to_string())
                .or_default()
                .push((*value).to_string());
        }
        map
    }

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        for code in 200..=299 {
            let response = HttpResponse::new(code, HashMap::new(), Vec::new());
            assert!(
                response.is_ok(),
                "Expected is_ok() to be true for code {code}"
            );
        }
    }

    #[test]
    fn test_is_ok_returns_false_for_4xx_and_5xx() {
        for code in [400, 404, 409, 429, 500, 503] {
            assert!(!HttpResponse::new(code, HashMap::new(), Vec::new()).is_ok());
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, headers(&[("x-request-id", "abc-123")]), Vec::new());
        assert_eq!(response.header("X-Request-Id"), Some("abc-123"));
        assert_eq!(response.request_id(), Some("abc-123"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_url_is_unset_until_recorded() {
        let response = HttpResponse::new(200, HashMap::new(), Vec::new());
        assert!(response.url.is_none());

        let response = response.with_url("https://api.example.com/v1/events?page=2");
        assert_eq!(
            response.url.as_deref(),
            Some("https://api.example.com/v1/events?page=2")
        );
    }

    #[test]
    fn test_deprecation_reason_extraction() {
        let response = HttpResponse::new(200, headers(&[("deprecation", "true")]), Vec::new());
        assert_eq!(response.deprecation_reason(), Some("true"));
    }

    #[test]
    fn test_json_decodes_typed_body() {
        #[derive(Deserialize)]
        struct Store {
            id: String,
        }

        let body = serde_json::to_vec(&json!({"id": "st-1"})).unwrap();
        let response = HttpResponse::new(200, HashMap::new(), body);
        let store: Store = response.json().unwrap();
        assert_eq!(store.id, "st-1");
    }

    #[test]
    fn test_body_json_handles_empty_and_invalid_bodies() {
        let response = HttpResponse::new(204, HashMap::new(), Vec::new());
        assert_eq!(response.body_json(), json!({}));

        let response = HttpResponse::new(502, HashMap::new(), b"Bad Gateway".to_vec());
        assert_eq!(response.body_json(), json!({"raw_body": "Bad Gateway"}));
        assert_eq!(response.text(), "Bad Gateway");
    }
}

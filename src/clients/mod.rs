//! HTTP client types.
//!
//! This module provides the transport layer the pagination fetchers in
//! [`crate::rest`] run on, and the place where per-resource locks are taken.
//!
//! - [`HttpClient`]: The async HTTP client
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A response with its raw body
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, PATCH, DELETE)
//! - [`DataType`]: Content types for request bodies
//!
//! # Locking
//!
//! Mutating requests that carry a resource key in their
//! [`RequestOptions`](crate::RequestOptions) are serialized per key through
//! the client's [`ResourceLockManager`](crate::ResourceLockManager). GET
//! requests and requests without a key are never serialized.
//!
//! # Retries
//!
//! None. Every failure is returned to the caller unchanged.

mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;

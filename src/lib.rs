//! # API Client Core
//!
//! Concurrency and pagination primitives for an HTTP API client, plus the
//! async transport they plug into.
//!
//! ## Overview
//!
//! This crate provides:
//! - Per-resource request locks via [`ResourceLockManager`], so mutating
//!   requests against one remote resource never overlap while requests against
//!   different resources run in parallel
//! - A generic cursor paginator, [`Paginator`], driven by any [`PageFetcher`]
//! - A link-following collector, [`LinkFollowingIterator`], for JSON:API
//!   style responses that carry a `links.next` URL
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - An async [`HttpClient`] that applies the locks and backs both paginators
//!   through [`rest::CursorList`] and [`rest::LinkList`]
//!
//! ## Quick Start
//!
//! ```rust
//! use api_client::{BaseUrl, ClientConfig, PageSize};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .page_size(PageSize::new(100).unwrap())
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Locking Mutations
//!
//! ```rust,ignore
//! use api_client::{HttpClient, ResourceKey, ResourceLockManager};
//! use api_client::clients::{DataType, HttpMethod, HttpRequest};
//!
//! // One manager per process; every client that may touch the same
//! // resources shares it.
//! let locks = ResourceLockManager::new();
//! let client = HttpClient::new(&config, locks.clone())?;
//!
//! let request = HttpRequest::builder(HttpMethod::Delete, "resources/stores/kv/st-1/keys/a")
//!     .resource_key(ResourceKey::new("st-1")?)
//!     .build()?;
//! client.request(request).await?;
//! ```
//!
//! ## Cursor Pagination
//!
//! ```rust
//! use api_client::{Page, PageRequest, Paginator};
//!
//! # tokio_test::block_on(async {
//! let data = vec![1, 2, 3, 4, 5];
//! let mut pages = Paginator::with_limit(
//!     |request: PageRequest| {
//!         let start: usize = request.cursor.as_deref().map_or(0, |c| c.parse().unwrap());
//!         let end = (start + 4).min(data.len());
//!         let next = (end < data.len()).then(|| end.to_string());
//!         let items = data[start..end].to_vec();
//!         async move { Ok::<_, std::convert::Infallible>(Page::new(items, next)) }
//!     },
//!     4,
//! );
//!
//! let mut seen = Vec::new();
//! while pages.next().await {
//!     seen.extend_from_slice(pages.items());
//! }
//! assert_eq!(seen, vec![1, 2, 3, 4, 5]);
//! assert!(pages.err().is_none());
//! # });
//! ```
//!
//! ## Link Following
//!
//! ```rust,ignore
//! use api_client::rest::LinkList;
//!
//! let events: Vec<Event> = LinkList::new(&client, "events").list_all().await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: the lock pool is an explicit, injectable handle
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime
//! - **No retries**: every failure is returned to the caller unchanged

pub mod clients;
pub mod config;
pub mod error;
pub mod locks;
pub mod pagination;
pub mod rest;

// Re-export public types at crate root for convenience
pub use config::{BaseUrl, ClientConfig, ClientConfigBuilder, PageSize};
pub use error::ConfigError;

// Re-export lock types
pub use locks::{RequestOptions, ResourceGuard, ResourceKey, ResourceLockManager, WeakMutexPool};

// Re-export HTTP client types
pub use clients::{
    DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError,
};

// Re-export pagination types
pub use pagination::{
    CursorState, JsonApiDocument, LinkFollowError, LinkFollowingIterator, LinkPageFetcher,
    LinkWalk, Page, PageFetcher, PageRequest, PaginationLinks, Paginator,
};

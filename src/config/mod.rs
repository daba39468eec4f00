//! Configuration types for the API client.
//!
//! This module provides the configuration used to construct an
//! [`HttpClient`](crate::clients::HttpClient) and to tune list walks.
//!
//! # Overview
//!
//! - [`ClientConfig`]: The configuration struct holding all client settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: A validated base URL newtype
//! - [`PageSize`]: A validated page-size hint
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use api_client::{BaseUrl, ClientConfig, PageSize};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .timeout(Duration::from_secs(30))
//!     .page_size(PageSize::new(100).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.page_size().map(PageSize::get), Some(100));
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, PageSize};

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for the API client.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Timeouts
///
/// Per-resource locks are held for the whole request/response cycle and never
/// time out on their own. The `timeout` set here is the transport deadline
/// that bounds how long any one holder can keep a resource locked.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: BaseUrl,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
    page_size: Option<PageSize>,
    max_link_pages: Option<usize>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the base URL all relative request paths are joined onto.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the transport timeout applied to every request, if configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the default page-size hint for list walks, if configured.
    #[must_use]
    pub const fn page_size(&self) -> Option<PageSize> {
        self.page_size
    }

    /// Returns the page cap for link-following walks, if configured.
    ///
    /// `None` means the walk ends only when the server stops sending a
    /// `next` link.
    #[must_use]
    pub const fn max_link_pages(&self) -> Option<usize> {
        self.max_link_pages
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `base_url` is required. All other fields default to `None`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<BaseUrl>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
    page_size: Option<PageSize>,
    max_link_pages: Option<usize>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets a prefix prepended to the `User-Agent` header.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the transport timeout for every request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the default page-size hint for list walks.
    #[must_use]
    pub const fn page_size(mut self, size: PageSize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Caps the number of pages a link-following walk may fetch.
    #[must_use]
    pub const fn max_link_pages(mut self, pages: usize) -> Self {
        self.max_link_pages = Some(pages);
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` was not set.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        Ok(ClientConfig {
            base_url,
            user_agent_prefix: self.user_agent_prefix,
            timeout: self.timeout,
            page_size: self.page_size,
            max_link_pages: self.max_link_pages,
        })
    }
}

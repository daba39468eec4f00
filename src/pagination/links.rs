//! Link-based pagination for JSON:API responses.
//!
//! Some endpoints return the next page as an absolute URL in the body's
//! `links.next` field instead of a cursor. [`LinkFollowingIterator`] walks
//! such a chain eagerly and returns every item.

use std::collections::HashSet;
use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The `links` object of a JSON:API document.
///
/// Each link may be a plain URL string or a link object with an `href`
/// member; both forms are read as the URL. Missing, `null` and empty links
/// are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// First page.
    #[serde(default, deserialize_with = "deserialize_link")]
    pub first: Option<String>,
    /// Last page.
    #[serde(default, deserialize_with = "deserialize_link")]
    pub last: Option<String>,
    /// Page after this one.
    #[serde(default, deserialize_with = "deserialize_link")]
    pub next: Option<String>,
    /// Page before this one.
    #[serde(default, deserialize_with = "deserialize_link")]
    pub prev: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkValue {
    Url(String),
    Object { href: Option<String> },
}

fn deserialize_link<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LinkValue>::deserialize(deserializer)?;
    Ok(value
        .and_then(|link| match link {
            LinkValue::Url(url) => Some(url),
            LinkValue::Object { href } => href,
        })
        .filter(|url| !url.is_empty()))
}

#[derive(Deserialize)]
struct LinksOnly {
    #[serde(default)]
    links: Option<PaginationLinks>,
}

impl PaginationLinks {
    /// Reads the `links` object from a response body.
    ///
    /// Only `links` is interpreted; the payload is skipped, so the same bytes
    /// can then be decoded into the typed document. A body without `links`
    /// yields empty links.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON object or `links` is
    /// malformed.
    ///
    /// ```rust
    /// use api_client::pagination::PaginationLinks;
    ///
    /// let body = br#"{"data": [], "links": {"next": "https://api.example.com/events?page=2"}}"#;
    /// let links = PaginationLinks::from_body(body).unwrap();
    /// assert_eq!(links.next_link(), Some("https://api.example.com/events?page=2"));
    /// ```
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: LinksOnly = serde_json::from_slice(body)?;
        Ok(envelope.links.unwrap_or_default())
    }

    /// Returns the next-page URL, if any.
    #[must_use]
    pub fn next_link(&self) -> Option<&str> {
        self.next.as_deref().filter(|url| !url.is_empty())
    }

    /// Returns `true` if a next page is linked.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_link().is_some()
    }

    /// Extracts the query parameter `param` from the next-page URL,
    /// percent-decoded.
    ///
    /// Useful when an endpoint links pages but also accepts the cursor
    /// directly.
    ///
    /// ```rust
    /// use api_client::pagination::PaginationLinks;
    ///
    /// let links = PaginationLinks {
    ///     next: Some("https://api.example.com/events?page%5Bafter%5D=a%2Fb&filter=x".to_string()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(links.next_cursor("page[after]"), Some("a/b".to_string()));
    /// assert_eq!(links.next_cursor("missing"), None);
    /// ```
    #[must_use]
    pub fn next_cursor(&self, param: &str) -> Option<String> {
        let url = self.next_link()?;
        let query_start = url.find('?')?;
        let query = &url[query_start + 1..];
        let query = query.split('#').next().unwrap_or_default();

        query.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = decode_component(parts.next()?);
            let value = decode_component(parts.next().unwrap_or_default());
            (key == param).then_some(value)
        })
    }
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw).map_or_else(|_| raw.clone(), |decoded| decoded.into_owned())
}

/// A JSON:API document whose primary data is a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonApiDocument<T> {
    /// Primary data.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Pagination links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PaginationLinks>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// An endpoint whose pages link to each other through `links.next`.
///
/// Both methods return the raw body; the iterator reads the links and the
/// typed payload from the same bytes.
pub trait LinkPageFetcher {
    /// Error returned by a failed fetch.
    type Error;

    /// Fetches the first page, applying the caller's filters.
    fn fetch_initial(&mut self) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;

    /// Fetches the page at `url` exactly as given.
    ///
    /// The URL already carries the original filters; implementors must not
    /// add them again.
    fn fetch_by_url(
        &mut self,
        url: String,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;

    /// Returns the URL of the page fetched last, if known.
    ///
    /// Used to recognise a `next` link that points back at a page already
    /// seen, including the first one.
    fn page_url(&self) -> Option<String> {
        None
    }

    /// Turns a `next` link into the URL to fetch.
    ///
    /// The default returns the link unchanged. Fetchers that know the URL of
    /// the current page resolve relative links against it.
    fn resolve_link(&self, link: &str) -> String {
        link.to_string()
    }
}

/// Errors from a link-following walk.
#[derive(Debug, Error)]
pub enum LinkFollowError<E> {
    /// A page request failed.
    #[error("failed to fetch page: {0}")]
    Fetch(#[source] E),

    /// A page body could not be decoded.
    #[error("failed to decode page: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server linked to a page already fetched in this walk.
    #[error("next link '{url}' was already visited")]
    RepeatedLink {
        /// The repeated URL.
        url: String,
    },

    /// The walk reached the configured page cap with more pages linked.
    #[error("stopped after {max_pages} pages with more pages still linked")]
    PageLimitExceeded {
        /// The configured cap.
        max_pages: usize,
    },
}

/// The result of a completed link-following walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkWalk<T> {
    /// Items from every page, in page order.
    pub items: Vec<T>,
    /// Number of pages fetched, including the first.
    pub pages: usize,
}

/// Follows `links.next` from the first page until the server stops linking.
///
/// Unlike [`Paginator`](super::Paginator) this is eager: [`collect`](Self::collect)
/// returns every item from every page at once.
///
/// The walk ends when a page has no `next` link. It is aborted with an error
/// if a `next` URL repeats, or if more pages are linked after an optional
/// [`max_pages`](Self::max_pages) cap has been reached.
///
/// # Example
///
/// ```rust,ignore
/// use api_client::pagination::LinkFollowingIterator;
/// use api_client::rest::LinkList;
///
/// let events: Vec<Event> = LinkFollowingIterator::new(LinkList::new(&client, "events"))
///     .collect()
///     .await?;
/// ```
pub struct LinkFollowingIterator<T, F> {
    fetcher: F,
    max_pages: Option<usize>,
    _items: PhantomData<fn() -> T>,
}

impl<T, F> LinkFollowingIterator<T, F>
where
    T: DeserializeOwned,
    F: LinkPageFetcher,
{
    /// Creates an iterator with no page cap.
    #[must_use]
    pub const fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_pages: None,
            _items: PhantomData,
        }
    }

    /// Caps the walk at `max_pages` pages.
    #[must_use]
    pub const fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Sets or clears the page cap.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Walks every page and returns all items.
    ///
    /// # Errors
    ///
    /// See [`collect_with_stats`](Self::collect_with_stats).
    pub async fn collect(self) -> Result<Vec<T>, LinkFollowError<F::Error>> {
        Ok(self.collect_with_stats().await?.items)
    }

    /// Walks every page and returns all items plus the page count.
    ///
    /// # Errors
    ///
    /// - [`LinkFollowError::Fetch`] if any page request fails
    /// - [`LinkFollowError::Decode`] if a body is not a valid document
    /// - [`LinkFollowError::RepeatedLink`] if a `next` URL repeats
    /// - [`LinkFollowError::PageLimitExceeded`] if the cap is hit with more
    ///   pages linked
    pub async fn collect_with_stats(mut self) -> Result<LinkWalk<T>, LinkFollowError<F::Error>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();

        let mut body = self
            .fetcher
            .fetch_initial()
            .await
            .map_err(LinkFollowError::Fetch)?;
        let mut pages = 1;
        if let Some(url) = self.fetcher.page_url() {
            visited.insert(url);
        }

        loop {
            let links = PaginationLinks::from_body(&body)?;
            let document: JsonApiDocument<T> = serde_json::from_slice(&body)?;
            items.extend(document.data);

            let Some(next) = links.next_link().map(|link| self.fetcher.resolve_link(link)) else {
                break;
            };

            if let Some(max_pages) = self.max_pages {
                if pages >= max_pages {
                    tracing::warn!(max_pages, next = %next, "link walk reached page limit");
                    return Err(LinkFollowError::PageLimitExceeded { max_pages });
                }
            }

            if !visited.insert(next.clone()) {
                tracing::warn!(url = %next, "link walk found a repeated next link");
                return Err(LinkFollowError::RepeatedLink { url: next });
            }

            pages += 1;
            tracing::debug!(page = pages, url = %next, "following next link");
            body = self
                .fetcher
                .fetch_by_url(next)
                .await
                .map_err(LinkFollowError::Fetch)?;
            if let Some(url) = self.fetcher.page_url() {
                visited.insert(url);
            }
        }

        tracing::debug!(pages, items = items.len(), "link walk complete");
        Ok(LinkWalk { items, pages })
    }
}

//! Cursor-based pagination.
//!
//! Endpoints that page with an opaque continuation token implement
//! [`PageFetcher`]; [`Paginator`] turns any of them into the same
//! `next()` / `items()` / `err()` walk.

use std::fmt;
use std::future::Future;

/// What a single page fetch receives.
///
/// `cursor` is `None` for the first page. `limit` is the caller's page-size
/// hint and stays the same for the whole walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Continuation token from the previous page.
    pub cursor: Option<String>,
    /// Page-size hint forwarded to the remote side.
    pub limit: Option<u32>,
}

/// One page of results plus the token for the page after it.
///
/// A missing or empty `next_cursor` means this is the last page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page. May be empty even when more pages follow.
    pub items: Vec<T>,
    /// Continuation token for the next page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page, treating an empty cursor as "no more pages".
    ///
    /// ```rust
    /// use api_client::pagination::Page;
    ///
    /// let page = Page::new(vec![1, 2], Some(String::new()));
    /// assert!(page.is_last());
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|cursor| !cursor.is_empty()),
        }
    }

    /// Creates the final page of a result set.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// Returns `true` if no page follows this one.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_cursor.as_deref().map_or(true, str::is_empty)
    }
}

/// Where a [`Paginator`] is in its walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    /// Token to send with the next request; `None` before the first page.
    pub cursor: Option<String>,
    /// Set once the last page was delivered or a fetch failed.
    pub exhausted: bool,
}

/// A list endpoint that pages with an opaque cursor.
///
/// The implementor owns whatever filters the endpoint takes; only the cursor
/// and limit change between calls.
///
/// Closures of the form `FnMut(PageRequest) -> impl Future<Output = Result<Page<T>, E>>`
/// implement this trait, which keeps tests and one-off endpoints short.
pub trait PageFetcher<T> {
    /// Error returned by a failed fetch.
    type Error;

    /// Fetches the page starting at `request.cursor`.
    fn fetch_page(
        &mut self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<T>, Self::Error>> + Send;
}

impl<T, E, F, Fut> PageFetcher<T> for F
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>> + Send,
{
    type Error = E;

    fn fetch_page(
        &mut self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<T>, Self::Error>> + Send {
        self(request)
    }
}

/// Lazily walks a cursor-paged result set one page at a time.
///
/// Each successful [`next`](Self::next) replaces [`items`](Self::items) with
/// the page just fetched; callers that want everything accumulate it
/// themselves or use [`collect_all`](Self::collect_all).
///
/// After the last page, or after the first failed fetch, `next` keeps
/// returning `false` without touching the network. A failure stays available
/// from [`err`](Self::err); retrying means building a new paginator.
///
/// Calls to `next` must not overlap; the `&mut self` receiver enforces this.
///
/// # Example
///
/// ```rust
/// use api_client::pagination::{Page, PageRequest, Paginator};
///
/// # tokio_test::block_on(async {
/// let mut paginator = Paginator::new(|request: PageRequest| async move {
///     let page = match request.cursor.as_deref() {
///         None => Page::new(vec![1, 2, 3, 4], Some("p2".to_string())),
///         Some(_) => Page::last(vec![5]),
///     };
///     Ok::<_, std::io::Error>(page)
/// });
///
/// let mut all = Vec::new();
/// while paginator.next().await {
///     all.extend_from_slice(paginator.items());
/// }
///
/// assert_eq!(all, vec![1, 2, 3, 4, 5]);
/// assert!(paginator.err().is_none());
/// # });
/// ```
pub struct Paginator<T, F: PageFetcher<T>> {
    fetcher: F,
    state: CursorState,
    limit: Option<u32>,
    items: Vec<T>,
    last_err: Option<F::Error>,
    pages_fetched: usize,
}

impl<T, F: PageFetcher<T>> Paginator<T, F> {
    /// Creates a paginator that starts at the first page.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            state: CursorState::default(),
            limit: None,
            items: Vec::new(),
            last_err: None,
            pages_fetched: 0,
        }
    }

    /// Creates a paginator that sends `limit` as the page-size hint on every
    /// request.
    #[must_use]
    pub fn with_limit(fetcher: F, limit: u32) -> Self {
        let mut paginator = Self::new(fetcher);
        paginator.limit = Some(limit);
        paginator
    }

    /// Fetches the next page.
    ///
    /// Returns `true` when a page (possibly empty) was fetched. Returns
    /// `false`, with [`items`](Self::items) cleared, once the walk is over or
    /// a fetch failed.
    pub async fn next(&mut self) -> bool {
        if self.state.exhausted {
            self.items.clear();
            return false;
        }

        let request = PageRequest {
            cursor: self.state.cursor.clone(),
            limit: self.limit,
        };

        match self.fetcher.fetch_page(request).await {
            Ok(page) => {
                self.pages_fetched += 1;
                match page.next_cursor.filter(|cursor| !cursor.is_empty()) {
                    Some(cursor) => self.state.cursor = Some(cursor),
                    None => self.state.exhausted = true,
                }
                tracing::debug!(
                    page = self.pages_fetched,
                    items = page.items.len(),
                    has_more = !self.state.exhausted,
                    "fetched page"
                );
                self.items = page.items;
                true
            }
            Err(err) => {
                tracing::debug!(page = self.pages_fetched + 1, "page fetch failed");
                self.items.clear();
                self.last_err = Some(err);
                self.state.exhausted = true;
                false
            }
        }
    }

    /// Returns the items of the most recently fetched page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Moves the current page's items out, leaving the page empty.
    pub fn take_items(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }

    /// Returns the error that ended the walk early, if any.
    ///
    /// `None` after a clean end of results.
    #[must_use]
    pub const fn err(&self) -> Option<&F::Error> {
        self.last_err.as_ref()
    }

    /// Consumes the paginator and returns the error that ended it, if any.
    #[must_use]
    pub fn into_err(self) -> Option<F::Error> {
        self.last_err
    }

    /// Returns `true` once `next` will no longer fetch.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.state.exhausted
    }

    /// Returns the cursor the next fetch will send.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.state.cursor.as_deref()
    }

    /// Returns the current cursor state.
    #[must_use]
    pub const fn state(&self) -> &CursorState {
        &self.state
    }

    /// Returns the number of pages fetched successfully so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Returns the page-size hint, if one was set.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Walks every remaining page and returns all items in order.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error. Items from earlier pages are discarded.
    pub async fn collect_all(mut self) -> Result<Vec<T>, F::Error> {
        let mut all = Vec::new();
        while self.next().await {
            all.append(&mut self.items);
        }
        self.last_err.map_or(Ok(all), Err)
    }
}

impl<T, F: PageFetcher<T>> fmt::Debug for Paginator<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("state", &self.state)
            .field("limit", &self.limit)
            .field("items", &self.items.len())
            .field("failed", &self.last_err.is_some())
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}

/// Fetches every page from `fetcher` and returns all items.
///
/// The one-shot form of [`Paginator`].
///
/// # Errors
///
/// Returns the first fetch error.
pub async fn list_all<T, F>(fetcher: F, limit: Option<u32>) -> Result<Vec<T>, F::Error>
where
    F: PageFetcher<T>,
{
    let paginator = match limit {
        Some(limit) => Paginator::with_limit(fetcher, limit),
        None => Paginator::new(fetcher),
    };
    paginator.collect_all().await
}

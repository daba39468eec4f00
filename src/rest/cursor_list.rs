//! HTTP-backed cursor list endpoint.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest};
use crate::pagination::{Page, PageFetcher, PageRequest, Paginator};

/// Query parameter the cursor is sent in by default.
pub const DEFAULT_CURSOR_PARAM: &str = "cursor";

/// Query parameter the page-size hint is sent in by default.
pub const DEFAULT_LIMIT_PARAM: &str = "limit";

#[derive(Deserialize)]
struct CursorListBody<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    meta: Option<CursorListMeta>,
}

#[derive(Deserialize)]
struct CursorListMeta {
    #[serde(default)]
    next_cursor: Option<String>,
}

/// A cursor-paged list endpoint reached through [`HttpClient`].
///
/// Each page is a GET to `path` with the fixed filters plus the cursor and
/// limit parameters. The response must look like:
///
/// ```json
/// { "data": [ ... ], "meta": { "next_cursor": "..." } }
/// ```
///
/// A missing `meta`, a missing `next_cursor` or an empty one marks the last
/// page.
///
/// # Example
///
/// ```rust,ignore
/// use api_client::rest::CursorList;
///
/// let mut keys = CursorList::<String>::new(&client, "resources/stores/kv/st-1/keys")
///     .filter("prefix", "user/")
///     .paginator();
///
/// while keys.next().await {
///     for key in keys.items() {
///         println!("{key}");
///     }
/// }
/// if let Some(err) = keys.err() {
///     eprintln!("listing failed: {err}");
/// }
/// ```
pub struct CursorList<'a, T> {
    client: &'a HttpClient,
    path: String,
    filters: HashMap<String, String>,
    cursor_param: String,
    limit_param: String,
    _items: PhantomData<fn() -> T>,
}

impl<'a, T> CursorList<'a, T> {
    /// Creates a list request for `path` with no filters.
    #[must_use]
    pub fn new(client: &'a HttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            filters: HashMap::new(),
            cursor_param: DEFAULT_CURSOR_PARAM.to_string(),
            limit_param: DEFAULT_LIMIT_PARAM.to_string(),
            _items: PhantomData,
        }
    }

    /// Adds a filter sent unchanged with every page request.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Sets the query parameter the cursor is sent in.
    #[must_use]
    pub fn cursor_param(mut self, name: impl Into<String>) -> Self {
        self.cursor_param = name.into();
        self
    }

    /// Sets the query parameter the page-size hint is sent in.
    #[must_use]
    pub fn limit_param(mut self, name: impl Into<String>) -> Self {
        self.limit_param = name.into();
        self
    }

    /// Returns the fixed filters.
    #[must_use]
    pub const fn filters(&self) -> &HashMap<String, String> {
        &self.filters
    }

    fn page_request(&self, request: &PageRequest) -> HttpRequest {
        let mut query = self.filters.clone();
        if let Some(cursor) = &request.cursor {
            query.insert(self.cursor_param.clone(), cursor.clone());
        }
        if let Some(limit) = request.limit {
            query.insert(self.limit_param.clone(), limit.to_string());
        }

        HttpRequest {
            http_method: HttpMethod::Get,
            path: self.path.clone(),
            body: None,
            body_type: None,
            query: (!query.is_empty()).then_some(query),
            extra_headers: None,
            options: crate::RequestOptions::new(),
        }
    }
}

impl<'a, T> CursorList<'a, T>
where
    T: DeserializeOwned + Send,
{
    /// Turns this list into a [`Paginator`] using the client's default page
    /// size.
    #[must_use]
    pub fn paginator(self) -> Paginator<T, Self> {
        match self.client.page_size() {
            Some(size) => Paginator::with_limit(self, size.get()),
            None => Paginator::new(self),
        }
    }

    /// Fetches every page and returns all items.
    ///
    /// # Errors
    ///
    /// Returns the first [`HttpError`] encountered.
    pub async fn list_all(self) -> Result<Vec<T>, HttpError> {
        self.paginator().collect_all().await
    }
}

impl<T> PageFetcher<T> for CursorList<'_, T>
where
    T: DeserializeOwned + Send,
{
    type Error = HttpError;

    fn fetch_page(
        &mut self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<T>, HttpError>> + Send {
        let http_request = self.page_request(&request);
        let client = self.client;

        async move {
            let response = client.request(http_request).await?;
            let body: CursorListBody<T> = response.json()?;
            let next_cursor = body.meta.and_then(|meta| meta.next_cursor);
            Ok(Page::new(body.data, next_cursor))
        }
    }
}

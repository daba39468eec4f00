//! HTTP-backed link-paged list endpoint.

use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;

use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest};
use crate::pagination::{LinkFollowError, LinkFollowingIterator, LinkPageFetcher};

/// A JSON:API list endpoint whose pages link to each other, reached through
/// [`HttpClient`].
///
/// The first request is a GET to `path` with the filters as query
/// parameters. Every later request is a GET to the `links.next` URL as the
/// server sent it; the filters are not added again because the server
/// already embedded them. A relative `next` link is resolved against the URL
/// of the page that contained it.
///
/// # Example
///
/// ```rust,ignore
/// use api_client::rest::LinkList;
///
/// let events: Vec<Event> = LinkList::new(&client, "events")
///     .filter("filter[event_type]", "purge")
///     .filter("page[size]", "100")
///     .list_all()
///     .await?;
/// ```
#[derive(Debug)]
pub struct LinkList<'a> {
    client: &'a HttpClient,
    path: String,
    filters: HashMap<String, String>,
    page_url: Option<String>,
}

impl<'a> LinkList<'a> {
    /// Creates a list request for `path` with no filters.
    #[must_use]
    pub fn new(client: &'a HttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            filters: HashMap::new(),
            page_url: None,
        }
    }

    /// Adds a filter sent with the first request.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Turns this list into a [`LinkFollowingIterator`] capped at the
    /// client's configured page limit, if any.
    #[must_use]
    pub fn iterator<T: DeserializeOwned>(self) -> LinkFollowingIterator<T, Self> {
        let max_pages = self.client.max_link_pages();
        LinkFollowingIterator::new(self).with_max_pages(max_pages)
    }

    /// Follows every page and returns all items.
    ///
    /// # Errors
    ///
    /// See [`LinkFollowingIterator::collect_with_stats`].
    pub async fn list_all<T: DeserializeOwned>(self) -> Result<Vec<T>, LinkFollowError<HttpError>> {
        self.iterator().collect().await
    }

    fn initial_request(&self) -> HttpRequest {
        HttpRequest {
            http_method: HttpMethod::Get,
            path: self.path.clone(),
            body: None,
            body_type: None,
            query: (!self.filters.is_empty()).then(|| self.filters.clone()),
            extra_headers: None,
            options: crate::RequestOptions::new(),
        }
    }
}

impl LinkPageFetcher for LinkList<'_> {
    type Error = HttpError;

    fn fetch_initial(&mut self) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send {
        let request = self.initial_request();
        let client = self.client;
        let page_url = &mut self.page_url;
        async move {
            let response = client.request(request).await?;
            *page_url = response.url;
            Ok(response.body)
        }
    }

    fn fetch_by_url(
        &mut self,
        url: String,
    ) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send {
        let client = self.client;
        let page_url = &mut self.page_url;
        async move {
            let response = client.get_url(url).await?;
            *page_url = response.url;
            Ok(response.body)
        }
    }

    fn page_url(&self) -> Option<String> {
        self.page_url.clone()
    }

    fn resolve_link(&self, link: &str) -> String {
        self.page_url
            .as_deref()
            .and_then(|page| reqwest::Url::parse(page).ok())
            .and_then(|page| page.join(link).ok())
            .map_or_else(|| link.to_string(), String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BaseUrl, ClientConfig, ResourceLockManager};

    fn client() -> HttpClient {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::new("https://api.example.com").unwrap())
            .build()
            .unwrap();
        HttpClient::new(&config, ResourceLockManager::new()).unwrap()
    }

    #[test]
    fn test_initial_request_carries_filters() {
        let client = client();
        let list = LinkList::new(&client, "events").filter("filter[event_type]", "purge");

        let request = list.initial_request();
        assert_eq!(request.path, "events");
        assert_eq!(
            request.query.unwrap().get("filter[event_type]"),
            Some(&"purge".to_string())
        );
    }

    #[test]
    fn test_relative_links_resolve_against_current_page() {
        let client = client();
        let mut list = LinkList::new(&client, "events");
        assert_eq!(list.resolve_link("events?page=2"), "events?page=2");

        list.page_url = Some("https://api.example.com/v1/events?page=1".to_string());
        assert_eq!(
            list.resolve_link("events?page=2"),
            "https://api.example.com/v1/events?page=2"
        );
        assert_eq!(
            list.resolve_link("?page=3"),
            "https://api.example.com/v1/events?page=3"
        );
        assert_eq!(
            list.resolve_link("/events?page=4"),
            "https://api.example.com/events?page=4"
        );
    }

    #[test]
    fn test_initial_request_without_filters_has_no_query() {
        let client = client();
        let request = LinkList::new(&client, "events").initial_request();
        assert!(request.query.is_none());
    }
}

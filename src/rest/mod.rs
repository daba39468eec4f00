//! List endpoints backed by [`HttpClient`](crate::HttpClient).
//!
//! This module connects the transport to the two pagination styles in
//! [`crate::pagination`]:
//!
//! - **[`CursorList`]**: a list endpoint that returns `data` plus an opaque
//!   `meta.next_cursor`; it implements [`PageFetcher`](crate::pagination::PageFetcher)
//!   and drives a [`Paginator`](crate::pagination::Paginator).
//! - **[`LinkList`]**: a JSON:API list endpoint whose responses carry a
//!   `links.next` URL; it implements
//!   [`LinkPageFetcher`](crate::pagination::LinkPageFetcher) and drives a
//!   [`LinkFollowingIterator`](crate::pagination::LinkFollowingIterator).
//!
//! List requests are GETs and never take a resource lock.

mod cursor_list;
mod link_list;

pub use cursor_list::{CursorList, DEFAULT_CURSOR_PARAM, DEFAULT_LIMIT_PARAM};
pub use link_list::LinkList;

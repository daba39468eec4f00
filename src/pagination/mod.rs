//! Pagination for list endpoints.
//!
//! Two protocols are supported:
//!
//! - **Cursor pagination** ([`Paginator`]): each response carries an opaque
//!   continuation token that is sent back on the next request. The walk is
//!   lazy, one page per [`Paginator::next`] call.
//! - **Link pagination** ([`LinkFollowingIterator`]): each JSON:API response
//!   carries the absolute URL of the next page in `links.next`. The walk is
//!   eager and returns all items at once.
//!
//! Endpoints plug in by implementing [`PageFetcher`] or [`LinkPageFetcher`];
//! the HTTP-backed implementations live in [`crate::rest`].
//!
//! # Termination
//!
//! A cursor walk ends on the first page without a continuation token, even
//! if that page is empty. Empty pages that still carry a token are not the
//! end. A link walk ends on the first page without a `next` link.
//!
//! # Errors
//!
//! Neither walk retries. The first failed fetch ends the walk and is reported
//! as-is.

mod cursor;
mod links;

pub use cursor::{list_all, CursorState, Page, PageFetcher, PageRequest, Paginator};
pub use links::{
    JsonApiDocument, LinkFollowError, LinkFollowingIterator, LinkPageFetcher, LinkWalk,
    PaginationLinks,
};

//! Pagination query parameters
//!
//! Paged routes take `page` (zero-based, default 0) and `limit` (required,
//! at least 1) from the query string and hand a validated [`PageParams`] to
//! the catalog.

use serde::Deserialize;
use songlib_common::PageParams;

/// Raw `page`/`limit` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TryFrom<PageQuery> for PageParams {
    type Error = songlib_common::Error;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        PageParams::from_query(query.page, query.limit)
    }
}

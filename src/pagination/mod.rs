//! Cursor-based pagination shared by every listing.
//!
//! - `cursor`: opaque base64url tokens carrying `(sort value, id)`
//! - `request`: `limit` / `sort_dir` / `cursor` parsing with bounds
//! - `sort`: allow-listed sort keys mapped to static SQL expressions
//! - `keyset`: ORDER BY, resume predicate and page assembly

pub mod cursor;
pub mod keyset;
pub mod request;
pub mod sort;

pub use cursor::{decode_cursor, encode_cursor, CursorToken, CursorValue};
pub use keyset::{KeysetQuery, Page, ParamList, SORT_VALUE_COLUMN};
pub use request::{parse_pagination, PageLimits, PaginationRequest, RequestQuery, SortDirection};
pub use sort::{sanitize_sort_by, SortSpec, SortTable};

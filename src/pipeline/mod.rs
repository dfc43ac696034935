//! In-memory search, filtering, sorting and paging of fetched places.
//!
//! Everything here is a pure function of its inputs except
//! [`PlaceResults::refresh`], which goes through the gateway.

pub mod filters;
pub mod paginate;
pub mod results;
pub mod search;
pub mod sort;
pub mod types;

pub use filters::apply_filters;
pub use paginate::{clamp_page, paginate, total_pages};
pub use results::{fetch_search, PlaceResults, SearchOutcome, SearchSequencer, SearchTicket, DEFAULT_PAGE_SIZE};
pub use search::apply_text_search;
pub use sort::{apply_category, featured, sort_by_category};
pub use types::{Category, FilterCriteria};

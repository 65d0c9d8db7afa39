//! Listing data for a bilingual (Arabic/English) rental site: cached lookup
//! collections, paginated property retrieval and in-memory filtering.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;

pub use api::{FetchMode, ListingSession, LookupRegistry, PropertyFetcher, PropertyFilters};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use models::{Language, LookupItem, LookupKind, PaginatedResponse, Property};
pub use store::Store;

pub mod client;
pub mod lookup;
pub mod properties;
pub mod traits;
pub mod types;

pub use client::HttpClient;
pub use lookup::{CachePolicy, LookupRegistry, LookupStatus};
pub use properties::{FetchMode, ListingSession, PropertyFetcher};
pub use traits::ApiTransport;
pub use types::PropertyFilters;

use crate::error::ApiResult;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Convert a JSON body into `T`, reporting shape mismatches as decode errors
pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    Ok(serde_json::from_value(body)?)
}

use crate::api::traits::ApiTransport;
use crate::api::types::PropertyFilters;
use crate::api::decode;
use crate::error::{ApiError, ApiResult};
use crate::filter::filtered_view;
use crate::models::{PaginatedResponse, Property};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PROPERTIES_PATH: &str = "/consumer/GetAllProperty";
pub const PROPERTY_DETAIL_PATH: &str = "/consumer/GetPropertyById";

/// Listing pages scanned for a property missing from the current session
pub const DETAIL_SCAN_PAGES: u32 = 10;

/// Where listing filters are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Pull every page unfiltered and filter in memory
    #[default]
    ClientFiltered,
    /// Send the filters as query parameters and trust the server's result
    ServerFiltered,
}

/// Retrieves listing pages and single listings.
///
/// Failures are returned to the caller untouched; paging is user-retriable,
/// so there is no retry here.
#[derive(Clone)]
pub struct PropertyFetcher {
    transport: Arc<dyn ApiTransport>,
    default_page_size: u32,
}

impl PropertyFetcher {
    pub fn new(transport: Arc<dyn ApiTransport>, default_page_size: u32) -> Self {
        Self {
            transport,
            default_page_size,
        }
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Fetch page `page` of `size` listings, forwarding `filters` on the wire
    /// when given.
    pub async fn get_page(
        &self,
        page: u32,
        size: u32,
        filters: Option<&PropertyFilters>,
    ) -> ApiResult<PaginatedResponse<Property>> {
        if size == 0 {
            return Err(ApiError::Config("page size must be positive".into()));
        }

        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("size".to_string(), size.to_string()),
        ];
        if let Some(filters) = filters {
            query.extend(filters.to_query());
        }

        debug!(page, size, source = self.transport.source_name(), "Fetching listing page");
        let body = self.transport.get_json(PROPERTIES_PATH, &query).await?;
        decode(body)
    }

    pub async fn get_property(&self, id: i64) -> ApiResult<Property> {
        let path = format!("{PROPERTY_DETAIL_PATH}/{id}");
        let body = self.transport.get_json(&path, &[]).await?;
        decode(body)
    }

    /// Page through the unfiltered listing looking for `id`, giving up after
    /// `max_pages` pages or at the last page.
    pub async fn scan_for(&self, id: i64, max_pages: u32) -> ApiResult<Property> {
        let mut session = self.session(FetchMode::ClientFiltered, PropertyFilters::default());
        for _ in 0..max_pages {
            let Some(page) = session.fetch_next().await? else {
                break;
            };
            if let Some(found) = page.content.iter().find(|p| p.id == id) {
                return Ok(found.clone());
            }
        }
        Err(ApiError::NotFound(format!("property {id}")))
    }

    /// Start a new paging session over the listing endpoint
    pub fn session(&self, mode: FetchMode, filters: PropertyFilters) -> ListingSession {
        ListingSession {
            fetcher: self.clone(),
            mode,
            filters,
            page_size: self.default_page_size,
            cursor: Some(0),
            pages: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// Accumulates listing pages for one browsing session.
///
/// Pages are requested strictly in order from a session-owned cursor that
/// advances by one per page received; nothing is requested once a page
/// reports `last`.
pub struct ListingSession {
    fetcher: PropertyFetcher,
    mode: FetchMode,
    filters: PropertyFilters,
    page_size: u32,
    /// Index of the next page to request, `None` when exhausted
    cursor: Option<u32>,
    pages: Vec<PaginatedResponse<Property>>,
    items: Vec<Property>,
}

impl ListingSession {
    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn filters(&self) -> &PropertyFilters {
        &self.filters
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    pub fn has_next(&self) -> bool {
        self.cursor.is_some()
    }

    /// Fetch the next page. Returns `None` once the last page has been seen.
    /// On error the session is left as it was so the call can be retried.
    pub async fn fetch_next(&mut self) -> ApiResult<Option<&PaginatedResponse<Property>>> {
        let Some(index) = self.cursor else {
            return Ok(None);
        };

        let wire_filters = match self.mode {
            FetchMode::ServerFiltered => Some(&self.filters),
            FetchMode::ClientFiltered => None,
        };
        let page = self
            .fetcher
            .get_page(index, self.page_size, wire_filters)
            .await?;

        if page.number != index {
            warn!(requested = index, returned = page.number, "Server renumbered page");
        }

        self.cursor = if page.last {
            None
        } else {
            let next = index.checked_add(1);
            if next.is_none() {
                warn!(index, "Page index space exhausted, stopping");
            }
            next
        };

        self.items.extend(page.content.iter().cloned());
        self.pages.push(page);
        Ok(self.pages.last())
    }

    /// Keep fetching until the server reports the last page. Returns the
    /// number of pages fetched by this call.
    pub async fn fetch_all(&mut self) -> ApiResult<usize> {
        let mut fetched = 0;
        while self.fetch_next().await?.is_some() {
            fetched += 1;
        }
        info!(
            pages = self.pages.len(),
            properties = self.items.len(),
            "Listing session fully loaded"
        );
        Ok(fetched)
    }

    pub fn pages(&self) -> &[PaginatedResponse<Property>] {
        &self.pages
    }

    /// Every property fetched so far, unfiltered
    pub fn properties(&self) -> &[Property] {
        &self.items
    }

    /// Already fetched property with `id`, regardless of filters
    pub fn find(&self, id: i64) -> Option<&Property> {
        self.items.iter().find(|p| p.id == id)
    }

    /// What the listing page shows: the accumulated properties, filtered in
    /// memory in client mode. `None` until the first page has arrived.
    pub fn visible(&self) -> Option<PaginatedResponse<Property>> {
        let template = self.pages.first()?;
        let view = match self.mode {
            FetchMode::ClientFiltered => filtered_view(template, &self.items, &self.filters),
            FetchMode::ServerFiltered => PaginatedResponse {
                content: self.items.clone(),
                ..template.clone()
            },
        };
        Some(view)
    }

    /// Replace the filters. Client mode re-derives the view from what is
    /// already loaded; server mode starts over because the fetched pages
    /// belong to the old query.
    pub fn set_filters(&mut self, filters: PropertyFilters) {
        if self.mode == FetchMode::ServerFiltered && filters.to_query() != self.filters.to_query() {
            self.reset();
        }
        self.filters = filters;
    }

    pub fn reset(&mut self) {
        self.cursor = Some(0);
        self.pages.clear();
        self.items.clear();
    }
}

use crate::api::lookup::PropertyLabels;
use crate::api::properties::DETAIL_SCAN_PAGES;
use crate::api::{
    ApiTransport, CachePolicy, FetchMode, HttpClient, ListingSession, LookupRegistry,
    PropertyFetcher, PropertyFilters,
};
use crate::config::Config;
use crate::error::ApiResult;
use crate::models::{Language, LookupKind, Property};
use std::sync::Arc;
use tracing::{info, warn};

/// Session-wide state shared by every view: display language, lookup cache
/// and listing fetcher.
///
/// Built once with [`Store::init`] and handed to consumers by reference.
/// [`Store::teardown`] ends its lifetime; fetches still in flight at that
/// point are discarded.
pub struct Store {
    config: Config,
    language: Language,
    registry: LookupRegistry,
    fetcher: PropertyFetcher,
}

impl Store {
    /// Build a store talking HTTP to `config.base_url`
    pub fn init(config: Config, language: Language) -> ApiResult<Self> {
        let transport = Arc::new(HttpClient::new(&config)?);
        Ok(Self::with_transport(
            transport,
            config,
            language,
            CachePolicy::default(),
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn ApiTransport>,
        config: Config,
        language: Language,
        policy: CachePolicy,
    ) -> Self {
        let registry = LookupRegistry::new(transport.clone(), policy);
        let fetcher = PropertyFetcher::new(transport, config.default_page_size);

        Self {
            config,
            language,
            registry,
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Switch between Arabic and English, returning the new language
    pub fn toggle_language(&mut self) -> Language {
        self.language = self.language.toggled();
        self.language
    }

    pub fn registry(&self) -> &LookupRegistry {
        &self.registry
    }

    pub fn fetcher(&self) -> &PropertyFetcher {
        &self.fetcher
    }

    /// Paging session in the default, client-filtered mode
    pub fn listing_session(&self, filters: PropertyFilters) -> ListingSession {
        self.fetcher.session(FetchMode::default(), filters)
    }

    pub fn listing_session_with_mode(
        &self,
        mode: FetchMode,
        filters: PropertyFilters,
    ) -> ListingSession {
        self.fetcher.session(mode, filters)
    }

    /// Warm the lookup kinds nearly every page needs. Returns how many
    /// loaded; failures are already recorded per kind.
    pub async fn preload_critical(&self) -> usize {
        let results = self.registry.load_many(&LookupKind::CRITICAL).await;
        let loaded = results.iter().filter(|(_, r)| r.is_ok()).count();

        for (kind, result) in &results {
            if let Err(err) = result {
                warn!(%kind, "Critical lookup data unavailable: {}", err);
            }
        }
        info!(loaded, total = results.len(), "Critical lookup data preloaded");
        loaded
    }

    /// Property for a detail view. A listing already loaded by `session` is
    /// reused; otherwise the unfiltered listing is scanned page by page.
    pub async fn resolve_property(
        &self,
        id: i64,
        session: Option<&ListingSession>,
    ) -> ApiResult<Property> {
        if let Some(found) = session.and_then(|s| s.find(id)) {
            return Ok(found.clone());
        }
        self.fetcher.scan_for(id, DETAIL_SCAN_PAGES).await
    }

    /// Name of `id` in the current language, `""` if unknown
    pub fn resolve_name(&self, kind: LookupKind, id: i64) -> String {
        self.registry.resolve_name(kind, id, self.language)
    }

    pub fn labels_for(&self, property: &Property) -> PropertyLabels {
        self.registry.labels_for(property, self.language)
    }

    pub fn teardown(self) {
        self.registry.close();
        info!("Store torn down");
    }
}

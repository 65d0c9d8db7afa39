use crate::api::decode;
use crate::api::traits::ApiTransport;
use crate::error::{ApiError, ApiResult};
use crate::models::{filter_valid_items, pick, Language, LookupItem, LookupKind, Property};
use backon::{ConstantBuilder, Retryable};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use moka::sync::Cache;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Lifetimes and retry settings for cached lookup collections
#[derive(Debug, Clone, PartialEq)]
pub struct CachePolicy {
    /// Age after which a collection is served stale and refreshed
    pub stale_after: Duration,
    /// Idle time after which a collection is dropped from the cache
    pub evict_after_idle: Duration,
    /// Total attempts per fetch, including the first
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(60 * 60),
            evict_after_idle: Duration::from_secs(2 * 60 * 60),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Load state of one lookup kind
#[derive(Debug, Clone, PartialEq)]
pub enum LookupStatus {
    Idle,
    Loading,
    Ready { loaded_at: DateTime<Utc>, count: usize },
    Failed(ApiError),
}

impl LookupStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone)]
struct CachedCollection {
    items: Arc<Vec<LookupItem>>,
    fetched_at: Instant,
}

/// Display names for every foreign key of a property
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PropertyLabels {
    pub region: String,
    pub city: String,
    pub neighborhood: String,
    pub property_type: String,
    pub listing_type: String,
    pub condition: String,
    pub finishing: String,
    pub features: Vec<String>,
}

/// Fetches and caches the reference collections, one per [`LookupKind`].
///
/// Collections are replaced whole on every successful fetch. Fresh data is
/// served from memory; stale data is served immediately while a single
/// background refresh per kind runs. Clones share the same cache.
#[derive(Clone)]
pub struct LookupRegistry {
    transport: Arc<dyn ApiTransport>,
    policy: CachePolicy,
    cache: Cache<LookupKind, CachedCollection>,
    status: Arc<DashMap<LookupKind, LookupStatus>>,
    gates: Arc<DashMap<LookupKind, Arc<Mutex<()>>>>,
    refreshing: Arc<DashSet<LookupKind>>,
    closed: Arc<AtomicBool>,
}

impl LookupRegistry {
    pub fn new(transport: Arc<dyn ApiTransport>, policy: CachePolicy) -> Self {
        let cache = Cache::builder()
            .time_to_idle(policy.evict_after_idle)
            .build();

        Self {
            transport,
            policy,
            cache,
            status: Arc::new(DashMap::new()),
            gates: Arc::new(DashMap::new()),
            refreshing: Arc::new(DashSet::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// One uncached request for the full collection of `kind`
    pub async fn fetch_kind(&self, kind: LookupKind) -> ApiResult<Vec<LookupItem>> {
        debug!(%kind, "Fetching lookup collection");
        let body = self.transport.get_json(kind.path(), &[]).await?;
        decode(body)
    }

    async fn fetch_with_retry(&self, kind: LookupKind) -> ApiResult<Vec<LookupItem>> {
        let backoff = ConstantBuilder::default()
            .with_delay(self.policy.retry_delay)
            .with_max_times(self.policy.max_attempts.saturating_sub(1));

        (|| async move { self.fetch_kind(kind).await })
            .retry(backoff)
            .notify(|err: &ApiError, dur: Duration| {
                warn!(
                    "Fetching {} failed, retrying after {:.2}s: {}",
                    kind,
                    dur.as_secs_f64(),
                    err
                )
            })
            .await
    }

    /// Collection for `kind`, going to the network only when nothing is
    /// cached. Errors are returned after all retry attempts are spent and
    /// are also recorded in [`LookupRegistry::status`].
    pub async fn load(&self, kind: LookupKind) -> ApiResult<Arc<Vec<LookupItem>>> {
        if self.is_closed() {
            return Err(ApiError::Closed);
        }
        if let Some(items) = self.serve_cached(kind) {
            return Ok(items);
        }

        let gate = self.gates.entry(kind).or_default().clone();
        let _guard = gate.lock().await;

        // Another caller may have filled the cache while we waited
        if let Some(items) = self.serve_cached(kind) {
            return Ok(items);
        }

        self.status.insert(kind, LookupStatus::Loading);
        match self.fetch_with_retry(kind).await {
            Ok(items) => Ok(self.store(kind, items)),
            Err(err) => {
                warn!(%kind, "Giving up on lookup collection: {}", err);
                if !self.is_closed() {
                    self.status.insert(kind, LookupStatus::Failed(err.clone()));
                }
                Err(err)
            }
        }
    }

    /// Load several kinds concurrently
    pub async fn load_many(
        &self,
        kinds: &[LookupKind],
    ) -> Vec<(LookupKind, ApiResult<Arc<Vec<LookupItem>>>)> {
        let loads = kinds.iter().map(|&kind| async move { (kind, self.load(kind).await) });
        join_all(loads).await
    }

    fn serve_cached(&self, kind: LookupKind) -> Option<Arc<Vec<LookupItem>>> {
        let entry = self.cache.get(&kind)?;
        if entry.fetched_at.elapsed() >= self.policy.stale_after {
            debug!(%kind, "Serving stale lookup data");
            self.spawn_refresh(kind);
        } else {
            trace!(%kind, "Lookup cache hit");
        }
        Some(entry.items)
    }

    fn spawn_refresh(&self, kind: LookupKind) {
        if self.is_closed() || !self.refreshing.insert(kind) {
            return;
        }

        let registry = self.clone();
        tokio::spawn(async move {
            let result = registry.fetch_with_retry(kind).await;
            registry.refreshing.remove(&kind);
            match result {
                Ok(items) => {
                    registry.store(kind, items);
                }
                Err(err) => {
                    warn!(%kind, "Background refresh failed, keeping cached data: {}", err)
                }
            }
        });
    }

    fn store(&self, kind: LookupKind, items: Vec<LookupItem>) -> Arc<Vec<LookupItem>> {
        let items = Arc::new(items);
        if self.is_closed() {
            debug!(%kind, "Registry closed, discarding fetched collection");
            self.status.remove(&kind);
            return items;
        }

        self.cache.insert(
            kind,
            CachedCollection {
                items: items.clone(),
                fetched_at: Instant::now(),
            },
        );
        self.status.insert(
            kind,
            LookupStatus::Ready {
                loaded_at: Utc::now(),
                count: items.len(),
            },
        );
        info!(%kind, count = items.len(), "Lookup collection loaded");
        items
    }

    /// Cached collection, or an empty one if `kind` has not loaded
    pub fn collection(&self, kind: LookupKind) -> Arc<Vec<LookupItem>> {
        self.cache
            .get(&kind)
            .map(|entry| entry.items)
            .unwrap_or_default()
    }

    /// Cached items fit for dropdowns and chip lists
    pub fn valid_items(&self, kind: LookupKind) -> Vec<LookupItem> {
        filter_valid_items(&self.collection(kind))
            .into_iter()
            .cloned()
            .collect()
    }

    /// A kind whose collection was evicted for idleness reads as `Idle` again
    pub fn status(&self, kind: LookupKind) -> LookupStatus {
        self.status.remove_if(&kind, |_, status| {
            matches!(status, LookupStatus::Ready { .. }) && !self.cache.contains_key(&kind)
        });
        self.status
            .get(&kind)
            .map(|entry| entry.value().clone())
            .unwrap_or(LookupStatus::Idle)
    }

    /// Item with numeric `id` in the cached collection of `kind`
    pub fn find(&self, kind: LookupKind, id: i64) -> ApiResult<LookupItem> {
        self.collection(kind)
            .iter()
            .find(|item| item.numeric_id() == Some(id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("{kind} id {id}")))
    }

    /// Localized name for `id`, or `""` when it cannot be resolved
    pub fn resolve_name(&self, kind: LookupKind, id: i64, language: Language) -> String {
        match self.find(kind, id) {
            Ok(item) => pick(&item, language).to_string(),
            Err(err) => {
                trace!("{}", err);
                String::new()
            }
        }
    }

    /// Like [`LookupRegistry::resolve_name`] for nullable foreign keys
    pub fn resolve_optional(&self, kind: LookupKind, id: Option<i64>, language: Language) -> String {
        id.map(|id| self.resolve_name(kind, id, language))
            .unwrap_or_default()
    }

    pub fn labels_for(&self, property: &Property, language: Language) -> PropertyLabels {
        PropertyLabels {
            region: self.resolve_optional(LookupKind::Region, property.region_id, language),
            city: self.resolve_optional(LookupKind::City, property.city_id, language),
            neighborhood: self.resolve_optional(
                LookupKind::Neighborhood,
                property.neighborhood_id,
                language,
            ),
            property_type: self.resolve_optional(
                LookupKind::PropertyType,
                property.property_type_id,
                language,
            ),
            listing_type: self.resolve_optional(
                LookupKind::ListingType,
                property.listing_type_id,
                language,
            ),
            condition: self.resolve_optional(LookupKind::Condition, property.condition_id, language),
            finishing: self.resolve_optional(
                LookupKind::FinishingType,
                property.finish_type_id,
                language,
            ),
            features: property
                .features
                .iter()
                .map(|&id| self.resolve_name(LookupKind::Feature, id, language))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Cities of one region, for dependent dropdowns. Best effort: failures
    /// are logged and yield an empty list.
    pub async fn fetch_cities_by_region(&self, region_id: i64) -> Vec<LookupItem> {
        self.fetch_scoped(LookupKind::City, "regionId", region_id).await
    }

    /// Neighborhoods of one city. Best effort, like
    /// [`LookupRegistry::fetch_cities_by_region`].
    pub async fn fetch_neighborhoods_by_city(&self, city_id: i64) -> Vec<LookupItem> {
        self.fetch_scoped(LookupKind::Neighborhood, "cityId", city_id).await
    }

    async fn fetch_scoped(&self, kind: LookupKind, param: &str, parent: i64) -> Vec<LookupItem> {
        let query = [(param.to_string(), parent.to_string())];
        let result: ApiResult<Vec<LookupItem>> = async {
            let body = self.transport.get_json(kind.path(), &query).await?;
            decode(body)
        }
        .await;

        result.unwrap_or_else(|err| {
            warn!(%kind, %param, parent, "Scoped lookup fetch failed: {}", err);
            Vec::new()
        })
    }

    /// Drop the cached collection of `kind`
    pub fn invalidate(&self, kind: LookupKind) {
        self.cache.invalidate(&kind);
        self.status.remove(&kind);
    }

    /// Empty the cache and ignore any fetch that completes afterwards
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cache.invalidate_all();
        self.status.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{lookup_json, FakeTransport};
    use serde_json::json;

    const REGIONS: &str = "/lookup/regions";

    fn registry(fake: &Arc<FakeTransport>) -> LookupRegistry {
        LookupRegistry::new(fake.clone(), CachePolicy::default())
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_collection_is_served_from_memory() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let registry = registry(&fake);

        assert_eq!(registry.status(LookupKind::Region), LookupStatus::Idle);
        let first = registry.load(LookupKind::Region).await.unwrap();
        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        let second = registry.load(LookupKind::Region).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.calls_to(REGIONS), 1);
        assert!(matches!(
            registry.status(LookupKind::Region),
            LookupStatus::Ready { count: 1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_loads_share_one_request() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let registry = registry(&fake);

        let results = registry
            .load_many(&[LookupKind::Region, LookupKind::Region])
            .await;

        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(fake.calls_to(REGIONS), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_collection_is_served_then_refreshed() {
        let fake = FakeTransport::new();
        fake.push(REGIONS, Ok(lookup_json(&[(1, "قديم", "Old")])));
        fake.push(REGIONS, Ok(lookup_json(&[(1, "جديد", "New")])));
        let registry = registry(&fake);

        registry.load(LookupKind::Region).await.unwrap();
        tokio::time::advance(Duration::from_secs(60 * 60 + 1)).await;

        let served = registry.load(LookupKind::Region).await.unwrap();
        assert_eq!(served[0].name_en, "Old");

        settle().await;
        assert_eq!(fake.calls_to(REGIONS), 2);
        assert_eq!(
            registry.resolve_name(LookupKind::Region, 1, Language::En),
            "New"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_background_refresh_keeps_old_data() {
        let fake = FakeTransport::new();
        fake.push(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        fake.always(REGIONS, Err(ApiError::Network("down".into())));
        let registry = registry(&fake);

        registry.load(LookupKind::Region).await.unwrap();
        tokio::time::advance(Duration::from_secs(2 * 60 * 60 - 60)).await;
        registry.load(LookupKind::Region).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(fake.calls_to(REGIONS), 4);
        assert_eq!(
            registry.resolve_name(LookupKind::Region, 1, Language::Ar),
            "الرياض"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_three_times_with_fixed_delay() {
        let fake = FakeTransport::new();
        fake.push(REGIONS, Err(ApiError::Network("reset".into())));
        fake.push(REGIONS, Err(ApiError::Network("timeout".into())));
        fake.push(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let registry = registry(&fake);

        let start = Instant::now();
        let items = registry.load(LookupKind::Region).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(fake.calls_to(REGIONS), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_and_flag_the_kind() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(json!({"unexpected": true})));
        let registry = registry(&fake);

        let err = registry.load(LookupKind::Region).await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(fake.calls_to(REGIONS), 3);
        assert!(registry.status(LookupKind::Region).error().is_some());
        assert_eq!(registry.resolve_name(LookupKind::Region, 1, Language::En), "");
    }

    #[tokio::test]
    async fn unresolved_ids_resolve_to_empty_strings() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let registry = registry(&fake);

        // Not loaded yet
        assert_eq!(registry.resolve_name(LookupKind::Region, 1, Language::Ar), "");

        registry.load(LookupKind::Region).await.unwrap();
        for lang in [Language::Ar, Language::En] {
            assert_eq!(registry.resolve_name(LookupKind::Region, 99, lang), "");
        }
        assert!(matches!(
            registry.find(LookupKind::Region, 99),
            Err(ApiError::NotFound(_))
        ));
        // Same id in a kind that was never loaded
        assert_eq!(registry.resolve_name(LookupKind::City, 1, Language::En), "");
    }

    #[tokio::test]
    async fn invalid_items_are_hidden_but_others_still_resolve() {
        let fake = FakeTransport::new();
        fake.always(
            REGIONS,
            Ok(json!([
                {"id": "undefined", "nameAr": "؟", "nameEn": "?"},
                {"id": "", "nameAr": "فارغ", "nameEn": "Empty"},
                {"id": 2, "nameAr": "مكة", "nameEn": "Makkah"}
            ])),
        );
        let registry = registry(&fake);
        registry.load(LookupKind::Region).await.unwrap();

        let valid = registry.valid_items(LookupKind::Region);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].numeric_id(), Some(2));
        assert_eq!(registry.collection(LookupKind::Region).len(), 3);
        assert_eq!(registry.resolve_name(LookupKind::Region, 2, Language::Ar), "مكة");
    }

    #[tokio::test]
    async fn scoped_fetches_send_parent_id_and_swallow_errors() {
        let fake = FakeTransport::new();
        fake.push("/lookup/cities", Ok(lookup_json(&[(10, "جدة", "Jeddah")])));
        fake.push(
            "/lookup/neighborhoods",
            Err(ApiError::Http {
                status: 500,
                url: "/lookup/neighborhoods".into(),
            }),
        );
        let registry = registry(&fake);

        let cities = registry.fetch_cities_by_region(2).await;
        let neighborhoods = registry.fetch_neighborhoods_by_city(10).await;

        assert_eq!(cities.len(), 1);
        assert!(neighborhoods.is_empty());

        let calls = fake.calls();
        assert_eq!(calls[0].1, vec![("regionId".to_string(), "2".to_string())]);
        assert_eq!(calls[1].1, vec![("cityId".to_string(), "10".to_string())]);
        // Scoped results never land in the shared cache
        assert!(registry.collection(LookupKind::City).is_empty());
    }

    #[tokio::test]
    async fn labels_resolve_each_kind_against_its_own_collection() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "منطقة", "Region One")])));
        fake.always("/lookup/cities", Ok(lookup_json(&[(1, "مدينة", "City One")])));
        fake.always(
            "/lookup/property-features",
            Ok(lookup_json(&[(4, "مسبح", "Pool")])),
        );
        let registry = registry(&fake);
        registry
            .load_many(&[LookupKind::Region, LookupKind::City, LookupKind::Feature])
            .await;

        let property = Property {
            region_id: Some(1),
            city_id: Some(1),
            property_type_id: Some(1),
            features: vec![4, 5],
            ..Default::default()
        };
        let labels = registry.labels_for(&property, Language::En);

        assert_eq!(labels.region, "Region One");
        assert_eq!(labels.city, "City One");
        assert_eq!(labels.property_type, "");
        assert_eq!(labels.neighborhood, "");
        assert_eq!(labels.features, vec!["Pool".to_string()]);
    }

    #[tokio::test]
    async fn idle_eviction_resets_status_and_forces_reload() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let policy = CachePolicy {
            evict_after_idle: Duration::from_millis(50),
            ..CachePolicy::default()
        };
        let registry = LookupRegistry::new(fake.clone(), policy);

        registry.load(LookupKind::Region).await.unwrap();
        std::thread::sleep(Duration::from_millis(200));
        registry.cache.run_pending_tasks();

        assert_eq!(registry.status(LookupKind::Region), LookupStatus::Idle);
        assert_eq!(registry.resolve_name(LookupKind::Region, 1, Language::En), "");

        registry.load(LookupKind::Region).await.unwrap();
        assert_eq!(fake.calls_to(REGIONS), 2);
        assert_eq!(
            registry.resolve_name(LookupKind::Region, 1, Language::En),
            "Riyadh"
        );
    }

    #[tokio::test]
    async fn load_after_close_stays_off_the_network() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let registry = registry(&fake);
        registry.close();

        let err = registry.load(LookupKind::Region).await.unwrap_err();

        assert_eq!(err, ApiError::Closed);
        assert_eq!(fake.calls_to(REGIONS), 0);
        assert_eq!(registry.status(LookupKind::Region), LookupStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn close_discards_late_refreshes() {
        let fake = FakeTransport::new();
        fake.always(REGIONS, Ok(lookup_json(&[(1, "الرياض", "Riyadh")])));
        let registry = registry(&fake);

        registry.load(LookupKind::Region).await.unwrap();
        tokio::time::advance(Duration::from_secs(60 * 60 + 1)).await;
        registry.load(LookupKind::Region).await.unwrap();
        registry.close();
        settle().await;

        assert!(registry.is_closed());
        assert!(registry.collection(LookupKind::Region).is_empty());
        assert_eq!(registry.status(LookupKind::Region), LookupStatus::Idle);
    }
}

//! Coefficient lookup chain: local table, optional external provider, cache,
//! and regional adjustment.
//!
//! ```text
//! get(key, state)
//!   ├── local table hit and !prefer_external ──► local
//!   ├── provider (cached by key, time-to-live) ──► remote
//!   │      └── provider error or invalid figures ──► local if present
//!   └── nothing ──► CarbonError::MissingCoefficient
//!   then × regional (state, category) multiplier, 1.0 when absent
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::{CarbonCoefficient, MaterialKey, MaterialsDatabase};
use crate::config::CarbonConfig;
use crate::errors::{CarbonError, CarbonResult};
use crate::regional::{self, State};

/// External source of carbon coefficients.
///
/// Implementations must be idempotent: the same key always yields the same
/// coefficient for the lifetime of a cache entry.
#[async_trait]
pub trait CoefficientProvider: Send + Sync {
    /// Name used in source tags and log lines
    fn name(&self) -> &str;

    async fn fetch(&self, key: &MaterialKey) -> CarbonResult<CarbonCoefficient>;
}

/// Resolves coefficients for material keys.
///
/// Shared across concurrent lookups; the cache is the only mutable state.
pub struct CoefficientSource {
    database: MaterialsDatabase,
    provider: Option<Arc<dyn CoefficientProvider>>,
    cache: Cache<MaterialKey, CarbonCoefficient>,
    prefer_external: bool,
}

impl CoefficientSource {
    /// Local-only source
    pub fn new(database: MaterialsDatabase) -> Self {
        CoefficientSource::with_config(database, &CarbonConfig::default())
    }

    /// Local-only source with cache sizing and flags taken from `config`
    pub fn with_config(database: MaterialsDatabase, config: &CarbonConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(Duration::from_secs(config.cache_max_age_secs))
            .build();

        CoefficientSource {
            database,
            provider: None,
            cache,
            prefer_external: config.prefer_external,
        }
    }

    /// Attach an external provider (builder pattern)
    pub fn with_provider(mut self, provider: Arc<dyn CoefficientProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Consult the provider even when the local table has the key
    pub fn prefer_external(mut self, prefer: bool) -> Self {
        self.prefer_external = prefer;
        self
    }

    pub fn database(&self) -> &MaterialsDatabase {
        &self.database
    }

    /// Resolve a coefficient, regionally adjusted when `state` is given.
    pub async fn get(&self, key: &MaterialKey, state: Option<State>) -> CarbonResult<CarbonCoefficient> {
        let base = self.resolve(key).await?;

        let multiplier = state
            .and_then(|s| regional::material_multiplier(s, key.category))
            .unwrap_or(1.0);

        if multiplier == 1.0 {
            Ok(base)
        } else {
            Ok(base.regionally_adjusted(multiplier))
        }
    }

    async fn resolve(&self, key: &MaterialKey) -> CarbonResult<CarbonCoefficient> {
        let local = self.database.coefficient(key);

        if let Some(coefficient) = local {
            coefficient.validate(key)?;
            if !self.prefer_external || self.provider.is_none() {
                return Ok(coefficient.clone());
            }
        }

        if let Some(provider) = &self.provider {
            let fetch = async {
                let mut coefficient = provider.fetch(key).await?;
                coefficient
                    .validate(key)
                    .map_err(|e| CarbonError::provider_failed(provider.name(), e.to_string()))?;
                if coefficient.source.is_empty() {
                    coefficient.source = format!("remote:{}", provider.name());
                }
                Ok::<_, CarbonError>(coefficient)
            };

            match self.cache.try_get_with(key.clone(), fetch).await {
                Ok(coefficient) => return Ok(coefficient),
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        key = %key,
                        error = %err,
                        "external coefficient lookup failed"
                    );
                }
            }
        }

        local
            .cloned()
            .ok_or_else(|| CarbonError::missing_coefficient(key.category.code(), key.material_type.clone()))
    }

    /// Number of cached external coefficients
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{MaterialCategory, MaterialEntry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic in-memory provider that counts calls.
    struct FakeProvider {
        rate: f64,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(rate: f64) -> Self {
            FakeProvider { rate, fail: false, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            FakeProvider { rate: 0.0, fail: true, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl CoefficientProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch(&self, key: &MaterialKey) -> CarbonResult<CarbonCoefficient> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CarbonError::provider_failed("fake", format!("no data for {}", key)));
            }
            Ok(CarbonCoefficient::new(self.rate, "m3"))
        }
    }

    fn concrete_32() -> MaterialKey {
        MaterialKey::new(MaterialCategory::Concrete, "concrete-32mpa")
    }

    #[tokio::test]
    async fn test_local_lookup() {
        let source = CoefficientSource::new(MaterialsDatabase::builtin());
        let coefficient = source.get(&concrete_32(), None).await.unwrap();
        assert_eq!(coefficient.rate, 320.0);
        assert_eq!(coefficient.source, "local");
    }

    #[tokio::test]
    async fn test_missing_key_names_key() {
        let source = CoefficientSource::new(MaterialsDatabase::builtin());
        let key = MaterialKey::new(MaterialCategory::Steel, "steel-unobtainium");
        let err = source.get(&key, None).await.unwrap_err();
        assert_eq!(err, CarbonError::missing_coefficient("steel", "steel-unobtainium"));
    }

    #[tokio::test]
    async fn test_provider_used_when_local_absent_and_cached() {
        let provider = Arc::new(FakeProvider::new(410.0));
        let source = CoefficientSource::new(MaterialsDatabase::new()).with_provider(provider.clone());

        let first = source.get(&concrete_32(), None).await.unwrap();
        let second = source.get(&concrete_32(), None).await.unwrap();

        assert_eq!(first.rate, 410.0);
        assert_eq!(first, second);
        assert_eq!(first.source, "remote:fake");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_local_wins_unless_prefer_external() {
        let provider = Arc::new(FakeProvider::new(410.0));
        let source = CoefficientSource::new(MaterialsDatabase::builtin()).with_provider(provider.clone());
        assert_eq!(source.get(&concrete_32(), None).await.unwrap().rate, 320.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let source = source.prefer_external(true);
        assert_eq!(source.get(&concrete_32(), None).await.unwrap().rate, 410.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_local() {
        let source = CoefficientSource::new(MaterialsDatabase::builtin())
            .with_provider(Arc::new(FakeProvider::failing()))
            .prefer_external(true);

        let coefficient = source.get(&concrete_32(), None).await.unwrap();
        assert_eq!(coefficient.rate, 320.0);
    }

    #[tokio::test]
    async fn test_provider_failure_without_local_is_fatal() {
        let source = CoefficientSource::new(MaterialsDatabase::new()).with_provider(Arc::new(FakeProvider::failing()));
        let err = source.get(&concrete_32(), None).await.unwrap_err();
        assert!(matches!(err, CarbonError::MissingCoefficient { .. }));
    }

    #[tokio::test]
    async fn test_negative_local_rate_rejected() {
        let database = MaterialsDatabase::builtin().with_entry(MaterialEntry::new(
            MaterialCategory::Steel,
            "steel-odd",
            CarbonCoefficient::new(-100.0, "t"),
        ));
        let source = CoefficientSource::new(database);
        let key = MaterialKey::new(MaterialCategory::Steel, "steel-odd");

        let err = source.get(&key, None).await.unwrap_err();
        assert!(matches!(err, CarbonError::InvalidInput { ref field, .. } if field == "steel/steel-odd.rate"));
    }

    #[tokio::test]
    async fn test_positive_biogenic_storage_rejected() {
        let database = MaterialsDatabase::new().with_entry(MaterialEntry::new(
            MaterialCategory::Timber,
            "timber-odd",
            CarbonCoefficient::new(220.0, "m3").with_biogenic_storage(650.0),
        ));
        let source = CoefficientSource::new(database);
        let key = MaterialKey::new(MaterialCategory::Timber, "timber-odd");

        assert!(source.get(&key, None).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_provider_rate_falls_back_to_local() {
        let provider = Arc::new(FakeProvider::new(f64::NAN));
        let source = CoefficientSource::new(MaterialsDatabase::builtin())
            .with_provider(provider.clone())
            .prefer_external(true);

        assert_eq!(source.get(&concrete_32(), None).await.unwrap().rate, 320.0);
        assert_eq!(source.cached_entries(), 0);

        let remote_only = CoefficientSource::new(MaterialsDatabase::new()).with_provider(Arc::new(FakeProvider::new(-1.0)));
        let err = remote_only.get(&concrete_32(), None).await.unwrap_err();
        assert!(matches!(err, CarbonError::MissingCoefficient { .. }));
    }

    #[tokio::test]
    async fn test_regional_multiplier_applied() {
        let source = CoefficientSource::new(MaterialsDatabase::builtin());
        let key = MaterialKey::new(MaterialCategory::Steel, "steel-structural");

        let wa = source.get(&key, Some(State::Wa)).await.unwrap();
        let expected = 2900.0 * regional::material_multiplier(State::Wa, MaterialCategory::Steel).unwrap();
        assert!((wa.rate - expected).abs() < 1e-9);
        assert!(wa.regional_multiplier > 1.0);
    }

    #[tokio::test]
    async fn test_absent_regional_factor_is_noop() {
        let source = CoefficientSource::new(MaterialsDatabase::builtin());
        assert!(regional::material_multiplier(State::Nsw, MaterialCategory::Concrete).is_none());

        let nsw = source.get(&concrete_32(), Some(State::Nsw)).await.unwrap();
        assert_eq!(nsw.rate, 320.0);
        assert_eq!(nsw.regional_multiplier, 1.0);
    }
}

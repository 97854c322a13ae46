//! Cache de réponses avec durée de vie
//!
//! Indépendant du moteur d'analyse: [`CachedFetcher`] enveloppe n'importe quel
//! [`FeatureFetcher`]. Seules les réponses réussies sont mises en cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use geofeature::RawCollection;
use tracing::debug;

use super::{build_request, FeatureFetcher, QueryError};
use crate::config::SourceDescriptor;
use crate::parcel::Parcel;

/// Cache mémoire clé → collection, avec expiration
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, RawCollection)>>,
}

impl ResponseCache {
    /// Crée un cache; une durée nulle le désactive
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Collection en cache et non expirée
    pub fn get(&self, key: &str) -> Option<RawCollection> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((stored, collection)) if stored.elapsed() < self.ttl => Some(collection.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Ajoute une collection; les entrées expirées sont purgées au passage
    pub fn insert(&self, key: String, collection: RawCollection) {
        if !self.is_enabled() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, (stored, _)| stored.elapsed() < ttl);
            entries.insert(key, (Instant::now(), collection));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetcher avec cache de réponses
pub struct CachedFetcher<F> {
    inner: F,
    cache: ResponseCache,
}

impl<F: FeatureFetcher> CachedFetcher<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl<F: FeatureFetcher> FeatureFetcher for CachedFetcher<F> {
    fn fetch<'a>(
        &'a self,
        source: &'a SourceDescriptor,
        parcel: &'a Parcel,
    ) -> BoxFuture<'a, Result<RawCollection, QueryError>> {
        Box::pin(async move {
            let key = build_request(source, parcel)?.cache_key();

            if let Some(collection) = self.cache.get(&key) {
                debug!(source = %source.name, "Cache hit");
                return Ok(collection);
            }

            let collection = self.inner.fetch(source, parcel).await?;
            self.cache.insert(key, collection.clone());
            Ok(collection)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use geo::{LineString, MultiPolygon, Polygon};
    use geofeature::GeometryKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FeatureFetcher for CountingFetcher {
        fn fetch<'a>(
            &'a self,
            source: &'a SourceDescriptor,
            _parcel: &'a Parcel,
        ) -> BoxFuture<'a, Result<RawCollection, QueryError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if self.fail {
                    Err(QueryError::MissingLayer(source.name.clone()))
                } else {
                    Ok(RawCollection::default())
                }
            })
        }
    }

    fn parcel() -> Parcel {
        let square = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                (500000.0, 7700000.0),
                (500100.0, 7700000.0),
                (500100.0, 7700100.0),
                (500000.0, 7700100.0),
                (500000.0, 7700000.0),
            ]),
            vec![],
        )]);
        Parcel::new(square, 31981).unwrap()
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor {
            name: "UCs".to_string(),
            protocol: Protocol::Rest,
            url: "https://host/MapServer/0".to_string(),
            layer: None,
            kind: GeometryKind::Polygon,
            identity_columns: vec!["nome_uc".to_string()],
            details: vec![],
            category: None,
        }
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::from_secs(60),
        );
        let (source, parcel) = (source(), parcel());

        fetcher.fetch(&source, &parcel).await.unwrap();
        fetcher.fetch(&source, &parcel).await.unwrap();

        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            Duration::from_secs(60),
        );
        let (source, parcel) = (source(), parcel());

        assert!(fetcher.fetch(&source, &parcel).await.is_err());
        assert!(fetcher.fetch(&source, &parcel).await.is_err());

        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
        assert!(fetcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::ZERO,
        );
        let (source, parcel) = (source(), parcel());

        fetcher.fetch(&source, &parcel).await.unwrap();
        fetcher.fetch(&source, &parcel).await.unwrap();

        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expired_entry() {
        let cache = ResponseCache::new(Duration::from_millis(1));
        cache.insert("k".to_string(), RawCollection::default());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_purges_expired_keys() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.insert("a".to_string(), RawCollection::default());
        cache.insert("b".to_string(), RawCollection::default());
        assert_eq!(cache.len(), 2);

        std::thread::sleep(Duration::from_millis(40));
        cache.insert("c".to_string(), RawCollection::default());

        assert_eq!(cache.len(), 1);
        assert!(cache.get("c").is_some());
    }
}

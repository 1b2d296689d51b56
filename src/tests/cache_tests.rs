//! Query cache behaviour: key derivation, expiry, invalidation and loading

#[cfg(test)]
mod tests {
    use crate::cache::{derive_key, AppCache, MockClock, QueryCache, QueryFamily};
    use crate::config::Config;
    use crate::validation::ValidationError;
    use serde_json::{json, Map, Value};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    /// Cache driven by a mock clock
    fn setup(ttl: Duration) -> (QueryCache<String>, MockClock) {
        let clock = MockClock::default();
        let cache = QueryCache::builder("affiliates-list", ttl)
            .fields(&["page", "perpage", "name", "status"])
            .clock(Arc::new(clock.clone()))
            .build();
        (cache, clock)
    }

    #[test]
    fn test_key_determinism_under_permutation() {
        let orders = [
            json!({"page": 1, "perpage": 20, "name": "acme", "status": "active"}),
            json!({"status": "active", "name": "acme", "perpage": 20, "page": 1}),
            json!({"name": "acme", "page": 1, "status": "active", "perpage": 20}),
        ];

        let keys: Vec<_> = orders
            .into_iter()
            .map(|p| derive_key("affiliates-list", &params(p)).unwrap())
            .collect();

        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_key_distinctness() {
        let undefined = derive_key("x", &params(json!({"a": null}))).unwrap();
        let empty = derive_key("x", &Map::new()).unwrap();
        let set = derive_key("x", &params(json!({"a": "1"}))).unwrap();

        assert_eq!(undefined, empty);
        assert_ne!(undefined, set);
    }

    #[test]
    fn test_key_rejects_array_param() {
        let err = derive_key("x", &params(json!({"a": [1, 2]}))).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidKeyParam { ref name, .. } if name == "a"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let (cache, clock) = setup(Duration::from_secs(300));
        let key = cache.key(&params(json!({"page": 1}))).unwrap();

        cache.set(key.clone(), "page one".to_string(), Duration::from_millis(1000)).await;

        clock.advance(Duration::from_millis(999));
        assert_eq!(cache.get(&key).await.as_deref(), Some("page one"));

        clock.advance(Duration::from_millis(2));
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_entry_is_fresh_at_exact_ttl() {
        let (cache, clock) = setup(Duration::from_secs(1));
        let key = cache.key(&Map::new()).unwrap();

        cache.insert(key.clone(), "v".to_string()).await;
        clock.advance(Duration::from_secs(1));

        assert!(cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_restarts_ttl() {
        let (cache, clock) = setup(Duration::from_secs(60));
        let key = cache.key(&params(json!({"page": 1}))).unwrap();

        cache.insert(key.clone(), "old".to_string()).await;
        clock.advance(Duration::from_secs(50));
        cache.insert(key.clone(), "new".to_string()).await;
        clock.advance(Duration::from_secs(50));

        assert_eq!(cache.get(&key).await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _clock) = setup(Duration::from_secs(60));
        let key = cache.key(&params(json!({"page": 1}))).unwrap();
        let other = cache.key(&params(json!({"page": 2}))).unwrap();

        cache.insert(key.clone(), "one".to_string()).await;
        cache.insert(other.clone(), "two".to_string()).await;
        cache.invalidate(&key).await;

        assert_eq!(cache.get(&key).await, None);
        assert_eq!(cache.get(&other).await.as_deref(), Some("two"));

        // Invalidating an absent key is a no-op
        cache.invalidate(&key).await;
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (cache, _clock) = setup(Duration::from_secs(60));
        let keys: Vec<_> = (1..=5)
            .map(|page| cache.key(&params(json!({"page": page}))).unwrap())
            .collect();

        for key in &keys {
            cache.insert(key.clone(), key.to_string()).await;
        }
        cache.invalidate_all();

        for key in &keys {
            assert_eq!(cache.get(key).await, None, "{} should be gone", key);
        }
    }

    #[tokio::test]
    async fn test_get_or_load_miss_then_hit() {
        let (cache, _clock) = setup(Duration::from_secs(60));
        let key = cache.key(&params(json!({"page": 1}))).unwrap();
        let loads = AtomicUsize::new(0);
        let loads = &loads;

        let load = move || async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>("fetched".to_string())
        };

        let first = cache.get_or_load(&key, Duration::from_secs(60), load).await.unwrap();
        let second = cache.get_or_load(&key, Duration::from_secs(60), load).await.unwrap();

        assert_eq!(first, "fetched");
        assert_eq!(second, "fetched");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_reloads_after_expiry() {
        let (cache, clock) = setup(Duration::from_secs(60));
        let key = cache.key(&Map::new()).unwrap();
        let loads = AtomicUsize::new(0);
        let loads = &loads;

        let load = move || async move {
            let n = loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(format!("load {}", n))
        };

        assert_eq!(cache.load(&key, load).await.unwrap(), "load 0");
        clock.advance(Duration::from_secs(61));
        assert_eq!(cache.load(&key, load).await.unwrap(), "load 1");
    }

    #[tokio::test]
    async fn test_get_or_load_failure_is_not_cached() {
        let (cache, _clock) = setup(Duration::from_secs(60));
        let key = cache.key(&params(json!({"page": 1}))).unwrap();
        let loads = AtomicUsize::new(0);
        let loads = &loads;

        let failed = cache
            .get_or_load(&key, Duration::from_secs(60), move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>("backend unavailable")
            })
            .await;
        assert_eq!(failed, Err("backend unavailable"));
        assert_eq!(cache.get(&key).await, None);

        let recovered = cache
            .get_or_load(&key, Duration::from_secs(60), move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>("fetched".to_string())
            })
            .await;
        assert_eq!(recovered.as_deref(), Ok("fetched"));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_leave_a_whole_entry() {
        let (cache, _clock) = setup(Duration::from_secs(60));
        let key = cache.key(&params(json!({"page": 1}))).unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        // Both loaders must be in flight before either completes
        let barrier = Arc::new(Barrier::new(2));

        let run = |n: usize| {
            let cache = cache.clone();
            let key = key.clone();
            let loads = loads.clone();
            let barrier = barrier.clone();
            async move {
                let (loads, barrier) = (&loads, &barrier);
                cache
                    .get_or_load(&key, Duration::from_secs(60), move || async move {
                        loads.fetch_add(1, Ordering::SeqCst);
                        barrier.wait().await;
                        Ok::<_, String>(format!("load {}", n))
                    })
                    .await
            }
        };

        let results = futures::future::join_all(vec![run(1), run(2)]).await;

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(results.iter().all(|r| r.is_ok()));
        let cached = cache.get(&key).await.expect("one of the loads should be cached");
        assert!(cached == "load 1" || cached == "load 2");
    }

    #[tokio::test]
    async fn test_app_cache_families_are_isolated() {
        let config = Config::default();
        let clock = MockClock::default();
        let cache = AppCache::new(&config, Arc::new(clock.clone()));
        let filter = params(json!({"page": 1, "perpage": 20}));

        let affiliates_key = cache.affiliates.key(&filter).unwrap();
        let coupons_key = cache.coupons.key(&filter).unwrap();
        assert_ne!(affiliates_key, coupons_key);
        assert_eq!(
            affiliates_key.as_str(),
            "affiliates-list?name=∅&page=1&perpage=20&status=∅"
        );

        cache.affiliates.insert(affiliates_key.clone(), Arc::new(json!(["a"]))).await;
        cache.coupons.insert(coupons_key.clone(), Arc::new(json!(["c"]))).await;

        cache.family(QueryFamily::Coupons).invalidate_all();
        assert!(cache.affiliates.get(&affiliates_key).await.is_some());
        assert!(cache.coupons.get(&coupons_key).await.is_none());

        // Coupons expire after 2 minutes, affiliates after 5
        assert_eq!(cache.coupons.default_ttl(), Duration::from_secs(120));
        clock.advance(Duration::from_secs(301));
        assert!(cache.affiliates.get(&affiliates_key).await.is_none());
    }
}

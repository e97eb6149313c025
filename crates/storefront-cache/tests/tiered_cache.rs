//! End-to-end behaviour of the two-tier cache over a shared in-memory store.

use std::sync::Arc;
use std::time::Duration;

use fake::Fake;
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Words;
use serde_json::{Value, json};
use storefront_cache::{
    CacheConfig, CacheService, DistributedTier, InMemoryStore, NoopObserver, codec, keys,
};

const MEMORY_TTL: Duration = Duration::from_secs(60);
const DISTRIBUTED_TTL: Duration = Duration::from_secs(300);

fn service_over(store: &InMemoryStore) -> CacheService {
    CacheService::new(&CacheConfig::default(), DistributedTier::active(store.clone()))
        .with_observer(Arc::new(NoopObserver))
}

fn bootstrap_payload() -> Value {
    let name: String = CompanyName().fake();
    let tags: Vec<String> = Words(2..6).fake();
    json!({
        "tenant": { "name": name, "active": true, "logo": null },
        "products": [
            { "id": 1, "price": 1250, "tags": tags },
            { "id": 2, "price": 99, "tags": [] }
        ],
        "theme": { "primary": "#0f766e", "radius": 8 }
    })
}

#[tokio::test(start_paused = true)]
async fn set_then_get_is_served_from_memory() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);
    let payload = bootstrap_payload();

    cache.set("bootstrap:T1", &payload).await;
    let value: Value = cache.get("bootstrap:T1").await.unwrap();

    assert_eq!(value, payload);
    assert_eq!(store.reads(), 0, "memory hit must not touch the distributed tier");
}

#[tokio::test(start_paused = true)]
async fn expired_memory_entry_falls_back_to_distributed_tier() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);
    let payload = bootstrap_payload();
    cache.set("bootstrap:T1", &payload).await;

    tokio::time::advance(MEMORY_TTL + Duration::from_secs(1)).await;

    let value: Value = cache.get("bootstrap:T1").await.unwrap();
    assert_eq!(value, payload);
    assert_eq!(store.reads(), 1);

    // Repopulated: the next read stays in memory
    let again: Value = cache.get("bootstrap:T1").await.unwrap();
    assert_eq!(again, payload);
    assert_eq!(store.reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn repopulated_entry_gets_a_fresh_memory_ttl() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);
    cache.set("bootstrap:T1", &json!(1)).await;

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(cache.get::<Value>("bootstrap:T1").await.is_some());

    // 61s + 59s is past the first memory TTL but within the refreshed one
    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(cache.get::<Value>("bootstrap:T1").await.is_some());
    assert_eq!(store.reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn both_ttls_elapsed_is_a_miss() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);
    cache.set("bootstrap:T1", &bootstrap_payload()).await;

    tokio::time::advance(DISTRIBUTED_TTL + Duration::from_secs(1)).await;

    assert!(cache.get::<Value>("bootstrap:T1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn pattern_invalidation_spans_both_tiers() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);
    for key in ["bootstrap:T1", "bootstrap:T2", "other:X"] {
        cache.set(key, &json!({ "key": key })).await;
    }

    assert_eq!(cache.invalidate("bootstrap:*").await, 2);

    assert!(!store.contains("bootstrap:T1"));
    assert!(!store.contains("bootstrap:T2"));
    assert!(cache.get::<Value>("bootstrap:T1").await.is_none());
    assert!(cache.get::<Value>("bootstrap:T2").await.is_none());
    assert_eq!(cache.get::<Value>("other:X").await, Some(json!({ "key": "other:X" })));
}

#[tokio::test(start_paused = true)]
async fn invalidation_reaches_entries_only_in_the_distributed_tier() {
    let store = InMemoryStore::new();
    let writer = service_over(&store);
    let other_process = service_over(&store);

    writer.set("bootstrap:T1", &json!(1)).await;
    writer.set("bootstrap:T2", &json!(2)).await;

    // The other process never saw these keys in memory
    assert_eq!(other_process.invalidate("bootstrap:*").await, 2);
    assert!(!store.contains("bootstrap:T1"));

    // The writer's memory copy is a strict cache and lives out its TTL
    tokio::time::advance(MEMORY_TTL + Duration::from_secs(1)).await;
    assert!(writer.get::<Value>("bootstrap:T1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn processes_share_entries_through_the_distributed_tier() {
    let store = InMemoryStore::new();
    let a = service_over(&store);
    let b = service_over(&store);
    let payload = bootstrap_payload();

    a.set("bootstrap:T1", &payload).await;

    assert_eq!(b.get::<Value>("bootstrap:T1").await, Some(payload));
    assert_eq!(b.memory().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_distributed_tier_degrades_to_memory_only() {
    let store = InMemoryStore::new();
    store.set_failing(true);
    let cache = service_over(&store);

    cache.set("bootstrap:T1", &json!({ "name": "A" })).await;
    cache.set("bootstrap:T2", &json!({ "name": "B" })).await;
    cache.set("other:X", &json!({ "name": "X" })).await;

    assert_eq!(cache.get::<Value>("bootstrap:T1").await, Some(json!({ "name": "A" })));
    assert!(cache.get::<Value>("missing").await.is_none());
    assert_eq!(cache.invalidate("bootstrap:*").await, 2);
    assert!(cache.get::<Value>("other:X").await.is_some());

    tokio::time::advance(MEMORY_TTL + Duration::from_secs(1)).await;
    assert!(cache.get::<Value>("other:X").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn recovered_distributed_tier_is_used_again() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);

    store.set_failing(true);
    cache.set("bootstrap:T1", &json!(1)).await;
    assert!(!store.contains("bootstrap:T1"));

    store.set_failing(false);
    cache.set("bootstrap:T1", &json!(2)).await;
    assert!(store.contains("bootstrap:T1"));
}

#[tokio::test(start_paused = true)]
async fn unconfigured_distributed_tier_behaves_like_memory_only() {
    let cache = CacheService::from_config(&CacheConfig::default())
        .unwrap()
        .with_observer(Arc::new(NoopObserver));
    assert!(!cache.distributed().is_available());

    cache.set("bootstrap:T1", &json!(1)).await;
    assert_eq!(cache.get::<Value>("bootstrap:T1").await, Some(json!(1)));

    tokio::time::advance(MEMORY_TTL + Duration::from_secs(1)).await;
    assert!(cache.get::<Value>("bootstrap:T1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn namespace_invalidation_scenario() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);

    cache.set(&keys::bootstrap_key("tenantA"), &json!({ "name": "A" })).await;
    cache.set(&keys::bootstrap_batch_key("tenantA", &["theme", "products"]), &json!([])).await;
    cache.set(&keys::bootstrap_key("zz-other"), &json!({ "name": "Z" })).await;

    assert_eq!(
        cache.get::<Value>("bootstrap:tenantA").await,
        Some(json!({ "name": "A" }))
    );

    assert_eq!(cache.invalidate_namespace("tenantA").await, 2);

    assert!(cache.get::<Value>("bootstrap:tenantA").await.is_none());
    assert!(cache.get::<Value>("bootstrap:tenantA:products,theme").await.is_none());
    assert!(cache.get::<Value>("bootstrap:zz-other").await.is_some());
}

#[tokio::test(start_paused = true)]
async fn legacy_uncompressed_entries_are_readable() {
    let store = InMemoryStore::new();
    let cache = service_over(&store);
    store.insert_raw("bootstrap:legacy", r#"{"name":"old","items":[1,null,"x"]}"#, DISTRIBUTED_TTL);

    assert_eq!(
        cache.get::<Value>("bootstrap:legacy").await,
        Some(json!({ "name": "old", "items": [1, null, "x"] }))
    );
}

#[test]
fn codec_roundtrips_generated_payloads() {
    for _ in 0..20 {
        let value = bootstrap_payload();
        let encoded = codec::encode(&value).unwrap();
        assert_eq!(codec::decode(&encoded.payload).unwrap(), value);
    }
}

#[test]
fn concurrent_writers_last_write_wins() {
    tokio_test::block_on(async {
        let store = InMemoryStore::new();
        let cache = Arc::new(service_over(&store));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache.set("bootstrap:hot", &json!({ "writer": i })).await;
                    cache.get::<Value>("bootstrap:hot").await
                })
            })
            .collect();

        for task in tasks {
            // Every reader sees some writer's snapshot, never an error
            let value = task.await.unwrap().unwrap();
            assert!(value["writer"].is_u64());
        }
        assert_eq!(store.writes(), 16);
    });
}

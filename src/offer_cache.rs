// Offer cache: keeps live provider responses between searches so repeated queries for the
// same leg or stay do not hit the supplier again. Synthetic offers are never stored.

use crate::offer::{ProviderCategory, ProviderOffer};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

const KEY_SEPARATOR: char = '|';

#[derive(Debug, Default)]
struct CacheStats {
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
    eviction_count: AtomicUsize,
    expired_count: AtomicUsize,
    rejected_count: AtomicUsize,
    average_lookup_time_ns: AtomicU64,
    total_lookups: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub eviction_count: usize,
    pub expired_count: usize,
    pub rejected_count: usize,
    pub average_lookup_time_ns: u64,
    pub total_lookups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    #[default]
    LeastRecentlyUsed,
    LeastFrequentlyUsed,
    // Entry closest to expiry goes first
    TimeToLive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferCacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub default_ttl_seconds: u64,
    pub eviction_policy: EvictionPolicy,
}

impl Default for OfferCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1_000,
            default_ttl_seconds: 300,
            eviction_policy: EvictionPolicy::LeastRecentlyUsed,
        }
    }
}

// "flights|CDG|JFK|2025-06-01|economy"
pub fn create_cache_key(category: ProviderCategory, destination: &str, parts: &[&str]) -> String {
    let mut key = format!("{}{}{}", category.as_str(), KEY_SEPARATOR, destination);
    for part in parts {
        key.push(KEY_SEPARATOR);
        key.push_str(part);
    }
    key
}

struct CacheEntry {
    offers: Vec<ProviderOffer>,
    created_at: Instant,
    ttl: Duration,
    access_count: usize,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    fn matches(key: &str, category: Option<ProviderCategory>, destination: Option<&str>) -> bool {
        let mut parts = key.split(KEY_SEPARATOR);
        let key_category = parts.next();
        let key_destination = parts.next();

        let matches_category = category.map_or(true, |c| key_category == Some(c.as_str()));
        let matches_destination = destination.map_or(true, |d| key_destination == Some(d));
        matches_category && matches_destination
    }
}

pub struct OfferCache {
    entries: DashMap<String, CacheEntry>,
    config: RwLock<OfferCacheConfig>,
    stats: CacheStats,
}

impl OfferCache {
    pub fn new(config: OfferCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config: RwLock::new(config),
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.read().enabled
    }

    /// Stores a live provider response under `key`.
    ///
    /// Returns false when the cache is disabled or the response contains a synthetic offer.
    /// At capacity one entry is evicted according to the current policy first.
    pub fn store(&self, key: &str, offers: &[ProviderOffer], ttl: Option<Duration>) -> bool {
        let (enabled, max_entries, default_ttl) = {
            let config = self.config.read();
            (config.enabled, config.max_entries, config.default_ttl_seconds)
        };
        if !enabled || max_entries == 0 {
            return false;
        }

        if offers.iter().any(|offer| offer.synthetic) {
            self.stats.rejected_count.fetch_add(1, Ordering::SeqCst);
            debug!(key, "refusing to cache synthetic offers");
            return false;
        }

        if !self.entries.contains_key(key) && self.entries.len() >= max_entries {
            self.evict_one();
        }

        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                offers: offers.to_vec(),
                created_at: now,
                ttl: ttl.unwrap_or_else(|| Duration::from_secs(default_ttl)),
                access_count: 0,
                last_accessed: now,
            },
        );
        true
    }

    // Expired entries are dropped on lookup and count as misses
    pub fn get(&self, key: &str) -> Option<Vec<ProviderOffer>> {
        let started = Instant::now();
        self.stats.total_lookups.fetch_add(1, Ordering::SeqCst);

        let expired = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.access_count += 1;
                entry.last_accessed = Instant::now();
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                self.record_lookup_time(started);
                return Some(entry.offers.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && self.entries.remove(key).is_some() {
            self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
        }
        self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        self.record_lookup_time(started);
        None
    }

    // None matches everything; returns the number of entries removed
    pub fn invalidate(&self, category: Option<ProviderCategory>, destination: Option<&str>) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| CacheEntry::matches(entry.key(), category, destination))
            .map(|entry| entry.key().clone())
            .collect();

        keys.into_iter()
            .filter(|key| self.entries.remove(key).is_some())
            .count()
    }

    pub fn set_eviction_policy(&self, policy: EvictionPolicy) {
        self.config.write().eviction_policy = policy;
    }

    pub fn resize(&self, max_entries: usize) {
        self.config.write().max_entries = max_entries;
        while self.entries.len() > max_entries {
            if !self.evict_one() {
                break;
            }
        }
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.entries.len(),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            rejected_count: self.stats.rejected_count.load(Ordering::SeqCst),
            average_lookup_time_ns: self.stats.average_lookup_time_ns.load(Ordering::SeqCst),
            total_lookups: self.stats.total_lookups.load(Ordering::SeqCst),
        }
    }

    fn evict_one(&self) -> bool {
        let policy = self.config.read().eviction_policy;

        // Collect the victim before removing; DashMap shards stay locked while iterating
        let victim = match policy {
            EvictionPolicy::LeastRecentlyUsed => self
                .entries
                .iter()
                .min_by_key(|entry| entry.last_accessed)
                .map(|entry| entry.key().clone()),
            EvictionPolicy::LeastFrequentlyUsed => self
                .entries
                .iter()
                .min_by_key(|entry| (entry.access_count, entry.last_accessed))
                .map(|entry| entry.key().clone()),
            EvictionPolicy::TimeToLive => self
                .entries
                .iter()
                .min_by_key(|entry| entry.expires_at())
                .map(|entry| entry.key().clone()),
        };

        match victim {
            Some(key) if self.entries.remove(&key).is_some() => {
                self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
                debug!(key = %key, ?policy, "evicted cached offers");
                true
            }
            _ => false,
        }
    }

    fn record_lookup_time(&self, started: Instant) {
        let duration_ns = started.elapsed().as_nanos() as u64;
        let total_lookups = self.stats.total_lookups.load(Ordering::SeqCst) as u64;
        let current_avg = self.stats.average_lookup_time_ns.load(Ordering::SeqCst);

        let new_avg = if total_lookups <= 1 {
            duration_ns
        } else {
            (current_avg * (total_lookups - 1) + duration_ns) / total_lookups
        };

        self.stats
            .average_lookup_time_ns
            .store(new_avg, Ordering::SeqCst);
    }
}

impl Default for OfferCache {
    fn default() -> Self {
        Self::new(OfferCacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackGenerator;
    use crate::fixtures::{self, date};
    use crate::search::{Stop, TravelerCounts};
    use std::sync::Arc;
    use std::thread;

    fn hotel_key(destination: &str) -> String {
        create_cache_key(ProviderCategory::Hotels, destination, &["2025-06-01", "2025-06-04"])
    }

    fn small_cache(max_entries: usize, policy: EvictionPolicy) -> OfferCache {
        OfferCache::new(OfferCacheConfig {
            max_entries,
            eviction_policy: policy,
            ..OfferCacheConfig::default()
        })
    }

    #[test]
    fn test_store_and_get() {
        let cache = OfferCache::default();
        let offers = vec![fixtures::hotel("h1", "CDG", 4, 600.0)];

        assert!(cache.store(&hotel_key("CDG"), &offers, None));
        assert_eq!(cache.get(&hotel_key("CDG")), Some(offers));
        assert_eq!(cache.get(&hotel_key("FCO")), None);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.total_lookups, 2);
    }

    #[test]
    fn test_synthetic_offers_are_rejected() {
        let cache = OfferCache::default();
        let stop = Stop {
            destination: "CDG".to_string(),
            check_in: date(2025, 6, 1),
            check_out: date(2025, 6, 4),
        };
        let synthetic = FallbackGenerator::default().hotels(&stop, &TravelerCounts::default(), "USD");

        assert!(!cache.store(&hotel_key("CDG"), &synthetic, None));
        assert_eq!(cache.get(&hotel_key("CDG")), None);
        assert_eq!(cache.stats().rejected_count, 1);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = OfferCache::new(OfferCacheConfig {
            enabled: false,
            ..OfferCacheConfig::default()
        });

        assert!(!cache.store(&hotel_key("CDG"), &[fixtures::hotel("h1", "CDG", 3, 300.0)], None));
        assert_eq!(cache.stats().items_count, 0);
    }

    #[test]
    fn test_expiration_and_ttl() {
        let cache = OfferCache::default();
        let offers = vec![fixtures::activity("a1", "CDG", 25.0)];
        let short = create_cache_key(ProviderCategory::Activities, "CDG", &[]);
        let long = create_cache_key(ProviderCategory::Activities, "FCO", &[]);

        cache.store(&short, &offers, Some(Duration::from_millis(50)));
        cache.store(&long, &offers, None);

        thread::sleep(Duration::from_millis(120));

        assert!(cache.get(&short).is_none());
        assert!(cache.get(&long).is_some());
        assert_eq!(cache.stats().expired_count, 1);
        assert_eq!(cache.stats().items_count, 1);
    }

    #[test]
    fn test_eviction_policy_lru() {
        let cache = small_cache(3, EvictionPolicy::LeastRecentlyUsed);
        let offers = vec![fixtures::hotel("h", "X", 3, 300.0)];

        for destination in ["AAA", "BBB", "CCC"] {
            cache.store(&hotel_key(destination), &offers, None);
            thread::sleep(Duration::from_millis(2));
        }
        // AAA becomes the most recently used
        assert!(cache.get(&hotel_key("AAA")).is_some());
        thread::sleep(Duration::from_millis(2));

        cache.store(&hotel_key("DDD"), &offers, None);

        assert!(cache.get(&hotel_key("AAA")).is_some());
        assert!(cache.get(&hotel_key("BBB")).is_none());
        assert!(cache.get(&hotel_key("CCC")).is_some());
        assert_eq!(cache.stats().eviction_count, 1);
    }

    #[test]
    fn test_eviction_policy_lfu() {
        let cache = small_cache(3, EvictionPolicy::LeastRecentlyUsed);
        cache.set_eviction_policy(EvictionPolicy::LeastFrequentlyUsed);
        let offers = vec![fixtures::hotel("h", "X", 3, 300.0)];

        for destination in ["AAA", "BBB", "CCC"] {
            cache.store(&hotel_key(destination), &offers, None);
        }
        for _ in 0..3 {
            cache.get(&hotel_key("AAA"));
            cache.get(&hotel_key("CCC"));
        }
        // BBB is the most recently read but the least frequently
        cache.get(&hotel_key("BBB"));
        cache.store(&hotel_key("DDD"), &offers, None);

        assert!(cache.get(&hotel_key("AAA")).is_some());
        assert!(cache.get(&hotel_key("BBB")).is_none());
        assert!(cache.get(&hotel_key("CCC")).is_some());
    }

    #[test]
    fn test_eviction_policy_ttl() {
        let cache = small_cache(2, EvictionPolicy::TimeToLive);
        let offers = vec![fixtures::hotel("h", "X", 3, 300.0)];

        cache.store(&hotel_key("AAA"), &offers, Some(Duration::from_secs(600)));
        cache.store(&hotel_key("BBB"), &offers, Some(Duration::from_secs(60)));
        cache.store(&hotel_key("CCC"), &offers, Some(Duration::from_secs(600)));

        assert!(cache.get(&hotel_key("AAA")).is_some());
        assert!(cache.get(&hotel_key("BBB")).is_none());
        assert!(cache.get(&hotel_key("CCC")).is_some());
    }

    #[test]
    fn test_invalidate_by_category_and_destination() {
        let cache = OfferCache::default();
        let flight = vec![fixtures::flight("f1", "CDG", 100.0, 500.0)];
        let hotel = vec![fixtures::hotel("h1", "CDG", 3, 300.0)];

        cache.store(
            &create_cache_key(ProviderCategory::Flights, "CDG", &["JFK", "2025-06-01"]),
            &flight,
            None,
        );
        cache.store(&hotel_key("CDG"), &hotel, None);
        cache.store(&hotel_key("FCO"), &hotel, None);

        assert_eq!(cache.invalidate(Some(ProviderCategory::Hotels), Some("CDG")), 1);
        assert_eq!(cache.invalidate(None, Some("CDG")), 1);
        assert_eq!(cache.stats().items_count, 1);
        assert_eq!(cache.invalidate(None, None), 1);
        assert_eq!(cache.stats().items_count, 0);
    }

    #[test]
    fn test_cache_resize() {
        let cache = small_cache(50, EvictionPolicy::LeastRecentlyUsed);
        let offers = vec![fixtures::activity("a", "X", 10.0)];
        for i in 0..50 {
            cache.store(&hotel_key(&format!("D{:02}", i)), &offers, None);
        }

        cache.resize(10);
        let stats = cache.stats();
        assert_eq!(stats.items_count, 10);
        assert_eq!(stats.eviction_count, 40);

        cache.resize(100);
        for i in 50..120 {
            cache.store(&hotel_key(&format!("D{:02}", i)), &offers, None);
        }
        assert_eq!(cache.stats().items_count, 80);
    }

    #[test]
    fn test_concurrent_access_with_contention() {
        let cache = Arc::new(small_cache(200, EvictionPolicy::LeastFrequentlyUsed));
        let popular = ["CDG", "FCO", "BCN"];
        let offers = vec![fixtures::hotel("h", "X", 4, 500.0)];
        for destination in popular {
            cache.store(&hotel_key(destination), &offers, None);
        }

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let offers = offers.clone();
                thread::spawn(move || {
                    for j in 0..500 {
                        let destination = if rand::random::<f64>() < 0.8 {
                            popular[j % popular.len()].to_string()
                        } else {
                            format!("X{}", i * 1000 + j)
                        };
                        match j % 10 {
                            0..=7 => {
                                cache.get(&hotel_key(&destination));
                            }
                            8 => {
                                cache.store(&hotel_key(&destination), &offers, None);
                            }
                            _ => {
                                cache.invalidate(Some(ProviderCategory::Hotels), Some(&destination));
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.total_lookups, 8 * 400);
        assert_eq!(stats.hit_count + stats.miss_count, stats.total_lookups);
        assert!(stats.items_count <= 200);
    }
}

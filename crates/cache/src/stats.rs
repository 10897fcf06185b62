//! Cache operation counters.

use serde::Serialize;

/// Internal monotonic counters, mutated under the store's lock.
#[derive(Debug, Default)]
pub(crate) struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

/// Point-in-time view of cache activity. All counters except
/// `cache_size` are monotonically increasing over a cache's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub total_lookups: u64,
    pub cache_size: usize,
    /// Sessions with a currently tracked page fingerprint.
    pub tracked_sessions: usize,
    /// Hits as a percentage of total lookups; 0.0 when nothing has been
    /// looked up yet.
    pub hit_rate: f64,
}

impl CacheStats {
    pub(crate) fn snapshot(&self, cache_size: usize, tracked_sessions: usize) -> StatsSnapshot {
        let total_lookups = self.hits + self.misses;
        let hit_rate = if total_lookups == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / total_lookups as f64
        };
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            invalidations: self.invalidations,
            total_lookups,
            cache_size,
            tracked_sessions,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_zero_hit_rate() {
        let snapshot = CacheStats::default().snapshot(0, 0);
        assert_eq!(snapshot.total_lookups, 0);
        assert_eq!(snapshot.hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_percentage() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        let snapshot = stats.snapshot(5, 2);
        assert_eq!(snapshot.total_lookups, 4);
        assert_eq!(snapshot.hit_rate, 75.0);
        assert_eq!(snapshot.cache_size, 5);
        assert_eq!(snapshot.tracked_sessions, 2);
    }
}

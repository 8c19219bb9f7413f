//! Cache usage statistics

use serde::Serialize;

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of resources currently cached
    pub entry_count: usize,

    /// Maximum number of resources
    pub capacity: usize,

    /// Lookups that found an existing resource
    pub hits: u64,

    /// Lookups that found nothing
    pub misses: u64,

    /// Resources allocated on a miss
    pub creations: u64,

    /// Resources dropped to make room
    pub evictions: u64,

    /// Full clears
    pub clears: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate how full the cache is (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entry_count as f64 / self.capacity as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_on_empty_stats() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.utilization(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 1,
            misses: 3,
            entry_count: 5,
            capacity: 10,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.25).abs() < f64::EPSILON);
        assert!((stats.utilization() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = CacheStats {
            evictions: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["evictions"], 2);
    }
}

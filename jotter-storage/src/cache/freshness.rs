//! Cache reads carrying their remaining lifetime.

use std::time::Duration;

/// Result of a cache hit.
///
/// The remaining lifetime is captured in the same read as the value, so a
/// caller never pairs a value with the TTL of a later entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRead<T> {
    value: T,
    expires_in: Duration,
}

impl<T> CacheRead<T> {
    pub fn new(value: T, expires_in: Duration) -> Self {
        Self { value, expires_in }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Get a reference to the underlying value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Remaining lifetime in whole seconds, rounded up.
    pub fn remaining_ttl_secs(&self) -> u64 {
        ttl_seconds(self.expires_in)
    }
}

/// Whole seconds for a remaining lifetime, rounded up.
///
/// Any live entry reports at least one second, and an entry written with a
/// whole-second TTL never reports more than that TTL.
pub fn ttl_seconds(remaining: Duration) -> u64 {
    let millis = remaining.as_millis();
    millis.div_ceil(1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_millis(1)), 1);
        assert_eq!(ttl_seconds(Duration::from_millis(999)), 1);
        assert_eq!(ttl_seconds(Duration::from_millis(1000)), 1);
        assert_eq!(ttl_seconds(Duration::from_millis(1001)), 2);
        assert_eq!(ttl_seconds(Duration::from_secs(15)), 15);
        assert_eq!(ttl_seconds(Duration::ZERO), 0);
    }

    #[test]
    fn test_cache_read_accessors() {
        let read = CacheRead::new(vec![1, 2, 3], Duration::from_millis(4_200));
        assert_eq!(read.value(), &vec![1, 2, 3]);
        assert_eq!(read.remaining_ttl_secs(), 5);
        assert_eq!(read.into_value(), vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn prop_live_ttl_within_bounds(ttl_secs in 1u64..3600, elapsed_ms in 0u64..3_600_000) {
            let ttl = Duration::from_secs(ttl_secs);
            let elapsed = Duration::from_millis(elapsed_ms);
            prop_assume!(elapsed < ttl);
            let reported = ttl_seconds(ttl - elapsed);
            prop_assert!(reported > 0);
            prop_assert!(reported <= ttl_secs);
        }
    }
}

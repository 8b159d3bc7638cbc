use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique token linking one command file to its response file.
///
/// Rendered as `<epoch_millis>_<counter>`. The timestamp makes ids unique
/// across process restarts; the counter makes them unique within one
/// process even when several are minted in the same millisecond.
///
/// Ordering is by the numeric pair, not the rendered string: `_10` sorts
/// after `_9` even though it compares lower byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId {
    epoch_millis: u64,
    counter: u64,
}

impl CorrelationId {
    pub fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Parse the `<epoch_millis>_<counter>` form. Returns `None` for
    /// anything else, including extra separators or non-numeric parts.
    pub fn parse(s: &str) -> Option<Self> {
        let (millis, counter) = s.split_once('_')?;
        Some(CorrelationId {
            epoch_millis: millis.parse().ok()?,
            counter: counter.parse().ok()?,
        })
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.epoch_millis, self.counter)
    }
}

/// Mints correlation ids for one channel instance. The counter lives on the
/// instance rather than in a process-wide static so independent channels
/// (and tests) never contend for it.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> CorrelationId {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let epoch_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        CorrelationId {
            epoch_millis,
            counter,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_display_parse_round_trip() {
        let generator = IdGenerator::new();
        let id = generator.next();
        let parsed = CorrelationId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(CorrelationId::parse("").is_none());
        assert!(CorrelationId::parse("12345").is_none());
        assert!(CorrelationId::parse("abc_1").is_none());
        assert!(CorrelationId::parse("12_x").is_none());
        assert!(CorrelationId::parse("1_2_3").is_none());
    }

    #[test]
    fn test_ids_unique_within_a_burst() {
        let generator = IdGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generator.next()));
        }
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let generator = Arc::new(IdGenerator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let generator = Arc::clone(&generator);
            handles.push(std::thread::spawn(move || {
                (0..1_000).map(|_| generator.next()).collect::<Vec<_>>()
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
    }

    #[test]
    fn test_ordering_is_numeric_not_lexical() {
        let nine = CorrelationId::parse("1717000000000_9").unwrap();
        let ten = CorrelationId::parse("1717000000000_10").unwrap();
        assert!(nine < ten);
        // Lexically "10" < "9", which is exactly the trap.
        assert!(ten.to_string() < nine.to_string());

        let earlier = CorrelationId::parse("1716999999999_50").unwrap();
        assert!(earlier < nine);
    }

    #[test]
    fn test_counter_increases_monotonically() {
        let generator = IdGenerator::new();
        let a = generator.next();
        let b = generator.next();
        assert!(b.counter() > a.counter());
        assert!(a < b);
    }
}

use std::collections::HashSet;

use bidwatch_common::PrimaryKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    New,
    /// Already accepted earlier in this run, e.g. matched by another keyword.
    SeenThisRun,
    /// Present in the destination store's lookback window.
    AlreadyStored,
}

/// Run-scoped dedupe against keys accepted so far and keys already stored.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<PrimaryKey>,
    existing: HashSet<PrimaryKey>,
}

impl Deduplicator {
    pub fn new(existing: HashSet<PrimaryKey>) -> Self {
        Self {
            seen: HashSet::new(),
            existing,
        }
    }

    /// Decide on `key`, remembering it when it is new.
    pub fn admit(&mut self, key: &PrimaryKey) -> DedupVerdict {
        if self.seen.contains(key) {
            return DedupVerdict::SeenThisRun;
        }
        if self.existing.contains(key) {
            return DedupVerdict::AlreadyStored;
        }
        self.seen.insert(key.clone());
        DedupVerdict::New
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_sighting_in_run_is_rejected() {
        let mut dedup = Deduplicator::default();
        let key = PrimaryKey::from("R24BK001-000");

        assert_eq!(dedup.admit(&key), DedupVerdict::New);
        assert_eq!(dedup.admit(&key), DedupVerdict::SeenThisRun);
        assert_eq!(dedup.admit(&key), DedupVerdict::SeenThisRun);
    }

    #[test]
    fn stored_keys_are_rejected() {
        let existing: HashSet<PrimaryKey> = [PrimaryKey::from("R24BK001-000")].into_iter().collect();
        let mut dedup = Deduplicator::new(existing);

        assert_eq!(dedup.admit(&PrimaryKey::from("R24BK001-000")), DedupVerdict::AlreadyStored);
        assert_eq!(dedup.admit(&PrimaryKey::from("R24BK002-000")), DedupVerdict::New);
        // A stored key is never promoted into the run's seen set.
        assert_eq!(dedup.admit(&PrimaryKey::from("R24BK001-000")), DedupVerdict::AlreadyStored);
    }

    #[test]
    fn different_orders_are_different_notices() {
        let mut dedup = Deduplicator::default();
        assert_eq!(dedup.admit(&PrimaryKey::from("R24BK001-000")), DedupVerdict::New);
        assert_eq!(dedup.admit(&PrimaryKey::from("R24BK001-001")), DedupVerdict::New);
    }
}

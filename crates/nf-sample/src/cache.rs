//! Signal event cache.
//!
//! Holds, in original index order, every record the channel predicate
//! classified as signal during the most recent full pass, together with its
//! projection variables. Fast passes iterate this table instead of the whole
//! event source.

use nf_core::{Error, EventSource, InteractionRecord, ProjectionValues, Result, SignalPredicate};

/// One cached signal record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    /// Index of the record in its event source.
    pub index: usize,
    /// Projection variables derived during the full pass.
    pub values: ProjectionValues,
}

/// Ordered table of signal records from the last full pass.
#[derive(Debug, Clone, Default)]
pub struct SignalEventCache {
    entries: Vec<CacheEntry>,
    n_scanned: usize,
}

impl SignalEventCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from scratch: visit every record of `source` once, in order.
    pub fn build(&mut self, source: &dyn EventSource, predicate: &dyn SignalPredicate) -> Result<()> {
        self.build_with(source, predicate, |_, _| {})
    }

    /// Rebuild, calling `on_signal` for each new entry with its record.
    ///
    /// The full pass uses the callback to weight and fill signal records while
    /// they are still borrowed, so each record is read exactly once.
    pub fn build_with<F>(
        &mut self,
        source: &dyn EventSource,
        predicate: &dyn SignalPredicate,
        mut on_signal: F,
    ) -> Result<()>
    where
        F: FnMut(&CacheEntry, &InteractionRecord),
    {
        self.clear();
        let n = source.count();
        for index in 0..n {
            let record = source.record(index).ok_or_else(|| {
                Error::Validation(format!(
                    "{}: record {index} missing (source reports {n} records)",
                    source.label()
                ))
            })?;
            if !predicate.is_signal(&record) {
                continue;
            }
            let entry = CacheEntry { index, values: predicate.derive_variables(&record) };
            on_signal(&entry, &record);
            self.entries.push(entry);
        }
        self.n_scanned = n;
        Ok(())
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.n_scanned = 0;
    }

    /// Number of cached signal records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no signal record is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records visited by the last build.
    pub fn n_scanned(&self) -> usize {
        self.n_scanned
    }

    /// Cached entries in index order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Source indices of cached entries.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::VecEventSource;

    struct Pick(Vec<i32>);

    impl SignalPredicate for Pick {
        fn name(&self) -> &str {
            "pick"
        }

        fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
            ProjectionValues { x: record.mode as f64 * 0.5, ..ProjectionValues::for_mode(record.mode) }
        }

        fn is_signal(&self, record: &InteractionRecord) -> bool {
            self.0.contains(&record.mode)
        }
    }

    fn source(n: i32) -> VecEventSource {
        VecEventSource::new((0..n).map(|i| InteractionRecord::new(i, vec![])).collect())
    }

    #[test]
    fn build_keeps_signal_in_index_order() {
        let mut cache = SignalEventCache::new();
        cache.build(&source(10), &Pick(vec![7, 1, 4, 3])).unwrap();
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.indices().collect::<Vec<_>>(), vec![1, 3, 4, 7]);
        assert_eq!(cache.entries()[2].values.x, 2.0);
        assert_eq!(cache.n_scanned(), 10);
    }

    #[test]
    fn rebuild_replaces_entries() {
        let mut cache = SignalEventCache::new();
        let src = source(5);
        cache.build(&src, &Pick(vec![0, 1, 2])).unwrap();
        cache.build(&src, &Pick(vec![4])).unwrap();
        assert_eq!(cache.indices().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn callback_sees_each_signal_once() {
        let mut cache = SignalEventCache::new();
        let mut seen = Vec::new();
        cache
            .build_with(&source(6), &Pick(vec![2, 5]), |e, r| seen.push((e.index, r.mode)))
            .unwrap();
        assert_eq!(seen, vec![(2, 2), (5, 5)]);
    }

    #[test]
    fn empty_source() {
        let mut cache = SignalEventCache::new();
        cache.build(&source(0), &Pick(vec![0])).unwrap();
        assert!(cache.is_empty());
    }
}

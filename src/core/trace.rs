//! Trace container: decoded entries, timestamp indexes, processed cache.

use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;

use crate::core::{
    EntryCache, Timestamp, TimestampIndex, TimestampType, TraceParser, TraceType,
};
use crate::query::{CustomQueryResult, CustomQueryType};
use crate::util::{Error, Result};

/// A loaded capture.
///
/// Decoding happens once in [`Trace::load`]; entries are processed on
/// demand and cached. Processing of distinct entries is independent, so
/// [`Trace::trees`] fans out over a rayon pool.
pub struct Trace<P: TraceParser> {
    parser: P,
    entries: Vec<P::Entry>,
    real_to_elapsed_offset: Option<i64>,
    elapsed: Option<TimestampIndex>,
    real: Option<TimestampIndex>,
    cache: EntryCache<P::Processed>,
}

impl<P: TraceParser> Trace<P> {
    /// Decode `buffer` with `parser` and index its timestamps.
    pub fn load(parser: P, buffer: &[u8]) -> Result<Self> {
        let _span = tracing::info_span!("trace_load", bytes = buffer.len()).entered();

        let decoded = parser.decode_trace(buffer)?;
        let offset = decoded.real_to_elapsed_offset;
        let entries = decoded.entries;

        let elapsed = build_index(&parser, &entries, TimestampType::Elapsed, offset);
        let real = build_index(&parser, &entries, TimestampType::Real, offset);

        if let Some(pos) = elapsed.as_ref().and_then(TimestampIndex::first_decrease) {
            tracing::warn!(entry = pos, "elapsed timestamps decrease; seeking may be inaccurate");
        }
        tracing::debug!(
            entries = entries.len(),
            has_real = real.is_some(),
            "trace loaded"
        );

        let cache = EntryCache::new(parser.cache_capacity());
        Ok(Self {
            parser,
            entries,
            real_to_elapsed_offset: offset,
            elapsed,
            real,
            cache,
        })
    }

    /// The parser driving this trace.
    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn trace_type(&self) -> TraceType {
        self.parser.trace_type()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decoded entries in capture order.
    pub fn decoded_entries(&self) -> &[P::Entry] {
        &self.entries
    }

    /// File-wide real-to-elapsed offset, if the capture has one.
    pub fn real_to_elapsed_offset(&self) -> Option<i64> {
        self.real_to_elapsed_offset
    }

    /// Timestamps of `kind` in entry order, if every entry has one.
    pub fn timestamps(&self, kind: TimestampType) -> Option<&[Timestamp]> {
        self.index(kind).map(TimestampIndex::as_slice)
    }

    fn index(&self, kind: TimestampType) -> Option<&TimestampIndex> {
        match kind {
            TimestampType::Elapsed => self.elapsed.as_ref(),
            TimestampType::Real => self.real.as_ref(),
        }
    }

    /// Index of the last entry at or before `ts`.
    pub fn index_at(&self, ts: &Timestamp) -> Result<Option<usize>> {
        let index = self
            .index(ts.kind())
            .ok_or(Error::TimestampUnavailable(ts.kind()))?;
        Ok(index.floor_index(ts))
    }

    /// Processed entry at `index`, built on first access.
    pub fn entry(&self, index: usize) -> Result<Arc<P::Processed>> {
        if let Some(hit) = self.cache.get(index) {
            return Ok(hit);
        }
        let decoded = self.entries.get(index).ok_or(Error::EntryOutOfBounds {
            index,
            count: self.entries.len(),
        })?;
        let processed = {
            let _span = tracing::debug_span!("process_entry", index).entered();
            self.parser.process_entry(index, decoded)?
        };
        Ok(self.cache.insert(index, Arc::new(processed)))
    }

    /// Processed entry in effect at `ts` (floor seek).
    pub fn entry_at(&self, ts: &Timestamp) -> Result<Option<Arc<P::Processed>>> {
        match self.index_at(ts)? {
            Some(index) => self.entry(index).map(Some),
            None => Ok(None),
        }
    }

    /// Processed entries of `range`, built in parallel.
    pub fn trees(&self, range: Range<usize>) -> Result<Vec<Arc<P::Processed>>> {
        check_range(&range, self.entries.len())?;
        range.into_par_iter().map(|index| self.entry(index)).collect()
    }

    /// Run a custom query over decoded entries of `range`.
    ///
    /// Never processes entries or touches the cache.
    pub fn custom_query(&self, query: &CustomQueryType, range: Range<usize>) -> Result<CustomQueryResult> {
        check_range(&range, self.entries.len())?;
        self.parser.custom_query(query, &self.entries[range])
    }

    /// Number of processed entries currently cached.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached processed entries.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn build_index<P: TraceParser>(
    parser: &P,
    entries: &[P::Entry],
    kind: TimestampType,
    offset: Option<i64>,
) -> Option<TimestampIndex> {
    entries
        .iter()
        .map(|entry| parser.timestamp(kind, entry, offset))
        .collect::<Option<Vec<_>>>()
        .map(TimestampIndex::new)
}

fn check_range(range: &Range<usize>, count: usize) -> Result<()> {
    if range.start > range.end || range.end > count {
        return Err(Error::InvalidRange {
            start: range.start,
            end: range.end,
            count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DecodedTrace;

    /// Entries are bytes; elapsed time is the byte value, 0 means "dump".
    struct ByteParser;

    impl TraceParser for ByteParser {
        type Entry = u8;
        type Processed = String;

        fn trace_type(&self) -> TraceType {
            TraceType::SurfaceFlinger
        }

        fn decode_trace(&self, buffer: &[u8]) -> Result<DecodedTrace<u8>> {
            Ok(DecodedTrace { entries: buffer.to_vec(), real_to_elapsed_offset: None })
        }

        fn timestamp(&self, kind: TimestampType, entry: &u8, offset: Option<i64>) -> Option<Timestamp> {
            Timestamp::make(kind, i64::from(*entry), offset)
        }

        fn process_entry(&self, index: usize, entry: &u8) -> Result<String> {
            Ok(format!("{}:{}", index, entry))
        }

        fn cache_capacity(&self) -> usize {
            8
        }
    }

    #[test]
    fn test_load_and_seek() {
        let trace = Trace::load(ByteParser, &[10, 20, 30]).unwrap();
        assert_eq!(trace.len(), 3);
        assert!(trace.timestamps(TimestampType::Real).is_none());
        assert_eq!(trace.timestamps(TimestampType::Elapsed).map(<[_]>::len), Some(3));

        assert_eq!(trace.index_at(&Timestamp::elapsed(25)).unwrap(), Some(1));
        assert_eq!(trace.index_at(&Timestamp::elapsed(5)).unwrap(), None);
        assert!(matches!(
            trace.index_at(&Timestamp::real(25)),
            Err(Error::TimestampUnavailable(TimestampType::Real))
        ));

        let entry = trace.entry_at(&Timestamp::elapsed(30)).unwrap().unwrap();
        assert_eq!(entry.as_str(), "2:30");
    }

    #[test]
    fn test_entries_cached() {
        let trace = Trace::load(ByteParser, &[1, 2, 3, 4]).unwrap();
        let all = trace.trees(0..4).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(trace.cached_entries(), 4);

        let again = trace.entry(2).unwrap();
        assert!(Arc::ptr_eq(&again, &all[2]));
    }

    #[test]
    fn test_range_checks() {
        let trace = Trace::load(ByteParser, &[1, 2]).unwrap();
        assert!(matches!(trace.trees(1..3), Err(Error::InvalidRange { .. })));
        assert!(matches!(trace.entry(5), Err(Error::EntryOutOfBounds { index: 5, count: 2 })));
        assert!(matches!(
            trace.custom_query(&CustomQueryType::VsyncId, 0..2),
            Err(Error::UnsupportedQuery(CustomQueryType::VsyncId))
        ));
    }
}

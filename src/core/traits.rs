//! Parser trait implemented by each trace format.
//!
//! A parser supplies the format-specific stages of the pipeline (frame
//! decoding, timestamp resolution, entry processing, custom queries);
//! [`Trace`](super::Trace) drives them and owns the results.

use crate::core::{Timestamp, TimestampType, DEFAULT_CACHE_CAPACITY};
use crate::query::{CustomQueryResult, CustomQueryType};
use crate::util::{Error, Result};

/// Kind of trace a parser understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraceType {
    /// Compositor layer snapshots (`LYRTRACE` captures).
    SurfaceFlinger,
}

/// Output of frame decoding.
#[derive(Clone, Debug)]
pub struct DecodedTrace<E> {
    /// Decoded entries in capture order.
    pub entries: Vec<E>,
    /// File-wide real-to-elapsed offset; `None` when absent or zero.
    pub real_to_elapsed_offset: Option<i64>,
}

/// Format-specific stages of the decode pipeline.
pub trait TraceParser: Send + Sync {
    /// One decoded (not yet processed) entry.
    type Entry: Send + Sync;
    /// Fully processed entry, e.g. an annotated hierarchy tree.
    type Processed: Send + Sync;

    /// Trace type handled by this parser.
    fn trace_type(&self) -> TraceType;

    /// Decode a complete capture buffer. Failure is fatal for the capture.
    fn decode_trace(&self, buffer: &[u8]) -> Result<DecodedTrace<Self::Entry>>;

    /// Resolve a timestamp of `kind` for one entry.
    fn timestamp(
        &self,
        kind: TimestampType,
        entry: &Self::Entry,
        real_to_elapsed_offset: Option<i64>,
    ) -> Option<Timestamp>;

    /// Turn a decoded entry into its processed form.
    fn process_entry(&self, index: usize, entry: &Self::Entry) -> Result<Self::Processed>;

    /// Run a cheap projection over decoded entries.
    ///
    /// The default serves no query kinds.
    fn custom_query(&self, query: &CustomQueryType, entries: &[Self::Entry]) -> Result<CustomQueryResult> {
        let _ = entries;
        Err(Error::UnsupportedQuery(query.clone()))
    }

    /// Number of processed entries the owning trace keeps cached.
    fn cache_capacity(&self) -> usize {
        DEFAULT_CACHE_CAPACITY
    }
}

//! Core trace types: timestamps, the parser trait and the trace container.
//!
//! - [`TraceParser`] - Format-specific pipeline stages
//! - [`Trace`] - Decoded entries, timestamp indexes, processed-entry cache
//! - [`Timestamp`] / [`TimestampIndex`] - Elapsed and real time
//! - [`EntryCache`] - Bounded cache of processed entries

mod cache;
mod time;
mod trace;
mod traits;

pub use cache::*;
pub use time::*;
pub use trace::*;
pub use traits::*;

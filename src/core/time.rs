//! Timestamps and the per-trace timestamp index.
//!
//! Every entry of a trace can be located by an elapsed timestamp (time
//! since boot) and, when the capture carries a real-to-elapsed offset, by
//! a real (wall-clock) timestamp.

use std::fmt;

/// Kind of a timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimestampType {
    /// Monotonic time since boot, in nanoseconds.
    Elapsed,
    /// Wall-clock time in nanoseconds since the Unix epoch.
    Real,
}

/// A typed point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    kind: TimestampType,
    value_ns: i64,
}

impl Timestamp {
    /// Create a timestamp of the given kind.
    pub const fn new(kind: TimestampType, value_ns: i64) -> Self {
        Self { kind, value_ns }
    }

    /// Elapsed timestamp.
    pub const fn elapsed(value_ns: i64) -> Self {
        Self::new(TimestampType::Elapsed, value_ns)
    }

    /// Real timestamp.
    pub const fn real(value_ns: i64) -> Self {
        Self::new(TimestampType::Real, value_ns)
    }

    #[inline]
    pub fn kind(&self) -> TimestampType {
        self.kind
    }

    /// Value in nanoseconds.
    #[inline]
    pub fn value_ns(&self) -> i64 {
        self.value_ns
    }

    /// Whether a timestamp of `kind` can be built given the file offset.
    pub fn can_make(kind: TimestampType, real_to_elapsed_offset: Option<i64>) -> bool {
        match kind {
            TimestampType::Elapsed => true,
            TimestampType::Real => real_to_elapsed_offset.is_some(),
        }
    }

    /// Build a timestamp of `kind` from an elapsed value and the file offset.
    ///
    /// Returns `None` for [`TimestampType::Real`] without an offset.
    pub fn make(kind: TimestampType, elapsed_ns: i64, real_to_elapsed_offset: Option<i64>) -> Option<Self> {
        match kind {
            TimestampType::Elapsed => Some(Self::elapsed(elapsed_ns)),
            TimestampType::Real => {
                real_to_elapsed_offset.map(|offset| Self::real(elapsed_ns.saturating_add(offset)))
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = self.value_ns;
        match self.kind {
            TimestampType::Elapsed => {
                let ms = ns / 1_000_000;
                write!(
                    f,
                    "{}h{}m{}s{}ms",
                    ms / 3_600_000,
                    (ms / 60_000) % 60,
                    (ms / 1000) % 60,
                    ms % 1000
                )
            }
            TimestampType::Real => write!(f, "{}ns (real)", ns),
        }
    }
}

/// Entry-ordered timestamps of one kind.
#[derive(Clone, Debug, Default)]
pub struct TimestampIndex {
    timestamps: Vec<Timestamp>,
}

impl TimestampIndex {
    /// Wrap timestamps listed in entry order.
    pub fn new(timestamps: Vec<Timestamp>) -> Self {
        Self { timestamps }
    }

    #[inline]
    pub fn as_slice(&self) -> &[Timestamp] {
        &self.timestamps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// First index whose timestamp decreases, if any.
    pub fn first_decrease(&self) -> Option<usize> {
        self.timestamps
            .windows(2)
            .position(|w| w[1] < w[0])
            .map(|i| i + 1)
    }

    /// Index of the last entry with timestamp <= `ts` (floor seek).
    ///
    /// Returns `None` when `ts` is before the first entry. With equal
    /// timestamps the last of them wins.
    pub fn floor_index(&self, ts: &Timestamp) -> Option<usize> {
        // Binary search for the first timestamp > ts
        let mut lo = 0;
        let mut hi = self.timestamps.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.timestamps[mid].value_ns <= ts.value_ns {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_timestamp() {
        assert_eq!(
            Timestamp::make(TimestampType::Elapsed, 10, None),
            Some(Timestamp::elapsed(10))
        );
        assert_eq!(Timestamp::make(TimestampType::Real, 10, None), None);
        assert_eq!(
            Timestamp::make(TimestampType::Real, 10, Some(1_000)),
            Some(Timestamp::real(1_010))
        );
        assert!(!Timestamp::can_make(TimestampType::Real, None));
    }

    #[test]
    fn test_floor_index() {
        let index = TimestampIndex::new(vec![
            Timestamp::elapsed(10),
            Timestamp::elapsed(20),
            Timestamp::elapsed(20),
            Timestamp::elapsed(40),
        ]);
        assert_eq!(index.floor_index(&Timestamp::elapsed(5)), None);
        assert_eq!(index.floor_index(&Timestamp::elapsed(10)), Some(0));
        assert_eq!(index.floor_index(&Timestamp::elapsed(25)), Some(2));
        assert_eq!(index.floor_index(&Timestamp::elapsed(1_000)), Some(3));
        assert_eq!(index.first_decrease(), None);
    }

    #[test]
    fn test_first_decrease() {
        let index = TimestampIndex::new(vec![
            Timestamp::elapsed(10),
            Timestamp::elapsed(5),
        ]);
        assert_eq!(index.first_decrease(), Some(1));
    }

    #[test]
    fn test_display_elapsed() {
        assert_eq!(Timestamp::elapsed(850_746_266_486).to_string(), "0h14m10s746ms");
    }
}

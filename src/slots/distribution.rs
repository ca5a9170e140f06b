//! Slot ranges and the even split of the slot space between primaries.

use std::str::FromStr;

use thiserror::Error;

/// Number of hash slots in a cluster.
pub const TOTAL_SLOTS: u16 = 16384;

/// Highest valid slot number.
pub const MAX_SLOT: u16 = TOTAL_SLOTS - 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid slot range '{input}': {reason}")]
pub struct SlotRangeParseError {
    pub input: String,
    pub reason: String,
}

/// Inclusive range of slots, written `start-end` or just `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotRange {
    pub start: u16,
    pub end: u16,
}

impl SlotRange {
    /// Callers guarantee `start <= end <= MAX_SLOT`; debug builds check it.
    pub fn new(start: u16, end: u16) -> Self {
        debug_assert!(start <= end && end <= MAX_SLOT, "bad slot range {}-{}", start, end);
        Self { start, end }
    }

    pub fn single(slot: u16) -> Self {
        Self::new(slot, slot)
    }

    pub fn full() -> Self {
        Self::new(0, MAX_SLOT)
    }

    pub fn count(&self) -> u16 {
        self.end - self.start + 1
    }

    pub fn contains(&self, slot: u16) -> bool {
        (self.start..=self.end).contains(&slot)
    }

    pub fn overlaps(&self, other: &SlotRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for SlotRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

fn parse_slot(input: &str, part: &str) -> Result<u16, SlotRangeParseError> {
    let invalid = |reason: String| SlotRangeParseError {
        input: input.to_string(),
        reason,
    };
    let slot = part
        .trim()
        .parse::<u16>()
        .map_err(|_| invalid(format!("'{}' is not a slot number", part)))?;
    if slot > MAX_SLOT {
        return Err(invalid(format!("slot {} is above {}", slot, MAX_SLOT)));
    }
    Ok(slot)
}

impl FromStr for SlotRange {
    type Err = SlotRangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let (start, end) = match input.split_once('-') {
            Some((lo, hi)) => (parse_slot(input, lo)?, parse_slot(input, hi)?),
            None => {
                let slot = parse_slot(input, input)?;
                (slot, slot)
            }
        };
        if start > end {
            return Err(SlotRangeParseError {
                input: input.to_string(),
                reason: "start is greater than end".to_string(),
            });
        }
        Ok(SlotRange::new(start, end))
    }
}

/// Split the slot space between `primaries` nodes the way
/// `redis-cli --cluster create` does.
///
/// Primary `i` ends at `round((i + 1) * 16384 / n) - 1` and the last one
/// always ends at 16383.
///
/// ```
/// use booking_migrator::slots::{calculate_distribution, SlotRange};
///
/// assert_eq!(
///     calculate_distribution(3),
///     vec![
///         SlotRange::new(0, 5460),
///         SlotRange::new(5461, 10922),
///         SlotRange::new(10923, 16383),
///     ]
/// );
/// ```
pub fn calculate_distribution(primaries: u16) -> Vec<SlotRange> {
    let n = u32::from(primaries.min(TOTAL_SLOTS));
    let total = u32::from(TOTAL_SLOTS);

    let mut next = 0u32;
    (1..=n)
        .filter_map(|i| {
            // Halves are rounded up: (2 * (i * total - n) + n) / (2 * n).
            let rounded = (2 * (i * total - n) + n) / (2 * n);
            let end = if i == n { total - 1 } else { rounded.clamp(next, total - 1) };
            let range = SlotRange::new(u16::try_from(next).ok()?, u16::try_from(end).ok()?);
            next = end + 1;
            Some(range)
        })
        .collect()
}

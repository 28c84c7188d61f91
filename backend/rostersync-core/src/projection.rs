// src/projection.rs
use std::collections::HashMap;

/// Codes that move an assignment off the roster's own day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRules {
    /// Repeats for the same employee within one roster roll to the next day.
    pub transfer_code: String,
    /// Cross-midnight shift, always attributed to the following day.
    pub overnight_code: String,
}

impl Default for ShiftRules {
    fn default() -> Self {
        Self {
            transfer_code: "乘".to_string(),
            overnight_code: "下".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Write to this day.
    Day(u32),
    /// Target day lies past the end of the month; nothing is written.
    OutOfRange(u32),
}

impl Projection {
    pub fn target_day(&self) -> u32 {
        match self {
            Projection::Day(d) | Projection::OutOfRange(d) => *d,
        }
    }
}

impl ShiftRules {
    /// Maps a roster entry to its attendance day.
    ///
    /// `prior_occurrences` is how many times this employee was already seen with the
    /// transfer code in the current roster file; it is ignored for other codes.
    pub fn project(
        &self,
        code: &str,
        source_day: u32,
        prior_occurrences: u32,
        month_length: u32,
    ) -> Projection {
        let target = if code == self.transfer_code {
            if prior_occurrences == 0 {
                source_day
            } else {
                source_day + 1
            }
        } else if code == self.overnight_code {
            source_day + 1
        } else {
            source_day
        };

        if target > month_length {
            Projection::OutOfRange(target)
        } else {
            Projection::Day(target)
        }
    }
}

/// Per-employee transfer-shift occurrences within a single roster file.
#[derive(Debug, Default)]
pub struct TransferCounter {
    counts: HashMap<String, u32>,
}

impl TransferCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of earlier occurrences and records this one.
    pub fn next(&mut self, name: &str) -> u32 {
        let count = self.counts.entry(name.to_string()).or_insert(0);
        let prior = *count;
        *count += 1;
        prior
    }
}

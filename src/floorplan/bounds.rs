//! Candidate board heights for the height search

use super::Instance;
use std::fmt;
use std::ops::RangeInclusive;

/// Range of board heights worth trying. `max` is included on purpose: a
/// single 5x2 circuit on a width-2 board only packs at height 5 = `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRange {
    pub min: usize,
    pub max: usize,
}

impl HeightRange {
    /// Lower bound: tallest circuit or area divided by board width.
    /// Upper bound: every circuit stacked on its longest side.
    pub fn estimate(instance: &Instance) -> Self {
        let tallest = instance.circuits.iter().map(|c| c.height).max().unwrap_or(0);
        let area_bound = instance.total_area().div_ceil(instance.board_width);
        let stacked = instance.circuits.iter().map(|c| c.max_side()).sum();

        Self {
            min: tallest.max(area_bound),
            max: stacked,
        }
    }

    /// Clamp the upper end to `cap` when one is configured
    pub fn with_cap(self, cap: Option<usize>) -> Self {
        match cap {
            Some(cap) => Self {
                min: self.min,
                max: self.max.min(cap),
            },
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max - self.min + 1
        }
    }

    pub fn contains(&self, height: usize) -> bool {
        self.min <= height && height <= self.max
    }

    /// Heights in ascending order
    pub fn heights(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }
}

impl fmt::Display for HeightRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[{}, {}] (empty)", self.min, self.max)
        } else {
            write!(f, "[{}, {}] ({} heights)", self.min, self.max, self.len())
        }
    }
}

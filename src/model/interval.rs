//! Genomic coordinate primitives: strand and the closed 1-based interval.

use serde::{Deserialize, Serialize};

use crate::common::Coord;
use crate::err::{MikadoError, Result};

/// Strand of a transcript or feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    /// Flip `+` to `-` and vice versa; `Unknown` is unaffected.
    pub fn flipped(self) -> Strand {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
            Strand::Unknown => ".",
        };
        write!(f, "{s}")
    }
}

/// Closed, 1-based `[start, end]` interval on a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: Coord,
    pub end: Coord,
}

impl Interval {
    pub fn new(start: Coord, end: Coord) -> Result<Self> {
        if start > end {
            return Err(MikadoError::InvalidTranscript {
                tid: String::new(),
                reason: format!("interval start {start} > end {end}"),
            });
        }
        Ok(Interval { start, end })
    }

    /// Length of the interval, inclusive on both ends.
    pub fn len(&self) -> Coord {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Overlap amount with another interval; see [`crate::common::overlap`].
    pub fn overlap(&self, other: &Interval) -> Coord {
        crate::common::overlap((self.start, self.end), (other.start, other.end))
    }

    pub fn as_tuple(&self) -> (Coord, Coord) {
        (self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_interval() {
        assert!(Interval::new(10, 5).is_err());
    }

    #[test]
    fn length_is_inclusive() {
        assert_eq!(Interval::new(100, 200).unwrap().len(), 101);
    }
}

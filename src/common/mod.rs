//! Common functionality shared across the crate: CLI verbosity plumbing and
//! the genomic coordinate primitives used throughout the locus core.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Commonly used command line arguments, following the teacher's pattern of a
/// single flattened `Verbosity` flag shared by every subcommand.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Verbosity of the program.
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Install a `tracing` subscriber at the level implied by `args.verbose`.
pub fn init_tracing(args: &Args) {
    let level = match args.verbose.log_level() {
        Some(log::Level::Error) => tracing::Level::ERROR,
        Some(log::Level::Warn) => tracing::Level::WARN,
        Some(log::Level::Info) => tracing::Level::INFO,
        Some(log::Level::Debug) => tracing::Level::DEBUG,
        Some(log::Level::Trace) => tracing::Level::TRACE,
        None => tracing::Level::WARN,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .compact()
        .finish();
    // Multiple tests in the same process may attempt this; ignore failure.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Closed 1-based `[start, end]` interval on a chromosome, `start <= end`.
pub type Coord = i64;

/// Genomic overlap primitive shared by every intersection predicate:
/// `overlap((a,b),(c,d)) = min(b,d) - max(a,c)`. Positive means genuine
/// overlap, zero or negative means the intervals are disjoint (or merely
/// touching, for zero).
pub fn overlap(first: (Coord, Coord), second: (Coord, Coord)) -> Coord {
    let lend = first.0.max(second.0);
    let rend = first.1.min(second.1);
    rend - lend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_positive() {
        assert_eq!(overlap((100, 200), (150, 250)), 50);
    }

    #[test]
    fn overlap_disjoint_is_negative() {
        assert_eq!(overlap((100, 200), (300, 400)), -100);
    }

    #[test]
    fn overlap_touching_is_zero() {
        assert_eq!(overlap((100, 200), (201, 300)), -1);
        assert_eq!(overlap((100, 200), (200, 300)), 0);
    }
}

//! The transcript/locus data model: coordinates, evidence views, and the
//! `Transcript` record together with its ORF reconciliation and chimera
//! splitting logic.

pub mod evidence;
pub mod interval;
pub mod orf;
pub mod transcript;

pub use evidence::{BlastHit, CandidateOrf, EmptyEvidenceStore, EvidenceStore, Hsp, InMemoryEvidenceStore, JunctionKey};
pub use interval::{Interval, Strand};
pub use orf::{reconcile_orfs, split_by_cds, ChimeraSplitConfig, OrfLoadingConfig};
pub use transcript::{Feature, FeatureKind, InternalOrf, Segment, SegmentKind, Transcript};

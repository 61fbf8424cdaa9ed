//! Read-only evidence views consumed by the core: verified splice junctions,
//! candidate ORFs and BLAST homology hits. These are the external-evidence
//! contract described in spec §3/§6 — parsing them from files or a database
//! is an external collaborator's job; the core only ever reads through this
//! trait.

use std::collections::{HashMap, HashSet};

use crate::common::Coord;
use crate::model::interval::Strand;

/// One candidate ORF for a transcript, as supplied by an external predictor
/// (BED12-like: `thick_start`/`thick_end` are 1-based, inclusive, in
/// transcript coordinates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOrf {
    pub thick_start: Coord,
    pub thick_end: Coord,
    pub strand: Strand,
    pub has_start_codon: bool,
    pub has_stop_codon: bool,
}

impl CandidateOrf {
    pub fn cds_len(&self) -> Coord {
        self.thick_end - self.thick_start + 1
    }
}

/// One HSP (high-scoring segment pair) inside a BLAST hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hsp {
    pub query_hsp_start: Coord,
    pub query_hsp_end: Coord,
    pub hsp_evalue: f64,
}

/// One BLAST hit for a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct BlastHit {
    pub query_start: Coord,
    pub query_end: Coord,
    pub evalue: f64,
    pub target: String,
    pub hsps: Vec<Hsp>,
}

/// A verified intron key: `(chrom, intron_start, intron_end, strand)`.
pub type JunctionKey = (String, Coord, Coord, Strand);

/// Read-only evidence lookups the core is allowed to perform. Implementors
/// may be backed by an in-memory map (preferred, per spec §5) or by a
/// connection to an external store; either way no core function mutates the
/// evidence.
pub trait EvidenceStore: Send + Sync {
    /// Whether the given intron is present in the verified-junction view.
    fn has_junction(&self, chrom: &str, start: Coord, end: Coord, strand: Strand) -> bool;
    /// Candidate ORFs for a transcript, in no particular order (the caller
    /// sorts by decreasing CDS length per spec §4.2).
    fn orfs_for(&self, transcript_id: &str) -> Vec<CandidateOrf>;
    /// BLAST hits for a transcript.
    fn hits_for(&self, transcript_id: &str) -> Vec<BlastHit>;
}

/// The one concrete `EvidenceStore` the core ships: a `HashMap`-backed,
/// immutable, shareable view. A SQL-backed store is an external
/// collaborator's concern (spec §1 Out-of-scope).
#[derive(Debug, Default, Clone)]
pub struct InMemoryEvidenceStore {
    junctions: HashSet<JunctionKey>,
    orfs: HashMap<String, Vec<CandidateOrf>>,
    hits: HashMap<String, Vec<BlastHit>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_junction(mut self, chrom: impl Into<String>, start: Coord, end: Coord, strand: Strand) -> Self {
        self.junctions.insert((chrom.into(), start, end, strand));
        self
    }

    pub fn with_orfs(mut self, transcript_id: impl Into<String>, orfs: Vec<CandidateOrf>) -> Self {
        self.orfs.insert(transcript_id.into(), orfs);
        self
    }

    pub fn with_hits(mut self, transcript_id: impl Into<String>, hits: Vec<BlastHit>) -> Self {
        self.hits.insert(transcript_id.into(), hits);
        self
    }
}

impl EvidenceStore for InMemoryEvidenceStore {
    fn has_junction(&self, chrom: &str, start: Coord, end: Coord, strand: Strand) -> bool {
        self.junctions
            .contains(&(chrom.to_string(), start, end, strand))
    }

    fn orfs_for(&self, transcript_id: &str) -> Vec<CandidateOrf> {
        self.orfs.get(transcript_id).cloned().unwrap_or_default()
    }

    fn hits_for(&self, transcript_id: &str) -> Vec<BlastHit> {
        self.hits.get(transcript_id).cloned().unwrap_or_default()
    }
}

/// A no-op store used when evidence is unavailable for a transcript
/// (spec §7, `EvidenceUnavailable`): the core proceeds with empty evidence.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyEvidenceStore;

impl EvidenceStore for EmptyEvidenceStore {
    fn has_junction(&self, _chrom: &str, _start: Coord, _end: Coord, _strand: Strand) -> bool {
        false
    }
    fn orfs_for(&self, _transcript_id: &str) -> Vec<CandidateOrf> {
        Vec::new()
    }
    fn hits_for(&self, _transcript_id: &str) -> Vec<BlastHit> {
        Vec::new()
    }
}

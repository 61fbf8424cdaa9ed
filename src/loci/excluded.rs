//! Excluded: the bucket for transcripts that never made it into a locus —
//! purged by `requirements`, or left over after alternative-splicing
//! election filled its quota (spec §4.7 Non-goals note: these are still
//! reported, never silently dropped).

use crate::model::interval::Strand;
use crate::model::transcript::Transcript;

#[derive(Debug, Clone)]
pub struct Excluded {
    pub chrom: String,
    pub strand: Strand,
    pub transcripts: Vec<Transcript>,
}

impl Excluded {
    pub fn new(chrom: impl Into<String>, strand: Strand, transcripts: Vec<Transcript>) -> Self {
        Excluded { chrom: chrom.into(), strand, transcripts }
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }
}

//! Monosublocus: a trivial single-transcript container, the unit a sublocus
//! emits one at a time via greedy best-first selection (spec §4.6–§4.7). Its
//! members are re-merged across sublocus boundaries by
//! [`crate::loci::monosublocus_holder`].

use crate::loci::AbstractLocus;
use crate::model::interval::Strand;
use crate::model::transcript::Transcript;

#[derive(Debug, Clone)]
pub struct Monosublocus {
    pub locus: AbstractLocus,
    pub transcript: Transcript,
}

impl Monosublocus {
    pub fn new(chrom: &str, strand: Strand, transcript: Transcript) -> Self {
        let locus = AbstractLocus::from_members(chrom, strand, std::slice::from_ref(&transcript), vec![0]);
        Monosublocus { locus, transcript }
    }
}

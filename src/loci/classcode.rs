//! A reduced class-code comparator: just the relationships the
//! alternative-splicing election step needs to decide whether a transcript
//! is a legitimate isoform of the locus primary, grounded in the spirit of
//! the original Mikado class-code table (Python `scales/assigner.py`)
//! without reproducing its full sequence-assignment machinery, which is
//! out of scope here (spec §1 Non-goals: no comparison against a reference
//! annotation).

use crate::common::{overlap, Coord};
use crate::model::transcript::Transcript;

/// Coarse relationship between two transcripts' exon/intron structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// Identical intron chains (or, for monoexonic transcripts, identical span).
    Equal,
    /// `a`'s intron chain is a subset of `b`'s (`a` is contained in `b`).
    Contained,
    /// The reverse of `Contained`.
    Containing,
    /// Overlapping exonic span with no shared splice sites.
    Overlapping,
    /// No genomic overlap at all.
    Unrelated,
}

/// Classify the relationship of `a` relative to `b`.
pub fn relationship(a: &Transcript, b: &Transcript) -> Relationship {
    if overlap((a.start, a.end), (b.start, b.end)) <= 0 {
        return Relationship::Unrelated;
    }
    if a.introns == b.introns {
        return Relationship::Equal;
    }
    let a_introns: Vec<&(Coord, Coord)> = a.introns.iter().collect();
    let b_introns: Vec<&(Coord, Coord)> = b.introns.iter().collect();
    if !a_introns.is_empty() && a_introns.iter().all(|i| b.introns.contains(i)) {
        return Relationship::Contained;
    }
    if !b_introns.is_empty() && b_introns.iter().all(|i| a.introns.contains(i)) {
        return Relationship::Containing;
    }
    Relationship::Overlapping
}

/// Fraction of `a`'s exonic bases that fall within `b`'s exonic span
/// (cheap approximation via genomic overlap of the two full spans' exons,
/// used for the alternative-splicing `min_cdna_overlap`/`min_cds_overlap`
/// thresholds).
pub fn exonic_overlap_fraction(a: &Transcript, b: &Transcript) -> f64 {
    let a_len = a.cdna_length();
    if a_len == 0 {
        return 0.0;
    }
    let mut shared: Coord = 0;
    for ea in &a.exons {
        for eb in &b.exons {
            let ov = overlap(ea.as_tuple(), eb.as_tuple());
            if ov > 0 {
                shared += ov;
            }
        }
    }
    shared as f64 / a_len as f64
}

/// Fraction of `a`'s CDS bases that fall within `b`'s CDS span.
pub fn cds_overlap_fraction(a: &Transcript, b: &Transcript) -> f64 {
    let a_len = a.combined_cds_length();
    if a_len == 0 {
        return 0.0;
    }
    let mut shared: Coord = 0;
    for ca in &a.combined_cds {
        for cb in &b.combined_cds {
            let ov = overlap(ca.as_tuple(), cb.as_tuple());
            if ov > 0 {
                shared += ov;
            }
        }
    }
    shared as f64 / a_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    fn mk(id: &str, exons: &[(Coord, Coord)]) -> Transcript {
        let mut t = Transcript::new(id, "chr1", "test", Strand::Plus);
        t.start = exons.first().unwrap().0;
        t.end = exons.last().unwrap().1;
        for &(s, e) in exons {
            t.add_exon(FeatureKind::Exon, s, e).unwrap();
        }
        t.finalize().unwrap();
        t
    }

    #[test]
    fn identical_intron_chains_are_equal() {
        let a = mk("a", &[(1, 100), (201, 300)]);
        let b = mk("b", &[(1, 100), (201, 300)]);
        assert_eq!(relationship(&a, &b), Relationship::Equal);
    }

    #[test]
    fn disjoint_transcripts_are_unrelated() {
        let a = mk("a", &[(1, 100)]);
        let b = mk("b", &[(1000, 1100)]);
        assert_eq!(relationship(&a, &b), Relationship::Unrelated);
    }

    #[test]
    fn subset_intron_chain_is_contained() {
        let a = mk("a", &[(1, 100), (201, 300)]);
        let b = mk("b", &[(1, 100), (201, 300), (401, 500)]);
        assert_eq!(relationship(&a, &b), Relationship::Contained);
        assert_eq!(relationship(&b, &a), Relationship::Containing);
    }
}

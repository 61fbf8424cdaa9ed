//! The locus hierarchy: superlocus → sublocus → monosublocus →
//! monosublocus-holder → locus (+ excluded), spec §4.4–§4.9.
//!
//! Each stage owns its member transcripts directly (`Vec<Transcript>`),
//! cloning them forward into the next stage rather than sharing one arena
//! with index references or back-pointers to a parent. `Transcript` carries
//! no parent pointer at all — `parent` is just a `Vec<String>` of IDs — so
//! this stays cheap and avoids lifetime bookkeeping across independently
//! compiled modules (see `DESIGN.md`'s "per-stage ownership" note).

pub mod classcode;
pub mod excluded;
pub mod locus;
pub mod monosublocus;
pub mod monosublocus_holder;
pub mod sublocus;
pub mod superlocus;

use std::collections::HashSet;

use crate::common::Coord;
use crate::model::interval::Strand;
use crate::model::transcript::Transcript;

/// Shared bookkeeping every locus stage carries: its genomic span, strand
/// and member transcript indices into the shared arena.
#[derive(Debug, Clone)]
pub struct AbstractLocus {
    pub chrom: String,
    pub strand: Strand,
    pub start: Coord,
    pub end: Coord,
    pub members: Vec<usize>,
}

impl AbstractLocus {
    pub fn new(chrom: impl Into<String>, strand: Strand) -> Self {
        AbstractLocus {
            chrom: chrom.into(),
            strand,
            start: Coord::MAX,
            end: Coord::MIN,
            members: Vec::new(),
        }
    }

    /// Widen the span to include `t` and record its arena index.
    pub fn add_member(&mut self, index: usize, t: &Transcript) {
        self.members.push(index);
        self.start = self.start.min(t.start);
        self.end = self.end.max(t.end);
    }

    pub fn from_members(chrom: impl Into<String>, strand: Strand, arena: &[Transcript], members: Vec<usize>) -> Self {
        let mut locus = AbstractLocus::new(chrom, strand);
        for &idx in &members {
            locus.add_member(idx, &arena[idx]);
        }
        locus.members = members;
        locus
    }
}

/// Two transcripts are compatible members of the same superlocus when they
/// share a chromosome, their spans overlap, and their strands are not
/// definitely incompatible (`Unknown` is compatible with anything, spec
/// §4.1's "strand-aware" overlap definition).
pub fn superlocus_compatible(a: &Transcript, b: &Transcript) -> bool {
    a.chrom == b.chrom
        && crate::common::overlap((a.start, a.end), (b.start, b.end)) >= 0
        && (a.strand == b.strand || a.strand == Strand::Unknown || b.strand == Strand::Unknown)
}

/// Two transcripts belong to the same sublocus when, in addition to
/// superlocus compatibility: both are multi-exonic and share an intron (a
/// CDS intron, when `cds_only`), or both are monoexonic and overlap. A
/// monoexonic transcript never intersects a multi-exonic one (spec §4.4:
/// "Mixed mono/multi ⇒ no intersection").
pub fn sublocus_compatible(a: &Transcript, b: &Transcript, cds_only: bool) -> bool {
    if !superlocus_compatible(a, b) {
        return false;
    }
    match (a.monoexonic(), b.monoexonic()) {
        (true, true) => crate::common::overlap((a.start, a.end), (b.start, b.end)) > 0,
        (false, false) => {
            if cds_only {
                a.combined_cds_introns().iter().any(|i| b.combined_cds_introns().contains(i))
            } else {
                a.introns.iter().any(|i| b.introns.contains(i))
            }
        }
        _ => false,
    }
}

/// Two transcripts intersect under the monosublocus-holder predicate when
/// they overlap in cDNA and either share a splice site (a CDS splice site,
/// when `cds_only`) or one of them is monoexonic and overlaps the other by
/// at least `min_monoexonic_overlap` of its own length (spec §4.4/§4.8).
pub fn monosublocus_holder_compatible(
    a: &Transcript,
    b: &Transcript,
    cds_only: bool,
    min_monoexonic_overlap: f64,
) -> bool {
    if a.chrom != b.chrom {
        return false;
    }
    if !(a.strand == b.strand || a.strand == Strand::Unknown || b.strand == Strand::Unknown) {
        return false;
    }
    if crate::common::overlap((a.start, a.end), (b.start, b.end)) <= 0 {
        return false;
    }
    let shares_splice_site = if cds_only {
        let a_sites = a.cds_splice_sites();
        let b_sites = b.cds_splice_sites();
        a_sites.iter().any(|s| b_sites.contains(s))
    } else {
        a.splices.iter().any(|s| b.splices.contains(s))
    };
    if shares_splice_site {
        return true;
    }
    if a.monoexonic() && classcode::exonic_overlap_fraction(a, b) >= min_monoexonic_overlap {
        return true;
    }
    if b.monoexonic() && classcode::exonic_overlap_fraction(b, a) >= min_monoexonic_overlap {
        return true;
    }
    false
}

/// Write the locus-relative metrics (spec §3: `exon_fraction`,
/// `intron_fraction`, `combined_cds_intron_fraction`,
/// `selected_cds_intron_fraction`, `retained_introns`, `retained_fraction`)
/// into every transcript in `transcripts`, using denominators computed over
/// the whole group. Shared by [`sublocus::Sublocus`] and
/// [`monosublocus_holder::MonosublocusHolder`], whose only difference is
/// which transcripts are grouped together when this runs.
pub fn gather_metrics(transcripts: &mut [Transcript]) {
    let mut total_introns: HashSet<(Coord, Coord)> = HashSet::new();
    let mut total_exons: HashSet<(Coord, Coord)> = HashSet::new();
    let mut total_cds_introns: HashSet<(Coord, Coord)> = HashSet::new();
    let mut total_selected_cds_introns: HashSet<(Coord, Coord)> = HashSet::new();
    for t in transcripts.iter() {
        total_introns.extend(t.introns.iter().copied());
        total_exons.extend(t.exons.iter().map(|e| e.as_tuple()));
        total_cds_introns.extend(t.combined_cds_introns());
        total_selected_cds_introns.extend(t.selected_cds_introns());
    }
    let all_introns: Vec<(Coord, Coord)> = transcripts.iter().flat_map(|t| t.introns.iter().copied()).collect();

    for t in transcripts.iter_mut() {
        t.intron_fraction = if total_introns.is_empty() {
            1.0
        } else {
            t.introns.len() as f64 / total_introns.len() as f64
        };
        t.exon_fraction = if total_exons.is_empty() {
            1.0
        } else {
            t.exons.len() as f64 / total_exons.len() as f64
        };
        t.combined_cds_intron_fraction = if total_cds_introns.is_empty() {
            1.0
        } else {
            t.combined_cds_introns().len() as f64 / total_cds_introns.len() as f64
        };
        t.selected_cds_intron_fraction = if total_selected_cds_introns.is_empty() {
            1.0
        } else {
            t.selected_cds_introns().len() as f64 / total_selected_cds_introns.len() as f64
        };

        let my_introns: HashSet<(Coord, Coord)> = t.introns.iter().copied().collect();
        let mut retained: Vec<(Coord, Coord)> = all_introns
            .iter()
            .filter(|i| !my_introns.contains(i))
            .filter(|&&(s, e)| t.exons.iter().any(|ex| ex.start <= s && ex.end >= e))
            .copied()
            .collect();
        retained.sort_unstable();
        retained.dedup();

        // retained_exonic_length: length of the (deduplicated) exons that
        // harbor at least one retained intron, not a per-intron sum.
        let retaining_exons: HashSet<(Coord, Coord)> = t
            .exons
            .iter()
            .filter(|ex| retained.iter().any(|&(s, e)| ex.start <= s && ex.end >= e))
            .map(|ex| ex.as_tuple())
            .collect();
        let retained_exonic_length: Coord = retaining_exons.iter().map(|&(s, e)| e - s + 1).sum();
        let cdna_length = t.cdna_length();
        t.retained_fraction = if cdna_length == 0 {
            0.0
        } else {
            retained_exonic_length as f64 / cdna_length as f64
        };
        t.retained_introns = retained;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transcript::FeatureKind;

    #[test]
    fn retained_intron_detected_against_siblings() {
        let mut spliced = Transcript::new("spliced", "chr1", "test", Strand::Plus);
        spliced.start = 1;
        spliced.end = 300;
        spliced.add_exon(FeatureKind::Exon, 1, 100).unwrap();
        spliced.add_exon(FeatureKind::Exon, 201, 300).unwrap();
        spliced.finalize().unwrap();

        let mut retaining = Transcript::new("retaining", "chr1", "test", Strand::Plus);
        retaining.start = 1;
        retaining.end = 300;
        retaining.add_exon(FeatureKind::Exon, 1, 300).unwrap();
        retaining.finalize().unwrap();

        let mut group = vec![spliced, retaining];
        gather_metrics(&mut group);
        assert!(group[1].retained_introns.contains(&(101, 200)));
        assert!(group[0].retained_introns.is_empty());
    }
}

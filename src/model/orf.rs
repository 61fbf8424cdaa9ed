//! ORF reconciliation and chimera splitting.
//!
//! Grounded on `loci_objects/transcript.py`'s `load_orfs`/`split_by_cds` from
//! the original Mikado: candidate ORFs reported by an external predictor are
//! clustered by transcript-coordinate overlap, a representative is chosen
//! per cluster, and the winners are projected back onto genomic coordinates.
//! Graph clustering itself is generalized from the teacher's interval-based
//! clustering (see [`crate::graph`]).

use std::collections::HashSet;

use serde::Deserialize;

use crate::common::{overlap, Coord};
use crate::err::Result;
use crate::model::evidence::{BlastHit, CandidateOrf};
use crate::model::interval::{Interval, Strand};
use crate::model::transcript::{InternalOrf, Segment, SegmentKind, Transcript};

/// Tunables for ORF reconciliation (spec §4.2, config `orf_loading` section).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OrfLoadingConfig {
    /// Minimum CDS length (bp) for a non-primary ORF to be retained.
    pub minimal_secondary_orf_length: Coord,
    /// When `true`, a monoexonic transcript's strand is never flipped to
    /// accommodate a `-`-strand candidate ORF; such candidates are dropped
    /// instead.
    pub trust_strand: bool,
}

impl Default for OrfLoadingConfig {
    fn default() -> Self {
        OrfLoadingConfig {
            minimal_secondary_orf_length: 100,
            trust_strand: false,
        }
    }
}

/// Tunables for chimera splitting (spec §4.3, config `chimera_split` section).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChimeraSplitConfig {
    pub execute: bool,
    pub blast_check: bool,
    pub minimal_hsp_overlap: f64,
    pub maximal_hsp_evalue: f64,
}

impl Default for ChimeraSplitConfig {
    fn default() -> Self {
        ChimeraSplitConfig {
            execute: true,
            blast_check: true,
            minimal_hsp_overlap: 0.9,
            maximal_hsp_evalue: 1e-6,
        }
    }
}

/// Replace a finalized transcript's annotation CDS with the ORFs chosen from
/// `candidates`, per spec §4.2. If no candidate survives filtering, the
/// transcript is left with its annotation-derived CDS untouched (the
/// "fall back to annotation" case).
pub fn reconcile_orfs(
    transcript: &mut Transcript,
    candidates: &[CandidateOrf],
    cfg: &OrfLoadingConfig,
) -> Result<()> {
    transcript.finalize()?;
    if candidates.is_empty() {
        return Ok(());
    }

    let monoexonic = transcript.monoexonic();
    let cdna_len = transcript.cdna_length();

    let mut candidates: Vec<CandidateOrf> = candidates.to_vec();
    if !monoexonic {
        // Multi-exonic transcripts already have a fixed strand (from
        // splicing); only ORFs agreeing with it make sense.
        let known_strand = transcript.strand;
        candidates.retain(|c| c.strand == known_strand);
    } else if cfg.trust_strand && transcript.strand != Strand::Unknown {
        let known_strand = transcript.strand;
        candidates.retain(|c| c.strand == known_strand);
    }
    candidates.retain(|c| c.thick_start >= 1 && c.thick_end <= cdna_len && c.thick_start <= c.thick_end);
    if candidates.is_empty() {
        return Ok(());
    }
    candidates.sort_by(|a, b| b.cds_len().cmp(&a.cds_len()));

    let components = crate::graph::connected_components(&candidates, |a, b| {
        a.strand == b.strand && overlap((a.thick_start, a.thick_end), (b.thick_start, b.thick_end)) >= 0
    });
    let mut representatives: Vec<CandidateOrf> = components
        .iter()
        .map(|comp| {
            comp.iter()
                .map(|&i| candidates[i].clone())
                .max_by_key(|o| o.cds_len())
                .expect("connected component is never empty")
        })
        .collect();
    representatives.sort_by(|a, b| b.cds_len().cmp(&a.cds_len()));

    let mut retained: Vec<CandidateOrf> = Vec::new();
    if let Some((primary, rest)) = representatives.split_first() {
        retained.push(primary.clone());
        for orf in rest {
            if orf.cds_len() >= cfg.minimal_secondary_orf_length {
                retained.push(orf.clone());
            }
        }
    }
    if retained.is_empty() {
        return Ok(());
    }

    // Monoexonic strand flip: the primary ORF's strand decides the
    // transcript's final orientation; any retained ORF that disagrees with
    // it is dropped (spec §9 Open Question, resolved normatively).
    if monoexonic {
        let primary_strand = retained[0].strand;
        retained.retain(|o| o.strand == primary_strand);
        if transcript.strand == Strand::Unknown {
            transcript.strand = primary_strand;
        } else if primary_strand == Strand::Minus {
            transcript.reverse_strand();
        }
    }

    let primary = retained[0].clone();
    let strand = transcript.strand;

    let projected: Vec<InternalOrf> = retained
        .iter()
        .map(|orf| project_orf(&transcript.exons, strand, orf.thick_start, orf.thick_end))
        .collect();

    let (combined_cds, combined_utr) = if projected.len() == 1 {
        let cds: Vec<Interval> = projected[0]
            .iter()
            .filter(|s| s.0 == SegmentKind::Cds)
            .map(|s| Interval { start: s.1, end: s.2 })
            .collect();
        let utr: Vec<Interval> = projected[0]
            .iter()
            .filter(|s| s.0 == SegmentKind::Utr)
            .map(|s| Interval { start: s.1, end: s.2 })
            .collect();
        (cds, utr)
    } else {
        let all_cds: Vec<(Coord, Coord)> = projected
            .iter()
            .flat_map(|orf| orf.iter().filter(|s| s.0 == SegmentKind::Cds).map(|s| (s.1, s.2)))
            .collect();
        let combined_cds = merge_overlapping(&all_cds);
        let combined_utr = subtract_from_exons(&transcript.exons, &combined_cds);
        (combined_cds, combined_utr)
    };

    transcript.replace_orfs(
        projected,
        combined_cds,
        combined_utr,
        0,
        primary.has_start_codon,
        primary.has_stop_codon,
    )
}

/// Project one ORF's `(thick_start, thick_end)` transcript-coordinate window
/// onto genomic exon coordinates, producing a full `{exon, CDS, UTR}`
/// partition. Walks exons in transcriptomic order (reversed on `-` strand),
/// tracking the cumulative transcript offset consumed so far.
fn project_orf(exons: &[Interval], strand: Strand, thick_start: Coord, thick_end: Coord) -> InternalOrf {
    let mut ordered: Vec<Interval> = exons.to_vec();
    ordered.sort_by_key(|e| (e.start, e.end));
    if strand == Strand::Minus {
        ordered.reverse();
    }

    let mut segs: InternalOrf = Vec::new();
    let mut consumed: Coord = 0;
    for exon in &ordered {
        segs.push((SegmentKind::Exon, exon.start, exon.end));
        let exon_tx_start = consumed + 1;
        let exon_tx_end = consumed + exon.len();
        consumed = exon_tx_end;

        if exon_tx_end < thick_start || exon_tx_start > thick_end {
            segs.push((SegmentKind::Utr, exon.start, exon.end));
            continue;
        }

        if strand != Strand::Minus {
            let mut cds_start = exon.start;
            if thick_start > exon_tx_start {
                let utr_end = exon.start + (thick_start - exon_tx_start) - 1;
                segs.push((SegmentKind::Utr, exon.start, utr_end));
                cds_start = utr_end + 1;
            }
            let cds_end = if exon_tx_end > thick_end {
                exon.end - (exon_tx_end - thick_end)
            } else {
                exon.end
            };
            if cds_start <= cds_end {
                segs.push((SegmentKind::Cds, cds_start, cds_end));
            }
            if cds_end < exon.end {
                segs.push((SegmentKind::Utr, cds_end + 1, exon.end));
            }
        } else {
            let mut cds_end = exon.end;
            if thick_start > exon_tx_start {
                cds_end = exon.end - (thick_start - exon_tx_start);
            }
            if cds_end < exon.end {
                segs.push((SegmentKind::Utr, cds_end + 1, exon.end));
            }
            let cds_start = if exon_tx_end > thick_end {
                exon.start + (exon_tx_end - thick_end)
            } else {
                exon.start
            };
            if cds_start <= cds_end {
                segs.push((SegmentKind::Cds, cds_start, cds_end));
            }
            if cds_start > exon.start {
                segs.push((SegmentKind::Utr, exon.start, cds_start - 1));
            }
        }
    }
    segs.sort_by_key(|&(kind, start, end)| (start, end, kind));
    segs
}

/// Collapse overlapping/touching `(start, end)` ranges into maximal disjoint
/// intervals, via the same connected-components clustering used elsewhere
/// (spec §9 Open Question: UTR/CDS union via interval arithmetic).
fn merge_overlapping(ranges: &[(Coord, Coord)]) -> Vec<Interval> {
    if ranges.is_empty() {
        return Vec::new();
    }
    let components = crate::graph::connected_components(ranges, |a, b| overlap(*a, *b) >= 0);
    let mut merged: Vec<Interval> = components
        .iter()
        .map(|comp| {
            let start = comp.iter().map(|&i| ranges[i].0).min().unwrap();
            let end = comp.iter().map(|&i| ranges[i].1).max().unwrap();
            Interval { start, end }
        })
        .collect();
    merged.sort_by_key(|i| (i.start, i.end));
    merged
}

/// Exonic positions not covered by `subtract`, coalesced into maximal
/// intervals. Exons are assumed disjoint and sorted (as finalized
/// transcripts guarantee); `subtract` need not be sorted or disjoint.
fn subtract_from_exons(exons: &[Interval], subtract: &[Interval]) -> Vec<Interval> {
    let mut out = Vec::new();
    for exon in exons {
        let mut cursor = exon.start;
        let mut covering: Vec<&Interval> = subtract
            .iter()
            .filter(|s| overlap((s.start, s.end), (exon.start, exon.end)) >= 0)
            .collect();
        covering.sort_by_key(|s| (s.start, s.end));
        for s in covering {
            let clip_start = s.start.max(exon.start);
            let clip_end = s.end.min(exon.end);
            if clip_start > cursor {
                out.push(Interval { start: cursor, end: clip_start - 1 });
            }
            cursor = cursor.max(clip_end + 1);
        }
        if cursor <= exon.end {
            out.push(Interval { start: cursor, end: exon.end });
        }
    }
    out
}

/// Split a transcript with >=2 internal ORFs into one transcript per ORF,
/// unless BLAST evidence suggests the ORFs are fragments of one real protein
/// (spec §4.3). Returns `vec![transcript.clone()]` when there is nothing to
/// split or the split is suppressed.
pub fn split_by_cds(transcript: &Transcript, cfg: &ChimeraSplitConfig, hits: &[BlastHit]) -> Result<Vec<Transcript>> {
    if !cfg.execute || transcript.number_internal_orfs() < 2 {
        return Ok(vec![transcript.clone()]);
    }

    let boundaries: Vec<(Coord, Coord)> = transcript
        .internal_orfs
        .iter()
        .map(|orf| {
            let cds: Vec<&Segment> = orf.iter().filter(|s| s.0 == SegmentKind::Cds).collect();
            let start = cds.iter().map(|s| s.1).min().expect("internal ORF has a CDS");
            let end = cds.iter().map(|s| s.2).max().expect("internal ORF has a CDS");
            (start, end)
        })
        .collect();

    if cfg.blast_check && should_suppress_split(&boundaries, hits, cfg) {
        return Ok(vec![transcript.clone()]);
    }

    let mut sorted_boundaries = boundaries.clone();
    sorted_boundaries.sort();

    let mut outputs = Vec::new();
    for (counter, orf) in transcript.internal_orfs.iter().enumerate() {
        let (my_start, my_end) = boundaries[counter];
        let pos = sorted_boundaries
            .iter()
            .position(|&b| b == (my_start, my_end))
            .expect("boundary present in sorted list");
        let is_leftmost = pos == 0;
        let is_rightmost = pos == sorted_boundaries.len() - 1;

        let mut new_exons = Vec::new();
        let mut new_utr = Vec::new();
        for e in &transcript.exons {
            if e.end < my_start {
                if is_leftmost {
                    new_exons.push(*e);
                    new_utr.push(*e);
                }
            } else if e.start > my_end {
                if is_rightmost {
                    new_exons.push(*e);
                    new_utr.push(*e);
                }
            } else {
                let mut ex_start = e.start;
                let mut ex_end = e.end;
                if e.start < my_start {
                    if is_leftmost {
                        new_utr.push(Interval::new(e.start, my_start - 1)?);
                    } else {
                        ex_start = my_start;
                    }
                }
                if e.end > my_end {
                    if is_rightmost {
                        new_utr.push(Interval::new(my_end + 1, e.end)?);
                    } else {
                        ex_end = my_end;
                    }
                }
                new_exons.push(Interval::new(ex_start, ex_end)?);
            }
        }
        new_exons.sort_by_key(|e| (e.start, e.end));
        new_utr.sort_by_key(|e| (e.start, e.end));

        let cds_segs: Vec<Interval> = orf
            .iter()
            .filter(|s| s.0 == SegmentKind::Cds)
            .map(|s| Interval { start: s.1, end: s.2 })
            .collect();

        let mut nt = Transcript::new(
            format!("{}.orf{}", transcript.id, counter + 1),
            transcript.chrom.clone(),
            transcript.source.clone(),
            transcript.strand,
        );
        nt.attributes = transcript.attributes.clone();
        nt.parent = transcript.parent.clone();
        nt.start = new_exons.first().expect("split transcript keeps at least one exon").start;
        nt.end = new_exons.last().expect("split transcript keeps at least one exon").end;
        nt.exons = new_exons;
        nt.combined_cds = cds_segs;
        nt.combined_utr = new_utr;
        nt.finalize()?;
        outputs.push(nt);
    }
    Ok(outputs)
}

/// Whether BLAST evidence indicates the candidate split pieces are actually
/// fragments of the same protein (one hit spanning every ORF, or two ORFs
/// sharing homology to the same target over enough of their own CDS).
fn should_suppress_split(boundaries: &[(Coord, Coord)], hits: &[BlastHit], cfg: &ChimeraSplitConfig) -> bool {
    let overall_start = boundaries.iter().map(|b| b.0).min().unwrap_or(0);
    let overall_end = boundaries.iter().map(|b| b.1).max().unwrap_or(0);
    for hit in hits {
        if hit.query_start <= overall_start && hit.query_end >= overall_end {
            return true;
        }
    }

    let mut targets_per_boundary: Vec<HashSet<&str>> = vec![HashSet::new(); boundaries.len()];
    for hit in hits {
        for hsp in hit.hsps.iter().filter(|h| h.hsp_evalue <= cfg.maximal_hsp_evalue) {
            for (i, b) in boundaries.iter().enumerate() {
                let ov = overlap(*b, (hsp.query_hsp_start, hsp.query_hsp_end));
                let cds_len = b.1 - b.0 + 1;
                if ov as f64 >= cfg.minimal_hsp_overlap * cds_len as f64 {
                    targets_per_boundary[i].insert(hit.target.as_str());
                }
            }
        }
    }
    for i in 0..boundaries.len() {
        for j in (i + 1)..boundaries.len() {
            if !targets_per_boundary[i].is_disjoint(&targets_per_boundary[j]) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transcript::FeatureKind;

    fn simple_transcript() -> Transcript {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 300;
        t.add_exon(FeatureKind::Exon, 1, 100).unwrap();
        t.add_exon(FeatureKind::Exon, 201, 300).unwrap();
        t.finalize().unwrap();
        t
    }

    fn orf(thick_start: Coord, thick_end: Coord, strand: Strand) -> CandidateOrf {
        CandidateOrf {
            thick_start,
            thick_end,
            strand,
            has_start_codon: true,
            has_stop_codon: true,
        }
    }

    #[test]
    fn empty_candidates_leave_annotation_cds() {
        let mut t = simple_transcript();
        t.combined_cds.push(Interval::new(1, 10).unwrap());
        reconcile_orfs(&mut t, &[], &OrfLoadingConfig::default()).unwrap();
        assert_eq!(t.combined_cds, vec![Interval::new(1, 10).unwrap()]);
    }

    #[test]
    fn single_candidate_is_projected_across_exons() {
        let mut t = simple_transcript();
        // cdna length = 100 + 100 = 200; thick window spans both exons.
        let cand = orf(51, 150, Strand::Plus);
        reconcile_orfs(&mut t, &[cand], &OrfLoadingConfig::default()).unwrap();
        assert_eq!(t.combined_cds_length(), 100);
        assert_eq!(t.combined_utr_length(), 100);
        assert_eq!(t.number_internal_orfs(), 1);
    }

    #[test]
    fn overlapping_candidates_collapse_to_one_representative() {
        let mut t = simple_transcript();
        let a = orf(1, 180, Strand::Plus);
        let b = orf(10, 150, Strand::Plus);
        reconcile_orfs(&mut t, &[a, b], &OrfLoadingConfig::default()).unwrap();
        assert_eq!(t.number_internal_orfs(), 1);
        assert_eq!(t.combined_cds_length(), 180);
    }

    #[test]
    fn monoexonic_minus_orf_flips_strand_when_not_trusted() {
        let mut t = Transcript::new("m1", "chr1", "test", Strand::Unknown);
        t.start = 1;
        t.end = 200;
        t.add_exon(FeatureKind::Exon, 1, 200).unwrap();
        t.finalize().unwrap();
        let cand = orf(1, 200, Strand::Minus);
        let cfg = OrfLoadingConfig {
            trust_strand: false,
            ..OrfLoadingConfig::default()
        };
        reconcile_orfs(&mut t, &[cand], &cfg).unwrap();
        assert_eq!(t.strand, Strand::Minus);
    }

    #[test]
    fn split_by_cds_produces_one_transcript_per_orf() {
        let mut t = Transcript::new("c1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 400;
        t.add_exon(FeatureKind::Exon, 1, 100).unwrap();
        t.add_exon(FeatureKind::Exon, 201, 400).unwrap();
        t.internal_orfs = vec![
            vec![(SegmentKind::Cds, 1, 100), (SegmentKind::Cds, 201, 220)],
            vec![(SegmentKind::Cds, 250, 400)],
        ];
        let split = split_by_cds(&t, &ChimeraSplitConfig::default(), &[]).unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].id, "c1.orf1");
        assert_eq!(split[1].id, "c1.orf2");
    }

    #[test]
    fn spanning_blast_hit_suppresses_split() {
        let mut t = Transcript::new("c2", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 400;
        t.add_exon(FeatureKind::Exon, 1, 400).unwrap();
        t.internal_orfs = vec![
            vec![(SegmentKind::Cds, 1, 100)],
            vec![(SegmentKind::Cds, 200, 400)],
        ];
        let hit = BlastHit {
            query_start: 1,
            query_end: 400,
            evalue: 1e-50,
            target: "prot1".to_string(),
            hsps: vec![],
        };
        let split = split_by_cds(&t, &ChimeraSplitConfig::default(), &[hit]).unwrap();
        assert_eq!(split.len(), 1);
    }
}

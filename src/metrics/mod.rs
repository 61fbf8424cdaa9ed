//! The closed metric registry (spec §3): every numeric or identifier column
//! the scoring engine, requirements DSL and TSV reports can reference.
//! Grounded on `loci_objects/transcript.py`'s `__dict__`-based property
//! registry, closed here into a `strum`/`enum_map` enum the way the teacher
//! closes its own small enumerations (`common/cli.rs`'s `GenomeRelease`).

use enum_map::Enum;
use strum_macros::{Display, EnumIter, EnumString};

use crate::common::Coord;
use crate::model::transcript::Transcript;

/// One entry of the closed metric registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, Enum)]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    Tid,
    Parent,
    Score,
    CdnaLength,
    CombinedCdsLength,
    CombinedCdsNum,
    CombinedCdsNumFraction,
    CombinedCdsFraction,
    CombinedUtrLength,
    CombinedUtrFraction,
    NumberInternalOrfs,
    SelectedCdsLength,
    SelectedCdsNum,
    SelectedCdsFraction,
    HighestCdsExonNumber,
    CdsNotMaximal,
    CdsNotMaximalFraction,
    FiveUtrLength,
    FiveUtrNum,
    FiveUtrNumComplete,
    ThreeUtrLength,
    ThreeUtrNum,
    ThreeUtrNumComplete,
    UtrLength,
    UtrNum,
    UtrNumComplete,
    UtrFraction,
    HasStartCodon,
    HasStopCodon,
    IsComplete,
    ExonNum,
    ExonFraction,
    IntronFraction,
    MaxIntronLength,
    StartDistanceFromTss,
    SelectedStartDistanceFromTss,
    EndDistanceFromTes,
    SelectedEndDistanceFromTes,
    CombinedCdsIntronFraction,
    SelectedCdsIntronFraction,
    RetainedIntronNum,
    RetainedFraction,
    VerifiedIntronsNum,
}

impl Metric {
    /// Registry order used for TSV report columns: `tid`, `parent`, `score`
    /// first, then the rest alphabetically by name (mirrors the original's
    /// `get_available_metrics`).
    pub fn registry() -> Vec<Metric> {
        use strum::IntoEnumIterator;
        let mut head = vec![Metric::Tid, Metric::Parent, Metric::Score];
        let mut rest: Vec<Metric> = Metric::iter()
            .filter(|m| !matches!(m, Metric::Tid | Metric::Parent | Metric::Score))
            .collect();
        rest.sort_by_key(|m| m.to_string());
        head.append(&mut rest);
        head
    }

    /// Whether this metric is numeric (scoreable/requirement-eligible) as
    /// opposed to a pure identifier column (`tid`, `parent`).
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Metric::Tid | Metric::Parent)
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn distance_from_tss(t: &Transcript, cds_start: Coord) -> Coord {
    match t.strand {
        crate::model::interval::Strand::Minus => t.end - cds_start,
        _ => cds_start - t.start,
    }
}

/// Corrected per spec §9: both the annotation and the selected-ORF variant
/// measure distance from the transcript's 3' genomic end, taking strand into
/// account exactly once (the original's `-` branch was applied twice).
fn distance_from_tes(t: &Transcript, cds_end: Coord) -> Coord {
    match t.strand {
        crate::model::interval::Strand::Minus => cds_end - t.start,
        _ => t.end - cds_end,
    }
}

/// Compute the numeric value of `metric` for `t`. Panics if asked for a
/// non-numeric metric (`Tid`/`Parent`); callers read those via
/// [`metric_string`] instead.
pub fn compute_numeric(metric: Metric, t: &Transcript) -> f64 {
    match metric {
        Metric::Tid | Metric::Parent => {
            panic!("{metric} is not a numeric metric")
        }
        Metric::Score => t.score,
        Metric::CdnaLength => t.cdna_length() as f64,
        Metric::CombinedCdsLength => t.combined_cds_length() as f64,
        Metric::CombinedCdsNum => t.combined_cds.len() as f64,
        Metric::CombinedCdsNumFraction => {
            if t.exons.is_empty() {
                0.0
            } else {
                t.combined_cds.len() as f64 / t.exons.len() as f64
            }
        }
        Metric::CombinedCdsFraction => {
            if t.cdna_length() == 0 {
                0.0
            } else {
                t.combined_cds_length() as f64 / t.cdna_length() as f64
            }
        }
        Metric::CombinedUtrLength => t.combined_utr_length() as f64,
        Metric::CombinedUtrFraction => {
            if t.cdna_length() == 0 {
                0.0
            } else {
                t.combined_utr_length() as f64 / t.cdna_length() as f64
            }
        }
        Metric::NumberInternalOrfs => t.number_internal_orfs() as f64,
        Metric::SelectedCdsLength => t.selected_cds_length() as f64,
        Metric::SelectedCdsNum => t.selected_cds_num() as f64,
        Metric::SelectedCdsFraction => {
            if t.cdna_length() == 0 {
                0.0
            } else {
                t.selected_cds_length() as f64 / t.cdna_length() as f64
            }
        }
        Metric::HighestCdsExonNumber => {
            t.internal_orfs
                .iter()
                .map(|orf| orf.iter().filter(|s| s.0 == crate::model::transcript::SegmentKind::Cds).count())
                .max()
                .unwrap_or(0) as f64
        }
        Metric::CdsNotMaximal => {
            let max = compute_numeric(Metric::HighestCdsExonNumber, t);
            let selected = t.selected_cds_num() as f64;
            (max - selected).max(0.0)
        }
        Metric::CdsNotMaximalFraction => {
            let max = compute_numeric(Metric::HighestCdsExonNumber, t);
            if max == 0.0 {
                0.0
            } else {
                compute_numeric(Metric::CdsNotMaximal, t) / max
            }
        }
        Metric::FiveUtrLength => t.five_utr().iter().map(|s| s.2 - s.1 + 1).sum::<Coord>() as f64,
        Metric::FiveUtrNum => t.five_utr().len() as f64,
        Metric::FiveUtrNumComplete => bool_to_f64(t.has_start_codon && !t.five_utr().is_empty()),
        Metric::ThreeUtrLength => t.three_utr().iter().map(|s| s.2 - s.1 + 1).sum::<Coord>() as f64,
        Metric::ThreeUtrNum => t.three_utr().len() as f64,
        Metric::ThreeUtrNumComplete => bool_to_f64(t.has_stop_codon && !t.three_utr().is_empty()),
        Metric::UtrLength => t.combined_utr_length() as f64,
        Metric::UtrNum => t.combined_utr.len() as f64,
        Metric::UtrNumComplete => (compute_numeric(Metric::FiveUtrNumComplete, t) as u8
            + compute_numeric(Metric::ThreeUtrNumComplete, t) as u8) as f64,
        Metric::UtrFraction => compute_numeric(Metric::CombinedUtrFraction, t),
        Metric::HasStartCodon => bool_to_f64(t.has_start_codon),
        Metric::HasStopCodon => bool_to_f64(t.has_stop_codon),
        Metric::IsComplete => bool_to_f64(t.has_start_codon && t.has_stop_codon),
        Metric::ExonNum => t.exons.len() as f64,
        Metric::ExonFraction => t.exon_fraction,
        Metric::IntronFraction => t.intron_fraction,
        Metric::MaxIntronLength => t.introns.iter().map(|i| i.1 - i.0 + 1).max().unwrap_or(0) as f64,
        Metric::StartDistanceFromTss => distance_from_tss(t, t.combined_cds_start()) as f64,
        Metric::SelectedStartDistanceFromTss => distance_from_tss(t, t.selected_cds_start()) as f64,
        Metric::EndDistanceFromTes => distance_from_tes(t, t.combined_cds_end()) as f64,
        Metric::SelectedEndDistanceFromTes => distance_from_tes(t, t.selected_cds_end()) as f64,
        Metric::CombinedCdsIntronFraction => t.combined_cds_intron_fraction,
        Metric::SelectedCdsIntronFraction => t.selected_cds_intron_fraction,
        Metric::RetainedIntronNum => t.retained_introns.len() as f64,
        Metric::RetainedFraction => t.retained_fraction,
        Metric::VerifiedIntronsNum => t.verified_introns_num as f64,
    }
}

/// String rendering for the two identifier columns.
pub fn metric_string(metric: Metric, t: &Transcript) -> String {
    match metric {
        Metric::Tid => t.id.clone(),
        Metric::Parent => t.parent.join(","),
        other => compute_numeric(other, t).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    fn simple() -> Transcript {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 100;
        t.end = 300;
        t.add_exon(FeatureKind::Exon, 100, 200).unwrap();
        t.add_exon(FeatureKind::Exon, 251, 300).unwrap();
        t.finalize().unwrap();
        t
    }

    #[test]
    fn registry_starts_with_tid_parent_score() {
        let reg = Metric::registry();
        assert_eq!(&reg[0..3], &[Metric::Tid, Metric::Parent, Metric::Score]);
    }

    #[test]
    fn cdna_length_matches_transcript() {
        let t = simple();
        assert_eq!(compute_numeric(Metric::CdnaLength, &t), 151.0);
    }

    #[test]
    fn end_distance_from_tes_uses_strand_once() {
        let mut plus = simple();
        plus.combined_cds.push(crate::model::interval::Interval::new(260, 270).unwrap());
        let plus_end = plus.combined_cds_end();
        assert_eq!(compute_numeric(Metric::EndDistanceFromTes, &plus), (plus.end - plus_end) as f64);

        let mut minus = Transcript::new("t2", "chr1", "test", Strand::Minus);
        minus.start = 100;
        minus.end = 300;
        minus.add_exon(FeatureKind::Exon, 100, 200).unwrap();
        minus.add_exon(FeatureKind::Exon, 251, 300).unwrap();
        minus.add_exon(FeatureKind::Cds, 260, 270).unwrap();
        minus.add_exon(FeatureKind::Utr, 100, 200).unwrap();
        minus.add_exon(FeatureKind::Utr, 251, 259).unwrap();
        minus.add_exon(FeatureKind::Utr, 271, 300).unwrap();
        minus.finalize().unwrap();
        let minus_end = minus.combined_cds_end();
        assert_eq!(compute_numeric(Metric::EndDistanceFromTes, &minus), (minus_end - minus.start) as f64);
    }

    #[test]
    fn metric_string_renders_tid() {
        let t = simple();
        assert_eq!(metric_string(Metric::Tid, &t), "t1");
    }
}

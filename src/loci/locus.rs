//! Locus: the final output unit — one primary transcript plus the
//! alternative-splicing isoforms elected to accompany it (spec §4.7–§4.9).

use std::collections::HashSet;

use crate::common::Coord;
use crate::config::requirements::{passes, RequirementsConfig};
use crate::config::scoring::{score_group, ScoringConfig};
use crate::config::AlternativeSplicingConfig;
use crate::err::Result;
use crate::loci::classcode::{self, cds_overlap_fraction, exonic_overlap_fraction};
use crate::model::interval::Strand;
use crate::model::transcript::Transcript;

/// Class-code relationships an alternative-splicing candidate is allowed to
/// have with the locus primary (spec §4.9 step 3's allow-list, e.g. Mikado's
/// `j`/`J`/`o`/`C`): a nested or overlapping structure, but never the exact
/// same intron chain (that's a duplicate, not an isoform) nor no relation at
/// all.
const AS_ALLOWED_RELATIONSHIPS: [classcode::Relationship; 3] = [
    classcode::Relationship::Contained,
    classcode::Relationship::Containing,
    classcode::Relationship::Overlapping,
];

#[derive(Debug, Clone)]
pub struct Locus {
    pub chrom: String,
    pub strand: Strand,
    pub primary: Transcript,
    pub alternative_splicing: Vec<Transcript>,
}

impl Locus {
    /// First pass of election (spec §4.5 scoring + requirements prefilter):
    /// purge `requirements` failures when `purge` is set, score the
    /// survivors, and pick the highest-scoring one as primary. Returns the
    /// primary, the rest of the scored pool in best-first order (candidates
    /// for alternative splicing), and whatever purge excluded.
    pub fn provisional_primary(
        mut transcripts: Vec<Transcript>,
        scoring: &ScoringConfig,
        requirements: &RequirementsConfig,
        purge: bool,
    ) -> Result<(Option<Transcript>, Vec<Transcript>, Vec<Transcript>)> {
        let mut excluded = Vec::new();
        if purge {
            let mut kept = Vec::new();
            for t in transcripts {
                if passes(requirements, &t)? {
                    kept.push(t);
                } else {
                    excluded.push(t);
                }
            }
            transcripts = kept;
        }
        if transcripts.is_empty() {
            return Ok((None, Vec::new(), excluded));
        }

        let scores = {
            let refs: Vec<&Transcript> = transcripts.iter().collect();
            score_group(scoring, &refs)?
        };
        for (t, s) in transcripts.iter_mut().zip(scores.iter()) {
            t.score = *s;
        }

        let mut order: Vec<usize> = (0..transcripts.len()).collect();
        order.sort_by(|&a, &b| {
            transcripts[b]
                .score
                .partial_cmp(&transcripts[a].score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let primary = transcripts[order[0]].clone();
        let pool: Vec<Transcript> = order[1..].iter().map(|&idx| transcripts[idx].clone()).collect();
        Ok((Some(primary), pool, excluded))
    }

    /// Second pass (spec §4.9): admit alternative-splicing isoforms from
    /// `pool` onto `primary`. `eligible`, when given, restricts candidacy to
    /// transcript ids in the set — this is how the superlocus-wide clique
    /// restriction (step 6: a candidate must sit in exactly one clique
    /// containing exactly one locus primary) is enforced from the caller;
    /// `None` skips that restriction entirely.
    pub fn admit_alternative_splicing(
        primary: &Transcript,
        pool: Vec<Transcript>,
        as_cfg: &AlternativeSplicingConfig,
        eligible: Option<&HashSet<String>>,
    ) -> (Vec<Transcript>, Vec<Transcript>) {
        let mut isoforms: Vec<Transcript> = Vec::new();
        let mut excluded = Vec::new();
        for candidate in pool {
            if isoforms.len() >= as_cfg.max_isoforms {
                excluded.push(candidate);
                continue;
            }
            if let Some(eligible) = eligible {
                if !eligible.contains(&candidate.id) {
                    excluded.push(candidate);
                    continue;
                }
            }
            if !AS_ALLOWED_RELATIONSHIPS.contains(&classcode::relationship(&candidate, primary)) {
                excluded.push(candidate);
                continue;
            }
            if candidate.score < primary.score * as_cfg.min_score_perc {
                excluded.push(candidate);
                continue;
            }
            if !as_cfg.keep_retained_introns && !candidate.retained_introns.is_empty() {
                excluded.push(candidate);
                continue;
            }
            let cdna_ov = exonic_overlap_fraction(&candidate, primary);
            let cds_ov = if candidate.combined_cds.is_empty() && primary.combined_cds.is_empty() {
                1.0
            } else {
                cds_overlap_fraction(&candidate, primary)
            };
            if cdna_ov >= as_cfg.min_cdna_overlap && cds_ov >= as_cfg.min_cds_overlap {
                isoforms.push(candidate);
            } else {
                excluded.push(candidate);
            }
        }
        (isoforms, excluded)
    }

    /// Score `transcripts`, purge `requirements` failures when `purge` is
    /// set, and elect the highest-scoring survivor as primary. Remaining
    /// survivors become alternative-splicing isoforms when they clear the
    /// configured class-code, overlap and score thresholds, up to
    /// `max_isoforms`. Returns `(None, excluded)` when nothing survives
    /// purging. Equivalent to [`Locus::elect_with_eligibility`] with no
    /// superlocus-wide clique restriction.
    pub fn elect(
        chrom: &str,
        strand: Strand,
        transcripts: Vec<Transcript>,
        scoring: &ScoringConfig,
        requirements: &RequirementsConfig,
        as_cfg: &AlternativeSplicingConfig,
        purge: bool,
    ) -> Result<(Option<Locus>, Vec<Transcript>)> {
        Self::elect_with_eligibility(chrom, strand, transcripts, scoring, requirements, as_cfg, purge, None)
    }

    /// As [`Locus::elect`], but AS candidacy is additionally restricted to
    /// `eligible` transcript ids when given (spec §4.9 step 6).
    #[allow(clippy::too_many_arguments)]
    pub fn elect_with_eligibility(
        chrom: &str,
        strand: Strand,
        transcripts: Vec<Transcript>,
        scoring: &ScoringConfig,
        requirements: &RequirementsConfig,
        as_cfg: &AlternativeSplicingConfig,
        purge: bool,
        eligible: Option<&HashSet<String>>,
    ) -> Result<(Option<Locus>, Vec<Transcript>)> {
        let (primary, pool, mut excluded) = Self::provisional_primary(transcripts, scoring, requirements, purge)?;
        let Some(primary) = primary else {
            return Ok((None, excluded));
        };
        let (isoforms, as_excluded) = Self::admit_alternative_splicing(&primary, pool, as_cfg, eligible);
        excluded.extend(as_excluded);
        Ok((
            Some(Locus {
                chrom: chrom.to_string(),
                strand,
                primary,
                alternative_splicing: isoforms,
            }),
            excluded,
        ))
    }

    pub fn all_transcripts(&self) -> Vec<&Transcript> {
        let mut v = vec![&self.primary];
        v.extend(self.alternative_splicing.iter());
        v
    }

    pub fn start(&self) -> Coord {
        self.all_transcripts().iter().map(|t| t.start).min().expect("locus always has a primary")
    }

    pub fn end(&self) -> Coord {
        self.all_transcripts().iter().map(|t| t.end).max().expect("locus always has a primary")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scoring::{Rescaling, ScoringRule};
    use crate::model::transcript::FeatureKind;
    use indexmap::IndexMap;

    fn mk(id: &str, start: Coord, end: Coord) -> Transcript {
        let mut t = Transcript::new(id, "chr1", "test", Strand::Plus);
        t.start = start;
        t.end = end;
        t.add_exon(FeatureKind::Exon, start, end).unwrap();
        t.finalize().unwrap();
        t
    }

    fn mk_spliced(id: &str, exons: &[(Coord, Coord)]) -> Transcript {
        let mut t = Transcript::new(id, "chr1", "test", Strand::Plus);
        t.start = exons.first().unwrap().0;
        t.end = exons.last().unwrap().1;
        for &(s, e) in exons {
            t.add_exon(FeatureKind::Exon, s, e).unwrap();
        }
        t.finalize().unwrap();
        t
    }

    fn default_scoring() -> ScoringConfig {
        let mut params = IndexMap::new();
        params.insert(
            "cdna_length".to_string(),
            ScoringRule { rescaling: Rescaling::Max, value: None, weight: 1.0, filter: None },
        );
        ScoringConfig { parameters: params }
    }

    #[test]
    fn longest_transcript_becomes_primary() {
        let short = mk("short", 1, 100);
        let long = mk("long", 1, 500);
        let (locus, excluded) = Locus::elect(
            "chr1",
            Strand::Plus,
            vec![short, long],
            &default_scoring(),
            &RequirementsConfig::default(),
            &AlternativeSplicingConfig::default(),
            false,
        )
        .unwrap();
        let locus = locus.unwrap();
        assert_eq!(locus.primary.id, "long");
        assert!(excluded.is_empty() || excluded.len() <= 1);
    }

    #[test]
    fn empty_after_purge_yields_no_locus() {
        let mut params = IndexMap::new();
        params.insert(
            "long_enough".to_string(),
            crate::config::requirements::Parameter {
                metric: "cdna_length".to_string(),
                operator: crate::config::requirements::Operator::Gt,
                value: crate::config::requirements::Value::Number(10000.0),
            },
        );
        let requirements = RequirementsConfig {
            expression: Some("long_enough".to_string()),
            parameters: params,
        };
        let t = mk("t1", 1, 100);
        let (locus, excluded) = Locus::elect(
            "chr1",
            Strand::Plus,
            vec![t],
            &default_scoring(),
            &requirements,
            &AlternativeSplicingConfig::default(),
            true,
        )
        .unwrap();
        assert!(locus.is_none());
        assert_eq!(excluded.len(), 1);
    }

    #[test]
    fn identical_intron_chain_is_not_admitted_as_isoform() {
        // Same exon structure as the primary: class-code `Equal`, not in
        // the AS allow-list, so it must be excluded even though every
        // overlap/score threshold would otherwise pass.
        let primary = mk_spliced("primary", &[(1, 100), (201, 400)]);
        let duplicate = mk_spliced("duplicate", &[(1, 100), (201, 400)]);
        let (locus, excluded) = Locus::elect(
            "chr1",
            Strand::Plus,
            vec![primary, duplicate],
            &default_scoring(),
            &RequirementsConfig::default(),
            &AlternativeSplicingConfig::default(),
            false,
        )
        .unwrap();
        let locus = locus.unwrap();
        assert!(locus.alternative_splicing.is_empty());
        assert_eq!(excluded.len(), 1);
    }

    #[test]
    fn nested_isoform_is_admitted() {
        let primary = mk_spliced("primary", &[(1, 100), (201, 400), (501, 600)]);
        let nested = mk_spliced("nested", &[(1, 100), (201, 400)]);
        let (locus, _) = Locus::elect(
            "chr1",
            Strand::Plus,
            vec![primary, nested],
            &default_scoring(),
            &RequirementsConfig::default(),
            &AlternativeSplicingConfig::default(),
            false,
        )
        .unwrap();
        let locus = locus.unwrap();
        assert_eq!(locus.alternative_splicing.len(), 1);
        assert_eq!(locus.alternative_splicing[0].id, "nested");
    }

    #[test]
    fn eligibility_restriction_drops_ambiguous_candidates() {
        let primary = mk_spliced("primary", &[(1, 100), (201, 400), (501, 600)]);
        let nested = mk_spliced("nested", &[(1, 100), (201, 400)]);
        let eligible: HashSet<String> = HashSet::new();
        let (primary_t, pool, _) =
            Locus::provisional_primary(vec![primary, nested], &default_scoring(), &RequirementsConfig::default(), false)
                .unwrap();
        let primary_t = primary_t.unwrap();
        let (isoforms, excluded) = Locus::admit_alternative_splicing(
            &primary_t,
            pool,
            &AlternativeSplicingConfig::default(),
            Some(&eligible),
        );
        assert!(isoforms.is_empty());
        assert_eq!(excluded.len(), 1);
    }
}

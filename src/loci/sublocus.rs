//! Sublocus: a cluster of transcripts sharing at least one splice site (or,
//! for monoexonic transcripts, simply overlapping), one level down from the
//! superlocus (spec §4.4, §4.6).

use std::cmp::Ordering;

use crate::config::requirements::{passes, RequirementsConfig};
use crate::config::scoring::{score_group, ScoringConfig};
use crate::err::Result;
use crate::loci::monosublocus::Monosublocus;
use crate::loci::{gather_metrics, sublocus_compatible, AbstractLocus};
use crate::model::interval::Strand;
use crate::model::transcript::Transcript;

#[derive(Debug, Clone)]
pub struct Sublocus {
    pub locus: AbstractLocus,
    pub transcripts: Vec<Transcript>,
}

/// Order candidates best-first: highest score, then longest cDNA, then
/// lexicographically smallest id (spec §4.6 step 3's tie-break).
fn better_first(a: &Transcript, b: &Transcript) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.cdna_length().cmp(&a.cdna_length()))
        .then_with(|| a.id.cmp(&b.id))
}

impl Sublocus {
    pub fn new(chrom: &str, strand: Strand, transcripts: Vec<Transcript>) -> Self {
        let locus = AbstractLocus::from_members(chrom, strand, &transcripts, (0..transcripts.len()).collect());
        Sublocus { locus, transcripts }
    }

    /// Write locus-relative metrics into every member transcript, using
    /// denominators computed over this sublocus alone.
    pub fn gather_metrics(&mut self) {
        gather_metrics(&mut self.transcripts);
    }

    /// Split this sublocus into monosubloci by greedy best-first selection
    /// (spec §4.6 step 3): run the requirements prefilter, score the
    /// survivors, then repeatedly pick the best-scored remaining transcript,
    /// emit it alone as a `Monosublocus`, and remove everyone it intersects
    /// under the sublocus predicate. Returns the monosubloci plus whatever
    /// the prefilter purged.
    pub fn define_monosubloci(
        &self,
        scoring: &ScoringConfig,
        requirements: &RequirementsConfig,
        purge: bool,
        cds_only: bool,
    ) -> Result<(Vec<Monosublocus>, Vec<Transcript>)> {
        if self.transcripts.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut pool = self.transcripts.clone();
        let mut excluded = Vec::new();
        if purge {
            let mut kept = Vec::new();
            for t in pool {
                if passes(requirements, &t)? {
                    kept.push(t);
                } else {
                    excluded.push(t);
                }
            }
            pool = kept;
        }
        if pool.is_empty() {
            return Ok((Vec::new(), excluded));
        }

        let scores = {
            let refs: Vec<&Transcript> = pool.iter().collect();
            score_group(scoring, &refs)?
        };
        for (t, s) in pool.iter_mut().zip(scores.iter()) {
            t.score = *s;
        }

        let mut monosubloci = Vec::new();
        while !pool.is_empty() {
            let mut best = 0;
            for i in 1..pool.len() {
                if better_first(&pool[i], &pool[best]) == Ordering::Less {
                    best = i;
                }
            }
            let winner = pool.remove(best);
            pool.retain(|t| !sublocus_compatible(&winner, t, cds_only));
            monosubloci.push(Monosublocus::new(&self.locus.chrom, self.locus.strand, winner));
        }
        Ok((monosubloci, excluded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Coord;
    use crate::model::transcript::FeatureKind;
    use indexmap::IndexMap;

    fn mk(id: &str, exons: &[(Coord, Coord)], strand: Strand) -> Transcript {
        let mut t = Transcript::new(id, "chr1", "test", strand);
        t.start = exons.first().unwrap().0;
        t.end = exons.last().unwrap().1;
        for &(s, e) in exons {
            t.add_exon(FeatureKind::Exon, s, e).unwrap();
        }
        t.finalize().unwrap();
        t
    }

    fn cdna_length_scoring() -> ScoringConfig {
        let mut params = IndexMap::new();
        params.insert(
            "cdna_length".to_string(),
            crate::config::scoring::ScoringRule {
                rescaling: crate::config::scoring::Rescaling::Max,
                value: None,
                weight: 1.0,
                filter: None,
            },
        );
        ScoringConfig { parameters: params }
    }

    #[test]
    fn non_overlapping_members_split_into_separate_monosubloci() {
        // t3 doesn't overlap t1 or t2 at all; even forced into one
        // sublocus, monosublocus clustering must still separate it out.
        let t1 = mk("t1", &[(1, 100), (201, 300)], Strand::Plus);
        let t2 = mk("t2", &[(1, 100), (201, 300), (401, 500)], Strand::Plus);
        let t3 = mk("t3", &[(1000, 1100), (1201, 1300)], Strand::Plus);
        let sub = Sublocus::new("chr1", Strand::Plus, vec![t1, t2, t3]);
        let (mono, excluded) = sub
            .define_monosubloci(&cdna_length_scoring(), &RequirementsConfig::default(), false, false)
            .unwrap();
        assert_eq!(mono.len(), 2);
        assert!(excluded.is_empty());
    }

    #[test]
    fn each_monosublocus_holds_exactly_one_transcript() {
        let t1 = mk("t1", &[(1, 100), (201, 300)], Strand::Plus);
        let t2 = mk("t2", &[(1, 100), (201, 300), (401, 500)], Strand::Plus);
        let sub = Sublocus::new("chr1", Strand::Plus, vec![t1, t2]);
        let (mono, _) = sub
            .define_monosubloci(&cdna_length_scoring(), &RequirementsConfig::default(), false, false)
            .unwrap();
        // Both share the (1,100)/(201,300) intron, so they intersect and
        // the greedy loop picks the longer one then removes the other.
        assert_eq!(mono.len(), 1);
        assert_eq!(mono[0].transcript.id, "t2");
    }

    #[test]
    fn purge_moves_requirement_failures_to_excluded() {
        let t1 = mk("t1", &[(1, 10)], Strand::Plus);
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
        let sub = Sublocus::new("chr1", Strand::Plus, vec![t1]);
        let (mono, excluded) = sub.define_monosubloci(&cdna_length_scoring(), &requirements, true, false).unwrap();
        assert!(mono.is_empty());
        assert_eq!(excluded.len(), 1);
    }
}

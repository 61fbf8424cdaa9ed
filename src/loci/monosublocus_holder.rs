//! MonosublocusHolder: re-merges monosubloci whose primary transcripts are
//! still plausibly part of the same locus even though they came from
//! different subloci, rescoring their members together before the final
//! locus is elected (spec §4.4, §4.8).

use crate::config::requirements::RequirementsConfig;
use crate::config::scoring::ScoringConfig;
use crate::config::AlternativeSplicingConfig;
use crate::err::Result;
use crate::loci::locus::Locus;
use crate::loci::monosublocus::Monosublocus;
use crate::loci::{gather_metrics, monosublocus_holder_compatible, AbstractLocus};
use crate::model::transcript::Transcript;

#[derive(Debug, Clone)]
pub struct MonosublocusHolder {
    pub locus: AbstractLocus,
    pub transcripts: Vec<Transcript>,
}

impl MonosublocusHolder {
    /// Cluster monosubloci (from possibly different subloci) under the
    /// holder predicate: cDNA overlap plus shared splice site (CDS splice
    /// site, when `cds_only`) or a monoexonic overlap-fraction floor.
    pub fn build(monosubloci: Vec<Monosublocus>, cds_only: bool, min_monoexonic_overlap: f64) -> Vec<MonosublocusHolder> {
        if monosubloci.is_empty() {
            return Vec::new();
        }
        let components = crate::graph::connected_components(&monosubloci, |a, b| {
            monosublocus_holder_compatible(&a.transcript, &b.transcript, cds_only, min_monoexonic_overlap)
        });
        components
            .into_iter()
            .map(|comp| {
                let chrom = monosubloci[comp[0]].locus.chrom.clone();
                let strand = monosubloci[comp[0]].locus.strand;
                let transcripts: Vec<Transcript> = comp.iter().map(|&i| monosubloci[i].transcript.clone()).collect();
                let locus = AbstractLocus::from_members(chrom, strand, &transcripts, (0..transcripts.len()).collect());
                MonosublocusHolder { locus, transcripts }
            })
            .collect()
    }

    /// Write locus-relative metrics using denominators computed across the
    /// holder's full transcript set, freshly recomputed from the raw
    /// sublocus-level ones since membership changed.
    pub fn gather_metrics(&mut self) {
        gather_metrics(&mut self.transcripts);
    }

    /// Score every member, purge `requirements` failures when `purge` is
    /// set, and elect a primary transcript plus its alternative-splicing
    /// isoforms. Returns the final locus (`None` if every member was
    /// purged) and the transcripts that did not make it in.
    pub fn define_locus(
        &self,
        scoring: &ScoringConfig,
        requirements: &RequirementsConfig,
        as_cfg: &AlternativeSplicingConfig,
        purge: bool,
    ) -> Result<(Option<Locus>, Vec<Transcript>)> {
        Locus::elect(
            &self.locus.chrom,
            self.locus.strand,
            self.transcripts.clone(),
            scoring,
            requirements,
            as_cfg,
            purge,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Coord;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    fn mk(id: &str, start: Coord, end: Coord) -> Transcript {
        let mut t = Transcript::new(id, "chr1", "test", Strand::Plus);
        t.start = start;
        t.end = end;
        t.add_exon(FeatureKind::Exon, start, end).unwrap();
        t.finalize().unwrap();
        t
    }

    #[test]
    fn monoexonic_overlap_above_floor_merges_into_one_holder() {
        // a = [1,200], b = [100,300]: b overlaps a by 101/200 = 0.505 of a's
        // length, above the default 0.5 floor, so they merge despite having
        // no splice sites to share (both monoexonic).
        let a = Monosublocus::new("chr1", Strand::Plus, mk("a", 1, 200));
        let b = Monosublocus::new("chr1", Strand::Plus, mk("b", 100, 300));
        let holders = MonosublocusHolder::build(vec![a, b], false, 0.5);
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].transcripts.len(), 2);
    }

    #[test]
    fn slight_monoexonic_overlap_below_floor_stays_separate() {
        // b overlaps a by only 10/200 = 0.05 of a's length, below the floor.
        let a = Monosublocus::new("chr1", Strand::Plus, mk("a", 1, 200));
        let b = Monosublocus::new("chr1", Strand::Plus, mk("b", 191, 400));
        let holders = MonosublocusHolder::build(vec![a, b], false, 0.5);
        assert_eq!(holders.len(), 2);
    }
}

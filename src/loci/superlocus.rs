//! The superlocus: the coarsest clustering stage, grouping every transcript
//! whose genomic span overlaps (strand permitting) into one group, then
//! driving evidence loading (ORF reconciliation, verified introns, chimera
//! splitting) before handing off to sublocus definition (spec §4.1–§4.4).

use crate::common::Coord;
use crate::err::Result;
use crate::loci::sublocus::Sublocus;
use crate::loci::{sublocus_compatible, superlocus_compatible, AbstractLocus};
use crate::model::evidence::EvidenceStore;
use crate::model::interval::Strand;
use crate::model::orf::{reconcile_orfs, split_by_cds, ChimeraSplitConfig, OrfLoadingConfig};
use crate::model::transcript::Transcript;

#[derive(Debug, Clone)]
pub struct Superlocus {
    pub locus: AbstractLocus,
    pub transcripts: Vec<Transcript>,
}

impl Superlocus {
    /// Partition `transcripts` (typically everything on one chromosome) into
    /// superloci by strand-aware genomic overlap.
    pub fn cluster(transcripts: Vec<Transcript>) -> Vec<Superlocus> {
        if transcripts.is_empty() {
            return Vec::new();
        }
        let components = crate::graph::connected_components(&transcripts, superlocus_compatible);
        components
            .into_iter()
            .map(|comp| {
                let members: Vec<Transcript> = comp.into_iter().map(|i| transcripts[i].clone()).collect();
                let chrom = members[0].chrom.clone();
                let strand = members
                    .iter()
                    .map(|t| t.strand)
                    .find(|s| *s != Strand::Unknown)
                    .unwrap_or(Strand::Unknown);
                let locus = AbstractLocus::from_members(chrom, strand, &members, (0..members.len()).collect());
                Superlocus { locus, transcripts: members }
            })
            .collect()
    }

    /// Reconcile ORFs, count verified introns, then split chimeras. Order
    /// matters: splitting must see the ORF-reconciled CDS, not the raw
    /// annotation one (spec §4.2 before §4.3).
    pub fn load_evidence(
        &mut self,
        evidence: &dyn EvidenceStore,
        orf_cfg: &OrfLoadingConfig,
        chimera_cfg: &ChimeraSplitConfig,
    ) -> Result<()> {
        for t in &mut self.transcripts {
            let candidates = evidence.orfs_for(&t.id);
            reconcile_orfs(t, &candidates, orf_cfg)?;
            t.verified_introns_num = t
                .introns
                .iter()
                .filter(|(s, e)| evidence.has_junction(&t.chrom, *s, *e, t.strand))
                .count();
        }

        let mut split_transcripts = Vec::with_capacity(self.transcripts.len());
        for t in &self.transcripts {
            let hits = evidence.hits_for(&t.id);
            split_transcripts.extend(split_by_cds(t, chimera_cfg, &hits)?);
        }
        self.transcripts = split_transcripts;
        self.locus.start = self.transcripts.iter().map(|t| t.start).min().unwrap_or(self.locus.start);
        self.locus.end = self.transcripts.iter().map(|t| t.end).max().unwrap_or(self.locus.end);
        Ok(())
    }

    /// Partition this superlocus's transcripts into subloci (spec §4.4).
    pub fn define_subloci(&self, cds_only: bool) -> Vec<Sublocus> {
        if self.transcripts.is_empty() {
            return Vec::new();
        }
        let components =
            crate::graph::connected_components(&self.transcripts, |a, b| sublocus_compatible(a, b, cds_only));
        components
            .into_iter()
            .map(|comp| {
                let members = comp.into_iter().map(|i| self.transcripts[i].clone()).collect();
                Sublocus::new(&self.locus.chrom, self.locus.strand, members)
            })
            .collect()
    }

    pub fn start(&self) -> Coord {
        self.locus.start
    }

    pub fn end(&self) -> Coord {
        self.locus.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::evidence::InMemoryEvidenceStore;
    use crate::model::transcript::FeatureKind;

    fn mk(id: &str, chrom: &str, start: Coord, end: Coord, strand: Strand) -> Transcript {
        let mut t = Transcript::new(id, chrom, "test", strand);
        t.start = start;
        t.end = end;
        t.add_exon(FeatureKind::Exon, start, end).unwrap();
        t.finalize().unwrap();
        t
    }

    #[test]
    fn disjoint_transcripts_form_separate_superloci() {
        let a = mk("a", "chr1", 1, 100, Strand::Plus);
        let b = mk("b", "chr1", 1000, 1100, Strand::Plus);
        let supers = Superlocus::cluster(vec![a, b]);
        assert_eq!(supers.len(), 2);
    }

    #[test]
    fn overlapping_transcripts_share_a_superlocus() {
        let a = mk("a", "chr1", 1, 200, Strand::Plus);
        let b = mk("b", "chr1", 100, 300, Strand::Plus);
        let supers = Superlocus::cluster(vec![a, b]);
        assert_eq!(supers.len(), 1);
        assert_eq!(supers[0].transcripts.len(), 2);
    }

    #[test]
    fn load_evidence_counts_verified_introns() {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 300;
        t.add_exon(FeatureKind::Exon, 1, 100).unwrap();
        t.add_exon(FeatureKind::Exon, 201, 300).unwrap();
        t.finalize().unwrap();
        let mut supers = Superlocus::cluster(vec![t]);
        let evidence = InMemoryEvidenceStore::new().with_junction("chr1", 101, 200, Strand::Plus);
        supers[0]
            .load_evidence(&evidence, &OrfLoadingConfig::default(), &ChimeraSplitConfig::default())
            .unwrap();
        assert_eq!(supers[0].transcripts[0].verified_introns_num, 1);
    }
}

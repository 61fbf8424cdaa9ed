//! Orchestration: cluster transcripts into superloci and drive each one
//! through evidence loading, clustering and locus election, in parallel
//! across superloci via `rayon` (spec §5). One superlocus is always
//! processed single-threaded — graph/scoring work doesn't parallelize well
//! at that granularity, and correctness (deterministic tie-breaking) is
//! easier to reason about sequentially.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::Config;
use crate::err::Result;
use crate::loci::excluded::Excluded;
use crate::loci::locus::Locus;
use crate::loci::monosublocus_holder::MonosublocusHolder;
use crate::loci::superlocus::Superlocus;
use crate::loci::monosublocus_holder_compatible;
use crate::model::evidence::EvidenceStore;
use crate::model::transcript::Transcript;

/// One superlocus's fully processed output: zero or more elected loci, plus
/// whatever transcripts never made it into one.
pub struct SuperlocusOutput {
    pub loci: Vec<Locus>,
    pub excluded: Excluded,
}

/// Process one superlocus end-to-end: evidence loading, sublocus and
/// monosublocus definition, holder re-merging, and locus election (spec
/// §4.1–§4.9).
///
/// The superlocus-wide clique restriction of §4.9 step 6 needs every
/// holder's provisional primary known before any holder's AS candidates are
/// admitted, so election happens in two passes: first every holder picks
/// its primary, then a single clique computation over all of the
/// superlocus's pooled transcripts decides which candidates are even
/// eligible for AS consideration, and only then does each holder run its
/// admission checks.
pub fn process_superlocus(
    mut superlocus: Superlocus,
    evidence: &dyn EvidenceStore,
    cfg: &Config,
) -> Result<SuperlocusOutput> {
    superlocus.load_evidence(evidence, &cfg.orf_loading, &cfg.chimera_split)?;

    let cds_only = cfg.run_options.subloci_from_cds_only;
    let overlap_floor = cfg.run_options.monosublocus_holder_min_monoexonic_overlap;

    let mut holders = Vec::new();
    let mut all_excluded = Vec::new();
    for mut sublocus in superlocus.define_subloci(cds_only) {
        sublocus.gather_metrics();
        let (monosubloci, purged) =
            sublocus.define_monosubloci(&cfg.scoring, &cfg.requirements, cfg.run_options.purge, cds_only)?;
        all_excluded.extend(purged);
        holders.extend(MonosublocusHolder::build(monosubloci, cds_only, overlap_floor));
    }

    for holder in &mut holders {
        holder.gather_metrics();
    }

    // Pass 1: provisional primary + AS candidate pool per holder.
    let mut provisional: Vec<(Option<Transcript>, Vec<Transcript>)> = Vec::with_capacity(holders.len());
    for holder in &holders {
        let (primary, pool, purged) = Locus::provisional_primary(
            holder.transcripts.clone(),
            &cfg.scoring,
            &cfg.requirements,
            cfg.run_options.purge,
        )?;
        all_excluded.extend(purged);
        provisional.push((primary, pool));
    }

    let primary_ids: HashSet<String> =
        provisional.iter().filter_map(|(p, _)| p.as_ref().map(|t| t.id.clone())).collect();

    // All transcripts pooled across holders, for the superlocus-wide clique
    // computation (spec §4.9 step 6): a candidate's AS eligibility depends
    // on its clique membership across the *entire* superlocus, not just its
    // own holder.
    let pooled: Vec<Transcript> = provisional
        .iter()
        .flat_map(|(primary, pool)| primary.iter().cloned().chain(pool.iter().cloned()))
        .collect();
    let cliques = crate::graph::maximal_cliques(&pooled, |a, b| {
        monosublocus_holder_compatible(a, b, cds_only, overlap_floor)
    });
    let eligible: HashSet<String> = pooled
        .iter()
        .enumerate()
        .filter(|(_, t)| !primary_ids.contains(&t.id))
        .filter_map(|(idx, t)| {
            let containing: Vec<&Vec<usize>> = cliques.iter().filter(|c| c.contains(&idx)).collect();
            if containing.len() != 1 {
                return None;
            }
            let primaries_in_clique = containing[0].iter().filter(|&&j| primary_ids.contains(&pooled[j].id)).count();
            (primaries_in_clique == 1).then(|| t.id.clone())
        })
        .collect();

    // Pass 2: admit AS isoforms, gated by the eligibility set just computed.
    let mut loci = Vec::new();
    for ((primary, pool), holder) in provisional.into_iter().zip(holders.iter()) {
        let Some(primary) = primary else {
            continue;
        };
        let (isoforms, excluded) =
            Locus::admit_alternative_splicing(&primary, pool, &cfg.alternative_splicing, Some(&eligible));
        all_excluded.extend(excluded);
        loci.push(Locus {
            chrom: holder.locus.chrom.clone(),
            strand: holder.locus.strand,
            primary,
            alternative_splicing: isoforms,
        });
    }

    let chrom = superlocus.locus.chrom.clone();
    let strand = superlocus.locus.strand;
    Ok(SuperlocusOutput {
        loci,
        excluded: Excluded::new(chrom, strand, all_excluded),
    })
}

/// Run the full pipeline over `transcripts`: cluster into superloci and
/// process each one in parallel. `cancel` lets a caller (e.g. a signal
/// handler) stop dispatching new superloci early; already-running ones
/// still finish.
pub fn run(
    transcripts: Vec<Transcript>,
    evidence: Arc<dyn EvidenceStore>,
    cfg: &Config,
    cancel: Arc<AtomicBool>,
) -> Result<Vec<SuperlocusOutput>> {
    let superloci = Superlocus::cluster(transcripts);
    superloci
        .into_par_iter()
        .filter({
            let cancel = cancel.clone();
            move |_| !cancel.load(Ordering::Relaxed)
        })
        .map(|sl| process_superlocus(sl, evidence.as_ref(), cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Coord;
    use crate::config::scoring::{Rescaling, ScoringRule};
    use crate::model::evidence::InMemoryEvidenceStore;
    use crate::model::interval::Strand;
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

    fn cfg_with_scoring() -> Config {
        let mut cfg = Config::default();
        let mut params = IndexMap::new();
        params.insert(
            "cdna_length".to_string(),
            ScoringRule { rescaling: Rescaling::Max, value: None, weight: 1.0, filter: None },
        );
        cfg.scoring.parameters = params;
        cfg.run_options.purge = false;
        cfg
    }

    #[test]
    fn end_to_end_produces_one_locus_for_one_cluster() {
        let a = mk("a", 1, 200);
        let b = mk("b", 100, 300);
        let superloci = Superlocus::cluster(vec![a, b]);
        assert_eq!(superloci.len(), 1);
        let evidence = InMemoryEvidenceStore::new();
        let cfg = cfg_with_scoring();
        let out = process_superlocus(superloci.into_iter().next().unwrap(), &evidence, &cfg).unwrap();
        assert_eq!(out.loci.len(), 1);
        assert!(out.excluded.is_empty() || out.loci[0].alternative_splicing.len() <= 1);
    }

    #[test]
    fn run_processes_disjoint_clusters_independently() {
        let a = mk("a", 1, 200);
        let b = mk("b", 1000, 1200);
        let evidence: Arc<dyn EvidenceStore> = Arc::new(InMemoryEvidenceStore::new());
        let cfg = cfg_with_scoring();
        let results = run(vec![a, b], evidence, &cfg, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(results.len(), 2);
    }
}

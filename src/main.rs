//! CLI entry point. Follows the teacher's pattern of a flattened `Verbosity`
//! argument, a `tracing` subscriber set up before anything else runs, and a
//! `console`-styled closing message.

use std::fs;
use std::io::BufWriter;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::Emoji;
use serde::Deserialize;

use mikado_loci::common::{init_tracing, Args as CommonArgs, Coord};
use mikado_loci::config::Config;
use mikado_loci::model::evidence::{BlastHit, CandidateOrf, EvidenceStore, Hsp, InMemoryEvidenceStore};
use mikado_loci::model::interval::Strand;
use mikado_loci::model::transcript::{FeatureKind, Transcript};
use mikado_loci::output::{gff, reports};
use mikado_loci::pipeline;
use mikado_loci::MikadoError;

static DONE: Emoji<'_, '_> = Emoji("\u{2705} ", "");

#[derive(Parser, Debug)]
#[command(name = "mikado-loci", version, about = "Cluster transcript predictions into gene loci")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster transcripts into loci, score them, and emit GFF3 + reports.
    Pick {
        /// Path to the YAML configuration document.
        #[arg(long)]
        config: String,
        /// Path to a JSON document describing the input transcripts.
        #[arg(long)]
        transcripts: String,
        /// Optional path to a JSON document of external evidence (verified
        /// junctions, candidate ORFs, BLAST hits).
        #[arg(long)]
        evidence: Option<String>,
        /// Prefix for the three output files (`<prefix>.gff3`,
        /// `<prefix>.metrics.tsv`, `<prefix>.scores.tsv`).
        #[arg(long)]
        out_prefix: String,
    },
}

#[derive(Debug, Deserialize)]
struct ExonInput {
    kind: String,
    start: Coord,
    end: Coord,
}

#[derive(Debug, Deserialize)]
struct TranscriptInput {
    id: String,
    chrom: String,
    source: String,
    strand: String,
    #[serde(default)]
    parent: Vec<String>,
    features: Vec<ExonInput>,
}

fn parse_strand(s: &str) -> Strand {
    match s {
        "+" => Strand::Plus,
        "-" => Strand::Minus,
        _ => Strand::Unknown,
    }
}

fn parse_kind(s: &str) -> Option<FeatureKind> {
    match s {
        "exon" => Some(FeatureKind::Exon),
        "CDS" => Some(FeatureKind::Cds),
        "UTR" => Some(FeatureKind::Utr),
        "start_codon" => Some(FeatureKind::StartCodon),
        "stop_codon" => Some(FeatureKind::StopCodon),
        _ => None,
    }
}

fn load_transcripts(path: &str) -> mikado_loci::Result<Vec<Transcript>> {
    let content = fs::read_to_string(path).map_err(|e| MikadoError::Io(e.to_string()))?;
    let inputs: Vec<TranscriptInput> =
        serde_json::from_str(&content).map_err(|e| MikadoError::InvalidConfig(e.to_string()))?;

    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        let mut t = Transcript::new(input.id, input.chrom, input.source, parse_strand(&input.strand));
        t.parent = input.parent;
        for feature in &input.features {
            let kind = parse_kind(&feature.kind).ok_or_else(|| {
                MikadoError::InvalidConfig(format!("unknown feature kind `{}`", feature.kind))
            })?;
            t.add_exon(kind, feature.start, feature.end)?;
        }
        t.start = t.exons.iter().map(|e| e.start).min().unwrap_or(0);
        t.end = t.exons.iter().map(|e| e.end).max().unwrap_or(0);
        out.push(t);
    }
    Ok(out)
}

#[derive(Debug, Deserialize, Default)]
struct EvidenceInput {
    #[serde(default)]
    junctions: Vec<(String, Coord, Coord, String)>,
    #[serde(default)]
    orfs: std::collections::HashMap<String, Vec<CandidateOrfInput>>,
    #[serde(default)]
    hits: std::collections::HashMap<String, Vec<BlastHitInput>>,
}

#[derive(Debug, Deserialize)]
struct CandidateOrfInput {
    thick_start: Coord,
    thick_end: Coord,
    strand: String,
    #[serde(default)]
    has_start_codon: bool,
    #[serde(default)]
    has_stop_codon: bool,
}

#[derive(Debug, Deserialize)]
struct BlastHitInput {
    query_start: Coord,
    query_end: Coord,
    evalue: f64,
    target: String,
    #[serde(default)]
    hsps: Vec<HspInput>,
}

#[derive(Debug, Deserialize)]
struct HspInput {
    query_hsp_start: Coord,
    query_hsp_end: Coord,
    hsp_evalue: f64,
}

fn load_evidence(path: Option<&str>) -> mikado_loci::Result<InMemoryEvidenceStore> {
    let Some(path) = path else {
        return Ok(InMemoryEvidenceStore::new());
    };
    let content = fs::read_to_string(path).map_err(|e| MikadoError::Io(e.to_string()))?;
    let input: EvidenceInput =
        serde_json::from_str(&content).map_err(|e| MikadoError::InvalidConfig(e.to_string()))?;

    let mut store = InMemoryEvidenceStore::new();
    for (chrom, start, end, strand) in input.junctions {
        store = store.with_junction(chrom, start, end, parse_strand(&strand));
    }
    for (tid, orfs) in input.orfs {
        let orfs = orfs
            .into_iter()
            .map(|o| CandidateOrf {
                thick_start: o.thick_start,
                thick_end: o.thick_end,
                strand: parse_strand(&o.strand),
                has_start_codon: o.has_start_codon,
                has_stop_codon: o.has_stop_codon,
            })
            .collect();
        store = store.with_orfs(tid, orfs);
    }
    for (tid, hits) in input.hits {
        let hits = hits
            .into_iter()
            .map(|h| BlastHit {
                query_start: h.query_start,
                query_end: h.query_end,
                evalue: h.evalue,
                target: h.target,
                hsps: h
                    .hsps
                    .into_iter()
                    .map(|p| Hsp {
                        query_hsp_start: p.query_hsp_start,
                        query_hsp_end: p.query_hsp_end,
                        hsp_evalue: p.hsp_evalue,
                    })
                    .collect(),
            })
            .collect();
        store = store.with_hits(tid, hits);
    }
    Ok(store)
}

fn run_pick(config: &str, transcripts: &str, evidence: Option<&str>, out_prefix: &str) -> mikado_loci::Result<()> {
    let config_text = fs::read_to_string(config).map_err(|e| MikadoError::Io(e.to_string()))?;
    let cfg = Config::from_yaml(&config_text)?;
    cfg.validate()?;

    let transcripts = load_transcripts(transcripts)?;
    let evidence_store = load_evidence(evidence)?;
    let evidence: Arc<dyn EvidenceStore> = Arc::new(evidence_store);

    tracing::info!(n = transcripts.len(), "loaded transcripts");
    let outputs = pipeline::run(transcripts, evidence, &cfg, Arc::new(AtomicBool::new(false)))?;

    let mut gff_text = String::new();
    let mut all_transcripts: Vec<Transcript> = Vec::new();
    for (i, output) in outputs.iter().enumerate() {
        for (j, locus) in output.loci.iter().enumerate() {
            let locus_id = format!("superlocus_{i}.locus_{j}");
            gff::write_locus(&mut gff_text, &locus_id, locus);
            all_transcripts.push(locus.primary.clone());
            all_transcripts.extend(locus.alternative_splicing.iter().cloned());
        }
        for excluded_t in &output.excluded.transcripts {
            gff::write_excluded(&mut gff_text, excluded_t);
            all_transcripts.push(excluded_t.clone());
        }
    }
    fs::write(format!("{out_prefix}.gff3"), gff_text).map_err(|e| MikadoError::Io(e.to_string()))?;

    let refs: Vec<&Transcript> = all_transcripts.iter().collect();
    let metrics_file = fs::File::create(format!("{out_prefix}.metrics.tsv")).map_err(|e| MikadoError::Io(e.to_string()))?;
    reports::write_metrics_report(BufWriter::new(metrics_file), &refs)?;
    let scores_file = fs::File::create(format!("{out_prefix}.scores.tsv")).map_err(|e| MikadoError::Io(e.to_string()))?;
    reports::write_scores_report(BufWriter::new(scores_file), &refs)?;

    let loci_count: usize = outputs.iter().map(|o| o.loci.len()).sum();
    tracing::info!(loci = loci_count, "finished");
    println!("{}wrote {loci_count} loci to {out_prefix}.gff3", DONE);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.common);

    let result = match &cli.command {
        Command::Pick { config, transcripts, evidence, out_prefix } => {
            run_pick(config, transcripts, evidence.as_deref(), out_prefix)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "mikado-loci failed");
            e.exit_code()
        }
    }
}

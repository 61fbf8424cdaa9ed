//! GFF3 emission for a locus's record tree, grounded on
//! `loci_objects/transcript.py`'s `__str__` from the original Mikado: one
//! `gene` line per locus, one `mRNA`/`transcript` line per member, one
//! `exon`/`CDS` line per segment, attributes rendered as `key=value` pairs.

use std::fmt::Write as _;

use crate::loci::locus::Locus;
use crate::model::transcript::{SegmentKind, Transcript};

/// Render one locus (primary + alternative-splicing isoforms) as a GFF3
/// record tree: a `gene` line, then each transcript's `mRNA`/`transcript`,
/// `exon` and `CDS` lines.
pub fn write_locus(out: &mut String, locus_id: &str, locus: &Locus) {
    let start = locus.start();
    let end = locus.end();
    let _ = writeln!(
        out,
        "{}\tMikado\tgene\t{}\t{}\t.\t{}\t.\tID={}",
        locus.chrom, start, end, locus.strand, locus_id
    );
    write_transcript(out, &locus.primary, locus_id);
    for isoform in &locus.alternative_splicing {
        write_transcript(out, isoform, locus_id);
    }
}

/// Render one excluded transcript as a standalone `gene`/`transcript` pair
/// so that nothing is silently dropped from the GFF3 output.
pub fn write_excluded(out: &mut String, transcript: &Transcript) {
    let _ = writeln!(
        out,
        "{}\tMikado\tgene\t{}\t{}\t.\t{}\t.\tID={}.gene",
        transcript.chrom, transcript.start, transcript.end, transcript.strand, transcript.id
    );
    write_transcript(out, transcript, &format!("{}.gene", transcript.id));
}

fn write_transcript(out: &mut String, t: &Transcript, parent_id: &str) {
    let feature_name = if t.combined_cds.is_empty() { "transcript" } else { "mRNA" };
    let _ = writeln!(
        out,
        "{}\tMikado\t{}\t{}\t{}\t.\t{}\t.\tID={};Parent={}",
        t.chrom, feature_name, t.start, t.end, t.strand, t.id, parent_id
    );
    for exon in &t.exons {
        let _ = writeln!(
            out,
            "{}\tMikado\texon\t{}\t{}\t.\t{}\t.\tParent={}",
            t.chrom, exon.start, exon.end, t.strand, t.id
        );
    }
    if let Some(orf) = t.internal_orfs.get(t.selected_internal_orf_index.unwrap_or(0)) {
        let mut consumed = 0i64;
        let mut cds_segments: Vec<&(SegmentKind, i64, i64)> =
            orf.iter().filter(|s| s.0 == SegmentKind::Cds).collect();
        if t.strand == crate::model::interval::Strand::Minus {
            cds_segments.reverse();
        }
        for seg in cds_segments {
            let phase = (3 - (consumed % 3)) % 3;
            let _ = writeln!(
                out,
                "{}\tMikado\tCDS\t{}\t{}\t.\t{}\t{}\tParent={}",
                t.chrom, seg.1, seg.2, t.strand, phase, t.id
            );
            consumed += seg.2 - seg.1 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    #[test]
    fn gene_and_mrna_lines_are_emitted() {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 200;
        t.add_exon(FeatureKind::Exon, 1, 200).unwrap();
        t.add_exon(FeatureKind::Cds, 10, 190).unwrap();
        t.add_exon(FeatureKind::Utr, 1, 9).unwrap();
        t.add_exon(FeatureKind::Utr, 191, 200).unwrap();
        t.finalize().unwrap();
        let locus = crate::loci::locus::Locus {
            chrom: "chr1".to_string(),
            strand: Strand::Plus,
            primary: t,
            alternative_splicing: Vec::new(),
        };
        let mut out = String::new();
        write_locus(&mut out, "locus1", &locus);
        assert!(out.contains("\tgene\t"));
        assert!(out.contains("\tmRNA\t"));
        assert!(out.contains("\tCDS\t"));
        assert!(out.contains("ID=t1;Parent=locus1"));
    }
}

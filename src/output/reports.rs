//! The two TSV companion reports (spec §6): one row per transcript, columns
//! the closed metric registry, written with `csv::Writer` the way the
//! teacher writes its aggregation reports in
//! `strucvars/aggregate/cli.rs`.

use std::io::Write;

use crate::err::{MikadoError, Result};
use crate::metrics::{metric_string, Metric};
use crate::model::transcript::Transcript;

/// Write the full metrics report: every registry column, one row per
/// transcript.
pub fn write_metrics_report<W: Write>(writer: W, transcripts: &[&Transcript]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let registry = Metric::registry();
    let header: Vec<String> = registry.iter().map(|m| m.to_string()).collect();
    csv_writer
        .write_record(&header)
        .map_err(|e| MikadoError::Io(e.to_string()))?;
    for t in transcripts {
        let row: Vec<String> = registry.iter().map(|&m| metric_string(m, t)).collect();
        csv_writer.write_record(&row).map_err(|e| MikadoError::Io(e.to_string()))?;
    }
    csv_writer.flush().map_err(|e| MikadoError::Io(e.to_string()))
}

/// Write the scores report: `tid`, `parent`, `score` only.
pub fn write_scores_report<W: Write>(writer: W, transcripts: &[&Transcript]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(["tid", "parent", "score"])
        .map_err(|e| MikadoError::Io(e.to_string()))?;
    for t in transcripts {
        csv_writer
            .write_record([t.id.clone(), t.parent.join(","), t.score.to_string()])
            .map_err(|e| MikadoError::Io(e.to_string()))?;
    }
    csv_writer.flush().map_err(|e| MikadoError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    #[test]
    fn metrics_report_has_one_row_per_transcript() {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 100;
        t.add_exon(FeatureKind::Exon, 1, 100).unwrap();
        t.finalize().unwrap();
        let mut buf = Vec::new();
        write_metrics_report(&mut buf, &[&t]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("tid,parent,score"));
    }

    #[test]
    fn scores_report_has_three_columns() {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = 100;
        t.add_exon(FeatureKind::Exon, 1, 100).unwrap();
        t.finalize().unwrap();
        t.score = 4.5;
        let mut buf = Vec::new();
        write_scores_report(&mut buf, &[&t]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "tid,parent,score\nt1,,4.5\n");
    }
}

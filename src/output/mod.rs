//! External output formats: the GFF3 record tree and the TSV companion
//! reports (spec §6).

pub mod gff;
pub mod reports;

//! Error types for the locus resolution core.
//!
//! Mirrors the closed error family from the design: invariant violations and
//! configuration problems are fatal, evidence/ORF problems are locally
//! recoverable (the caller decides whether to drop or reroute).

use std::process::ExitCode;

/// Errors produced by the locus resolution core.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MikadoError {
    /// `finalize()` invariants violated.
    #[error("invalid transcript {tid}: {reason}")]
    InvalidTranscript { tid: String, reason: String },

    /// ORF projection inconsistent with the transcript's exons.
    #[error("invalid CDS for transcript {tid}: {reason}")]
    InvalidCds { tid: String, reason: String },

    /// A transcript failed a locus's acceptance predicate.
    #[error("transcript {tid} does not belong in this locus: {reason}")]
    NotInLocus { tid: String, reason: String },

    /// No configuration document was supplied.
    #[error("no configuration supplied")]
    NoJsonConfig,

    /// A `scoring.parameters` entry named a rescaler we do not recognize.
    #[error("unrecognized rescaler `{0}`")]
    UnrecognizedRescaler(String),

    /// `requirements.expression` failed to parse or reference a known parameter.
    #[error("invalid requirements expression: {0}")]
    InvalidRequirements(String),

    /// Configuration failed schema validation (unknown or missing keys).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure reading a configuration document or evidence source.
    #[error("I/O error: {0}")]
    Io(String),

    /// Evidence lookup failed for a transcript; the core proceeds with empty evidence.
    #[error("evidence unavailable for {tid}: {reason}")]
    EvidenceUnavailable { tid: String, reason: String },
}

impl MikadoError {
    /// Exit code contract from the external-interfaces section: `0` success,
    /// `1` user error (bad config/input), `2` internal error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            MikadoError::NoJsonConfig
            | MikadoError::InvalidConfig(_)
            | MikadoError::InvalidRequirements(_)
            | MikadoError::UnrecognizedRescaler(_)
            | MikadoError::Io(_) => ExitCode::from(1),
            MikadoError::InvalidTranscript { .. }
            | MikadoError::InvalidCds { .. }
            | MikadoError::NotInLocus { .. }
            | MikadoError::EvidenceUnavailable { .. } => ExitCode::from(2),
        }
    }
}

pub type Result<T> = std::result::Result<T, MikadoError>;

//! Configuration: a `serde`-driven YAML/JSON document following the
//! teacher's `deny_unknown_fields` discipline (`strucvars/aggregate/cli.rs`'s
//! `Args`), validated explicitly for the one required key with no sane
//! default (`scoring.parameters`).

pub mod requirements;
pub mod scoring;

use serde::Deserialize;

use crate::err::{MikadoError, Result};
use crate::model::orf::{ChimeraSplitConfig, OrfLoadingConfig};
use requirements::RequirementsConfig;
use scoring::ScoringConfig;

/// Tunables for the alternative-splicing election step (spec §4.9).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AlternativeSplicingConfig {
    /// Maximum number of AS isoforms retained per locus, beyond the primary.
    pub max_isoforms: usize,
    /// An AS candidate must score at least this fraction of the primary's
    /// score to be retained.
    pub min_score_perc: f64,
    /// Minimum fraction of the primary's CDS the candidate must share.
    pub min_cdna_overlap: f64,
    pub min_cds_overlap: f64,
    /// Whether candidates may differ from the primary only by retaining an
    /// intron (normally excluded).
    pub keep_retained_introns: bool,
}

impl Default for AlternativeSplicingConfig {
    fn default() -> Self {
        AlternativeSplicingConfig {
            max_isoforms: 3,
            min_score_perc: 0.5,
            min_cdna_overlap: 0.2,
            min_cds_overlap: 0.2,
            keep_retained_introns: false,
        }
    }
}

/// Top-level pipeline knobs not specific to any one component (spec §5).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunOptionsConfig {
    /// Worker threads for the superloci pool; `0` lets `rayon` pick.
    pub threads: usize,
    /// Purge transcripts failing `requirements` instead of only excluding
    /// them from AS election.
    pub purge: bool,
    pub exclude_splice_in_padding: bool,
    /// When set, the sublocus and monosublocus-holder predicates only look
    /// at CDS introns/splice sites instead of the full intron chain.
    pub subloci_from_cds_only: bool,
    /// Floor for the monosublocus-holder predicate's monoexonic fallback:
    /// a monoexonic transcript merges with another when it overlaps it by
    /// at least this fraction of its own length, even without a shared
    /// splice site.
    pub monosublocus_holder_min_monoexonic_overlap: f64,
}

impl Default for RunOptionsConfig {
    fn default() -> Self {
        RunOptionsConfig {
            threads: 0,
            purge: true,
            exclude_splice_in_padding: true,
            subloci_from_cds_only: false,
            monosublocus_holder_min_monoexonic_overlap: 0.5,
        }
    }
}

/// The full configuration document.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub run_options: RunOptionsConfig,
    pub orf_loading: OrfLoadingConfig,
    pub chimera_split: ChimeraSplitConfig,
    pub requirements: RequirementsConfig,
    pub scoring: ScoringConfig,
    pub alternative_splicing: AlternativeSplicingConfig,
}

impl Config {
    /// Parse a YAML configuration document.
    pub fn from_yaml(content: &str) -> Result<Config> {
        serde_yaml::from_str(content).map_err(|e| MikadoError::InvalidConfig(e.to_string()))
    }

    /// Parse a JSON configuration document.
    pub fn from_json(content: &str) -> Result<Config> {
        serde_json::from_str(content).map_err(|e| MikadoError::InvalidConfig(e.to_string()))
    }

    /// Validate required keys that have no usable zero-value default.
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fail_validation_without_scoring_parameters() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn yaml_round_trips_minimal_document() {
        let yaml = r#"
scoring:
  parameters:
    cdna_length:
      rescaling: max
      weight: 1.0
"#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.run_options.purge, true);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let yaml = "not_a_real_section: true\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}

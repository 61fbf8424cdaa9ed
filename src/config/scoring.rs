//! The `scoring` configuration section (spec §4.5): a weighted sum of
//! per-metric rescaled values, each metric optionally gated by a filter.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::config::requirements::{Operator, Value};
use crate::err::{MikadoError, Result};
use crate::metrics::{compute_numeric, Metric};
use crate::model::transcript::Transcript;

/// How a metric's raw value is rescaled to `[0, 1]` before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rescaling {
    /// Highest raw value among candidates scores 1, lowest scores 0.
    Max,
    /// Lowest raw value among candidates scores 1, highest scores 0.
    Min,
    /// Candidates closest to `target` score 1, furthest score 0.
    Target,
}

/// An optional per-metric gate: transcripts failing it contribute 0 for this
/// metric's weighted term regardless of rescaled value.
#[derive(Debug, Clone, Deserialize)]
pub struct Filter {
    pub operator: Operator,
    pub value: Value,
}

/// One scoring rule, keyed by metric name in `ScoringConfig::parameters`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringRule {
    pub rescaling: Rescaling,
    #[serde(default)]
    pub value: Option<f64>,
    pub weight: f64,
    #[serde(default)]
    pub filter: Option<Filter>,
}

/// The `scoring` configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub parameters: IndexMap<String, ScoringRule>,
}

impl ScoringConfig {
    /// `scoring.parameters` must name at least one metric; this is the one
    /// required key with no sensible default.
    pub fn validate(&self) -> Result<()> {
        if self.parameters.is_empty() {
            return Err(MikadoError::InvalidConfig(
                "scoring.parameters must define at least one metric".to_string(),
            ));
        }
        for name in self.parameters.keys() {
            if name.parse::<Metric>().is_err() {
                return Err(MikadoError::UnrecognizedRescaler(name.clone()));
            }
        }
        Ok(())
    }
}

/// Rescale `raw` to `[0, 1]` given the min/max/target seen across the
/// candidate set being scored together (spec §4.5).
fn rescale(rescaling: Rescaling, target: Option<f64>, raw: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        // Every candidate is tied: max/min both sit at the (shared) extremum,
        // but target-rescaling has no sense of "best" to award full marks to.
        return match rescaling {
            Rescaling::Max | Rescaling::Min => 1.0,
            Rescaling::Target => 0.0,
        };
    }
    match rescaling {
        Rescaling::Max => (raw - min) / (max - min),
        Rescaling::Min => (max - raw) / (max - min),
        Rescaling::Target => {
            let target = target.unwrap_or(0.0);
            let worst = (min - target).abs().max((max - target).abs());
            if worst < f64::EPSILON {
                1.0
            } else {
                1.0 - (raw - target).abs() / worst
            }
        }
    }
}

/// Score every transcript in `group` against `cfg`, returning one score per
/// transcript in the same order. Rescaling is computed relative to the
/// min/max seen within `group` (typically all transcripts in one locus).
pub fn score_group(cfg: &ScoringConfig, group: &[&Transcript]) -> Result<Vec<f64>> {
    let mut scores = vec![0.0; group.len()];
    for (name, rule) in &cfg.parameters {
        let metric: Metric = name
            .parse()
            .map_err(|_| MikadoError::UnrecognizedRescaler(name.clone()))?;
        let raw: Vec<f64> = group.iter().map(|t| compute_numeric(metric, t)).collect();
        let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for (i, t) in group.iter().enumerate() {
            let passes_filter = match &rule.filter {
                None => true,
                Some(filter) => filter.operator.evaluate(raw[i], &filter.value)?,
            };
            if !passes_filter {
                continue;
            }
            let rescaled = rescale(rule.rescaling, rule.value, raw[i], min, max);
            scores[i] += rescaled * rule.weight;
            let _ = t;
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    fn transcript_with_cdna(id: &str, len: i64) -> Transcript {
        let mut t = Transcript::new(id, "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = len;
        t.add_exon(FeatureKind::Exon, 1, len).unwrap();
        t.finalize().unwrap();
        t
    }

    #[test]
    fn max_rescaling_rewards_longer_cdna() {
        let mut params = IndexMap::new();
        params.insert(
            "cdna_length".to_string(),
            ScoringRule {
                rescaling: Rescaling::Max,
                value: None,
                weight: 1.0,
                filter: None,
            },
        );
        let cfg = ScoringConfig { parameters: params };
        let short = transcript_with_cdna("short", 100);
        let long = transcript_with_cdna("long", 500);
        let group = vec![&short, &long];
        let scores = score_group(&cfg, &group).unwrap();
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[1], 1.0);
    }

    #[test]
    fn equal_raw_values_all_score_one() {
        let mut params = IndexMap::new();
        params.insert(
            "cdna_length".to_string(),
            ScoringRule {
                rescaling: Rescaling::Max,
                value: None,
                weight: 2.0,
                filter: None,
            },
        );
        let cfg = ScoringConfig { parameters: params };
        let a = transcript_with_cdna("a", 100);
        let b = transcript_with_cdna("b", 100);
        let group = vec![&a, &b];
        let scores = score_group(&cfg, &group).unwrap();
        assert_eq!(scores, vec![2.0, 2.0]);
    }

    #[test]
    fn validate_rejects_empty_parameters() {
        let cfg = ScoringConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_metric() {
        let mut params = IndexMap::new();
        params.insert(
            "not_a_metric".to_string(),
            ScoringRule {
                rescaling: Rescaling::Max,
                value: None,
                weight: 1.0,
                filter: None,
            },
        );
        let cfg = ScoringConfig { parameters: params };
        assert!(cfg.validate().is_err());
    }
}

//! Presentation defaults used while filling in missing evidence fields.
//!
//! None of these carry clinical meaning: the resistance score is a fixed
//! placeholder and therapy efficacy is a rank heuristic for ordering bars.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvidenceDefaults {
    /// VAF used when a driver row carries neither a VAF nor an `AF` column.
    pub default_vaf: f64,
    /// Score given to every (gene, mutation) pair from a gene-keyed resistance mapping.
    pub resistance_score: f64,
    /// Efficacy of the rank-0 therapy.
    pub efficacy_start: f64,
    /// Efficacy drop per rank.
    pub efficacy_step: f64,
    pub efficacy_floor: f64,
    pub efficacy_ceiling: f64,
}

impl Default for EvidenceDefaults {
    fn default() -> Self {
        Self {
            default_vaf:      0.5,
            resistance_score: 0.75,
            efficacy_start:   0.9,
            efficacy_step:    0.1,
            efficacy_floor:   0.5,
            efficacy_ceiling: 0.9,
        }
    }
}

impl EvidenceDefaults {
    /// All values must be fractions and the efficacy band must not be inverted.
    pub fn validate(&self) -> Result<(), String> {
        let fractions = [
            ("default_vaf", self.default_vaf),
            ("resistance_score", self.resistance_score),
            ("efficacy_start", self.efficacy_start),
            ("efficacy_step", self.efficacy_step),
            ("efficacy_floor", self.efficacy_floor),
            ("efficacy_ceiling", self.efficacy_ceiling),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("evidence.{} must lie in [0, 1], got {}", name, value));
            }
        }
        if self.efficacy_floor > self.efficacy_ceiling {
            return Err(format!(
                "evidence.efficacy_floor ({}) exceeds evidence.efficacy_ceiling ({})",
                self.efficacy_floor, self.efficacy_ceiling
            ));
        }
        Ok(())
    }

    /// `clamp(start - rank * step, floor, ceiling)`, rounded to suppress float noise.
    pub fn rank_efficacy(&self, rank: usize) -> f64 {
        let raw = self.efficacy_start - rank as f64 * self.efficacy_step;
        round4(raw.clamp(self.efficacy_floor, self.efficacy_ceiling))
    }

    pub fn clamp_efficacy(&self, efficacy: f64) -> f64 {
        round4(efficacy.clamp(self.efficacy_floor, self.efficacy_ceiling))
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

//! Canonical evidence records handed to display layers.

use serde::{Deserialize, Serialize};

/// Impact tier assigned by the upstream annotation tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    High,
    Moderate,
    Low,
    Unknown,
}

impl Impact {
    /// Case-insensitive; anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Impact::High,
            "MODERATE" => Impact::Moderate,
            "LOW" => Impact::Low,
            _ => Impact::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "HIGH",
            Impact::Moderate => "MODERATE",
            Impact::Low => "LOW",
            Impact::Unknown => "UNKNOWN",
        }
    }

    pub fn pathogenicity(&self) -> f64 {
        match self {
            Impact::High => 0.9,
            Impact::Moderate => 0.7,
            Impact::Low => 0.5,
            Impact::Unknown => 0.6,
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, Impact::High | Impact::Moderate)
    }
}

/// A normalised driver mutation.
///
/// `pathogenicity_score` and `actionable` are always derived from `impact`,
/// so the record cannot be built in a contradictory state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MutationRecord {
    gene: String,
    mutation: String,
    variant_allele_fraction: f64,
    impact: Impact,
    pathogenicity_score: f64,
    actionable: bool,
}

impl MutationRecord {
    /// VAF is clamped into [0, 1].
    pub fn new(
        gene: impl Into<String>,
        mutation: impl Into<String>,
        variant_allele_fraction: f64,
        impact: Impact,
    ) -> Self {
        Self {
            gene: gene.into(),
            mutation: mutation.into(),
            variant_allele_fraction: variant_allele_fraction.clamp(0.0, 1.0),
            impact,
            pathogenicity_score: impact.pathogenicity(),
            actionable: impact.is_actionable(),
        }
    }

    pub fn gene(&self) -> &str { &self.gene }
    pub fn mutation(&self) -> &str { &self.mutation }
    pub fn variant_allele_fraction(&self) -> f64 { self.variant_allele_fraction }
    pub fn impact(&self) -> Impact { self.impact }
    pub fn pathogenicity_score(&self) -> f64 { self.pathogenicity_score }
    pub fn actionable(&self) -> bool { self.actionable }
}

/// One resistance-conferring (gene, mutation) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResistanceRecord {
    pub gene: String,
    pub mutation: String,
    pub score: f64,
    pub therapy: String,
}

/// Ranked therapy suggestion. Efficacy is a display ordering, not a clinical estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TherapyRecommendation {
    pub name: String,
    pub mechanism: String,
    pub efficacy: f64,
}

/// Summary counts reported by the VCF-backed analyser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EvidenceStatistics {
    #[serde(default)]
    pub driver_genes: u64,
    #[serde(default)]
    pub total_variants: u64,
}

impl EvidenceStatistics {
    pub fn summary(&self) -> String {
        format!(
            "Found {} driver mutations out of {} total variants.",
            self.driver_genes, self.total_variants
        )
    }
}

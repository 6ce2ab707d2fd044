//! oncohub-evidence: Mutation evidence normalisation.
//!
//! Upstream analysers hand back driver, resistance and therapy evidence in
//! several shapes (VCF-derived tables, gene-keyed mappings, free-text lists).
//! This crate classifies each shape explicitly and produces one canonical,
//! display-ready `EvidenceSet`:
//! - `drivers`: default-filling of VAF, pathogenicity and actionability
//! - `resistance`: score/therapy synthesis for gene-keyed mappings
//! - `therapies`: "Name (mechanism)" parsing and rank-based efficacy

pub mod defaults;
pub mod drivers;
pub mod evidence;
pub mod models;
pub mod resistance;
pub mod shape;
pub mod therapies;

pub use defaults::EvidenceDefaults;
pub use evidence::{EvidenceSet, ResistanceState, TherapyState};
pub use models::{EvidenceStatistics, Impact, MutationRecord, ResistanceRecord, TherapyRecommendation};

use serde_json::Value;

/// Stateless apart from its presentation defaults; safe to share across invocations.
#[derive(Debug, Clone, Default)]
pub struct MutationEvidenceNormalizer {
    defaults: EvidenceDefaults,
}

impl MutationEvidenceNormalizer {
    pub fn new(defaults: EvidenceDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &EvidenceDefaults {
        &self.defaults
    }

    pub fn normalize_drivers(&self, source: &Value) -> Vec<MutationRecord> {
        drivers::normalize(source, &self.defaults)
    }

    pub fn normalize_resistance(&self, source: &Value) -> Vec<ResistanceRecord> {
        resistance::normalize(source, &self.defaults)
    }

    pub fn normalize_therapies(&self, source: &Value) -> Vec<TherapyRecommendation> {
        therapies::normalize(source, &self.defaults)
    }

    /// Normalise a whole analysis result (`drivers`, `resistance`, `therapies`, `statistics`).
    pub fn normalize_evidence(&self, analysis: &Value) -> EvidenceSet {
        evidence::normalize(analysis, &self.defaults)
    }
}

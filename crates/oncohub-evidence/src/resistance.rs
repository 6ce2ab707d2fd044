//! Resistance marker normalisation.

use serde_json::Value;
use tracing::{debug, warn};

use crate::defaults::EvidenceDefaults;
use crate::models::ResistanceRecord;
use crate::shape::{self, ResistanceShape, Row};

pub fn normalize(source: &Value, defaults: &EvidenceDefaults) -> Vec<ResistanceRecord> {
    let records = match shape::classify_resistance(source) {
        ResistanceShape::Tabular(rows) | ResistanceShape::Canonical(rows) => from_rows(&rows, defaults),
        ResistanceShape::Mapping(mapping) => from_mapping(&mapping, defaults),
        ResistanceShape::Empty => Vec::new(),
    };
    debug!(n = records.len(), "Resistance markers normalised");
    records
}

/// Placeholder therapy class for a gene with no explicit therapy.
pub fn inhibitor_for(gene: &str) -> String {
    format!("{} Inhibitor", gene)
}

/// Gene-keyed mapping: every (gene, mutation) pair gets the fixed score and
/// the gene's inhibitor class.
fn from_mapping(mapping: &[(String, Vec<String>)], defaults: &EvidenceDefaults) -> Vec<ResistanceRecord> {
    mapping
        .iter()
        .flat_map(|(gene, mutations)| {
            mutations.iter().map(move |mutation| ResistanceRecord {
                gene: gene.clone(),
                mutation: mutation.clone(),
                score: defaults.resistance_score,
                therapy: inhibitor_for(gene),
            })
        })
        .collect()
}

fn from_rows(rows: &[Row], defaults: &EvidenceDefaults) -> Vec<ResistanceRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(gene) = shape::field_str(row, &["gene"]) else {
                warn!(row = i, "Skipping resistance row with no gene");
                return None;
            };
            let mutation = shape::field_str(row, &["mutation"]).unwrap_or_default();
            let score = shape::field_f64(row, &["score"])
                .map(|s| s.clamp(0.0, 1.0))
                .unwrap_or(defaults.resistance_score);
            let therapy = shape::field_str(row, &["therapy"]).unwrap_or_else(|| inhibitor_for(&gene));
            Some(ResistanceRecord { gene, mutation, score, therapy })
        })
        .collect()
}

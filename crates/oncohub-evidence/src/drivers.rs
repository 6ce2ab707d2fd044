//! Driver mutation normalisation.

use serde_json::Value;
use tracing::{debug, warn};

use oncohub_common::OncohubError;

use crate::defaults::EvidenceDefaults;
use crate::models::{Impact, MutationRecord};
use crate::shape::{self, DriverShape, Row};

const VAF_FIELDS: [&str; 2] = ["variant_allele_fraction", "vaf"];
const AF_FIELDS: [&str; 2] = ["AF", "af"];
const PATHOGENICITY_FIELDS: [&str; 2] = ["pathogenicity_score", "pathogenicity"];

/// Empty or unrecognisable input yields an empty list; callers treat that as "no data".
pub fn normalize(source: &Value, defaults: &EvidenceDefaults) -> Vec<MutationRecord> {
    let records = match shape::classify_drivers(source) {
        DriverShape::Tabular(rows) => from_rows(&rows, defaults),
        DriverShape::Canonical(rows) => from_canonical(&rows, defaults),
        DriverShape::Empty => Vec::new(),
    };
    debug!(n = records.len(), "Driver mutations normalised");
    records
}

/// VCF-derived rows: VAF falls back to `AF` then the default; impact drives the rest.
fn from_rows(rows: &[Row], defaults: &EvidenceDefaults) -> Vec<MutationRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| match row_to_record(row, defaults) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(row = i, error = %e, "Skipping driver row");
                None
            }
        })
        .collect()
}

/// Already-canonical records still go through the same constructor so the
/// derived fields are recomputed rather than trusted.
fn from_canonical(rows: &[Row], defaults: &EvidenceDefaults) -> Vec<MutationRecord> {
    from_rows(rows, defaults)
}

fn row_to_record(row: &Row, defaults: &EvidenceDefaults) -> Result<MutationRecord, OncohubError> {
    let gene = shape::field_str(row, &["gene"])
        .ok_or_else(|| OncohubError::MalformedRecord("driver row has no gene".to_string()))?;
    let mutation = shape::field_str(row, &["mutation"])
        .ok_or_else(|| OncohubError::MalformedRecord(format!("driver row for {} has no mutation", gene)))?;

    let vaf = shape::field_f64(row, &VAF_FIELDS)
        .or_else(|| shape::field_f64(row, &AF_FIELDS))
        .unwrap_or(defaults.default_vaf);

    let impact = shape::field_str(row, &["impact"])
        .map(|s| Impact::parse(&s))
        .unwrap_or(Impact::Unknown);

    let record = MutationRecord::new(gene, mutation, vaf, impact);

    if let Some(supplied) = shape::field_f64(row, &PATHOGENICITY_FIELDS) {
        if (supplied - record.pathogenicity_score()).abs() > 1e-9 {
            warn!(
                gene = record.gene(),
                mutation = record.mutation(),
                supplied,
                derived = record.pathogenicity_score(),
                "Supplied pathogenicity disagrees with impact tier; using derived value"
            );
        }
    }
    if let Some(supplied) = shape::field_bool(row, &["actionable"]) {
        if supplied != record.actionable() {
            warn!(
                gene = record.gene(),
                mutation = record.mutation(),
                supplied,
                "Supplied actionability disagrees with impact tier; using derived value"
            );
        }
    }

    Ok(record)
}

//! FHIR `DiagnosticReport` bundle flattening.
//!
//! Each bundle entry becomes one five-column record. Missing fields are empty
//! strings; a missing report id is logged and kept with an empty id so one bad
//! entry never drops the rest of the bundle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use oncohub_common::{OncohubError, Result};

/// Column order of the tabular export.
pub const EXPORT_HEADER: [&str; 5] = ["Report ID", "Test Name", "Date of Test", "Result", "Status"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticReportRecord {
    pub report_id: String,
    pub test_name: String,
    pub date_of_test: String,
    pub result: String,
    pub status: String,
}

impl DiagnosticReportRecord {
    pub fn from_resource(resource: &Value) -> Self {
        let record = Self {
            report_id: text(&resource["id"]),
            test_name: text(&resource["code"]["text"]),
            date_of_test: text(&resource["issued"]),
            result: result_text(&resource["result"]),
            status: text(&resource["status"]),
        };
        if record.report_id.is_empty() {
            let e = OncohubError::MalformedRecord("DiagnosticReport entry has no id".to_string());
            warn!(error = %e, test_name = %record.test_name, "Keeping report with empty id");
        }
        record
    }

    pub fn as_row(&self) -> [&str; 5] {
        [
            self.report_id.as_str(),
            self.test_name.as_str(),
            self.date_of_test.as_str(),
            self.result.as_str(),
            self.status.as_str(),
        ]
    }
}

/// Parse a search-set bundle body into records, one per `entry`.
pub fn parse_bundle(body: &str) -> Result<Vec<DiagnosticReportRecord>> {
    let bundle: Value = serde_json::from_str(body)?;
    Ok(records_from_bundle(&bundle))
}

pub fn records_from_bundle(bundle: &Value) -> Vec<DiagnosticReportRecord> {
    bundle["entry"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|entry| DiagnosticReportRecord::from_resource(&entry["resource"]))
                .collect()
        })
        .unwrap_or_default()
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// `result` is a list of references in FHIR; references (or displays) are joined with "; ".
fn result_text(v: &Value) -> String {
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) => item["reference"]
                    .as_str()
                    .or_else(|| item["display"].as_str())
                    .map(String::from),
                other => Some(text(other)).filter(|s| !s.is_empty()),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => text(&v["reference"]),
        other => text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_full_entry() {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": [{
                "resource": {
                    "resourceType": "DiagnosticReport",
                    "id": "eKFqYWCUTPL4hKjMXb9BQHA3",
                    "status": "final",
                    "code": {"text": "Molecular Pathology Report"},
                    "issued": "2023-02-14T15:20:00Z",
                    "result": [
                        {"reference": "Observation/e9tq7sMSP7X1"},
                        {"reference": "Observation/eAb8sGdk2"}
                    ]
                }
            }]
        });
        let records = records_from_bundle(&bundle);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.report_id, "eKFqYWCUTPL4hKjMXb9BQHA3");
        assert_eq!(r.test_name, "Molecular Pathology Report");
        assert_eq!(r.date_of_test, "2023-02-14T15:20:00Z");
        assert_eq!(r.result, "Observation/e9tq7sMSP7X1; Observation/eAb8sGdk2");
        assert_eq!(r.status, "final");
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let bundle = json!({"entry": [{"resource": {"status": "preliminary"}}, {}]});
        let records = records_from_bundle(&bundle);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].report_id, "");
        assert_eq!(records[0].status, "preliminary");
        assert_eq!(records[1], DiagnosticReportRecord::default());
    }

    #[test]
    fn test_bundle_without_entries() {
        assert!(records_from_bundle(&json!({"resourceType": "Bundle", "total": 0})).is_empty());
        assert!(parse_bundle(r#"{"entry": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_body() {
        assert!(matches!(parse_bundle("<html>"), Err(OncohubError::Serialization(_))));
    }

    #[test]
    fn test_result_display_fallback() {
        let r = DiagnosticReportRecord::from_resource(&json!({
            "id": "r1", "result": [{"display": "KRAS G12D detected"}]
        }));
        assert_eq!(r.result, "KRAS G12D detected");
    }
}

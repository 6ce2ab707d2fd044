//! Therapy recommendation normalisation.
//!
//! Efficacy is a rank heuristic: `clamp(start - rank * step, floor, ceiling)`.
//! Output efficacy never increases with rank, whatever the source supplied.

use serde_json::Value;
use tracing::{debug, warn};

use crate::defaults::EvidenceDefaults;
use crate::models::TherapyRecommendation;
use crate::shape::{self, Row, TherapyShape};

pub fn normalize(source: &Value, defaults: &EvidenceDefaults) -> Vec<TherapyRecommendation> {
    let therapies = match shape::classify_therapies(source) {
        TherapyShape::Structured(rows) => from_structured(&rows, defaults),
        TherapyShape::FreeText(texts) => from_free_text(&texts, defaults),
        TherapyShape::Empty => Vec::new(),
    };
    debug!(n = therapies.len(), "Therapy recommendations normalised");
    therapies
}

/// Split "Name (mechanism)" on the first `(`. The mechanism keeps its opening
/// parenthesis; text without one has an empty mechanism. Text starting with
/// `(` has an empty name.
pub fn parse_therapy_text(text: &str) -> (String, String) {
    let text = text.trim();
    match text.split_once('(') {
        Some((name, rest)) => (name.trim().to_string(), format!("({}", rest.trim())),
        None => (text.to_string(), String::new()),
    }
}

fn from_free_text(texts: &[String], defaults: &EvidenceDefaults) -> Vec<TherapyRecommendation> {
    texts
        .iter()
        .map(|t| parse_therapy_text(t))
        .filter(|(name, mechanism)| !name.is_empty() || !mechanism.is_empty())
        .enumerate()
        .map(|(rank, (name, mechanism))| TherapyRecommendation {
            name,
            mechanism,
            efficacy: defaults.rank_efficacy(rank),
        })
        .collect()
}

/// Supplied efficacy is clamped into the band and capped by the previous rank;
/// missing efficacy falls back to the rank schedule.
fn from_structured(rows: &[Row], defaults: &EvidenceDefaults) -> Vec<TherapyRecommendation> {
    let mut out: Vec<TherapyRecommendation> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let Some(name) = shape::field_str(row, &["name"]) else {
            warn!(row = i, "Skipping therapy record with no name");
            continue;
        };
        let mechanism = shape::field_str(row, &["mechanism"]).unwrap_or_default();
        let rank = out.len();
        let mut efficacy = shape::field_f64(row, &["efficacy"])
            .map(|e| defaults.clamp_efficacy(e))
            .unwrap_or_else(|| defaults.rank_efficacy(rank));
        if let Some(prev) = out.last() {
            if efficacy > prev.efficacy {
                warn!(therapy = %name, rank, efficacy, "Efficacy exceeds higher-ranked therapy; capping");
                efficacy = prev.efficacy;
            }
        }
        out.push(TherapyRecommendation { name, mechanism, efficacy });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(v: Value) -> Vec<TherapyRecommendation> {
        normalize(&v, &EvidenceDefaults::default())
    }

    #[test]
    fn test_free_text_parsing_and_ranking() {
        let out = norm(json!(["Drug A (EGFR inhibitor)", "Drug B (MEK inhibitor)", "Drug C"]));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].name, "Drug A");
        assert_eq!(out[0].mechanism, "(EGFR inhibitor)");
        assert_eq!(out[1].mechanism, "(MEK inhibitor)");
        assert_eq!(out[2].name, "Drug C");
        assert_eq!(out[2].mechanism, "");
        let eff: Vec<f64> = out.iter().map(|t| t.efficacy).collect();
        assert_eq!(eff, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn test_long_list_hits_floor() {
        let texts: Vec<String> = (0..8).map(|i| format!("Drug {}", i)).collect();
        let out = norm(json!(texts));
        assert_eq!(out.len(), 8);
        for pair in out.windows(2) {
            assert!(pair[0].efficacy >= pair[1].efficacy);
        }
        assert!(out.iter().all(|t| (0.5..=0.9).contains(&t.efficacy)));
        assert_eq!(out[7].efficacy, 0.5);
    }

    #[test]
    fn test_parse_splits_on_first_paren_only() {
        let (name, mech) = parse_therapy_text("  Osimertinib (3rd-gen (irreversible) EGFR TKI) ");
        assert_eq!(name, "Osimertinib");
        assert_eq!(mech, "(3rd-gen (irreversible) EGFR TKI)");
    }

    #[test]
    fn test_parse_with_unclosed_paren() {
        let (name, mech) = parse_therapy_text("Trametinib (MEK");
        assert_eq!(name, "Trametinib");
        assert_eq!(mech, "(MEK");
    }

    #[test]
    fn test_leading_paren_leaves_name_empty() {
        let (name, mech) = parse_therapy_text("(Immunotherapy) checkpoint");
        assert_eq!(name, "");
        assert_eq!(mech, "(Immunotherapy) checkpoint");

        let out = norm(json!(["(Immunotherapy) checkpoint", "Drug B"]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "");
        assert_eq!(out[0].mechanism, "(Immunotherapy) checkpoint");
        assert_eq!(out[0].efficacy, 0.9);
        assert_eq!(out[1].efficacy, 0.8);
    }

    #[test]
    fn test_structured_records_are_clamped_and_monotone() {
        let out = norm(json!([
            {"name": "Pembrolizumab", "mechanism": "PD-1 blockade", "efficacy": 0.97},
            {"name": "Olaparib", "mechanism": "PARP inhibition", "efficacy": 0.4},
            {"name": "Sotorasib", "mechanism": "KRAS G12C", "efficacy": 0.8},
            {"mechanism": "nameless"},
        ]));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].efficacy, 0.9);
        assert_eq!(out[1].efficacy, 0.5);
        assert_eq!(out[2].efficacy, 0.5);
    }

    #[test]
    fn test_structured_missing_efficacy_uses_rank() {
        let out = norm(json!([
            {"name": "Carfilzomib", "mechanism": "proteasome"},
            {"name": "Sacituzumab", "mechanism": "TROP-2 ADC"},
        ]));
        assert_eq!(out[0].efficacy, 0.9);
        assert_eq!(out[1].efficacy, 0.8);
    }

    #[test]
    fn test_empty_list() {
        assert!(norm(json!([])).is_empty());
        assert!(norm(json!(["   "])).is_empty());
    }
}

//! End-to-end normalisation of analyser outputs in every supported shape.

use oncohub_evidence::{EvidenceDefaults, Impact, MutationEvidenceNormalizer, ResistanceState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn normalizer() -> MutationEvidenceNormalizer {
    MutationEvidenceNormalizer::new(EvidenceDefaults::default())
}

#[test]
fn test_drivers_are_idempotent() {
    let n = normalizer();
    let first = n.normalize_drivers(&json!([
        {"gene": "KRAS", "mutation": "G12D", "AF": 0.38, "impact": "HIGH"},
        {"gene": "SMAD4", "mutation": "R361H", "impact": "moderate"},
        {"gene": "CDKN2A", "mutation": "W110*", "AF": "0.12", "impact": "LOW"},
        {"gene": "TP53", "mutation": "P72R"},
    ]));
    assert_eq!(first.len(), 4);

    let canonical: Value = serde_json::to_value(&first).unwrap();
    let second = n.normalize_drivers(&canonical);
    assert_eq!(first, second);
}

#[test]
fn test_driver_order_is_preserved() {
    let genes = ["TP53", "KRAS", "APC", "PIK3CA", "BRAF"];
    let rows: Vec<Value> = genes
        .iter()
        .map(|g| json!({"gene": g, "mutation": "X1Y", "impact": "HIGH"}))
        .collect();
    let out = normalizer().normalize_drivers(&Value::Array(rows));
    let got: Vec<&str> = out.iter().map(|r| r.gene()).collect();
    assert_eq!(got, genes.to_vec());
}

#[test]
fn test_every_driver_has_exactly_the_canonical_fields() {
    let out = normalizer().normalize_drivers(&json!([
        {"gene": "EGFR", "mutation": "exon19del", "impact": "HIGH", "QUAL": 99, "FILTER": "PASS"}
    ]));
    let v = serde_json::to_value(&out[0]).unwrap();
    let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "actionable",
            "gene",
            "impact",
            "mutation",
            "pathogenicity_score",
            "variant_allele_fraction"
        ]
    );
    assert_eq!(out[0].impact(), Impact::High);
}

#[test]
fn test_resistance_mapping_example() {
    let out = normalizer().normalize_resistance(&json!({"EGFR": ["T790M"], "BRAF": ["V600E"]}));
    assert_eq!(out.len(), 2);
    for r in &out {
        assert_eq!(r.score, 0.75);
        assert_eq!(r.therapy, format!("{} Inhibitor", r.gene));
    }
}

#[test]
fn test_therapy_example() {
    let out = normalizer().normalize_therapies(&json!([
        "Drug A (EGFR inhibitor)",
        "Drug B (MEK inhibitor)",
        "Drug C"
    ]));
    let eff: Vec<f64> = out.iter().map(|t| t.efficacy).collect();
    assert_eq!(eff, vec![0.9, 0.8, 0.7]);
    assert_eq!(out[2].mechanism, "");
}

#[test]
fn test_configured_efficacy_schedule() {
    let defaults = EvidenceDefaults {
        efficacy_start: 0.85,
        efficacy_step: 0.05,
        efficacy_floor: 0.6,
        efficacy_ceiling: 0.85,
        ..Default::default()
    };
    let out = MutationEvidenceNormalizer::new(defaults)
        .normalize_therapies(&json!(["A", "B", "C", "D", "E", "F", "G"]));
    let eff: Vec<f64> = out.iter().map(|t| t.efficacy).collect();
    assert_eq!(eff, vec![0.85, 0.8, 0.75, 0.7, 0.65, 0.6, 0.6]);
}

#[test]
fn test_vcf_analysis_without_resistance_shows_no_markers() {
    let set = normalizer().normalize_evidence(&json!({
        "drivers": {
            "gene": ["KRAS", "TP53"],
            "mutation": ["G12V", "R248W"],
            "AF": [0.44, 0.31],
            "impact": ["HIGH", "MODERATE"]
        },
        "resistance": {},
        "therapies": [],
        "statistics": {"driver_genes": 2, "total_variants": 311}
    }));
    assert!(set.detailed);
    assert_eq!(set.drivers.len(), 2);
    assert_eq!(set.resistance_state(), ResistanceState::NoMarkers);
    assert_eq!(
        set.statistics.map(|s| s.summary()).as_deref(),
        Some("Found 2 driver mutations out of 311 total variants.")
    );
}

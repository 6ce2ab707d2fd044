//! Input shape classification.
//!
//! Every evidence list is classified once into an explicit shape before any
//! normalisation runs. Tables may arrive row-oriented (`[{"gene": .., ..}, ..]`)
//! or column-oriented (`{"gene": [..], "mutation": [..]}`).

use serde_json::{Map, Value};
use tracing::warn;

pub type Row = Map<String, Value>;

/// Fields a driver row must carry to be taken as already canonical.
pub const CANONICAL_DRIVER_FIELDS: [&str; 6] = [
    "gene",
    "mutation",
    "variant_allele_fraction",
    "impact",
    "pathogenicity_score",
    "actionable",
];

pub const CANONICAL_RESISTANCE_FIELDS: [&str; 4] = ["gene", "mutation", "score", "therapy"];

#[derive(Debug, Clone, PartialEq)]
pub enum DriverShape {
    /// VCF-derived rows with `gene`, `mutation` and optionally `AF`, `impact`.
    Tabular(Vec<Row>),
    /// Records already carrying every canonical field.
    Canonical(Vec<Row>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResistanceShape {
    /// Rows with explicit `gene`, `score`, `therapy` columns.
    Tabular(Vec<Row>),
    /// Gene name to mutation identifiers, no score or therapy.
    Mapping(Vec<(String, Vec<String>)>),
    Canonical(Vec<Row>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TherapyShape {
    /// Records with `name`, `mechanism`, `efficacy`.
    Structured(Vec<Row>),
    /// Plain strings, optionally "Name (mechanism)".
    FreeText(Vec<String>),
    Empty,
}

pub fn classify_drivers(source: &Value) -> DriverShape {
    let Some(rows) = table_rows(source, "gene") else {
        return DriverShape::Empty;
    };
    if rows.is_empty() {
        DriverShape::Empty
    } else if source.is_array() && rows.iter().all(|r| has_all(r, &CANONICAL_DRIVER_FIELDS)) {
        DriverShape::Canonical(rows)
    } else {
        DriverShape::Tabular(rows)
    }
}

pub fn classify_resistance(source: &Value) -> ResistanceShape {
    match source {
        Value::Object(obj) if is_single_row(obj, "gene") => ResistanceShape::Tabular(vec![obj.clone()]),
        Value::Object(obj) if !is_column_table(obj, "gene") => {
            let mapping: Vec<(String, Vec<String>)> = obj
                .iter()
                .filter_map(|(gene, mutations)| match mutations {
                    Value::Array(items) => Some((
                        gene.clone(),
                        items.iter().filter_map(scalar_to_string).collect(),
                    )),
                    other => {
                        warn!(gene = %gene, value = %other, "Skipping resistance entry with no mutation list");
                        None
                    }
                })
                .collect();
            if mapping.is_empty() {
                ResistanceShape::Empty
            } else {
                ResistanceShape::Mapping(mapping)
            }
        }
        _ => match table_rows(source, "gene") {
            Some(rows) if rows.is_empty() => ResistanceShape::Empty,
            Some(rows) if source.is_array() && rows.iter().all(|r| has_all(r, &CANONICAL_RESISTANCE_FIELDS)) => {
                ResistanceShape::Canonical(rows)
            }
            Some(rows) => ResistanceShape::Tabular(rows),
            None => ResistanceShape::Empty,
        },
    }
}

/// Classified on the first element, the same way the analysers are told apart.
pub fn classify_therapies(source: &Value) -> TherapyShape {
    match source {
        Value::Array(items) => match items.first() {
            None => TherapyShape::Empty,
            Some(Value::Object(_)) => {
                let rows: Vec<Row> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(row) => Some(row.clone()),
                        other => {
                            warn!(value = %other, "Skipping non-record entry in structured therapy list");
                            None
                        }
                    })
                    .collect();
                TherapyShape::Structured(rows)
            }
            Some(_) => {
                let texts: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let text = scalar_to_string(item);
                        if text.is_none() {
                            warn!(value = %item, "Skipping non-text entry in therapy list");
                        }
                        text
                    })
                    .collect();
                if texts.is_empty() { TherapyShape::Empty } else { TherapyShape::FreeText(texts) }
            }
        },
        Value::Object(obj) if is_column_table(obj, "name") => match table_rows(source, "name") {
            Some(rows) if !rows.is_empty() => TherapyShape::Structured(rows),
            _ => TherapyShape::Empty,
        },
        Value::String(s) if !s.trim().is_empty() => TherapyShape::FreeText(vec![s.clone()]),
        _ => TherapyShape::Empty,
    }
}

/// Rows of a row- or column-oriented table. `None` when the value is not a table at all.
pub fn table_rows(source: &Value, key_column: &str) -> Option<Vec<Row>> {
    match source {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row.clone()),
                    other => {
                        warn!(value = %other, "Skipping non-record table row");
                        None
                    }
                })
                .collect(),
        ),
        Value::Object(obj) if is_column_table(obj, key_column) => Some(columns_to_rows(obj)),
        other => {
            warn!(kind = value_kind(other), "Evidence value is not a table");
            None
        }
    }
}

fn is_column_table(obj: &Map<String, Value>, key_column: &str) -> bool {
    matches!(obj.get(key_column), Some(Value::Array(_)))
}

/// A lone record (`{"gene": "EGFR", ..}`) rather than a gene-keyed mapping.
fn is_single_row(obj: &Map<String, Value>, key_column: &str) -> bool {
    matches!(obj.get(key_column), Some(Value::String(_)))
}

fn columns_to_rows(obj: &Map<String, Value>) -> Vec<Row> {
    let height = obj
        .values()
        .filter_map(|col| col.as_array().map(|a| a.len()))
        .max()
        .unwrap_or(0);

    (0..height)
        .map(|i| {
            obj.iter()
                .map(|(name, col)| {
                    let cell = match col {
                        Value::Array(cells) => cells.get(i).cloned().unwrap_or(Value::Null),
                        scalar => scalar.clone(),
                    };
                    (name.clone(), cell)
                })
                .collect()
        })
        .collect()
}

fn has_all(row: &Row, fields: &[&str]) -> bool {
    fields.iter().all(|f| row.get(*f).map(|v| !v.is_null()).unwrap_or(false))
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty text value among `names`. Numbers are stringified.
pub fn field_str(row: &Row, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| row.get(*n).and_then(scalar_to_string))
}

/// First finite numeric value among `names`. Numeric strings are accepted.
pub fn field_f64(row: &Row, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|n| {
        let v = match row.get(*n)? {
            Value::Number(num) => num.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        v.is_finite().then_some(v)
    })
}

pub fn field_bool(row: &Row, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|n| match row.get(*n)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

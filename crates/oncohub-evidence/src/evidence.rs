//! Whole-result normalisation: one analysis output in, one `EvidenceSet` out.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::defaults::EvidenceDefaults;
use crate::models::{EvidenceStatistics, MutationRecord, ResistanceRecord, TherapyRecommendation};
use crate::shape::{self, DriverShape};
use crate::{drivers, resistance, therapies};

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct EvidenceSet {
    pub drivers: Vec<MutationRecord>,
    pub resistance: Vec<ResistanceRecord>,
    pub therapies: Vec<TherapyRecommendation>,
    pub statistics: Option<EvidenceStatistics>,
    /// Driver evidence came from the table-producing (variant-call backed) analyser.
    pub detailed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResistanceState<'a> {
    Markers(&'a [ResistanceRecord]),
    NoMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TherapyState<'a> {
    Recommendations(&'a [TherapyRecommendation]),
    NoRecommendations,
}

impl EvidenceSet {
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.resistance.is_empty() && self.therapies.is_empty()
    }

    pub fn resistance_state(&self) -> ResistanceState<'_> {
        if self.resistance.is_empty() {
            ResistanceState::NoMarkers
        } else {
            ResistanceState::Markers(&self.resistance)
        }
    }

    pub fn therapy_state(&self) -> TherapyState<'_> {
        if self.therapies.is_empty() {
            TherapyState::NoRecommendations
        } else {
            TherapyState::Recommendations(&self.therapies)
        }
    }

    pub fn actionable_drivers(&self) -> impl Iterator<Item = &MutationRecord> {
        self.drivers.iter().filter(|d| d.actionable())
    }
}

pub fn normalize(analysis: &Value, defaults: &EvidenceDefaults) -> EvidenceSet {
    let Value::Object(obj) = analysis else {
        if !analysis.is_null() {
            warn!("Analysis output is not an object; treating as no data");
        }
        return EvidenceSet::default();
    };

    let null = Value::Null;
    let driver_source = obj.get("drivers").unwrap_or(&null);

    let statistics = obj.get("statistics").and_then(|s| {
        serde_json::from_value::<EvidenceStatistics>(s.clone())
            .map_err(|e| warn!(error = %e, "Ignoring unreadable analysis statistics"))
            .ok()
    });

    let set = EvidenceSet {
        detailed: matches!(shape::classify_drivers(driver_source), DriverShape::Tabular(_))
            && !driver_source.is_array(),
        drivers: drivers::normalize(driver_source, defaults),
        resistance: resistance::normalize(obj.get("resistance").unwrap_or(&null), defaults),
        therapies: therapies::normalize(obj.get("therapies").unwrap_or(&null), defaults),
        statistics,
    };

    info!(
        drivers = set.drivers.len(),
        resistance = set.resistance.len(),
        therapies = set.therapies.len(),
        detailed = set.detailed,
        "Evidence set normalised"
    );
    set
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The physical action a Recommendation or Decision asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Charge,
    Discharge,
    Hold,
    Export,
}

/// One specialist's proposal for this tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: ActionKind,
    pub magnitude_kwh: f64,
    pub confidence: f64,
    pub value_sek: f64,
    /// 1 = critical, 4 = lowest.
    pub priority: u8,
    pub rationale: String,
    pub is_veto: bool,
    pub requires_immediate_action: bool,
    pub source: &'static str,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Recommendation {
    #[must_use]
    pub fn hold(source: &'static str, rationale: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Hold,
            magnitude_kwh: 0.0,
            confidence: 1.0,
            value_sek: 0.0,
            priority: 4,
            rationale: rationale.into(),
            is_veto: false,
            requires_immediate_action: false,
            source,
            metadata: HashMap::new(),
        }
    }
}

/// The winning Recommendation for a tick, plus attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub recommendation: Recommendation,
    pub contributing_policies: Vec<&'static str>,
    pub rejected: Vec<(&'static str, String)>,
    pub had_conflict: bool,
    pub opportunity_cost_sek: f64,

    pub soc_after_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    pub self_consumption_kwh: f64,
}

//! Response DTOs for the clinical API
//!
//! Response bodies are also what the response cache stores, so every type
//! here round-trips through serde.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clinical::{
    BloodPressureCategory, BmiAssessment, BmiCategory, ChildAssessment, GrowthAssessment,
    HeightForAge, MuacCategory, WeightForAge, WeightForHeight,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One classified indicator with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator<C> {
    pub category: C,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl<C> Indicator<C> {
    fn new(category: C, label: &str, value: Option<f64>) -> Self {
        Self {
            category,
            label: label.to_string(),
            value: value.map(round2),
        }
    }
}

/// Response body for GET /api/clinical/child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildAssessmentResponse {
    pub weight_for_age: Indicator<WeightForAge>,
    pub height_for_age: Indicator<HeightForAge>,
    pub weight_for_height: Indicator<WeightForHeight>,
    pub needs_follow_up: bool,
}

impl From<ChildAssessment> for ChildAssessmentResponse {
    fn from(a: ChildAssessment) -> Self {
        fn z<C: Copy>(g: GrowthAssessment<C>, label: &str) -> Indicator<C> {
            Indicator::new(g.category, label, Some(g.z_score))
        }

        Self {
            weight_for_age: z(a.weight_for_age, a.weight_for_age.category.label()),
            height_for_age: z(a.height_for_age, a.height_for_age.category.label()),
            weight_for_height: z(a.weight_for_height, a.weight_for_height.category.label()),
            needs_follow_up: a.needs_follow_up(),
        }
    }
}

/// Response body for GET /api/clinical/adult
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdultAssessmentResponse {
    pub bmi: Indicator<BmiCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<Indicator<BloodPressureCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muac: Option<Indicator<MuacCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_obesity: Option<bool>,
}

impl AdultAssessmentResponse {
    pub fn new(
        bmi: BmiAssessment,
        blood_pressure: Option<BloodPressureCategory>,
        muac: Option<(MuacCategory, f64)>,
        central_obesity: Option<bool>,
    ) -> Self {
        Self {
            bmi: Indicator::new(bmi.category, bmi.category.label(), Some(bmi.value)),
            blood_pressure: blood_pressure.map(|c| Indicator::new(c, c.label(), None)),
            muac: muac.map(|(c, cm)| Indicator::new(c, c.label(), Some(cm))),
            central_obesity,
        }
    }
}

/// Response body for GET /api/clinical/age
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeResponse {
    pub birth_date: NaiveDate,
    pub today: NaiveDate,
    pub months: u32,
    pub years: u32,
}

/// Response body for POST /api/cache/:namespace/bump
#[derive(Debug, Clone, Serialize)]
pub struct BumpResponse {
    pub namespace: String,
    /// New version, absent when no store is configured
    pub version: Option<i64>,
    pub message: String,
}

impl BumpResponse {
    pub fn new(namespace: impl Into<String>, version: Option<i64>) -> Self {
        let namespace = namespace.into();
        let message = match version {
            Some(v) => format!("Namespace '{}' now at version {}", namespace, v),
            None => format!("Namespace '{}' not cached; nothing to invalidate", namespace),
        };
        Self {
            namespace,
            version,
            message,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// "connected" or "disabled"
    pub store: String,
    pub rate_limit_enabled: bool,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(store_connected: bool, rate_limit_enabled: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            store: if store_connected { "connected" } else { "disabled" }.to_string(),
            rate_limit_enabled,
        }
    }
}

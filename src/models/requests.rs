//! Request DTOs for the clinical API
//!
//! Query-string parameters of each endpoint, with validation and the
//! canonical cache key derived from them.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::clinical::{ChildMeasurement, Gender};

/// Maximum length of a cache namespace accepted over HTTP.
const MAX_NAMESPACE_LENGTH: usize = 64;

fn check_positive(name: &str, value: f64) -> Option<String> {
    if !value.is_finite() || value <= 0.0 {
        Some(format!("{} must be a positive number", name))
    } else {
        None
    }
}

/// Query for GET /api/clinical/child
#[derive(Debug, Clone, Deserialize)]
pub struct ChildQuery {
    pub weight_kg: f64,
    pub height_cm: f64,
    /// Age in months; negative values are treated as zero
    pub age_months: f64,
    pub gender: Gender,
}

impl ChildQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !self.age_months.is_finite() {
            return Some("age_months must be a number".to_string());
        }
        check_positive("weight_kg", self.weight_kg)
            .or_else(|| check_positive("height_cm", self.height_cm))
    }

    pub fn cache_key(&self) -> String {
        format!(
            "child:w={}&h={}&a={}&g={}",
            self.weight_kg,
            self.height_cm,
            self.age_months,
            self.gender.as_str()
        )
    }

    pub fn measurement(&self) -> ChildMeasurement {
        ChildMeasurement {
            age_months: self.age_months,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            gender: self.gender,
        }
    }
}

/// Query for GET /api/clinical/adult
#[derive(Debug, Clone, Deserialize)]
pub struct AdultQuery {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: Gender,
    #[serde(default)]
    pub systolic: Option<u32>,
    #[serde(default)]
    pub diastolic: Option<u32>,
    /// Mid-upper-arm circumference (LILA) in cm
    #[serde(default)]
    pub muac_cm: Option<f64>,
    #[serde(default)]
    pub waist_cm: Option<f64>,
}

impl AdultQuery {
    pub fn validate(&self) -> Option<String> {
        if let Some(err) = check_positive("weight_kg", self.weight_kg)
            .or_else(|| check_positive("height_cm", self.height_cm))
        {
            return Some(err);
        }
        if self.systolic.is_some() != self.diastolic.is_some() {
            return Some("systolic and diastolic must be given together".to_string());
        }
        self.muac_cm
            .and_then(|v| check_positive("muac_cm", v))
            .or_else(|| self.waist_cm.and_then(|v| check_positive("waist_cm", v)))
    }

    pub fn cache_key(&self) -> String {
        fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        format!(
            "adult:w={}&h={}&g={}&sys={}&dia={}&muac={}&waist={}",
            self.weight_kg,
            self.height_cm,
            self.gender.as_str(),
            opt(self.systolic),
            opt(self.diastolic),
            opt(self.muac_cm),
            opt(self.waist_cm)
        )
    }
}

/// Query for GET /api/clinical/pregnancy
#[derive(Debug, Clone, Deserialize)]
pub struct PregnancyQuery {
    /// First day of the last menstrual period
    pub lmp: NaiveDate,
    /// Reference day, defaults to the server's current date
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Query for GET /api/clinical/age
#[derive(Debug, Clone, Deserialize)]
pub struct AgeQuery {
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Validates a cache namespace taken from the request path.
pub fn validate_namespace(namespace: &str) -> Option<String> {
    if namespace.is_empty() || namespace.len() > MAX_NAMESPACE_LENGTH {
        return Some(format!(
            "Namespace must be 1 to {} characters",
            MAX_NAMESPACE_LENGTH
        ));
    }
    if !namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some("Namespace may only contain letters, digits, '-' and '_'".to_string());
    }
    None
}

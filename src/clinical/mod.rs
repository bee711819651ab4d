//! Clinical Metric Module
//!
//! Pure functions over clinical measurements: ages, simplified growth
//! z-scores, body-mass index, arm and waist circumference risk, blood
//! pressure and pregnancy dating.
//!
//! The growth z-scores are simplified linear approximations, not the WHO
//! Child Growth Standards lookup tables. They are suitable for screening
//! dashboards only, and their formulas must stay as they are: swapping in
//! the full tables would change every reported category.

mod age;
mod growth;
mod pregnancy;
mod vitals;

use serde::{Deserialize, Serialize};

pub use age::{age_in_months, age_in_years};
pub use growth::{
    height_for_age, weight_for_age, weight_for_height, GrowthAssessment, HeightForAge,
    WeightForAge, WeightForHeight,
};
pub use pregnancy::{
    estimated_delivery_date, gestational_age_weeks, summarize_pregnancy, trimester,
    PregnancySummary,
};
pub use vitals::{
    body_mass_index, classify_blood_pressure, classify_bmi, muac_risk, waist_circumference_risk,
    BloodPressureCategory, BmiAssessment, BmiCategory, MuacCategory,
};

// == Gender ==
/// Sex used to pick reference constants.
///
/// Also accepts the `L` (laki-laki) and `P` (perempuan) codes used on
/// health post registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "L", alias = "l", alias = "M")]
    Male,
    #[serde(alias = "P", alias = "p", alias = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

// == Child Assessment ==
/// A single anthropometric measurement of a child.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChildMeasurement {
    pub age_months: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: Gender,
}

/// The three growth indicators for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChildAssessment {
    pub weight_for_age: GrowthAssessment<WeightForAge>,
    pub height_for_age: GrowthAssessment<HeightForAge>,
    pub weight_for_height: GrowthAssessment<WeightForHeight>,
}

impl ChildAssessment {
    /// Whether any indicator falls outside its normal band.
    pub fn needs_follow_up(&self) -> bool {
        self.weight_for_age.category != WeightForAge::Normal
            || self.height_for_age.category != HeightForAge::Normal
            || self.weight_for_height.category != WeightForHeight::Normal
    }
}

/// Computes weight-for-age, height-for-age and weight-for-height together.
pub fn assess_child(m: &ChildMeasurement) -> ChildAssessment {
    ChildAssessment {
        weight_for_age: weight_for_age(m.weight_kg, m.age_months, m.gender),
        height_for_age: height_for_age(m.height_cm, m.age_months, m.gender),
        weight_for_height: weight_for_height(m.weight_kg, m.height_cm, m.gender),
    }
}

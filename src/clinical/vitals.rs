//! Adult screening metrics: BMI, arm and waist circumference, blood pressure.

use serde::{Deserialize, Serialize};

use super::Gender;

/// Mid-upper-arm circumference below which chronic energy deficiency is
/// suspected, for either sex.
const MUAC_THRESHOLD_CM: f64 = 23.5;

// == Body Mass Index ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Underweight => "Kurus",
            Self::Normal => "Normal",
            Self::Overweight => "Gemuk",
            Self::Obese => "Obesitas",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiAssessment {
    pub value: f64,
    pub category: BmiCategory,
}

pub fn classify_bmi(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// BMI from weight in kilograms and height in centimetres.
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> BmiAssessment {
    let height_m = height_cm / 100.0;
    let value = weight_kg / (height_m * height_m);
    BmiAssessment {
        value,
        category: classify_bmi(value),
    }
}

// == Arm Circumference ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MuacCategory {
    Normal,
    ChronicEnergyDeficiencyRisk,
}

impl MuacCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::ChronicEnergyDeficiencyRisk => "Risiko KEK",
        }
    }
}

/// Mid-upper-arm circumference (LILA) screening.
///
/// The threshold is the same for both sexes; `gender` is accepted so callers
/// can pass a measurement record through unchanged.
pub fn muac_risk(circumference_cm: f64, _gender: Gender) -> MuacCategory {
    if circumference_cm < MUAC_THRESHOLD_CM {
        MuacCategory::ChronicEnergyDeficiencyRisk
    } else {
        MuacCategory::Normal
    }
}

// == Waist Circumference ==
/// Central obesity flag: waist above 90 cm for men, 80 cm for women.
pub fn waist_circumference_risk(circumference_cm: f64, gender: Gender) -> bool {
    let threshold = match gender {
        Gender::Male => 90.0,
        Gender::Female => 80.0,
    };
    circumference_cm > threshold
}

// == Blood Pressure ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodPressureCategory {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "pre-hypertension")]
    PreHypertension,
    #[serde(rename = "stage-1")]
    Stage1,
    #[serde(rename = "stage-2")]
    Stage2,
}

impl BloodPressureCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::PreHypertension => "Pra-hipertensi",
            Self::Stage1 => "Hipertensi derajat 1",
            Self::Stage2 => "Hipertensi derajat 2",
        }
    }
}

/// Classifies a reading in mmHg; the worse of the two pressures decides.
pub fn classify_blood_pressure(systolic: u32, diastolic: u32) -> BloodPressureCategory {
    if systolic >= 160 || diastolic >= 100 {
        BloodPressureCategory::Stage2
    } else if systolic >= 140 || diastolic >= 90 {
        BloodPressureCategory::Stage1
    } else if systolic >= 120 || diastolic >= 80 {
        BloodPressureCategory::PreHypertension
    } else {
        BloodPressureCategory::Normal
    }
}

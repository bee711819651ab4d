//! Simplified anthropometric z-scores.
//!
//! Medians come from a linear model in age (or a constant weight/height
//! ratio), and the standard deviation is a fixed share of the median. This is
//! a screening approximation, not the WHO reference tables.

use serde::{Deserialize, Serialize};

use super::Gender;

// == Reference Model ==
/// Linear median: `base + age_months * monthly_gain`.
struct LinearMedian {
    base: f64,
    monthly_gain: f64,
}

impl LinearMedian {
    fn at(&self, age_months: f64) -> f64 {
        self.base + age_months.max(0.0) * self.monthly_gain
    }
}

fn weight_median(gender: Gender) -> LinearMedian {
    match gender {
        Gender::Male => LinearMedian {
            base: 3.3,
            monthly_gain: 0.25,
        },
        Gender::Female => LinearMedian {
            base: 3.2,
            monthly_gain: 0.24,
        },
    }
}

fn height_median(gender: Gender) -> LinearMedian {
    match gender {
        Gender::Male => LinearMedian {
            base: 49.9,
            monthly_gain: 1.0,
        },
        Gender::Female => LinearMedian {
            base: 49.1,
            monthly_gain: 1.0,
        },
    }
}

/// Expected weight (kg) per metre of height.
fn expected_weight_per_metre(gender: Gender) -> f64 {
    match gender {
        Gender::Male => 14.0,
        Gender::Female => 13.6,
    }
}

const WEIGHT_SD_FRACTION: f64 = 0.12;
const HEIGHT_SD_FRACTION: f64 = 0.04;
const RATIO_SD_FRACTION: f64 = 0.15;

fn z_score(value: f64, median: f64, sd_fraction: f64) -> f64 {
    (value - median) / (median * sd_fraction)
}

// == Categories ==
/// Weight-for-age (underweight) category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightForAge {
    SeverelyLow,
    Low,
    Normal,
}

impl WeightForAge {
    fn from_z(z: f64) -> Self {
        if z < -3.0 {
            Self::SeverelyLow
        } else if z < -2.0 {
            Self::Low
        } else {
            Self::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SeverelyLow => "Berat badan sangat kurang",
            Self::Low => "Berat badan kurang",
            Self::Normal => "Berat badan normal",
        }
    }
}

/// Height-for-age (stunting) category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeightForAge {
    StuntingSevere,
    Stunting,
    Normal,
}

impl HeightForAge {
    fn from_z(z: f64) -> Self {
        if z < -3.0 {
            Self::StuntingSevere
        } else if z < -2.0 {
            Self::Stunting
        } else {
            Self::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StuntingSevere => "Sangat pendek",
            Self::Stunting => "Pendek",
            Self::Normal => "Normal",
        }
    }
}

/// Weight-for-height (wasting) category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightForHeight {
    WastingSevere,
    Wasting,
    Normal,
    Overweight,
}

impl WeightForHeight {
    fn from_z(z: f64) -> Self {
        if z < -3.0 {
            Self::WastingSevere
        } else if z < -2.0 {
            Self::Wasting
        } else if z > 2.0 {
            Self::Overweight
        } else {
            Self::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WastingSevere => "Gizi buruk",
            Self::Wasting => "Gizi kurang",
            Self::Normal => "Gizi baik",
            Self::Overweight => "Gizi lebih",
        }
    }
}

/// A z-score with the category it falls into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssessment<C> {
    pub z_score: f64,
    pub category: C,
}

// == Indicators ==
/// Weight-for-age z-score; negative ages are treated as zero.
pub fn weight_for_age(
    weight_kg: f64,
    age_months: f64,
    gender: Gender,
) -> GrowthAssessment<WeightForAge> {
    let median = weight_median(gender).at(age_months);
    let z = z_score(weight_kg, median, WEIGHT_SD_FRACTION);
    GrowthAssessment {
        z_score: z,
        category: WeightForAge::from_z(z),
    }
}

/// Height-for-age z-score; negative ages are treated as zero.
pub fn height_for_age(
    height_cm: f64,
    age_months: f64,
    gender: Gender,
) -> GrowthAssessment<HeightForAge> {
    let median = height_median(gender).at(age_months);
    let z = z_score(height_cm, median, HEIGHT_SD_FRACTION);
    GrowthAssessment {
        z_score: z,
        category: HeightForAge::from_z(z),
    }
}

/// Weight-for-height z-score from the weight per metre of height.
pub fn weight_for_height(
    weight_kg: f64,
    height_cm: f64,
    gender: Gender,
) -> GrowthAssessment<WeightForHeight> {
    let ratio = weight_kg / (height_cm / 100.0);
    let z = z_score(ratio, expected_weight_per_metre(gender), RATIO_SD_FRACTION);
    GrowthAssessment {
        z_score: z,
        category: WeightForHeight::from_z(z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_weight_for_age_thresholds() {
        // Male, 20 months: median 8.3 kg, sd 0.996 kg.
        let median = 8.3;
        let sd = median * 0.12;

        let normal = weight_for_age(median - 1.9 * sd, 20.0, Gender::Male);
        assert!((normal.z_score + 1.9).abs() < 1e-6);
        assert_eq!(normal.category, WeightForAge::Normal);

        let low = weight_for_age(median - 2.5 * sd, 20.0, Gender::Male);
        assert_eq!(low.category, WeightForAge::Low);

        let severe = weight_for_age(median - 3.1 * sd, 20.0, Gender::Male);
        assert_eq!(severe.category, WeightForAge::SeverelyLow);
    }

    #[test]
    fn test_boundaries_belong_to_milder_band() {
        assert_eq!(WeightForAge::from_z(-3.0), WeightForAge::Low);
        assert_eq!(WeightForAge::from_z(-2.0), WeightForAge::Normal);
        assert_eq!(HeightForAge::from_z(-3.0), HeightForAge::Stunting);
        assert_eq!(WeightForHeight::from_z(2.0), WeightForHeight::Normal);
    }

    #[test]
    fn test_female_medians_differ() {
        let boy = weight_for_age(8.0, 20.0, Gender::Male);
        let girl = weight_for_age(8.0, 20.0, Gender::Female);
        assert!(girl.z_score > boy.z_score);
    }

    #[test]
    fn test_negative_age_clamped_to_birth() {
        let at_birth = height_for_age(49.9, 0.0, Gender::Male);
        let negative = height_for_age(49.9, -4.0, Gender::Male);
        assert_eq!(at_birth, negative);
        assert!(at_birth.z_score.abs() < EPS);
    }

    #[test]
    fn test_height_for_age_uses_four_percent_sd() {
        // Female, 10 months: median 59.1 cm, sd 2.364 cm.
        let result = height_for_age(59.1 - 2.364, 10.0, Gender::Female);
        assert!((result.z_score + 1.0).abs() < 1e-6);
        assert_eq!(result.category, HeightForAge::Normal);
    }

    #[test]
    fn test_weight_for_height_bands() {
        // Male expected ratio 14.0 kg/m, sd 2.1.
        let normal = weight_for_height(11.2, 80.0, Gender::Male);
        assert!(normal.z_score.abs() < EPS);
        assert_eq!(normal.category, WeightForHeight::Normal);

        // ratio 8.5 → z ≈ -2.62
        assert_eq!(
            weight_for_height(6.8, 80.0, Gender::Male).category,
            WeightForHeight::Wasting
        );
        // ratio 7.0 → z ≈ -3.33
        assert_eq!(
            weight_for_height(5.6, 80.0, Gender::Male).category,
            WeightForHeight::WastingSevere
        );
        // ratio 18.75 → z ≈ 2.26
        assert_eq!(
            weight_for_height(15.0, 80.0, Gender::Male).category,
            WeightForHeight::Overweight
        );
    }

    #[test]
    fn test_negative_weight_is_extreme_not_error() {
        let result = weight_for_age(-5.0, 12.0, Gender::Female);
        assert!(result.z_score < -10.0);
        assert_eq!(result.category, WeightForAge::SeverelyLow);
    }

    #[test]
    fn test_category_codes_and_labels() {
        assert_eq!(
            serde_json::to_string(&WeightForAge::SeverelyLow).unwrap(),
            r#""severely-low""#
        );
        assert_eq!(
            serde_json::to_string(&HeightForAge::StuntingSevere).unwrap(),
            r#""stunting-severe""#
        );
        assert_eq!(
            serde_json::to_string(&WeightForHeight::WastingSevere).unwrap(),
            r#""wasting-severe""#
        );
        assert_eq!(WeightForHeight::Overweight.label(), "Gizi lebih");
    }
}

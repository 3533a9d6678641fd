// ⚖️ Wilks Score - Bodyweight-normalised strength index
// Coefficient = 500 / P(bw), where P is a sex-specific quintic polynomial in
// bodyweight (kg). Score = coefficient × total (kg).

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::records::Sex;
use crate::units::{Weight, WeightUnit};

/// Polynomial coefficients, constant term first.
mod coefficients {
    pub const MALE: [f64; 6] = [
        -216.0475144,
        16.2606339,
        -0.002388645,
        -0.00113732,
        7.01863e-6,
        -1.291e-8,
    ];

    pub const FEMALE: [f64; 6] = [
        594.31747775582,
        -27.23842536447,
        0.82112226871,
        -0.00930733913,
        4.731582e-5,
        -9.054e-8,
    ];
}

fn coefficients_for(sex: &str) -> AnalysisResult<&'static [f64; 6]> {
    match sex.trim().to_lowercase().as_str() {
        "m" => Ok(&coefficients::MALE),
        "f" => Ok(&coefficients::FEMALE),
        other => Err(AnalysisError::invalid(format!(
            "sex must be 'm' or 'f' for Wilks, got '{}'",
            other
        ))),
    }
}

/// Computes the Wilks score.
///
/// # Arguments
/// * `sex` - "m" or "f", case-insensitive
/// * `bodyweight` - Lifter bodyweight, must be positive
/// * `total` - Sum of best squat, bench and deadlift, must not be negative
/// * `lbs` - When true both weights are pounds and are converted (÷ 2.2) first
pub fn wilks_score(sex: &str, bodyweight: f64, total: f64, lbs: bool) -> AnalysisResult<f64> {
    let unit = WeightUnit::from_lbs_flag(lbs);
    wilks_for_weights(sex, Weight::new(bodyweight, unit), Weight::new(total, unit))
}

/// Unit-tagged variant of [`wilks_score`].
pub fn wilks_for_weights(sex: &str, bodyweight: Weight, total: Weight) -> AnalysisResult<f64> {
    let coeffs = coefficients_for(sex)?;

    let bw = bodyweight.to_kg();
    let total = total.to_kg();

    if !bw.is_finite() || bw <= 0.0 {
        return Err(AnalysisError::invalid(format!(
            "bodyweight must be positive, got {}",
            bw
        )));
    }
    if !total.is_finite() || total < 0.0 {
        return Err(AnalysisError::invalid(format!(
            "total must not be negative, got {}",
            total
        )));
    }

    // Horner evaluation of the quintic
    let denominator = coeffs.iter().rev().fold(0.0, |acc, c| acc * bw + c);

    if denominator <= 0.0 {
        return Err(AnalysisError::invalid(format!(
            "bodyweight {} kg is outside the Wilks formula's domain",
            bw
        )));
    }

    Ok(500.0 / denominator * total)
}

/// Wilks score for a typed sex. Mx has no coefficient set.
pub fn wilks_for_sex(sex: Sex, bodyweight: Weight, total: Weight) -> AnalysisResult<f64> {
    match sex {
        Sex::M => wilks_for_weights("m", bodyweight, total),
        Sex::F => wilks_for_weights("f", bodyweight, total),
        Sex::Mx => Err(AnalysisError::invalid(
            "Wilks coefficients exist only for M and F lifters",
        )),
    }
}

// ============================================================================
// TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Beginner,
    Intermediate,
    Advanced,
    Elite,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Beginner => "Beginner",
            Tier::Intermediate => "Intermediate",
            Tier::Advanced => "Advanced",
            Tier::Elite => "Elite",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Maps a Wilks score to its tier. NaN is unclassified (None), not an error.
pub fn classify(score: f64) -> Option<Tier> {
    if score.is_nan() {
        return None;
    }

    Some(if score < 300.0 {
        Tier::Beginner
    } else if score < 400.0 {
        Tier::Intermediate
    } else if score < 500.0 {
        Tier::Advanced
    } else {
        Tier::Elite
    })
}

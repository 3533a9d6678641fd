// ⚖️ Units - Unit-tagged weights
// Everything inside the core is kilograms; pounds are converted once at the boundary.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AnalysisError;

/// Pounds per kilogram, as used by the source dataset tooling.
pub const LB_PER_KG: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    /// Unit selected by the legacy "inputs are in pounds" flag
    pub fn from_lbs_flag(lbs: bool) -> Self {
        if lbs {
            WeightUnit::Lb
        } else {
            WeightUnit::Kg
        }
    }
}

impl FromStr for WeightUnit {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pounds" => Ok(WeightUnit::Lb),
            other => Err(AnalysisError::invalid(format!(
                "unknown weight unit '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightUnit::Kg => write!(f, "kg"),
            WeightUnit::Lb => write!(f, "lb"),
        }
    }
}

/// A weight together with the unit it was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: f64,
    pub unit: WeightUnit,
}

impl Weight {
    pub fn new(value: f64, unit: WeightUnit) -> Self {
        Weight { value, unit }
    }

    pub fn kg(value: f64) -> Self {
        Weight::new(value, WeightUnit::Kg)
    }

    pub fn lb(value: f64) -> Self {
        Weight::new(value, WeightUnit::Lb)
    }

    /// Canonical kilogram value
    pub fn to_kg(&self) -> f64 {
        match self.unit {
            WeightUnit::Kg => self.value,
            WeightUnit::Lb => self.value / LB_PER_KG,
        }
    }

    pub fn to_lb(&self) -> f64 {
        match self.unit {
            WeightUnit::Kg => self.value * LB_PER_KG,
            WeightUnit::Lb => self.value,
        }
    }

    /// Same weight expressed in `unit`
    pub fn convert(&self, unit: WeightUnit) -> Weight {
        match unit {
            WeightUnit::Kg => Weight::kg(self.to_kg()),
            WeightUnit::Lb => Weight::lb(self.to_lb()),
        }
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} {}", self.value, self.unit)
    }
}

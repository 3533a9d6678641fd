// 🏋️ Records - Competition rows as loaded from the bulk CSV
// RawRecord mirrors the CSV header; CompetitionRecord is the typed row the core works on.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

use crate::error::AnalysisError;

// ============================================================================
// RAW RECORD (CSV ROW)
// ============================================================================

/// One row of the OpenPowerlifting bulk CSV.
/// Columns the analysis does not use are ignored; numeric cells may be empty.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Sex", default)]
    pub sex: Option<String>,

    #[serde(rename = "Event", default)]
    pub event: Option<String>,

    #[serde(rename = "Equipment", default)]
    pub equipment: Option<String>,

    #[serde(rename = "Age", default)]
    pub age: Option<f64>,

    #[serde(rename = "AgeClass", default)]
    pub age_class: Option<String>,

    #[serde(rename = "BirthYearClass", default)]
    pub birth_year_class: Option<String>,

    #[serde(rename = "Division", default)]
    pub division: Option<String>,

    #[serde(rename = "BodyweightKg", default)]
    pub bodyweight_kg: Option<f64>,

    #[serde(rename = "WeightClassKg", default)]
    pub weight_class_kg: Option<String>,

    #[serde(rename = "Best3SquatKg", default)]
    pub best3_squat_kg: Option<f64>,

    #[serde(rename = "Best3BenchKg", default)]
    pub best3_bench_kg: Option<f64>,

    #[serde(rename = "Best3DeadliftKg", default)]
    pub best3_deadlift_kg: Option<f64>,

    #[serde(rename = "TotalKg", default)]
    pub total_kg: Option<f64>,

    #[serde(rename = "Place", default)]
    pub place: Option<String>,

    #[serde(rename = "Wilks", default)]
    pub wilks: Option<f64>,

    #[serde(rename = "Tested", default)]
    pub tested: Option<String>,

    #[serde(rename = "Country", default)]
    pub country: Option<String>,

    #[serde(rename = "Federation", default)]
    pub federation: Option<String>,

    #[serde(rename = "Date", default)]
    pub date: Option<String>,

    #[serde(rename = "MeetName", default)]
    pub meet_name: Option<String>,
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut records = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        // +2: header row and 1-based numbering
        let record: RawRecord = result
            .with_context(|| format!("Failed to deserialize competition row {}", line + 2))?;
        records.push(record);
    }

    log::info!(
        "Loaded {} competition rows from {}",
        records.len(),
        csv_path.display()
    );

    Ok(records)
}

// ============================================================================
// CATEGORICAL FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    Mx,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
            Sex::Mx => "Mx",
        }
    }
}

impl FromStr for Sex {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Sex::M),
            "f" | "female" => Ok(Sex::F),
            "mx" => Ok(Sex::Mx),
            other => Err(AnalysisError::invalid(format!("unknown sex code '{}'", other))),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Drug-testing status of the competition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tested {
    Yes,
    #[serde(rename = "Not Known")]
    NotKnown,
}

impl Tested {
    /// Only an explicit "Yes" counts as tested
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some("Yes") => Tested::Yes,
            _ => Tested::NotKnown,
        }
    }
}

/// Finishing place at a meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Place {
    Rank(u32),
    Disqualified,
    /// Guest lifters, no-shows and other non-numeric markers
    Other(String),
}

impl Place {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(rank) = raw.parse::<u32>() {
            return Place::Rank(rank);
        }
        match raw.to_uppercase().as_str() {
            "DQ" | "DD" => Place::Disqualified,
            _ => Place::Other(raw.to_string()),
        }
    }

    pub fn rank(&self) -> Option<u32> {
        match self {
            Place::Rank(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_disqualified(&self) -> bool {
        matches!(self, Place::Disqualified)
    }
}

impl From<String> for Place {
    fn from(raw: String) -> Self {
        Place::parse(&raw)
    }
}

impl From<Place> for String {
    fn from(place: Place) -> Self {
        match place {
            Place::Rank(r) => r.to_string(),
            Place::Disqualified => "DQ".to_string(),
            Place::Other(s) => s,
        }
    }
}

/// Federation weight class. A trailing "+" marks the open-ended top class,
/// which is kept distinct from the bounded class sharing its number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightClass {
    pub limit: String,
    pub open_ended: bool,
}

impl WeightClass {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (limit, open_ended) = match raw.strip_suffix('+') {
            Some(limit) => (limit.trim(), true),
            None => (raw, false),
        };

        if limit.is_empty() {
            return None;
        }

        Some(WeightClass {
            limit: limit.to_string(),
            open_ended,
        })
    }

    pub fn label(&self) -> String {
        if self.open_ended {
            format!("{}+", self.limit)
        } else {
            self.limit.clone()
        }
    }
}

impl std::fmt::Display for WeightClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// COMPETITION RECORD
// ============================================================================

/// A cleaned competition entry. Never mutated after cleaning;
/// derived columns live in the structures that wrap it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionRecord {
    pub name: String,
    pub sex: Sex,
    pub event: String,
    pub equipment: Option<String>,
    pub age: Option<f64>,
    pub age_class: String,
    pub weight_class: WeightClass,
    pub bodyweight_kg: Option<f64>,
    pub best3_squat_kg: Option<f64>,
    pub best3_bench_kg: Option<f64>,
    pub best3_deadlift_kg: Option<f64>,
    pub total_kg: Option<f64>,
    pub wilks: Option<f64>,
    pub place: Place,
    pub tested: Tested,
    pub country: Option<String>,
    pub federation: String,
    pub meet_name: String,
    pub date: NaiveDate,
}

impl CompetitionRecord {
    /// Fingerprint of the competition entry (who, where, when, which event).
    /// Identical for the same entry listed under several divisions.
    pub fn entry_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}",
            self.name, self.date, self.meet_name, self.federation, self.event
        ));
        format!("{:x}", hasher.finalize())
    }

    /// Squat + bench + deadlift of this entry; missing lifts count as zero
    /// unless all three are missing.
    pub fn lift_sum(&self) -> Option<f64> {
        let lifts = [self.best3_squat_kg, self.best3_bench_kg, self.best3_deadlift_kg];
        if lifts.iter().all(Option::is_none) {
            return None;
        }
        Some(lifts.iter().map(|l| l.unwrap_or(0.0)).sum())
    }
}

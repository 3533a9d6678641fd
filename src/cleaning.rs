// 🧹 Cleaning - Business rules that turn raw CSV rows into the analysis table
// Every dropped row is counted so the caller can see what the rules removed.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AnalysisError, AnalysisResult};
use crate::records::{CompetitionRecord, Place, RawRecord, Sex, Tested, WeightClass};

// ============================================================================
// RULE SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessRules {
    /// Meets before this year are ignored
    pub min_year: i32,

    /// Lifters younger than this (or without an age) are ignored
    pub min_age: f64,

    /// Keep only lifters from this country (None = all countries)
    pub country: Option<String>,
}

impl Default for BusinessRules {
    fn default() -> Self {
        BusinessRules {
            min_year: 2013,
            min_age: 13.0,
            country: None,
        }
    }
}

// ============================================================================
// CLEANING SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub dropped_disqualified: usize,
    pub dropped_country: usize,
    pub dropped_bad_date: usize,
    pub dropped_before_min_year: usize,
    pub dropped_no_weight_class: usize,
    pub dropped_age: usize,
    pub dropped_unknown_sex: usize,
    pub age_class_filled: usize,
}

impl CleaningSummary {
    pub fn dropped_rows(&self) -> usize {
        self.input_rows - self.kept_rows
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows in, {} kept | dropped: {} DQ, {} country, {} bad date, {} before cutoff, {} no class, {} age, {} sex | {} age classes filled",
            self.input_rows,
            self.kept_rows,
            self.dropped_disqualified,
            self.dropped_country,
            self.dropped_bad_date,
            self.dropped_before_min_year,
            self.dropped_no_weight_class,
            self.dropped_age,
            self.dropped_unknown_sex,
            self.age_class_filled
        )
    }
}

#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub records: Vec<CompetitionRecord>,
    pub summary: CleaningSummary,
}

// ============================================================================
// CLEANING
// ============================================================================

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse the CSV date column (YYYY-MM-DD)
pub fn parse_meet_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Apply the business rules to raw rows.
///
/// A row that survives every filter but still has neither an age class nor a
/// birth-year class fails the whole batch: the table downstream assumes every
/// row can be bucketed by age.
pub fn apply_business_rules(
    raw: &[RawRecord],
    rules: &BusinessRules,
) -> AnalysisResult<CleanedDataset> {
    let mut summary = CleaningSummary {
        input_rows: raw.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(raw.len());

    for (index, row) in raw.iter().enumerate() {
        let place = non_empty(&row.place)
            .map(Place::parse)
            .unwrap_or_else(|| Place::Other(String::new()));
        if place.is_disqualified() {
            summary.dropped_disqualified += 1;
            continue;
        }

        if let Some(country) = &rules.country {
            if non_empty(&row.country) != Some(country.as_str()) {
                summary.dropped_country += 1;
                continue;
            }
        }

        let date = match non_empty(&row.date).and_then(parse_meet_date) {
            Some(date) => date,
            None => {
                summary.dropped_bad_date += 1;
                continue;
            }
        };
        if date.year() < rules.min_year {
            summary.dropped_before_min_year += 1;
            continue;
        }

        let weight_class = match non_empty(&row.weight_class_kg).and_then(WeightClass::parse) {
            Some(class) => class,
            None => {
                summary.dropped_no_weight_class += 1;
                continue;
            }
        };

        let tested = Tested::from_flag(row.tested.as_deref());

        let age = match row.age {
            Some(age) if age.is_finite() && age >= rules.min_age => age,
            _ => {
                summary.dropped_age += 1;
                continue;
            }
        };

        let age_class = match (non_empty(&row.age_class), non_empty(&row.birth_year_class)) {
            (Some(class), _) => class.to_string(),
            (None, Some(birth_class)) => {
                summary.age_class_filled += 1;
                birth_class.to_string()
            }
            (None, None) => {
                return Err(AnalysisError::precondition(format!(
                    "row {} ({}) has an age but neither AgeClass nor BirthYearClass",
                    index, row.name
                )));
            }
        };

        let sex = match non_empty(&row.sex).map(Sex::from_str) {
            Some(Ok(sex)) => sex,
            _ => {
                summary.dropped_unknown_sex += 1;
                continue;
            }
        };

        records.push(CompetitionRecord {
            name: row.name.trim().to_string(),
            sex,
            event: non_empty(&row.event).unwrap_or_default().to_string(),
            equipment: non_empty(&row.equipment).map(str::to_string),
            age: Some(age),
            age_class,
            weight_class,
            bodyweight_kg: row.bodyweight_kg,
            best3_squat_kg: row.best3_squat_kg,
            best3_bench_kg: row.best3_bench_kg,
            best3_deadlift_kg: row.best3_deadlift_kg,
            total_kg: row.total_kg,
            wilks: row.wilks,
            place,
            tested,
            country: non_empty(&row.country).map(str::to_string),
            federation: non_empty(&row.federation).unwrap_or_default().to_string(),
            meet_name: non_empty(&row.meet_name).unwrap_or_default().to_string(),
            date,
        });
    }

    summary.kept_rows = records.len();

    log::info!("Cleaning: {}", summary.summary());
    if summary.kept_rows == 0 && summary.input_rows > 0 {
        log::warn!("Business rules removed every row");
    }

    Ok(CleanedDataset { records, summary })
}

// ============================================================================
// TESTS
// ============================================================================

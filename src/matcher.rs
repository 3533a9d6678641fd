// 🎯 Nearest-Class Matcher - Place a lifter into a federation's weight/age class
// Picks the class of the historical entry closest to the lifter's bodyweight or age.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::records::{CompetitionRecord, Sex, Tested, WeightClass};

// ============================================================================
// POPULATION FILTER
// ============================================================================

/// Which historical entries count as the comparison population.
/// Empty lists mean "no restriction" on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerFilter {
    pub sex: Sex,
    pub federations: Vec<String>,
    pub tested_only: bool,
    pub event: Option<String>,
    pub weight_classes: Vec<WeightClass>,
    pub age_classes: Vec<String>,
}

impl PeerFilter {
    pub fn new(sex: Sex) -> Self {
        PeerFilter {
            sex,
            federations: Vec::new(),
            tested_only: false,
            event: None,
            weight_classes: Vec::new(),
            age_classes: Vec::new(),
        }
    }

    pub fn matches(&self, record: &CompetitionRecord) -> bool {
        if record.sex != self.sex {
            return false;
        }

        if !self.federations.is_empty()
            && !self
                .federations
                .iter()
                .any(|f| f.eq_ignore_ascii_case(&record.federation))
        {
            return false;
        }

        if self.tested_only && record.tested != Tested::Yes {
            return false;
        }

        if let Some(event) = &self.event {
            if !event.eq_ignore_ascii_case(&record.event) {
                return false;
            }
        }

        if !self.weight_classes.is_empty() && !self.weight_classes.contains(&record.weight_class) {
            return false;
        }

        if !self.age_classes.is_empty() && !self.age_classes.contains(&record.age_class) {
            return false;
        }

        true
    }

    /// Records passing the filter, in input order
    pub fn apply<'a>(&self, records: &'a [CompetitionRecord]) -> Vec<&'a CompetitionRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn describe(&self) -> String {
        let federations = if self.federations.is_empty() {
            "all federations".to_string()
        } else {
            self.federations.join(", ")
        };
        format!(
            "{} / {}{}",
            federations,
            self.sex,
            if self.tested_only { " / tested" } else { "" }
        )
    }
}

// ============================================================================
// NEAREST-CLASS MATCHING
// ============================================================================

/// Result of a nearest-class lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMatch<T> {
    /// Class label of the closest entry
    pub class: T,
    /// Absolute distance between the target and that entry's value
    pub distance: f64,
    /// Position of the entry within the population slice
    pub index: usize,
}

/// Scan for the entry whose `value` is closest to `target`.
/// Entries without a value are skipped. Ties keep the earliest entry.
fn nearest_by<T, V, L>(
    population: &[&CompetitionRecord],
    target: f64,
    what: &str,
    value: V,
    label: L,
) -> AnalysisResult<ClassMatch<T>>
where
    V: Fn(&CompetitionRecord) -> Option<f64>,
    L: Fn(&CompetitionRecord) -> T,
{
    if !target.is_finite() {
        return Err(AnalysisError::invalid(format!(
            "target {} must be a finite number, got {}",
            what, target
        )));
    }

    let mut best: Option<(usize, f64)> = None;

    for (index, record) in population.iter().enumerate() {
        let Some(v) = value(*record).filter(|v| v.is_finite()) else {
            continue;
        };
        let distance = (v - target).abs();

        // Strict comparison keeps the first entry on ties
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }

    match best {
        Some((index, distance)) => Ok(ClassMatch {
            class: label(population[index]),
            distance,
            index,
        }),
        None => Err(AnalysisError::no_population(format!(
            "no entries with a recorded {} to match against",
            what
        ))),
    }
}

/// Weight class of the entry whose bodyweight is closest to `target_bodyweight_kg`.
pub fn nearest_weight_class(
    population: &[&CompetitionRecord],
    target_bodyweight_kg: f64,
) -> AnalysisResult<ClassMatch<WeightClass>> {
    if target_bodyweight_kg <= 0.0 {
        return Err(AnalysisError::invalid(format!(
            "bodyweight must be positive, got {}",
            target_bodyweight_kg
        )));
    }

    nearest_by(
        population,
        target_bodyweight_kg,
        "bodyweight",
        |r| r.bodyweight_kg,
        |r| r.weight_class.clone(),
    )
}

/// Age class of the entry whose age is closest to `target_age`.
pub fn nearest_age_class(
    population: &[&CompetitionRecord],
    target_age: f64,
) -> AnalysisResult<ClassMatch<String>> {
    nearest_by(population, target_age, "age", |r| r.age, |r| r.age_class.clone())
}

/// Weight and age class a lifter would most likely compete in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedClass {
    pub weight_class: WeightClass,
    pub age_class: String,
}

pub fn estimate_class(
    population: &[&CompetitionRecord],
    bodyweight_kg: f64,
    age: f64,
) -> AnalysisResult<EstimatedClass> {
    let weight = nearest_weight_class(population, bodyweight_kg)?;
    let age = nearest_age_class(population, age)?;

    log::debug!(
        "Estimated class: {} kg (Δ{:.1}), {} (Δ{:.1})",
        weight.class,
        weight.distance,
        age.class,
        age.distance
    );

    Ok(EstimatedClass {
        weight_class: weight.class,
        age_class: age.class,
    })
}

// ============================================================================
// TESTS
// ============================================================================

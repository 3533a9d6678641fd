// 🏋️ Lifter Summary - One competitor's history
// Competition count, best placement and per-persona progression for a name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::error::{AnalysisError, AnalysisResult, AnalysisWarning};
use crate::persona::{PersonaResolver, PersonaStrategy, PersonaTable};
use crate::records::{CompetitionRecord, Sex};

/// Sorted distinct names competing in `event` for `sex`
pub fn lifter_names(records: &[CompetitionRecord], sex: Sex, event: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.sex == sex && r.event.eq_ignore_ascii_case(event))
        .map(|r| r.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub rank: u32,
    /// First place at the lifter's only meet, with nobody else entered
    pub sole_entrant: bool,
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sole_entrant {
            write!(f, "{} *", self.rank)
        } else {
            write!(f, "{}", self.rank)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionView {
    ByDate,
    ByAge,
    ByBodyweight,
}

impl std::str::FromStr for ProgressionView {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(ProgressionView::ByDate),
            "age" => Ok(ProgressionView::ByAge),
            "weight" | "bodyweight" => Ok(ProgressionView::ByBodyweight),
            other => Err(AnalysisError::invalid(format!(
                "view must be 'date', 'age' or 'weight', got '{}'",
                other
            ))),
        }
    }
}

/// One meet on a persona's progression line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionPoint {
    pub persona: u32,
    pub date: NaiveDate,
    pub age: Option<f64>,
    pub bodyweight_kg: Option<f64>,
    pub meet: String,
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifterSummary {
    pub name: String,
    pub event: String,
    /// Distinct (meet, date) pairs
    pub competitions: usize,
    pub best_placement: Option<Placement>,
    pub personas: PersonaTable,
    pub warnings: Vec<AnalysisWarning>,
}

impl LifterSummary {
    pub fn is_ambiguous(&self) -> bool {
        self.personas.is_ambiguous()
    }

    /// Per-persona performance line, one point per (date, meet).
    /// ByAge / ByBodyweight skip meets where that value was not recorded.
    pub fn progression(&self, view: ProgressionView) -> Vec<ProgressionPoint> {
        let mut seen: HashSet<(u32, NaiveDate, &str)> = HashSet::new();
        let mut points: Vec<ProgressionPoint> = Vec::new();

        for row in &self.personas.rows {
            let record = &row.record;
            if !seen.insert((row.persona, record.date, record.meet_name.as_str())) {
                continue;
            }

            let keyed = match view {
                ProgressionView::ByDate => true,
                ProgressionView::ByAge => record.age.is_some(),
                ProgressionView::ByBodyweight => record.bodyweight_kg.is_some(),
            };
            if !keyed {
                continue;
            }

            points.push(ProgressionPoint {
                persona: row.persona,
                date: record.date,
                age: record.age,
                bodyweight_kg: record.bodyweight_kg,
                meet: record.meet_name.clone(),
                squat: record.best3_squat_kg,
                bench: record.best3_bench_kg,
                deadlift: record.best3_deadlift_kg,
            });
        }

        points.sort_by(|a, b| {
            a.persona.cmp(&b.persona).then_with(|| match view {
                ProgressionView::ByDate => a.date.cmp(&b.date),
                ProgressionView::ByAge => cmp_f64(a.age, b.age).then(a.date.cmp(&b.date)),
                ProgressionView::ByBodyweight => {
                    cmp_f64(a.bodyweight_kg, b.bodyweight_kg).then(a.date.cmp(&b.date))
                }
            })
        });

        points
    }
}

fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => Ordering::Equal,
    }
}

/// Summarise every `event` entry recorded under `name`.
pub fn lifter_summary(
    records: &[CompetitionRecord],
    name: &str,
    event: &str,
    strategy: PersonaStrategy,
) -> AnalysisResult<LifterSummary> {
    let entries: Vec<CompetitionRecord> = records
        .iter()
        .filter(|r| r.name == name && r.event.eq_ignore_ascii_case(event))
        .cloned()
        .collect();

    if entries.is_empty() {
        return Err(AnalysisError::no_population(format!(
            "no {} entries for '{}'",
            event, name
        )));
    }

    let competitions = entries
        .iter()
        .map(|r| (r.meet_name.as_str(), r.date))
        .collect::<HashSet<_>>()
        .len();

    let best_placement = best_placement(records, &entries, event);

    let personas = PersonaResolver::new(strategy).resolve(&entries)?;
    let warnings: Vec<AnalysisWarning> = personas.warning().into_iter().collect();

    for warning in &warnings {
        log::warn!("{}", warning);
    }

    Ok(LifterSummary {
        name: name.to_string(),
        event: event.to_string(),
        competitions,
        best_placement,
        personas,
        warnings,
    })
}

fn best_placement(
    all: &[CompetitionRecord],
    entries: &[CompetitionRecord],
    event: &str,
) -> Option<Placement> {
    let rank = entries.iter().filter_map(|r| r.place.rank()).min()?;

    let sole_entrant = rank == 1
        && entries.len() == 1
        && all
            .iter()
            .filter(|r| {
                r.meet_name == entries[0].meet_name
                    && r.date == entries[0].date
                    && r.event.eq_ignore_ascii_case(event)
            })
            .count()
            == 1;

    Some(Placement { rank, sole_entrant })
}

// ============================================================================
// TESTS
// ============================================================================

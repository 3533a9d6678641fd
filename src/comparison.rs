// 🆚 Comparison - "How do you measure up?"
// Filters the historical table to the user's population, estimates the class
// they would compete in, then ranks each entered lift against that class.
// The result is an immutable report; nothing is remembered between calls.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult, AnalysisWarning};
use crate::matcher::{estimate_class, EstimatedClass, PeerFilter};
use crate::ranking::{aggregate_peer_bests, rank_against_peers, Lift, PeerGrouping, Ranking};
use crate::records::{CompetitionRecord, Sex};
use crate::units::Weight;
use crate::wilks::{classify, wilks_for_sex, Tier};

// ============================================================================
// INPUTS
// ============================================================================

/// Lifter details entered for one comparison. Never stored with the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub sex: Sex,
    pub age: f64,
    pub bodyweight: Weight,
    pub squat: Option<Weight>,
    pub bench: Option<Weight>,
    pub deadlift: Option<Weight>,
}

impl UserProfile {
    pub fn validate(&self) -> AnalysisResult<()> {
        if !self.age.is_finite() || self.age <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "age must be positive, got {}",
                self.age
            )));
        }

        let bw = self.bodyweight.to_kg();
        if !bw.is_finite() || bw <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "bodyweight must be positive, got {}",
                self.bodyweight
            )));
        }

        for (lift, weight) in self.entered_lifts() {
            let kg = weight.to_kg();
            if !kg.is_finite() || kg < 0.0 {
                return Err(AnalysisError::invalid(format!(
                    "{} must not be negative, got {}",
                    lift, weight
                )));
            }
        }

        Ok(())
    }

    fn entered_lifts(&self) -> Vec<(Lift, Weight)> {
        [
            (Lift::Squat, self.squat),
            (Lift::Bench, self.bench),
            (Lift::Deadlift, self.deadlift),
        ]
        .into_iter()
        .filter_map(|(lift, weight)| weight.map(|w| (lift, w)))
        .collect()
    }

    /// Total in kg, only when all three lifts were entered
    pub fn total_kg(&self) -> Option<f64> {
        match (self.squat, self.bench, self.deadlift) {
            (Some(s), Some(b), Some(d)) => Some(s.to_kg() + b.to_kg() + d.to_kg()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonQuery {
    /// Empty = every federation
    pub federations: Vec<String>,
    pub tested_only: bool,
    pub event: Option<String>,
    pub grouping: PeerGrouping,
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftRanking {
    pub lift: Lift,
    /// The user's value: kilograms for lifts, points for Wilks
    pub value: f64,
    pub ranking: Ranking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub lifter: String,
    pub population: String,
    pub estimated_class: EstimatedClass,
    /// Entries in the estimated class before per-lifter aggregation
    pub peer_entries: usize,
    /// Distinct peers (lifters or personas) ranked against
    pub peer_count: usize,
    pub rankings: Vec<LiftRanking>,
    pub wilks: Option<f64>,
    pub tier: Option<Tier>,
    pub warnings: Vec<AnalysisWarning>,
}

impl ComparisonReport {
    pub fn ranking(&self, lift: Lift) -> Option<&LiftRanking> {
        self.rankings.iter().find(|r| r.lift == lift)
    }

    pub fn summary(&self) -> String {
        let rankings: Vec<String> = self
            .rankings
            .iter()
            .map(|r| format!("{} {}", r.lift, r.ranking))
            .collect();
        format!(
            "{} vs {} peers in {} kg / {}: {}",
            self.lifter,
            self.peer_count,
            self.estimated_class.weight_class,
            self.estimated_class.age_class,
            rankings.join(", ")
        )
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Rank a user against historical competitors.
///
/// Fails with `NoMatchingPopulation` when the filters (or the estimated
/// class) leave nobody to compare against.
pub fn compare(
    records: &[CompetitionRecord],
    profile: &UserProfile,
    query: &ComparisonQuery,
) -> AnalysisResult<ComparisonReport> {
    profile.validate()?;

    let filter = PeerFilter {
        federations: query.federations.clone(),
        tested_only: query.tested_only,
        event: query.event.clone(),
        ..PeerFilter::new(profile.sex)
    };

    let population = filter.apply(records);
    if population.is_empty() {
        log::warn!("No historical entries for {}", filter.describe());
        return Err(AnalysisError::no_population(filter.describe()));
    }

    let bodyweight_kg = profile.bodyweight.to_kg();
    let estimated_class = estimate_class(&population, bodyweight_kg, profile.age)?;

    let in_class = |r: &CompetitionRecord| {
        r.weight_class == estimated_class.weight_class && r.age_class == estimated_class.age_class
    };

    let peer_entries = population.iter().filter(|&&r| in_class(r)).count();
    if peer_entries == 0 {
        return Err(AnalysisError::no_population(format!(
            "{} has no entries in {} kg / {}",
            filter.describe(),
            estimated_class.weight_class,
            estimated_class.age_class
        )));
    }

    // Personas come from each name's whole filtered history, not just the class slice
    let aggregation = aggregate_peer_bests(&population, query.grouping, in_class)?;

    let mut rankings: Vec<LiftRanking> = profile
        .entered_lifts()
        .into_iter()
        .map(|(lift, weight)| {
            let value = weight.to_kg();
            LiftRanking {
                lift,
                value,
                ranking: rank_against_peers(&aggregation.bests, lift, value),
            }
        })
        .collect();

    let total = profile.total_kg();
    if let Some(total) = total {
        rankings.push(LiftRanking {
            lift: Lift::Total,
            value: total,
            ranking: rank_against_peers(&aggregation.bests, Lift::Total, total),
        });
    }

    // Mx lifters have no Wilks coefficients; that is "no score", not a failure
    let wilks = match (total, profile.sex) {
        (Some(total), Sex::M | Sex::F) => Some(wilks_for_sex(
            profile.sex,
            profile.bodyweight,
            Weight::kg(total),
        )?),
        _ => None,
    };

    if let Some(score) = wilks {
        rankings.push(LiftRanking {
            lift: Lift::Wilks,
            value: score,
            ranking: rank_against_peers(&aggregation.bests, Lift::Wilks, score),
        });
    }

    let report = ComparisonReport {
        lifter: profile.name.clone(),
        population: filter.describe(),
        estimated_class,
        peer_entries,
        peer_count: aggregation.bests.len(),
        rankings,
        wilks,
        tier: wilks.and_then(classify),
        warnings: aggregation.warnings,
    };

    log::info!("{}", report.summary());

    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================

// 📊 Percentile Ranking - Where a lift falls within a peer population
// Peers are first reduced to one best value per lifter (or per persona), so a
// lifter with many meets is counted once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalysisResult, AnalysisWarning};
use crate::persona::{PersonaResolver, PersonaStrategy};
use crate::records::CompetitionRecord;

// ============================================================================
// RANKING RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrankableReason {
    /// No peers to compare against
    EmptyPopulation,
    /// The value being ranked is NaN or infinite
    InvalidValue,
}

/// A percentile, or the reason none could be computed.
/// `Ranked(0.0)` means "below everyone", never "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Ranking {
    Ranked(f64),
    Unrankable(UnrankableReason),
}

impl Ranking {
    pub fn percentile(&self) -> Option<f64> {
        match self {
            Ranking::Ranked(p) => Some(*p),
            Ranking::Unrankable(_) => None,
        }
    }

    pub fn is_ranked(&self) -> bool {
        matches!(self, Ranking::Ranked(_))
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ranking::Ranked(p) => write!(f, "{:.1}%", p),
            Ranking::Unrankable(UnrankableReason::EmptyPopulation) => {
                write!(f, "unrankable (no comparable data)")
            }
            Ranking::Unrankable(UnrankableReason::InvalidValue) => {
                write!(f, "unrankable (invalid value)")
            }
        }
    }
}

/// Percentile of `value` within `peer_values`.
///
/// Missing peer values count as 0: a lifter without a successful attempt sits
/// at the bottom rather than leaving the population. Ties use the mean
/// convention: % strictly below + half the % exactly equal.
pub fn percentile_rank(peer_values: &[Option<f64>], value: f64) -> Ranking {
    if !value.is_finite() {
        return Ranking::Unrankable(UnrankableReason::InvalidValue);
    }
    if peer_values.is_empty() {
        return Ranking::Unrankable(UnrankableReason::EmptyPopulation);
    }

    let mut below = 0usize;
    let mut equal = 0usize;
    for peer in peer_values {
        let peer = peer.filter(|v| v.is_finite()).unwrap_or(0.0);
        if peer < value {
            below += 1;
        } else if peer == value {
            equal += 1;
        }
    }

    let n = peer_values.len() as f64;
    Ranking::Ranked((below as f64 + 0.5 * equal as f64) / n * 100.0)
}

// ============================================================================
// PEER BESTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lift {
    Squat,
    Bench,
    Deadlift,
    Total,
    Wilks,
}

impl Lift {
    pub fn all() -> &'static [Lift] {
        &[Lift::Squat, Lift::Bench, Lift::Deadlift, Lift::Total, Lift::Wilks]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Lift::Squat => "Squat",
            Lift::Bench => "Bench",
            Lift::Deadlift => "Deadlift",
            Lift::Total => "Total",
            Lift::Wilks => "Wilks",
        }
    }
}

impl std::fmt::Display for Lift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Best values of one lifter (or persona) across all of their meets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerBest {
    pub lifter: String,
    pub entries: usize,
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
    pub total: Option<f64>,
    pub wilks: Option<f64>,
}

fn max_opt(current: Option<f64>, candidate: Option<f64>) -> Option<f64> {
    match (current, candidate.filter(|v| v.is_finite())) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

impl PeerBest {
    fn empty(lifter: String) -> Self {
        PeerBest {
            lifter,
            entries: 0,
            squat: None,
            bench: None,
            deadlift: None,
            total: None,
            wilks: None,
        }
    }

    fn absorb(&mut self, record: &CompetitionRecord) {
        self.entries += 1;
        self.squat = max_opt(self.squat, record.best3_squat_kg);
        self.bench = max_opt(self.bench, record.best3_bench_kg);
        self.deadlift = max_opt(self.deadlift, record.best3_deadlift_kg);
        self.total = max_opt(self.total, record.total_kg);
        self.wilks = max_opt(self.wilks, record.wilks);
    }

    pub fn get(&self, lift: Lift) -> Option<f64> {
        match lift {
            Lift::Squat => self.squat,
            Lift::Bench => self.bench,
            Lift::Deadlift => self.deadlift,
            Lift::Total => self.total,
            Lift::Wilks => self.wilks,
        }
    }
}

/// How historical entries are folded into peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum PeerGrouping {
    /// One peer per raw name (may blend people sharing a name)
    Name,
    /// One peer per resolved persona
    Persona { strategy: PersonaStrategy },
    /// One peer per name, keeping only the persona with the most entries in scope
    LargestPersona { strategy: PersonaStrategy },
}

impl Default for PeerGrouping {
    fn default() -> Self {
        PeerGrouping::Persona {
            strategy: PersonaStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerAggregation {
    pub bests: Vec<PeerBest>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Fold entries into one best value per peer, sorted by peer label.
///
/// `population` is every entry of each candidate name; personas are resolved
/// over that whole history. Only entries accepted by `in_scope` contribute to
/// a best, and names (or personas) with no entry in scope are not peers.
pub fn aggregate_peer_bests<F>(
    population: &[&CompetitionRecord],
    grouping: PeerGrouping,
    in_scope: F,
) -> AnalysisResult<PeerAggregation>
where
    F: Fn(&CompetitionRecord) -> bool,
{
    let mut by_name: BTreeMap<&str, Vec<&CompetitionRecord>> = BTreeMap::new();
    for &record in population {
        by_name.entry(record.name.as_str()).or_default().push(record);
    }
    by_name.retain(|_, entries| entries.iter().any(|&record| in_scope(record)));

    let mut aggregation = PeerAggregation::default();

    let strategy = match grouping {
        PeerGrouping::Name => {
            for (name, entries) in by_name {
                let mut best = PeerBest::empty(name.to_string());
                for &record in entries.iter().filter(|&&record| in_scope(record)) {
                    best.absorb(record);
                }
                aggregation.bests.push(best);
            }
            return Ok(aggregation);
        }
        PeerGrouping::Persona { strategy } | PeerGrouping::LargestPersona { strategy } => strategy,
    };

    let resolver = PersonaResolver::new(strategy);
    for entries in by_name.into_values() {
        let history: Vec<CompetitionRecord> = entries.into_iter().cloned().collect();
        let mut table = resolver.resolve(&history)?;

        if let Some(warning) = table.warning() {
            aggregation.warnings.push(warning);
        }

        table.rows.retain(|row| in_scope(&row.record));

        let rows = match grouping {
            PeerGrouping::LargestPersona { .. } => match table.largest_persona() {
                Some(persona) => table.rows_for(persona),
                None => Vec::new(),
            },
            _ => table.rows.iter().collect(),
        };

        let mut personas: BTreeMap<u32, PeerBest> = BTreeMap::new();
        for row in rows {
            personas
                .entry(row.persona)
                .or_insert_with(|| PeerBest::empty(row.label()))
                .absorb(&row.record);
        }
        aggregation.bests.extend(personas.into_values());
    }

    Ok(aggregation)
}

/// Percentile of `value` for `lift` among aggregated peers
pub fn rank_against_peers(peers: &[PeerBest], lift: Lift, value: f64) -> Ranking {
    let values: Vec<Option<f64>> = peers.iter().map(|p| p.get(lift)).collect();
    percentile_rank(&values, value)
}

// ============================================================================
// TESTS
// ============================================================================

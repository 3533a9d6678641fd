// Strength Pulse - Core Library
// Powerlifting benchmarking: cleans historical meet results, then ranks a lifter
// against the peers they would actually compete with.

pub mod error;
pub mod units;
pub mod records;
pub mod cleaning;
pub mod wilks;
pub mod matcher;
pub mod persona;     // Shared-name disambiguation
pub mod ranking;
pub mod comparison;  // End-to-end "how do you measure up?"
pub mod lifter;
pub mod explorer;    // Class dropdowns and table browsing
pub mod config;

// Re-export commonly used types
pub use error::{AnalysisError, AnalysisResult, AnalysisWarning};
pub use units::{Weight, WeightUnit, LB_PER_KG};
pub use records::{
    CompetitionRecord, RawRecord, Sex, Tested, Place, WeightClass,
    load_csv,
};
pub use cleaning::{
    BusinessRules, CleanedDataset, CleaningSummary,
    apply_business_rules, parse_meet_date,
};
pub use wilks::{Tier, classify, wilks_score, wilks_for_sex, wilks_for_weights};
pub use matcher::{
    PeerFilter, ClassMatch, EstimatedClass,
    nearest_weight_class, nearest_age_class, estimate_class,
};
pub use persona::{
    PersonaStrategy, PersonaResolver, PersonaTable, PersonaRow, PersonaCache,
    resolve_personas, persona_count,
};
pub use ranking::{
    Ranking, UnrankableReason, Lift, PeerBest, PeerGrouping, PeerAggregation,
    percentile_rank, aggregate_peer_bests, rank_against_peers,
};
pub use comparison::{
    UserProfile, ComparisonQuery, ComparisonReport, LiftRanking,
    compare,
};
pub use lifter::{
    LifterSummary, Placement, ProgressionView, ProgressionPoint,
    lifter_names, lifter_summary,
};
pub use explorer::{
    ClassOptions,
    browse, class_options, class_options_by_federation,
};
pub use config::AppConfig;

/// Crate version, shown by the CLI banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

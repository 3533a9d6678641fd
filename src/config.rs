// ⚙️ Configuration - TOML settings for data, rules, personas and comparisons
// Every field has a default, so an empty (or missing) file is a valid
// configuration. CLI flags override what is read here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cleaning::BusinessRules;
use crate::comparison::ComparisonQuery;
use crate::persona::PersonaStrategy;
use crate::ranking::PeerGrouping;
use crate::units::WeightUnit;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub rules: BusinessRules,
    pub persona: PersonaConfig,
    pub comparison: ComparisonConfig,
}

/// Where the historical table lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub csv_path: Option<PathBuf>,
    /// Shorthand for `rules.country`; wins when both are set
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    #[default]
    Chronological,
    AgeDateDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub strategy: StrategyName,
    /// Only read by `age_date_delta`
    pub threshold: i64,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        PersonaConfig {
            strategy: StrategyName::Chronological,
            threshold: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingName {
    #[default]
    Persona,
    LargestPersona,
    Name,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub federations: Vec<String>,
    pub tested_only: bool,
    /// Unit the user's numbers are entered in
    pub unit: WeightUnit,
    pub grouping: GroupingName,
    pub event: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            federations: Vec::new(),
            tested_only: false,
            unit: WeightUnit::Kg,
            grouping: GroupingName::Persona,
            event: "SBD".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn persona_strategy(&self) -> PersonaStrategy {
        match self.persona.strategy {
            StrategyName::Chronological => PersonaStrategy::ChronologicalRegression,
            StrategyName::AgeDateDelta => PersonaStrategy::AgeDateDelta {
                threshold: self.persona.threshold,
            },
        }
    }

    pub fn business_rules(&self) -> BusinessRules {
        let mut rules = self.rules.clone();
        if self.data.country.is_some() {
            rules.country = self.data.country.clone();
        }
        rules
    }

    pub fn peer_grouping(&self) -> PeerGrouping {
        match self.comparison.grouping {
            GroupingName::Name => PeerGrouping::Name,
            GroupingName::Persona => PeerGrouping::Persona {
                strategy: self.persona_strategy(),
            },
            GroupingName::LargestPersona => PeerGrouping::LargestPersona {
                strategy: self.persona_strategy(),
            },
        }
    }

    pub fn comparison_query(&self) -> ComparisonQuery {
        ComparisonQuery {
            federations: self.comparison.federations.clone(),
            tested_only: self.comparison.tested_only,
            event: Some(self.comparison.event.clone()),
            grouping: self.peer_grouping(),
        }
    }
}

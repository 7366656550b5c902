//! Insight and business configuration
//!
//! Every threshold, weight and estimation multiplier the analyzers use lives
//! here rather than in the analyzers themselves.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/gramsales/config/insights.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/insights.toml");

/// Viral score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViralConfig {
    pub reach_weight: f64,
    pub engagement_weight: f64,
    pub saves_weight: f64,
    pub comments_weight: f64,
    /// Score given to every post when a required column is absent
    pub neutral_score: f64,
}

impl Default for ViralConfig {
    fn default() -> Self {
        Self {
            reach_weight: 0.30,
            engagement_weight: 0.25,
            saves_weight: 0.25,
            comments_weight: 0.20,
            neutral_score: 50.0,
        }
    }
}

/// Saves-to-sales correlation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub min_overlap_days: usize,
    pub strong_threshold: f64,
    pub moderate_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_overlap_days: 3,
            strong_threshold: 0.6,
            moderate_threshold: 0.3,
        }
    }
}

/// Posting-time score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub engagement_weight: f64,
    pub viral_weight: f64,
    pub conversion_weight: f64,
    pub conversion_window_hours: f64,
    pub top_hours: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            engagement_weight: 0.4,
            viral_weight: 0.3,
            conversion_weight: 0.3,
            conversion_window_hours: 24.0,
            top_hours: 3,
        }
    }
}

/// Multipliers for the viral funnel estimate (not measurements)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    pub viral_threshold: f64,
    pub followers_per_viral_point: f64,
    pub lead_rate: f64,
    pub sale_rate: f64,
    pub average_ticket: f64,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            viral_threshold: 75.0,
            followers_per_viral_point: 2.5,
            lead_rate: 0.03,
            sale_rate: 0.15,
            average_ticket: 1997.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashtagConfig {
    /// Hashtags with fewer attributed leads are not ranked
    pub min_leads: usize,
}

impl Default for HashtagConfig {
    fn default() -> Self {
        Self { min_leads: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// Used for sales that carry no commission rate of their own
    pub default_commission_rate: f64,
    /// Company-wide monthly revenue goal
    pub monthly_goal: f64,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            default_commission_rate: 0.30,
            monthly_goal: 100_000.0,
        }
    }
}

/// Profile of one seller on the team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub display_name: String,
    #[serde(default)]
    pub monthly_goal: Option<f64>,
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub viral: ViralConfig,
    pub correlation: CorrelationConfig,
    pub timing: TimingConfig,
    pub funnel: FunnelConfig,
    pub hashtags: HashtagConfig,
    pub business: BusinessConfig,
    /// Identity -> profile map, keyed by a lowercase login
    pub team: BTreeMap<String, TeamMember>,
}

impl InsightConfig {
    /// Load config (explicit path, then data-dir override, then embedded default)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(default_path) => {
                    debug!(path = %default_path.display(), "Using config override");
                    fs::read_to_string(&default_path)
                        .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::parse(&content)
    }

    /// Embedded defaults
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Parse and validate config from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: InsightConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("viral.reach_weight", self.viral.reach_weight),
            ("viral.engagement_weight", self.viral.engagement_weight),
            ("viral.saves_weight", self.viral.saves_weight),
            ("viral.comments_weight", self.viral.comments_weight),
            ("timing.engagement_weight", self.timing.engagement_weight),
            ("timing.viral_weight", self.timing.viral_weight),
            ("timing.conversion_weight", self.timing.conversion_weight),
            ("funnel.lead_rate", self.funnel.lead_rate),
            ("funnel.sale_rate", self.funnel.sale_rate),
            ("business.default_commission_rate", self.business.default_commission_rate),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{} must be a non-negative number", name)));
            }
        }

        let viral_total = self.viral.reach_weight
            + self.viral.engagement_weight
            + self.viral.saves_weight
            + self.viral.comments_weight;
        if viral_total > 1.0 + 1e-9 {
            return Err(Error::Config(format!(
                "viral weights must sum to at most 1.0 (got {:.2})",
                viral_total
            )));
        }
        if !(0.0..=100.0).contains(&self.viral.neutral_score) {
            return Err(Error::Config("viral.neutral_score must be within 0-100".into()));
        }
        if self.correlation.min_overlap_days < 2 {
            return Err(Error::Config(
                "correlation.min_overlap_days must be at least 2".into(),
            ));
        }
        if self.correlation.moderate_threshold > self.correlation.strong_threshold {
            return Err(Error::Config(
                "correlation.moderate_threshold must not exceed strong_threshold".into(),
            ));
        }
        let window = self.timing.conversion_window_hours;
        if !window.is_finite() || window <= 0.0 {
            return Err(Error::Config(
                "timing.conversion_window_hours must be a positive number".into(),
            ));
        }
        if self.timing.top_hours == 0 {
            return Err(Error::Config("timing.top_hours must be at least 1".into()));
        }
        Ok(())
    }

    /// Find the team login and profile for a seller name (matches login or display name)
    pub fn team_entry(&self, seller: &str) -> Option<(&str, &TeamMember)> {
        let needle = seller.trim().to_lowercase();
        self.team
            .get_key_value(&needle)
            .or_else(|| {
                self.team
                    .iter()
                    .find(|(_, m)| m.display_name.to_lowercase() == needle)
            })
            .map(|(login, member)| (login.as_str(), member))
    }

    /// Find the team profile for a seller name
    pub fn team_member(&self, seller: &str) -> Option<&TeamMember> {
        self.team_entry(seller).map(|(_, member)| member)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("gramsales").join("config").join("insights.toml"))
}

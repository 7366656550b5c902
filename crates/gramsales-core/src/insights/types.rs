//! Core types for the Insight Engine

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PostKind;

/// Kinds of insight the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Save rate vs daily sales correlation
    SavesCorrelation,
    /// Best performing post kind
    ContentType,
    /// Best and worst posting hours
    OptimalTiming,
    /// Estimated funnel impact of viral posts
    ViralContent,
    /// Story link clicks vs Instagram leads
    StoriesPerformance,
    /// Hashtags that bring qualified leads
    HashtagPerformance,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::SavesCorrelation => "saves_correlation",
            InsightKind::ContentType => "content_type",
            InsightKind::OptimalTiming => "optimal_timing",
            InsightKind::ViralContent => "viral_content",
            InsightKind::StoriesPerformance => "stories_performance",
            InsightKind::HashtagPerformance => "hashtag_performance",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saves_correlation" => Ok(InsightKind::SavesCorrelation),
            "content_type" => Ok(InsightKind::ContentType),
            "optimal_timing" => Ok(InsightKind::OptimalTiming),
            "viral_content" => Ok(InsightKind::ViralContent),
            "stories_performance" => Ok(InsightKind::StoriesPerformance),
            "hashtag_performance" => Ok(InsightKind::HashtagPerformance),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Priority of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Numeric rank for sorting (higher = more important)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A ranked recommendation produced by one analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub kind: InsightKind,
    pub priority: Priority,
    /// Short title (e.g. "Videos/Reels Convert Best")
    pub title: String,
    /// One-line finding
    pub message: String,
    /// What to do about it
    pub recommended_action: String,
    /// Kind-specific structured data
    pub supporting_data: serde_json::Value,
    /// The figures are heuristic estimates, not measurements
    pub simulated: bool,
    /// Not enough data for a real finding
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
}

impl InsightRecord {
    /// Create a new record with the current timestamp
    pub fn new(
        kind: InsightKind,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            priority,
            title: title.into(),
            message: message.into(),
            recommended_action: String::new(),
            supporting_data: serde_json::Value::Null,
            simulated: false,
            degraded: false,
            generated_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    /// Add structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.supporting_data = data;
        self
    }

    /// Mark the figures as estimated rather than measured
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    /// Mark as an "insufficient data" placeholder
    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }
}

/// Strength of the save rate / sales relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    /// Not enough overlapping days to say anything
    InsufficientData,
}

impl CorrelationStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

/// Save rate and sales of one overlapping day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSalesPoint {
    pub date: NaiveDate,
    pub save_rate: f64,
    pub sales_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSavedPost {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub saves: u64,
    pub kind: Option<PostKind>,
    pub caption: Option<String>,
}

/// Result of the saves-to-sales analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavesToSalesData {
    /// Pearson coefficient rounded to 3 decimals (0 when insufficient)
    pub correlation: f64,
    pub strength: CorrelationStrength,
    pub message: String,
    pub overlapping_days: usize,
    pub best_save_rate: f64,
    pub avg_save_rate: f64,
    pub points: Vec<SaveSalesPoint>,
    pub top_saved_posts: Vec<TopSavedPost>,
}

/// Aggregates for one post kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindPerformance {
    pub kind: PostKind,
    pub posts: usize,
    pub mean_engagement: f64,
    pub mean_saves: f64,
    pub mean_reach: f64,
    pub mean_viral_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeData {
    pub best_kind: PostKind,
    pub best_engagement: f64,
    pub kinds: Vec<KindPerformance>,
}

/// Aggregates for one hour-of-day bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourPerformance {
    pub hour: u32,
    pub posts: usize,
    pub mean_engagement: f64,
    pub mean_viral_score: f64,
    /// Mean hours from post to first sale; `None` when unmeasured
    pub conversion_speed_hours: Option<f64>,
    pub performance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingData {
    pub hours: Vec<HourPerformance>,
    pub best_hours: Vec<u32>,
    pub worst_hours: Vec<u32>,
    pub golden_hour: u32,
    /// Whether conversion speed came from timestamped sales
    pub conversion_measured: bool,
    pub fastest_conversion_hours: Option<f64>,
}

/// Estimated downstream impact of one viral post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralPostImpact {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub viral_score: f64,
    pub caption_preview: Option<String>,
    pub follower_gain: u64,
    pub leads: u64,
    pub sales: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralFunnelData {
    pub viral_posts: usize,
    pub total_follower_gain: u64,
    pub total_leads: u64,
    pub total_sales: u64,
    pub total_revenue: f64,
    pub posts: Vec<ViralPostImpact>,
    /// Always true: the funnel figures come from fixed multipliers
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoriesData {
    pub total_link_clicks: u64,
    pub instagram_leads: u64,
    pub conversion_rate: f64,
    /// Hour -> mean link clicks, best first
    pub best_hours: Vec<(u32, f64)>,
    pub story_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagStats {
    pub hashtag: String,
    pub leads: usize,
    pub qualified: usize,
    pub qualify_rate: f64,
    /// Mean engagement of posts whose caption uses the hashtag
    pub mean_post_engagement: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagData {
    pub best: HashtagStats,
    pub hashtags: BTreeMap<String, HashtagStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_kind_round_trip_names() {
        assert_eq!(InsightKind::SavesCorrelation.as_str(), "saves_correlation");
        assert_eq!(
            InsightKind::from_str("hashtag_performance").unwrap(),
            InsightKind::HashtagPerformance
        );
        assert!(InsightKind::from_str("spending").is_err());
    }

    #[test]
    fn test_priority_rank() {
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn test_record_builder() {
        let record = InsightRecord::new(
            InsightKind::ViralContent,
            Priority::High,
            "Viral Content",
            "2 viral posts",
        )
        .with_action("Repeat the pattern")
        .with_data(serde_json::json!({"viral_posts": 2}))
        .simulated();

        assert_eq!(record.recommended_action, "Repeat the pattern");
        assert_eq!(record.supporting_data["viral_posts"], 2);
        assert!(record.simulated);
        assert!(!record.degraded);
    }

    #[test]
    fn test_record_serializes_snake_case() {
        let record = InsightRecord::new(
            InsightKind::OptimalTiming,
            Priority::Medium,
            "t",
            "m",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "optimal_timing");
        assert_eq!(json["priority"], "medium");
    }
}

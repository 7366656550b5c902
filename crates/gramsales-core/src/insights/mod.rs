//! Insight Engine - ranked recommendations from posts, sales and leads
//!
//! Each analyzer looks at one immutable [`Dataset`](crate::models::Dataset)
//! snapshot and produces zero or more [`InsightRecord`]s. The engine runs
//! them all, drops the ones that fail, and sorts what is left by priority.
//!
//! ## Core Insight Types
//!
//! - **Saves Correlation** - Does a higher save rate mean more sales?
//! - **Content Type** - Which post kind engages best
//! - **Optimal Timing** - Best and worst hours to publish
//! - **Viral Content** - Estimated funnel impact of viral posts (simulated)
//! - **Stories Performance** - Story link clicks vs Instagram leads
//! - **Hashtag Performance** - Hashtags that bring qualified leads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gramsales_core::insights::{AnalysisContext, InsightEngine};
//!
//! let engine = InsightEngine::new();
//! let ctx = AnalysisContext::new(&dataset, &config);
//! let records = engine.analyze_all(&ctx);
//! ```

pub mod content_type;
pub mod engine;
pub mod hashtag_performance;
pub mod optimal_timing;
pub mod saves_correlation;
pub mod stories_performance;
pub mod types;
pub mod viral_content;

pub use content_type::{analyze_content_types, ContentTypeInsight};
pub use engine::{rank_insights, AnalysisContext, Insight, InsightEngine};
pub use hashtag_performance::{analyze_hashtags, HashtagPerformanceInsight};
pub use optimal_timing::{analyze_posting_times, OptimalTimingInsight};
pub use saves_correlation::{analyze_saves_to_sales, SavesCorrelationInsight};
pub use stories_performance::{analyze_stories, StoriesPerformanceInsight};
pub use types::{
    ContentTypeData, CorrelationStrength, HashtagData, HashtagStats, HourPerformance,
    InsightKind, InsightRecord, KindPerformance, Priority, SaveSalesPoint, SavesToSalesData,
    StoriesData, TimingData, TopSavedPost, ViralFunnelData, ViralPostImpact,
};
pub use viral_content::{analyze_viral_funnel, ViralContentInsight};

//! Insight Engine - runs every analyzer and ranks what they find

use crate::config::InsightConfig;
use crate::error::{Error, Result};
use crate::models::Dataset;
use crate::prepare::{prepare_posts, PreparedPost};

use super::types::{InsightKind, InsightRecord};
use super::{
    ContentTypeInsight, HashtagPerformanceInsight, OptimalTimingInsight, SavesCorrelationInsight,
    StoriesPerformanceInsight, ViralContentInsight,
};

/// Context provided to insight analyzers
///
/// Holds the immutable input snapshot plus the per-post derived metrics,
/// computed once and shared by every analyzer.
pub struct AnalysisContext<'a> {
    pub dataset: &'a Dataset,
    pub config: &'a InsightConfig,
    prepared: Vec<PreparedPost<'a>>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(dataset: &'a Dataset, config: &'a InsightConfig) -> Self {
        let prepared = prepare_posts(&dataset.posts, &config.viral);
        Self {
            dataset,
            config,
            prepared,
        }
    }

    /// Posts with engagement rate, save rate and viral score attached
    pub fn prepared_posts(&self) -> &[PreparedPost<'a>] {
        &self.prepared
    }
}

/// Trait for insight analyzers
pub trait Insight {
    /// Unique identifier for this insight kind
    fn id(&self) -> InsightKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Analyze the snapshot and produce zero or more records
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>>;
}

/// The main insight engine that orchestrates analysis
pub struct InsightEngine {
    insights: Vec<Box<dyn Insight>>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create a new insight engine with built-in analyzers
    pub fn new() -> Self {
        let mut engine = Self::empty();

        engine.register(Box::new(SavesCorrelationInsight::new()));
        engine.register(Box::new(ContentTypeInsight::new()));
        engine.register(Box::new(HashtagPerformanceInsight::new()));
        engine.register(Box::new(OptimalTimingInsight::new()));
        engine.register(Box::new(ViralContentInsight::new()));
        engine.register(Box::new(StoriesPerformanceInsight::new()));

        engine
    }

    /// Engine with no analyzers registered
    pub fn empty() -> Self {
        Self { insights: vec![] }
    }

    /// Register an insight analyzer
    pub fn register(&mut self, insight: Box<dyn Insight>) {
        self.insights.push(insight);
    }

    /// Run all analyzers and collect their records, highest priority first
    ///
    /// A failing analyzer is logged and contributes nothing; the run itself
    /// never fails.
    pub fn analyze_all(&self, ctx: &AnalysisContext<'_>) -> Vec<InsightRecord> {
        let mut all_records = vec![];

        for insight in &self.insights {
            match insight.analyze(ctx) {
                Ok(records) => {
                    tracing::debug!(
                        insight = insight.id().as_str(),
                        count = records.len(),
                        "Insight analysis complete"
                    );
                    all_records.extend(records);
                }
                Err(e @ Error::MissingColumn { .. }) => {
                    tracing::debug!(
                        insight = insight.id().as_str(),
                        reason = %e,
                        "Insight analysis skipped"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        insight = insight.id().as_str(),
                        error = %e,
                        "Insight analysis failed"
                    );
                }
            }
        }

        rank_insights(&mut all_records);
        all_records
    }

    /// Convenience wrapper: build the context and run every analyzer
    pub fn analyze(&self, dataset: &Dataset, config: &InsightConfig) -> Vec<InsightRecord> {
        let ctx = AnalysisContext::new(dataset, config);
        let records = self.analyze_all(&ctx);
        tracing::info!(
            insights = records.len(),
            posts = dataset.posts.len(),
            sales = dataset.sales.len(),
            leads = dataset.leads.len(),
            "Insight run complete"
        );
        records
    }

    /// Get list of registered insight kinds
    pub fn insight_kinds(&self) -> Vec<InsightKind> {
        self.insights.iter().map(|i| i.id()).collect()
    }
}

/// Sort records high > medium > low, keeping the original order within a priority
pub fn rank_insights(records: &mut [InsightRecord]) {
    records.sort_by_key(|r| std::cmp::Reverse(r.priority.rank()));
}

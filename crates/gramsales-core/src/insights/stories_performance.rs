//! Stories Performance Insight
//!
//! Relates story link clicks to Instagram-origin leads created on the same
//! days and finds the hours where stories get the most clicks.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use crate::error::Result;
use crate::models::{LeadOrigin, LeadRecord, StoryRecord};
use crate::stats::{mean, percent, round_to};

use super::engine::{AnalysisContext, Insight};
use super::types::{InsightKind, InsightRecord, Priority, StoriesData};

const TOP_STORY_HOURS: usize = 3;

/// Clicks, leads and best hours for the stories table
///
/// Returns `None` when there are no stories.
pub fn analyze_stories(stories: &[StoryRecord], leads: &[LeadRecord]) -> Option<StoriesData> {
    if stories.is_empty() {
        return None;
    }

    let story_days: BTreeSet<_> = stories.iter().map(|s| s.date).collect();
    let total_link_clicks: u64 = stories.iter().map(|s| s.link_clicks).sum();
    let instagram_leads = leads
        .iter()
        .filter(|l| l.origin == LeadOrigin::Instagram && story_days.contains(&l.day()))
        .count() as u64;

    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for story in stories {
        by_hour
            .entry(story.hour)
            .or_default()
            .push(story.link_clicks as f64);
    }
    let mut best_hours: Vec<(u32, f64)> = by_hour
        .into_iter()
        .filter_map(|(hour, clicks)| mean(&clicks).map(|m| (hour, round_to(m, 1))))
        .collect();
    best_hours.sort_by(|a, b| b.1.total_cmp(&a.1));
    best_hours.truncate(TOP_STORY_HOURS);

    Some(StoriesData {
        total_link_clicks,
        instagram_leads,
        conversion_rate: round_to(percent(instagram_leads as f64, total_link_clicks as f64), 2),
        best_hours,
        story_days: story_days.len(),
    })
}

/// Insight that reports how stories turn into leads
pub struct StoriesPerformanceInsight;

impl StoriesPerformanceInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StoriesPerformanceInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for StoriesPerformanceInsight {
    fn id(&self) -> InsightKind {
        InsightKind::StoriesPerformance
    }

    fn name(&self) -> &'static str {
        "Stories Performance"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>> {
        let Some(analysis) = analyze_stories(&ctx.dataset.stories, &ctx.dataset.leads) else {
            return Ok(vec![]);
        };

        let data = serde_json::to_value(&analysis).unwrap_or_else(|_| json!({}));

        if analysis.total_link_clicks == 0 {
            let record = InsightRecord::new(
                self.id(),
                Priority::Low,
                "Stories Get No Link Clicks",
                format!(
                    "{} day(s) of stories without a single link click",
                    analysis.story_days
                ),
            )
            .with_action("Add a link sticker and a clear call to action to your stories")
            .with_data(data);
            return Ok(vec![record]);
        }

        let hours = analysis
            .best_hours
            .iter()
            .map(|(h, _)| format!("{:02}h", h))
            .collect::<Vec<_>>()
            .join(", ");

        let record = InsightRecord::new(
            self.id(),
            Priority::Medium,
            format!("Stories Convert {:.1}% of Clicks", analysis.conversion_rate),
            format!(
                "{} link clicks brought {} Instagram lead(s) over {} story day(s)",
                analysis.total_link_clicks, analysis.instagram_leads, analysis.story_days
            ),
        )
        .with_action(format!("Publish stories with links around {}", hours))
        .with_data(data);

        Ok(vec![record])
    }
}

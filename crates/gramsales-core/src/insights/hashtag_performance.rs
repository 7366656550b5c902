//! Hashtag Performance Insight
//!
//! Ranks campaign hashtags by how many of the leads they bring in become
//! qualified (interested, negotiating or closed).

use std::collections::BTreeMap;

use serde_json::json;

use crate::config::HashtagConfig;
use crate::error::Result;
use crate::models::LeadRecord;
use crate::prepare::{extract_hashtags, PreparedPost};
use crate::stats::{mean, percent, round_to};

use super::engine::{AnalysisContext, Insight};
use super::types::{HashtagData, HashtagStats, InsightKind, InsightRecord, Priority};

const HIGH_QUALIFY_RATE: f64 = 50.0;

/// Canonical form of a hashtag: lowercase with a leading `#`
pub fn normalize_hashtag(tag: &str) -> Option<String> {
    let tag = tag.trim().trim_start_matches('#');
    if tag.is_empty() {
        return None;
    }
    Some(format!("#{}", tag.to_lowercase()))
}

/// Per-hashtag lead quality
///
/// Returns `None` when no hashtag has at least `min_leads` attributed leads.
pub fn analyze_hashtags(
    leads: &[LeadRecord],
    posts: &[PreparedPost<'_>],
    config: &HashtagConfig,
) -> Option<HashtagData> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    // Order in which tags first appear; ties in qualify rate go to the earliest
    let mut first_seen: Vec<String> = Vec::new();
    for lead in leads {
        let Some(tag) = lead.hashtag.as_deref().and_then(normalize_hashtag) else {
            continue;
        };
        if !counts.contains_key(&tag) {
            first_seen.push(tag.clone());
        }
        let entry = counts.entry(tag).or_insert((0, 0));
        entry.0 += 1;
        if lead.status.is_qualified() {
            entry.1 += 1;
        }
    }
    if counts.is_empty() {
        return None;
    }

    let mut engagement_by_tag: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for prepared in posts {
        let (Some(caption), Some(rate)) = (&prepared.post.caption, prepared.engagement_rate) else {
            continue;
        };
        for tag in extract_hashtags(caption) {
            if counts.contains_key(&tag) {
                engagement_by_tag.entry(tag).or_default().push(rate);
            }
        }
    }

    let hashtags: BTreeMap<String, HashtagStats> = counts
        .into_iter()
        .map(|(tag, (leads, qualified))| {
            let mean_post_engagement = engagement_by_tag
                .get(&tag)
                .and_then(|rates| mean(rates))
                .map(|m| round_to(m, 2));
            let stats = HashtagStats {
                hashtag: tag.clone(),
                leads,
                qualified,
                qualify_rate: round_to(percent(qualified as f64, leads as f64), 1),
                mean_post_engagement,
            };
            (tag, stats)
        })
        .collect();

    let best = first_seen
        .iter()
        .filter_map(|tag| hashtags.get(tag))
        .filter(|s| s.leads >= config.min_leads)
        .fold(None::<&HashtagStats>, |best, s| match best {
            Some(b) if b.qualify_rate >= s.qualify_rate => Some(b),
            _ => Some(s),
        })?
        .clone();

    Some(HashtagData { best, hashtags })
}

/// Insight that finds the hashtag bringing the best leads
pub struct HashtagPerformanceInsight;

impl HashtagPerformanceInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HashtagPerformanceInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for HashtagPerformanceInsight {
    fn id(&self) -> InsightKind {
        InsightKind::HashtagPerformance
    }

    fn name(&self) -> &'static str {
        "Hashtag Performance"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>> {
        let Some(analysis) = analyze_hashtags(
            &ctx.dataset.leads,
            ctx.prepared_posts(),
            &ctx.config.hashtags,
        ) else {
            return Ok(vec![]);
        };

        let best = &analysis.best;
        let priority = if best.qualify_rate >= HIGH_QUALIFY_RATE {
            Priority::High
        } else {
            Priority::Medium
        };

        let record = InsightRecord::new(
            self.id(),
            priority,
            format!("{} Brings the Best Leads", best.hashtag),
            format!(
                "{} of {} leads from {} qualified ({:.1}%)",
                best.qualified, best.leads, best.hashtag, best.qualify_rate
            ),
        )
        .with_action(format!("Use {} more often in your posts", best.hashtag))
        .with_data(serde_json::to_value(&analysis).unwrap_or_else(|_| json!({})));

        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::models::{Dataset, LeadOrigin, LeadStatus, Post};
    use chrono::NaiveDateTime;

    fn lead(tag: Option<&str>, status: LeadStatus) -> LeadRecord {
        let mut lead = LeadRecord::new(
            NaiveDateTime::parse_from_str("2024-01-01 10:00", "%Y-%m-%d %H:%M").unwrap(),
            "Lead",
            LeadOrigin::Instagram,
            status,
        );
        lead.hashtag = tag.map(String::from);
        lead
    }

    #[test]
    fn test_normalize_hashtag() {
        assert_eq!(normalize_hashtag("Vendas"), Some("#vendas".into()));
        assert_eq!(normalize_hashtag(" #Vendas "), Some("#vendas".into()));
        assert_eq!(normalize_hashtag("#"), None);
    }

    #[test]
    fn test_best_hashtag_by_qualify_rate() {
        let leads = vec![
            lead(Some("#dermato"), LeadStatus::Closed),
            lead(Some("dermato"), LeadStatus::Interested),
            lead(Some("#Dermato"), LeadStatus::Lost),
            lead(Some("#promo"), LeadStatus::New),
            lead(Some("#promo"), LeadStatus::New),
            lead(Some("#promo"), LeadStatus::Negotiating),
            // below the minimum lead count, never best
            lead(Some("#rare"), LeadStatus::Closed),
            lead(None, LeadStatus::Closed),
        ];
        let posts = vec![Post {
            id: "p".into(),
            caption: Some("Check this #dermato".into()),
            engagement_rate: Some(4.5),
            ..Default::default()
        }];
        let dataset = Dataset::new(posts, vec![], leads);
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let analysis =
            analyze_hashtags(&dataset.leads, ctx.prepared_posts(), &config.hashtags).unwrap();
        assert_eq!(analysis.best.hashtag, "#dermato");
        assert_eq!(analysis.best.leads, 3);
        assert_eq!(analysis.best.qualified, 2);
        assert_eq!(analysis.best.qualify_rate, 66.7);
        assert_eq!(analysis.best.mean_post_engagement, Some(4.5));
        assert_eq!(analysis.hashtags.len(), 3);
        assert_eq!(analysis.hashtags["#rare"].qualify_rate, 100.0);

        let records = HashtagPerformanceInsight::new().analyze(&ctx).unwrap();
        assert_eq!(records[0].priority, Priority::High);
    }

    #[test]
    fn test_tie_goes_to_first_seen_hashtag() {
        let leads = vec![
            lead(Some("#zeta"), LeadStatus::Closed),
            lead(Some("#alpha"), LeadStatus::Closed),
            lead(Some("#zeta"), LeadStatus::New),
            lead(Some("#alpha"), LeadStatus::New),
            lead(Some("#zeta"), LeadStatus::Lost),
            lead(Some("#alpha"), LeadStatus::Lost),
        ];
        let dataset = Dataset::new(vec![], vec![], leads);
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let analysis =
            analyze_hashtags(&dataset.leads, ctx.prepared_posts(), &config.hashtags).unwrap();
        assert_eq!(analysis.hashtags["#alpha"].qualify_rate, 33.3);
        assert_eq!(analysis.best.hashtag, "#zeta");
    }

    #[test]
    fn test_no_attributed_leads_no_record() {
        let dataset = Dataset::new(vec![], vec![], vec![lead(None, LeadStatus::Closed)]);
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);
        assert!(HashtagPerformanceInsight::new().analyze(&ctx).unwrap().is_empty());
    }
}

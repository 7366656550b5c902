//! Data preparation: derived post metrics and per-day aggregates
//!
//! Everything here is a pure in-memory transformation of the input tables.
//! Dates are grouped by calendar day in whatever single timezone the caller
//! supplied.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::config::ViralConfig;
use crate::error::{Error, Result};
use crate::models::{Dataset, LeadOrigin, LeadRecord, Post, SaleRecord};
use crate::stats::{finite_or_zero, mean, round_to};

/// Columns of the posts table that analyses may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostColumn {
    Timestamp,
    Kind,
    Reach,
    Saves,
    Comments,
    Likes,
    /// Supplied directly or derivable from likes/comments/saves/reach
    EngagementRate,
    Caption,
}

impl PostColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Kind => "kind",
            Self::Reach => "reach",
            Self::Saves => "saves",
            Self::Comments => "comments",
            Self::Likes => "likes",
            Self::EngagementRate => "engagement_rate",
            Self::Caption => "caption",
        }
    }
}

/// Whether any post carries a value for `column`
pub fn has_column(posts: &[Post], column: PostColumn) -> bool {
    posts.iter().any(|p| match column {
        PostColumn::Timestamp => p.timestamp.is_some(),
        PostColumn::Kind => p.kind.is_some(),
        PostColumn::Reach => p.reach.is_some(),
        PostColumn::Saves => p.saves.is_some(),
        PostColumn::Comments => p.comments.is_some(),
        PostColumn::Likes => p.likes.is_some(),
        PostColumn::EngagementRate => p.engagement_rate().is_some(),
        PostColumn::Caption => p.caption.is_some(),
    })
}

/// Fail with `MissingColumn` for the first absent column
pub fn require_columns(posts: &[Post], columns: &[PostColumn]) -> Result<()> {
    match columns.iter().find(|c| !has_column(posts, **c)) {
        Some(column) => Err(Error::MissingColumn {
            table: "posts",
            column: column.as_str(),
        }),
        None => Ok(()),
    }
}

/// A post with its derived metrics
#[derive(Debug, Clone)]
pub struct PreparedPost<'a> {
    pub post: &'a Post,
    pub engagement_rate: Option<f64>,
    pub save_rate: Option<f64>,
    pub viral_score: f64,
}

/// Attach engagement rate, save rate and viral score to every post
pub fn prepare_posts<'a>(posts: &'a [Post], config: &ViralConfig) -> Vec<PreparedPost<'a>> {
    let scores = viral_scores(posts, config);
    posts
        .iter()
        .zip(scores)
        .map(|(post, viral_score)| PreparedPost {
            post,
            engagement_rate: post.engagement_rate(),
            save_rate: post.save_rate().map(|r| round_to(r, 2)),
            viral_score,
        })
        .collect()
}

/// Viral score (0-100) of each post, relative to the batch maxima
///
/// When any of reach, engagement rate, saves or comments is absent from the
/// batch, every post gets `config.neutral_score`. A column whose maximum is
/// zero contributes nothing.
pub fn viral_scores(posts: &[Post], config: &ViralConfig) -> Vec<f64> {
    let required = [
        PostColumn::Reach,
        PostColumn::EngagementRate,
        PostColumn::Saves,
        PostColumn::Comments,
    ];
    if let Err(e) = require_columns(posts, &required) {
        if !posts.is_empty() {
            tracing::debug!(error = %e, "Viral score falls back to neutral");
        }
        return vec![config.neutral_score; posts.len()];
    }

    let reach: Vec<f64> = posts.iter().map(|p| p.reach.unwrap_or(0) as f64).collect();
    let engagement: Vec<f64> = posts
        .iter()
        .map(|p| p.engagement_rate().unwrap_or(0.0).max(0.0))
        .collect();
    let saves: Vec<f64> = posts.iter().map(|p| p.saves.unwrap_or(0) as f64).collect();
    let comments: Vec<f64> = posts
        .iter()
        .map(|p| p.comments.unwrap_or(0) as f64)
        .collect();

    let reach_norm = normalize(&reach);
    let engagement_norm = normalize(&engagement);
    let saves_norm = normalize(&saves);
    let comments_norm = normalize(&comments);

    (0..posts.len())
        .map(|i| {
            let score = reach_norm[i] * config.reach_weight
                + engagement_norm[i] * config.engagement_weight
                + saves_norm[i] * config.saves_weight
                + comments_norm[i] * config.comments_weight;
            round_to(finite_or_zero(score), 1).clamp(0.0, 100.0)
        })
        .collect()
}

/// Scale values to 0-100 against their maximum; all zeros when max is 0
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| finite_or_zero(v / max * 100.0))
        .collect()
}

/// Lowercased hashtags in a caption, in order of appearance
pub fn extract_hashtags(caption: &str) -> Vec<String> {
    static HASHTAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = HASHTAG_RE.get_or_init(|| Regex::new(r"#[\p{L}\p{N}_]+").expect("valid regex"));

    let mut tags: Vec<String> = Vec::new();
    for m in re.find_iter(caption) {
        let tag = m.as_str().to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Post activity for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPosts {
    pub date: NaiveDate,
    pub posts: usize,
    pub saves: u64,
    pub reach: u64,
    pub mean_engagement: Option<f64>,
    /// `saves / reach * 100` over the day, rounded to 2 decimals
    pub save_rate: Option<f64>,
}

/// Group posts by publication day; posts without a timestamp are skipped
pub fn daily_posts(posts: &[Post]) -> Vec<DailyPosts> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Post>> = BTreeMap::new();
    for post in posts {
        if let Some(day) = post.day() {
            by_day.entry(day).or_default().push(post);
        }
    }

    by_day
        .into_iter()
        .map(|(date, day_posts)| {
            let saves: u64 = day_posts.iter().map(|p| p.saves.unwrap_or(0)).sum();
            let reach: u64 = day_posts.iter().map(|p| p.reach.unwrap_or(0)).sum();
            let rates: Vec<f64> = day_posts.iter().filter_map(|p| p.engagement_rate()).collect();
            let save_rate =
                (reach > 0).then(|| round_to(saves as f64 / reach as f64 * 100.0, 2));
            DailyPosts {
                date,
                posts: day_posts.len(),
                saves,
                reach,
                mean_engagement: mean(&rates),
                save_rate,
            }
        })
        .collect()
}

/// Sales for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: f64,
    pub count: usize,
}

pub fn daily_sales(sales: &[SaleRecord]) -> Vec<DailySales> {
    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for sale in sales {
        let entry = by_day.entry(sale.date).or_insert((0.0, 0));
        entry.0 += sale.amount;
        entry.1 += 1;
    }
    by_day
        .into_iter()
        .map(|(date, (total, count))| DailySales { date, total, count })
        .collect()
}

/// Leads created on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLeads {
    pub date: NaiveDate,
    pub total: usize,
    pub instagram: usize,
}

pub fn daily_leads(leads: &[LeadRecord]) -> Vec<DailyLeads> {
    let mut by_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for lead in leads {
        let entry = by_day.entry(lead.day()).or_insert((0, 0));
        entry.0 += 1;
        if lead.origin == LeadOrigin::Instagram {
            entry.1 += 1;
        }
    }
    by_day
        .into_iter()
        .map(|(date, (total, instagram))| DailyLeads {
            date,
            total,
            instagram,
        })
        .collect()
}

/// Posts, sales and leads merged for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub posts: usize,
    pub saves: u64,
    pub reach: u64,
    pub mean_engagement: Option<f64>,
    pub save_rate: Option<f64>,
    pub sales_total: f64,
    pub sales_count: usize,
    pub leads: usize,
    pub instagram_leads: usize,
}

impl DailyAggregate {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            posts: 0,
            saves: 0,
            reach: 0,
            mean_engagement: None,
            save_rate: None,
            sales_total: 0.0,
            sales_count: 0,
            leads: 0,
            instagram_leads: 0,
        }
    }
}

/// Outer merge of the daily post, sale and lead aggregates
///
/// Only dates with some activity appear; the counters of a table with no
/// activity on that date are zero.
pub fn daily_aggregates(dataset: &Dataset) -> Vec<DailyAggregate> {
    let mut by_day: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();

    for day in daily_posts(&dataset.posts) {
        let entry = by_day
            .entry(day.date)
            .or_insert_with(|| DailyAggregate::empty(day.date));
        entry.posts = day.posts;
        entry.saves = day.saves;
        entry.reach = day.reach;
        entry.mean_engagement = day.mean_engagement;
        entry.save_rate = day.save_rate;
    }
    for day in daily_sales(&dataset.sales) {
        let entry = by_day
            .entry(day.date)
            .or_insert_with(|| DailyAggregate::empty(day.date));
        entry.sales_total = day.total;
        entry.sales_count = day.count;
    }
    for day in daily_leads(&dataset.leads) {
        let entry = by_day
            .entry(day.date)
            .or_insert_with(|| DailyAggregate::empty(day.date));
        entry.leads = day.total;
        entry.instagram_leads = day.instagram;
    }

    by_day.into_values().collect()
}

//! Domain models for gramsales
//!
//! Every table row keeps the fields a data source may omit as `Option`s.
//! A column counts as present in a table when at least one row carries a
//! value for it; analyses check presence before they run.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Kind of Instagram post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Image,
    Video,
    Carousel,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Carousel => "carousel",
        }
    }

    /// Label used in insight titles and recommendations
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Image => "Photos",
            Self::Video => "Videos/Reels",
            Self::Carousel => "Carousels",
        }
    }
}

impl std::str::FromStr for PostKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" | "photo" => Ok(Self::Image),
            "video" | "reel" | "reels" => Ok(Self::Video),
            "carousel" | "carousel_album" => Ok(Self::Carousel),
            _ => Err(format!("Unknown post kind: {}", s)),
        }
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One Instagram post (feed post, reel or carousel)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// Publication time
    pub timestamp: Option<NaiveDateTime>,
    pub kind: Option<PostKind>,
    pub reach: Option<u64>,
    pub saves: Option<u64>,
    pub comments: Option<u64>,
    pub likes: Option<u64>,
    /// Engagement rate as reported by the data source, in percent
    pub engagement_rate: Option<f64>,
    pub caption: Option<String>,
}

impl Post {
    /// Engagement rate in percent
    ///
    /// A value supplied by the data source wins; otherwise it is derived as
    /// `(likes + comments + saves) / reach * 100`, which needs `reach > 0`.
    pub fn engagement_rate(&self) -> Option<f64> {
        if let Some(rate) = self.engagement_rate {
            return rate.is_finite().then_some(rate);
        }
        let reach = self.reach.filter(|r| *r > 0)?;
        let interactions = self.likes? + self.comments? + self.saves?;
        Some(interactions as f64 / reach as f64 * 100.0)
    }

    /// Save rate (`saves / reach * 100`), undefined when reach is zero
    pub fn save_rate(&self) -> Option<f64> {
        let reach = self.reach.filter(|r| *r > 0)?;
        Some(self.saves? as f64 / reach as f64 * 100.0)
    }

    /// Calendar day of publication
    pub fn day(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }

    /// Hour of day of publication (0-23)
    pub fn hour(&self) -> Option<u32> {
        self.timestamp.map(|ts| ts.hour())
    }
}

/// Sale status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Confirmed,
    Pending,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" | "confirmada" | "paid" => Ok(Self::Confirmed),
            "pending" | "pendente" => Ok(Self::Pending),
            "cancelled" | "canceled" | "cancelada" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown sale status: {}", s)),
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded sale. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub customer_ref: String,
    /// Exact time the sale was recorded, when the source has it
    pub recorded_at: Option<NaiveDateTime>,
    pub seller: Option<String>,
    pub product: Option<String>,
    pub status: Option<SaleStatus>,
    pub payment_method: Option<String>,
    /// Commission as a fraction (0.3 = 30%)
    pub commission_rate: Option<f64>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl SaleRecord {
    pub fn new(date: NaiveDate, amount: f64, customer_ref: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            customer_ref: customer_ref.into(),
            recorded_at: None,
            seller: None,
            product: None,
            status: None,
            payment_method: None,
            commission_rate: None,
            customer_phone: None,
            customer_email: None,
        }
    }

    /// Sales without a status column are treated as confirmed
    pub fn is_confirmed(&self) -> bool {
        self.status.map_or(true, |s| s == SaleStatus::Confirmed)
    }
}

/// Where a lead came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadOrigin {
    Instagram,
    WhatsApp,
    Referral,
    Website,
    Event,
    FacebookAds,
    GoogleAds,
    /// Created from a sale with no prior lead
    Sale,
    Other,
}

impl LeadOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::WhatsApp => "whatsapp",
            Self::Referral => "referral",
            Self::Website => "website",
            Self::Event => "event",
            Self::FacebookAds => "facebook_ads",
            Self::GoogleAds => "google_ads",
            Self::Sale => "sale",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for LeadOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Self::Instagram),
            "whatsapp" => Ok(Self::WhatsApp),
            "referral" | "indicação" | "indicacao" => Ok(Self::Referral),
            "website" | "site" => Ok(Self::Website),
            "event" | "evento" => Ok(Self::Event),
            "facebook_ads" | "anúncio facebook" | "anuncio facebook" => Ok(Self::FacebookAds),
            "google_ads" | "google ads" => Ok(Self::GoogleAds),
            "sale" | "venda" => Ok(Self::Sale),
            "other" | "outro" => Ok(Self::Other),
            _ => Err(format!("Unknown lead origin: {}", s)),
        }
    }
}

impl std::fmt::Display for LeadOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a lead in the sales funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Interested,
    Negotiating,
    Closed,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Interested => "interested",
            Self::Negotiating => "negotiating",
            Self::Closed => "closed",
            Self::Lost => "lost",
        }
    }

    /// Funnel order, used for display
    pub fn all() -> &'static [LeadStatus] {
        &[
            Self::New,
            Self::Contacted,
            Self::Interested,
            Self::Negotiating,
            Self::Closed,
            Self::Lost,
        ]
    }

    /// Leads that showed real buying intent
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Interested | Self::Negotiating | Self::Closed)
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" | "novo" => Ok(Self::New),
            "contacted" | "contatado" => Ok(Self::Contacted),
            "interested" | "interessado" => Ok(Self::Interested),
            "negotiating" | "negociacao" | "negociação" => Ok(Self::Negotiating),
            "closed" | "fechado" => Ok(Self::Closed),
            "lost" | "perdido" => Ok(Self::Lost),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sales lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub created_at: NaiveDateTime,
    pub name: String,
    pub origin: LeadOrigin,
    pub status: LeadStatus,
    pub seller: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Lead quality score, 1-10
    pub score: Option<u8>,
    pub estimated_value: Option<f64>,
    /// Campaign hashtag that brought the lead in
    pub hashtag: Option<String>,
}

impl LeadRecord {
    pub fn new(
        created_at: NaiveDateTime,
        name: impl Into<String>,
        origin: LeadOrigin,
        status: LeadStatus,
    ) -> Self {
        Self {
            created_at,
            name: name.into(),
            origin,
            status,
            seller: None,
            phone: None,
            email: None,
            score: None,
            estimated_value: None,
            hashtag: None,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.created_at.date()
    }
}

/// One Instagram story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    pub date: NaiveDate,
    /// Hour of day the story was published (0-23)
    pub hour: u32,
    pub views: Option<u64>,
    pub link_clicks: u64,
    pub has_link: Option<bool>,
}

/// A business cost (ads, tools, salaries...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub recurring: bool,
}

/// Immutable snapshot of every input table for one analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub posts: Vec<Post>,
    pub sales: Vec<SaleRecord>,
    pub leads: Vec<LeadRecord>,
    pub stories: Vec<StoryRecord>,
    pub costs: Vec<CostRecord>,
}

impl Dataset {
    pub fn new(posts: Vec<Post>, sales: Vec<SaleRecord>, leads: Vec<LeadRecord>) -> Self {
        Self {
            posts,
            sales,
            leads,
            stories: Vec::new(),
            costs: Vec::new(),
        }
    }

    pub fn with_stories(mut self, stories: Vec<StoryRecord>) -> Self {
        self.stories = stories;
        self
    }

    pub fn with_costs(mut self, costs: Vec<CostRecord>) -> Self {
        self.costs = costs;
        self
    }
}

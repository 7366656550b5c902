//! CSV import for posts, sales, leads, stories and costs
//!
//! Headers are matched case-insensitively against a list of aliases, so
//! exports in English or Portuguese both load. Unknown columns are ignored
//! and absent optional columns become `None`. A value that is present but
//! cannot be parsed is an import error naming its line.

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    CostRecord, LeadOrigin, LeadRecord, LeadStatus, Post, PostKind, SaleRecord, StoryRecord,
};

const POST_ID: &[&str] = &["id", "post_id", "media_id"];
const POST_TIMESTAMP: &[&str] = &["timestamp", "date", "data", "published_at", "created_at"];
const POST_KIND: &[&str] = &["kind", "type", "media_type", "tipo"];
const POST_REACH: &[&str] = &["reach", "alcance"];
const POST_SAVES: &[&str] = &["saves", "saved", "salvos", "salvamentos"];
const POST_COMMENTS: &[&str] = &["comments", "comments_count", "comentarios", "comentários"];
const POST_LIKES: &[&str] = &["likes", "like_count", "curtidas"];
const POST_ENGAGEMENT: &[&str] = &["engagement_rate", "engajamento", "taxa_engajamento"];
const POST_CAPTION: &[&str] = &["caption", "legenda", "text"];

const SALE_DATE: &[&str] = &["date", "data", "data_venda", "created_at"];
const SALE_AMOUNT: &[&str] = &["amount", "valor", "preco", "preço", "price"];
const SALE_CUSTOMER: &[&str] = &["customer", "customer_ref", "customer_name", "cliente", "nome_cliente"];
const SALE_RECORDED_AT: &[&str] = &["recorded_at", "timestamp", "datetime", "data_hora"];
const SALE_SELLER: &[&str] = &["seller", "vendedor"];
const SALE_PRODUCT: &[&str] = &["product", "produto"];
const SALE_STATUS: &[&str] = &["status"];
const SALE_PAYMENT: &[&str] = &["payment_method", "forma_pagamento", "pagamento"];
const SALE_COMMISSION: &[&str] = &["commission_rate", "commission", "comissao", "comissão"];
const SALE_PHONE: &[&str] = &["customer_phone", "phone", "telefone", "whatsapp"];
const SALE_EMAIL: &[&str] = &["customer_email", "email"];

const LEAD_CREATED_AT: &[&str] = &["created_at", "date", "data", "data_criacao"];
const LEAD_NAME: &[&str] = &["name", "nome"];
const LEAD_ORIGIN: &[&str] = &["origin", "origem", "source"];
const LEAD_STATUS: &[&str] = &["status"];
const LEAD_SELLER: &[&str] = &["seller", "vendedor"];
const LEAD_PHONE: &[&str] = &["phone", "telefone", "whatsapp"];
const LEAD_EMAIL: &[&str] = &["email"];
const LEAD_SCORE: &[&str] = &["score", "pontuacao", "pontuação"];
const LEAD_VALUE: &[&str] = &["estimated_value", "valor_estimado"];
const LEAD_HASHTAG: &[&str] = &["hashtag", "hashtag_origem"];

const STORY_DATE: &[&str] = &["date", "data", "timestamp"];
const STORY_HOUR: &[&str] = &["hour", "hora"];
const STORY_VIEWS: &[&str] = &["views", "visualizacoes", "visualizações", "impressions"];
const STORY_CLICKS: &[&str] = &["link_clicks", "clicks", "cliques_link"];
const STORY_HAS_LINK: &[&str] = &["has_link", "tem_link"];

const COST_DATE: &[&str] = &["date", "data"];
const COST_DESCRIPTION: &[&str] = &["description", "descricao", "descrição"];
const COST_CATEGORY: &[&str] = &["category", "categoria"];
const COST_AMOUNT: &[&str] = &["amount", "valor"];
const COST_RECURRING: &[&str] = &["recurring", "recorrente"];

/// Category for costs exported without one
const DEFAULT_COST_CATEGORY: &str = "other";

fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Header positions, looked up by alias
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
                .collect(),
        }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
    }
}

/// One CSV row with its line number for error messages
struct Row<'a> {
    record: &'a StringRecord,
    line: u64,
}

impl<'a> Row<'a> {
    fn get(&self, column: Option<usize>) -> Option<&'a str> {
        column
            .and_then(|i| self.record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn required(&self, column: Option<usize>, name: &str) -> Result<&'a str> {
        self.get(column).ok_or_else(|| self.error(format!("missing {}", name)))
    }

    fn parse<T>(
        &self,
        column: Option<usize>,
        name: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(column) {
            Some(value) => parse(value)
                .map(Some)
                .ok_or_else(|| self.error(format!("invalid {} '{}'", name, value))),
            None => Ok(None),
        }
    }

    fn error(&self, message: String) -> Error {
        Error::Import(format!("line {}: {}", self.line, message))
    }
}

fn rows<R: Read>(
    reader: R,
    mut each: impl FnMut(&Columns, &Row<'_>) -> Result<()>,
) -> Result<usize> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);

    let mut count = 0;
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);
        each(&columns, &Row { record: &record, line })?;
        count += 1;
    }
    Ok(count)
}

/// Parse Instagram posts
pub fn read_posts<R: Read>(reader: R) -> Result<Vec<Post>> {
    let mut posts = Vec::new();

    rows(reader, |cols, row| {
        let kind = row.get(cols.find(POST_KIND)).and_then(|k| match k.parse::<PostKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                debug!(line = row.line, error = %e, "Ignoring post kind");
                None
            }
        });

        posts.push(Post {
            id: row
                .get(cols.find(POST_ID))
                .map(String::from)
                .unwrap_or_else(|| format!("row-{}", row.line)),
            timestamp: row.parse(cols.find(POST_TIMESTAMP), "timestamp", parse_datetime)?,
            kind,
            reach: row.parse(cols.find(POST_REACH), "reach", parse_count)?,
            saves: row.parse(cols.find(POST_SAVES), "saves", parse_count)?,
            comments: row.parse(cols.find(POST_COMMENTS), "comments", parse_count)?,
            likes: row.parse(cols.find(POST_LIKES), "likes", parse_count)?,
            engagement_rate: row.parse(cols.find(POST_ENGAGEMENT), "engagement rate", |v| {
                parse_amount(v.trim_end_matches('%'))
            })?,
            caption: row.get(cols.find(POST_CAPTION)).map(String::from),
        });
        Ok(())
    })?;

    debug!(count = posts.len(), "Imported posts");
    Ok(posts)
}

/// Parse sales
///
/// A datetime in the date column also fills `recorded_at` when no separate
/// timestamp column exists.
pub fn read_sales<R: Read>(reader: R) -> Result<Vec<SaleRecord>> {
    let mut sales = Vec::new();

    rows(reader, |cols, row| {
        let date_value = row.required(cols.find(SALE_DATE), "date")?;
        let date_time = parse_datetime(date_value)
            .ok_or_else(|| row.error(format!("invalid date '{}'", date_value)))?;
        let amount = row
            .parse(cols.find(SALE_AMOUNT), "amount", parse_amount)?
            .ok_or_else(|| row.error("missing amount".into()))?;

        let mut sale = SaleRecord::new(
            date_time.date(),
            amount,
            row.get(cols.find(SALE_CUSTOMER)).unwrap_or_default(),
        );
        sale.recorded_at = row
            .parse(cols.find(SALE_RECORDED_AT), "recorded_at", parse_datetime)?
            .or_else(|| has_time_part(date_value).then_some(date_time));
        sale.seller = row.get(cols.find(SALE_SELLER)).map(String::from);
        sale.product = row.get(cols.find(SALE_PRODUCT)).map(String::from);
        sale.status = row.parse(cols.find(SALE_STATUS), "status", |v| v.parse().ok())?;
        sale.payment_method = row.get(cols.find(SALE_PAYMENT)).map(String::from);
        sale.commission_rate =
            row.parse(cols.find(SALE_COMMISSION), "commission rate", parse_rate)?;
        sale.customer_phone = row.get(cols.find(SALE_PHONE)).map(String::from);
        sale.customer_email = row.get(cols.find(SALE_EMAIL)).map(String::from);

        sales.push(sale);
        Ok(())
    })?;

    debug!(count = sales.len(), "Imported sales");
    Ok(sales)
}

/// Parse leads; an unknown origin becomes `Other`, a missing status `New`
pub fn read_leads<R: Read>(reader: R) -> Result<Vec<LeadRecord>> {
    let mut leads = Vec::new();

    rows(reader, |cols, row| {
        let created_at = row
            .parse(cols.find(LEAD_CREATED_AT), "created_at", parse_datetime)?
            .ok_or_else(|| row.error("missing created_at".into()))?;
        let origin = row
            .get(cols.find(LEAD_ORIGIN))
            .and_then(|o| o.parse().ok())
            .unwrap_or(LeadOrigin::Other);
        let status = row
            .parse(cols.find(LEAD_STATUS), "status", |v| v.parse::<LeadStatus>().ok())?
            .unwrap_or(LeadStatus::New);

        let mut lead = LeadRecord::new(
            created_at,
            row.get(cols.find(LEAD_NAME)).unwrap_or_default(),
            origin,
            status,
        );
        lead.seller = row.get(cols.find(LEAD_SELLER)).map(String::from);
        lead.phone = row.get(cols.find(LEAD_PHONE)).map(String::from);
        lead.email = row.get(cols.find(LEAD_EMAIL)).map(String::from);
        lead.score = row.parse(cols.find(LEAD_SCORE), "score", |v| {
            parse_count(v).and_then(|s| u8::try_from(s).ok())
        })?;
        lead.estimated_value =
            row.parse(cols.find(LEAD_VALUE), "estimated value", parse_amount)?;
        lead.hashtag = row.get(cols.find(LEAD_HASHTAG)).map(String::from);

        leads.push(lead);
        Ok(())
    })?;

    debug!(count = leads.len(), "Imported leads");
    Ok(leads)
}

/// Parse stories; the hour comes from its own column or the date's time
pub fn read_stories<R: Read>(reader: R) -> Result<Vec<StoryRecord>> {
    let mut stories = Vec::new();

    rows(reader, |cols, row| {
        let at = row
            .parse(cols.find(STORY_DATE), "date", parse_datetime)?
            .ok_or_else(|| row.error("missing date".into()))?;
        let hour = row
            .parse(cols.find(STORY_HOUR), "hour", |v| {
                parse_count(v)
                    .and_then(|h| u32::try_from(h).ok())
                    .filter(|h| *h < 24)
            })?
            .unwrap_or_else(|| at.hour());

        stories.push(StoryRecord {
            date: at.date(),
            hour,
            views: row.parse(cols.find(STORY_VIEWS), "views", parse_count)?,
            link_clicks: row
                .parse(cols.find(STORY_CLICKS), "link clicks", parse_count)?
                .unwrap_or(0),
            has_link: row.parse(cols.find(STORY_HAS_LINK), "has_link", parse_bool)?,
        });
        Ok(())
    })?;

    debug!(count = stories.len(), "Imported stories");
    Ok(stories)
}

/// Parse business costs
pub fn read_costs<R: Read>(reader: R) -> Result<Vec<CostRecord>> {
    let mut costs = Vec::new();

    rows(reader, |cols, row| {
        let date = row
            .parse(cols.find(COST_DATE), "date", parse_datetime)?
            .ok_or_else(|| row.error("missing date".into()))?
            .date();
        let amount = row
            .parse(cols.find(COST_AMOUNT), "amount", parse_amount)?
            .ok_or_else(|| row.error("missing amount".into()))?;

        costs.push(CostRecord {
            date,
            description: row
                .get(cols.find(COST_DESCRIPTION))
                .unwrap_or_default()
                .to_string(),
            category: row
                .get(cols.find(COST_CATEGORY))
                .unwrap_or(DEFAULT_COST_CATEGORY)
                .to_lowercase(),
            amount,
            recurring: row
                .parse(cols.find(COST_RECURRING), "recurring", parse_bool)?
                .unwrap_or(false),
        });
        Ok(())
    })?;

    debug!(count = costs.len(), "Imported costs");
    Ok(costs)
}

fn has_time_part(s: &str) -> bool {
    s.contains(':')
}

/// Parse a date or datetime in the common export formats
///
/// Plain dates are taken at midnight. Offsets are dropped, keeping the
/// local wall-clock time.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    for fmt in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let date_formats = [
        "%Y-%m-%d", // 2024-01-15
        "%d/%m/%Y", // 15/01/2024
        "%d/%m/%y", // 15/01/24
        "%Y/%m/%d", // 2024/01/15
    ];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

/// Parse a money amount: "1997", "1,997.00", "R$ 1.997,00", "(50)"
pub fn parse_amount(s: &str) -> Option<f64> {
    let reais = s.contains("R$");
    let mut cleaned: String = s
        .trim()
        .replace("R$", "")
        .replace(['$', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // 1.997,00
        (Some(dot), Some(comma)) if comma > dot => {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        }
        // 1,997.00
        (Some(_), Some(_)) => {
            cleaned = cleaned.replace(',', "");
        }
        // 1.997.000, or R$ 1.997 (thousands)
        (Some(dot), None)
            if cleaned.matches('.').count() > 1 || (reais && cleaned.len() - dot - 1 == 3) =>
        {
            cleaned = cleaned.replace('.', "");
        }
        // 19,90 (decimal) vs 1,997 (thousands)
        (None, Some(comma)) => {
            cleaned = if cleaned.len() - comma - 1 <= 2 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            };
        }
        _ => {}
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a non-negative count; "1,234" and "12.0" are accepted
fn parse_count(s: &str) -> Option<u64> {
    if let Ok(n) = s.trim().parse::<u64>() {
        return Some(n);
    }
    parse_amount(s)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as u64)
}

/// Commission as a fraction; "30", "30%" and "0.3" all mean 30%
fn parse_rate(s: &str) -> Option<f64> {
    let value = parse_amount(s.trim_end_matches('%'))?;
    if value < 0.0 {
        return None;
    }
    Some(if value > 1.0 { value / 100.0 } else { value })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "sim" | "s" => Some(true),
        "false" | "0" | "no" | "n" | "nao" | "não" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SaleStatus;

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(19, 45, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-15 19:45:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15T19:45:00+0000"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15T19:45:00-03:00"), Some(expected));
        assert_eq!(parse_datetime("15/01/2024 19:45"), Some(expected));
        assert_eq!(
            parse_datetime("15/01/2024").map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1997"), Some(1997.0));
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("R$ 1.997,00"), Some(1997.0));
        assert_eq!(parse_amount("19,90"), Some(19.9));
        assert_eq!(parse_amount("1,997"), Some(1997.0));
        assert_eq!(parse_amount("(100.00)"), Some(-100.0));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_parse_amount_dot_thousands() {
        assert_eq!(parse_amount("R$ 1.997"), Some(1997.0));
        assert_eq!(parse_amount("1.997.000"), Some(1_997_000.0));
        assert_eq!(parse_amount("R$ 19.90"), Some(19.9));
        assert_eq!(parse_amount("19.90"), Some(19.9));
        assert_eq!(parse_amount("1.5"), Some(1.5));

        let csv = "data,valor,cliente\n2024-01-01,R$ 1.997,Ana\n";
        let sales = read_sales(csv.as_bytes()).unwrap();
        assert_eq!(sales[0].amount, 1997.0);
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30"), Some(0.3));
        assert_eq!(parse_rate("30%"), Some(0.3));
        assert_eq!(parse_rate("0.25"), Some(0.25));
        assert_eq!(parse_rate("-1"), None);
    }

    #[test]
    fn test_read_posts() {
        let csv = "\
Timestamp,Media_Type,Reach,Saves,Comments,Likes,Caption,Unused
2024-01-05T19:45:00+0000,REELS,1000,50,10,100,Great #tips,x
2024-01-06 09:00:00,STORY,,,,,,
";
        let posts = read_posts(csv.as_bytes()).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].kind, Some(PostKind::Video));
        assert_eq!(posts[0].reach, Some(1000));
        assert_eq!(posts[0].hour(), Some(19));
        assert_eq!(posts[0].engagement_rate(), Some(16.0));
        assert_eq!(posts[0].id, "row-2");
        // unknown kinds and empty cells are just absent
        assert_eq!(posts[1].kind, None);
        assert_eq!(posts[1].saves, None);
        assert_eq!(posts[1].caption, None);
    }

    #[test]
    fn test_read_posts_invalid_number_names_line() {
        let csv = "id,reach\np1,100\np2,lots\n";
        let err = read_posts(csv.as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 3"), "{}", message);
        assert!(message.contains("reach"));
    }

    #[test]
    fn test_read_sales_with_portuguese_headers() {
        let csv = "\
data_venda,valor,cliente,vendedor,status,comissao,telefone
2024-03-05 14:30:00,\"R$ 1.997,00\",Maria,ana,confirmada,30,(11) 99999-0000
06/03/2024,997,João,,pendente,,
";
        let sales = read_sales(csv.as_bytes()).unwrap();
        assert_eq!(sales.len(), 2);

        assert_eq!(sales[0].amount, 1997.0);
        assert_eq!(sales[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(sales[0].recorded_at.map(|t| t.hour()), Some(14));
        assert_eq!(sales[0].status, Some(SaleStatus::Confirmed));
        assert_eq!(sales[0].commission_rate, Some(0.3));
        assert_eq!(sales[0].customer_phone.as_deref(), Some("(11) 99999-0000"));

        assert_eq!(sales[1].date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        assert_eq!(sales[1].recorded_at, None);
        assert_eq!(sales[1].seller, None);
        assert_eq!(sales[1].status, Some(SaleStatus::Pending));
    }

    #[test]
    fn test_read_sales_requires_amount() {
        let csv = "date,customer\n2024-03-05,Maria\n";
        let err = read_sales(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
        assert!(err.to_string().contains("missing amount"));
    }

    #[test]
    fn test_read_leads() {
        let csv = "\
nome,origem,status,data_criacao,pontuacao,hashtag,valor_estimado
Maria,Instagram,interessado,2024-03-01 10:00:00,8,#dermato,1997
Ana,Carrier Pigeon,,2024-03-02,,,
";
        let leads = read_leads(csv.as_bytes()).unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].origin, LeadOrigin::Instagram);
        assert_eq!(leads[0].status, LeadStatus::Interested);
        assert_eq!(leads[0].score, Some(8));
        assert_eq!(leads[0].hashtag.as_deref(), Some("#dermato"));
        assert_eq!(leads[0].estimated_value, Some(1997.0));
        assert_eq!(leads[1].origin, LeadOrigin::Other);
        assert_eq!(leads[1].status, LeadStatus::New);
    }

    #[test]
    fn test_read_leads_rejects_unknown_status() {
        let csv = "name,status,created_at\nMaria,maybe,2024-03-01\n";
        assert!(read_leads(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_read_stories_hour_from_timestamp() {
        let csv = "\
date,hour,views,link_clicks,has_link
2024-03-01,20,500,12,sim
2024-03-02 09:15:00,,300,,
";
        let stories = read_stories(csv.as_bytes()).unwrap();
        assert_eq!(stories[0].hour, 20);
        assert_eq!(stories[0].link_clicks, 12);
        assert_eq!(stories[0].has_link, Some(true));
        assert_eq!(stories[1].hour, 9);
        assert_eq!(stories[1].link_clicks, 0);
        assert_eq!(stories[1].has_link, None);
    }

    #[test]
    fn test_read_costs() {
        let csv = "\
data,descricao,categoria,valor,recorrente
2024-03-01,Meta Ads,Ads,\"1.500,00\",sim
2024-03-02,Coffee,,25,
";
        let costs = read_costs(csv.as_bytes()).unwrap();
        assert_eq!(costs[0].category, "ads");
        assert_eq!(costs[0].amount, 1500.0);
        assert!(costs[0].recurring);
        assert_eq!(costs[1].category, "other");
        assert!(!costs[1].recurring);
    }

    #[test]
    fn test_header_only_file_is_empty() {
        assert!(read_sales("date,amount\n".as_bytes()).unwrap().is_empty());
    }
}

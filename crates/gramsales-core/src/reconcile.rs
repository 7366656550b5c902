//! Keep the lead list in step with recorded sales
//!
//! A sale closes the lead it came from. Matching is by phone first (digits
//! only), then by email (case-insensitive). A sale with no matching lead
//! creates a new, already closed one.

use serde::Serialize;

use crate::models::{LeadOrigin, LeadRecord, LeadStatus, SaleRecord};

/// Score given to leads created straight from a sale
pub const SALE_LEAD_SCORE: u8 = 10;

/// What to do with the lead list for one sale
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", content = "lead", rename_all = "snake_case")]
pub enum LeadAction {
    /// Sale has no contact details to match on
    Skip,
    /// Mark the lead at this index as closed
    Close(usize),
    /// Add this lead
    Create(LeadRecord),
}

fn phone_digits(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    (!digits.is_empty()).then_some(digits)
}

fn email_key(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

/// Decide how `sale` changes `leads`
pub fn reconcile_sale(leads: &[LeadRecord], sale: &SaleRecord) -> LeadAction {
    let phone = sale.customer_phone.as_deref().and_then(phone_digits);
    let email = sale.customer_email.as_deref().and_then(email_key);

    if phone.is_none() && email.is_none() {
        return LeadAction::Skip;
    }

    if let Some(phone) = &phone {
        let found = leads.iter().position(|l| {
            l.phone.as_deref().and_then(phone_digits).as_ref() == Some(phone)
        });
        if let Some(index) = found {
            return LeadAction::Close(index);
        }
    }

    if let Some(email) = &email {
        let found = leads
            .iter()
            .position(|l| l.email.as_deref().and_then(email_key).as_ref() == Some(email));
        if let Some(index) = found {
            return LeadAction::Close(index);
        }
    }

    let created_at = sale
        .recorded_at
        .unwrap_or_else(|| sale.date.and_time(chrono::NaiveTime::MIN));
    let mut lead = LeadRecord::new(
        created_at,
        sale.customer_ref.clone(),
        LeadOrigin::Sale,
        LeadStatus::Closed,
    );
    lead.seller = sale.seller.clone();
    lead.phone = sale.customer_phone.clone();
    lead.email = sale.customer_email.clone();
    lead.score = Some(SALE_LEAD_SCORE);
    lead.estimated_value = Some(sale.amount);
    LeadAction::Create(lead)
}

/// Apply every sale to `leads` in order, returning how many leads were
/// closed and created
pub fn apply_sales(leads: &mut Vec<LeadRecord>, sales: &[SaleRecord]) -> (usize, usize) {
    let mut closed = 0;
    let mut created = 0;

    for sale in sales.iter().filter(|s| s.is_confirmed()) {
        match reconcile_sale(leads, sale) {
            LeadAction::Skip => {}
            LeadAction::Close(index) => {
                if leads[index].status != LeadStatus::Closed {
                    leads[index].status = LeadStatus::Closed;
                    closed += 1;
                }
            }
            LeadAction::Create(lead) => {
                leads.push(lead);
                created += 1;
            }
        }
    }

    tracing::debug!(closed, created, "Reconciled sales with leads");
    (closed, created)
}

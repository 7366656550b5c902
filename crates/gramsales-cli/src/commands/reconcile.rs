//! Lead reconciliation command

use anyhow::Result;
use gramsales_core::reconcile::apply_sales;

use super::load_dataset;
use crate::cli::DataFiles;

pub fn cmd_reconcile(files: &DataFiles, json: bool) -> Result<()> {
    let dataset = load_dataset(files)?;
    let mut leads = dataset.leads;

    let before = leads.len();
    let (closed, created) = apply_sales(&mut leads, &dataset.sales);

    if json {
        println!("{}", serde_json::to_string_pretty(&leads)?);
        return Ok(());
    }

    println!("🔗 Reconciled {} sales against {} leads", dataset.sales.len(), before);
    println!("   ✅ Leads closed:  {}", closed);
    println!("   ➕ Leads created: {}", created);

    if closed + created == 0 {
        println!();
        println!("   💡 Tip: include customer phone or email in the sales export to match leads");
    }

    Ok(())
}

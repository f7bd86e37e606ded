use crate::cache::*;
use crate::entity_resolver::*;
use crate::errors::*;
use crate::settings::*;
use crate::types::*;
use crate::ynab_client::*;
use crate::ynab_models::*;

/// Rewrites every rollover transaction's amount to zero, leaving the
/// transactions themselves (and the audit trail they form) in place.  This
/// returns all category balances to their natural state, for people who want
/// to stop using the tool without deleting months of history by hand.
pub struct ZeroProcessor;

impl ZeroProcessor {
    pub fn run(cache: &Cache, ynab_client: &YnabBudgetClient, settings: &Settings) -> Result<()> {
        let rollover_payee_id =
            EntityResolver::new(cache, ynab_client, settings).resolve_rollover_payee_id()?;
        // Fetch fresh rather than trusting the cached snapshot: zeroing is a
        // one-off and must cover every transaction that exists right now.
        println!("Getting rollover transactions from YNAB...");
        let transactions = ynab_client
            .get_transactions_by_payee(&rollover_payee_id, None, None)?
            .transactions;
        let updates = build_zero_updates(transactions);
        if updates.is_empty() {
            println!("No rollover transactions with a non-zero amount; nothing to do!");
            return Ok(());
        }
        println!(
            "Zeroing {} rollover transaction{}.",
            updates.len(),
            if updates.len() == 1 { "" } else { "s" }
        );
        if settings.dry_run {
            println!();
            println!("NOTE: No changes were actually saved.");
            println!("Re-run with '--yes' to save the changes to YNAB.");
        } else {
            ynab_client.update_transactions(updates)?;
            println!("All done.");
        }
        Ok(())
    }
}

/// Zeroed updates for every live transaction that isn't already zero; all
/// other fields are carried over unchanged.
fn build_zero_updates(transactions: Vec<HybridTransaction>) -> Vec<UpdateTransaction> {
    transactions
        .into_iter()
        .filter(|transaction| !transaction.deleted && !transaction.amount.is_zero())
        .map(|transaction| UpdateTransaction {
            id: transaction.id,
            account_id: transaction.account_id,
            date: transaction.date,
            amount: Milliunits::zero(),
            payee_id: transaction.payee_id,
            payee_name: None,
            category_id: transaction.category_id,
            memo: transaction.memo,
            cleared: Some(transaction.cleared),
            approved: Some(transaction.approved),
        })
        .collect()
}

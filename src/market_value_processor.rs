use chrono::NaiveDate;
use log::debug;

use crate::constants::*;
use crate::errors::*;
use crate::market_price_client::*;
use crate::settings::*;
use crate::types::*;
use crate::ynab_client::*;
use crate::ynab_models::*;

/// Marks tracking accounts to market.  Any open account whose note reads
/// "Balance: <quantity> <symbol>" is valued at the current USD spot price,
/// and the difference from the recorded balance is booked as a "Market
/// Change" transaction dated today.  Re-runs on the same day fold the
/// difference into that day's existing transaction instead of stacking new
/// ones.
pub struct MarketValueProcessor;

impl MarketValueProcessor {
    pub fn run(ynab_client: &YnabBudgetClient, settings: &Settings) -> Result<()> {
        let price_client = MarketPriceClient::new();
        let today = chrono::Local::today().naive_local();
        println!("Getting accounts from YNAB...");
        let accounts = ynab_client.get_accounts()?;

        let mut create_transactions = Vec::new();
        let mut update_transactions = Vec::new();
        for account in accounts {
            if account.closed || account.deleted {
                continue;
            }
            let (quantity, symbol) = match account.note.as_ref().and_then(|n| parse_market_balance(n))
            {
                Some(parsed) => parsed,
                None => continue,
            };
            // TODO: quote in the budget's own currency once the budget
            // settings endpoint is wired in; this assumes a USD budget.
            let price = price_client.get_usd_price(&symbol)?;
            let current_value = market_value(quantity, price);
            let delta = current_value - account.balance;
            if delta.is_zero() {
                debug!("Account {} is already marked to market", account.name);
                continue;
            }
            let existing = ynab_client
                .get_transactions_by_account(&account.id, Some(today))?
                .transactions
                .into_iter()
                .find(|t| {
                    !t.deleted
                        && t.date == today
                        && t.payee_name.as_deref() == Some(MARKET_CHANGE_PAYEE_NAME)
                });
            match existing {
                Some(existing) => {
                    let amount = existing.amount + delta;
                    println!(
                        "Updating market change for {} by {} to {} ({} {} at {} USD)",
                        account.name, delta, amount, quantity, symbol, price
                    );
                    update_transactions.push(UpdateTransaction {
                        id: existing.id,
                        account_id: existing.account_id,
                        date: today,
                        amount,
                        payee_id: existing.payee_id,
                        payee_name: None,
                        category_id: existing.category_id,
                        memo: existing.memo,
                        cleared: Some(existing.cleared),
                        approved: Some(existing.approved),
                    });
                }
                None => {
                    println!(
                        "Adding market change for {} of {} ({} {} at {} USD)",
                        account.name, delta, quantity, symbol, price
                    );
                    create_transactions.push(market_change_transaction(
                        account.id.clone(),
                        today,
                        delta,
                    ));
                }
            }
        }

        if create_transactions.is_empty() && update_transactions.is_empty() {
            println!("No market value changes; nothing to do!");
            return Ok(());
        }
        if settings.dry_run {
            println!();
            println!("NOTE: No changes were actually saved.");
            println!("Re-run with '--yes' to save the changes to YNAB.");
            return Ok(());
        }
        if !create_transactions.is_empty() {
            ynab_client.create_transactions(create_transactions)?;
        }
        if !update_transactions.is_empty() {
            ynab_client.update_transactions(update_transactions)?;
        }
        println!("All done.");
        Ok(())
    }
}

/// Quantity and symbol from an account note like "Balance: 0.521 BTC".
fn parse_market_balance(note: &str) -> Option<(f64, String)> {
    MARKET_BALANCE_REGEX.captures(note).and_then(|captures| {
        captures[1]
            .parse::<f64>()
            .ok()
            .map(|quantity| (quantity, captures[2].to_string()))
    })
}

/// Rounded to whole milliunits; sub-milliunit precision has no
/// representation in the ledger.
fn market_value(quantity: f64, usd_price: f64) -> Milliunits {
    Milliunits::from_scaled_i64((quantity * usd_price * 1_000.0).round() as i64)
}

fn market_change_transaction(
    account_id: YnabAccountId,
    date: NaiveDate,
    amount: Milliunits,
) -> SaveTransaction {
    SaveTransaction {
        account_id,
        date,
        amount,
        payee_id: None,
        payee_name: Some(MARKET_CHANGE_PAYEE_NAME.to_string()),
        category_id: None,
        memo: None,
        cleared: Some(Cleared::Cleared),
        approved: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_balance() {
        assert_eq!(
            parse_market_balance("Balance: 0.521 BTC"),
            Some((0.521, "BTC".to_string()))
        );
        assert_eq!(
            parse_market_balance("Balance: -2 VTSAX Admiral"),
            Some((-2.0, "VTSAX Admiral".to_string()))
        );
        assert_eq!(parse_market_balance("0.521 BTC"), None);
        assert_eq!(parse_market_balance("Balance: lots of BTC"), None);
        assert_eq!(parse_market_balance(""), None);
    }

    #[test]
    fn test_market_value_rounds_to_milliunits() {
        assert_eq!(
            market_value(0.5, 10_000.0),
            Milliunits::from_scaled_i64(5_000_000)
        );
        assert_eq!(
            market_value(0.333_333_3, 3.0),
            Milliunits::from_scaled_i64(1_000)
        );
    }
}

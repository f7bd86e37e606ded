use log::debug;

use crate::cache::*;
use crate::errors::*;
use crate::settings::*;
use crate::types::*;
use crate::utilities::*;
use crate::ynab_client::*;
use crate::ynab_models::*;

/// The locally cached, consistent view the reconciliation engine runs over.
#[derive(Debug)]
pub struct BudgetSnapshot {
    pub months: Vec<MonthDetail>,
    pub rollover_transactions: Vec<HybridTransaction>,
}

/// Keeps the cached months and rollover transactions current using the
/// service's incremental sync: only records changed since the last stored
/// server knowledge token are fetched and merged.  Full-history refetching
/// would be far too expensive to do on every run.
pub struct MonthSynchronizer<'a> {
    cache: &'a Cache,
    ynab_client: &'a YnabBudgetClient<'a>,
    settings: &'a Settings,
}

impl<'a> MonthSynchronizer<'a> {
    pub fn new(
        cache: &'a Cache,
        ynab_client: &'a YnabBudgetClient,
        settings: &'a Settings,
    ) -> MonthSynchronizer<'a> {
        MonthSynchronizer {
            cache,
            ynab_client,
            settings,
        }
    }

    pub fn sync(
        &self,
        rollover_payee_id: &YnabPayeeId,
        horizon: MonthKey,
    ) -> Result<BudgetSnapshot> {
        let months = self.sync_months(horizon)?;
        let rollover_transactions = self.sync_rollover_transactions(rollover_payee_id)?;
        Ok(BudgetSnapshot {
            months,
            rollover_transactions,
        })
    }

    fn sync_months(&self, horizon: MonthKey) -> Result<Vec<MonthDetail>> {
        let knowledge_key = self.settings.months_knowledge_key();
        let data_key = self.settings.months_data_key();
        let last_knowledge = self.cache.get::<i64>(&knowledge_key)?;
        let summaries = self.ynab_client.get_budget_months(last_knowledge)?;
        let mut months = self
            .cache
            .get::<Vec<MonthDetail>>(&data_key)?
            .unwrap_or_default();
        if !summaries.months.is_empty() {
            println!(
                "Syncing {} changed month{} from YNAB...",
                summaries.months.len(),
                if summaries.months.len() == 1 { "" } else { "s" }
            );
            for summary in summaries.months {
                if summary.deleted {
                    remove_month(&mut months, summary.month);
                } else {
                    let detail = self.ynab_client.get_budget_month(summary.month)?;
                    merge_month(&mut months, detail);
                }
            }
            sort_and_prune_months(&mut months, horizon);
            self.cache.put(&data_key, &months)?;
            self.cache.put(&knowledge_key, &summaries.server_knowledge)?;
        } else {
            debug!("No months changed since last run");
        }
        Ok(months)
    }

    fn sync_rollover_transactions(
        &self,
        rollover_payee_id: &YnabPayeeId,
    ) -> Result<Vec<HybridTransaction>> {
        let knowledge_key = self.settings.rollover_transactions_knowledge_key();
        let data_key = self.settings.rollover_transactions_data_key();
        let last_knowledge = self.cache.get::<i64>(&knowledge_key)?;
        let changed = self
            .ynab_client
            .get_transactions_by_payee(rollover_payee_id, None, last_knowledge)?;
        let mut transactions = self
            .cache
            .get::<Vec<HybridTransaction>>(&data_key)?
            .unwrap_or_default();
        if !changed.transactions.is_empty() {
            println!(
                "Syncing {} changed rollover transaction{} from YNAB...",
                changed.transactions.len(),
                if changed.transactions.len() == 1 { "" } else { "s" }
            );
            for transaction in changed.transactions {
                merge_transaction(&mut transactions, transaction);
            }
            self.cache.put(&data_key, &transactions)?;
            self.cache.put(&knowledge_key, &changed.server_knowledge)?;
        } else {
            debug!("No rollover transactions changed since last run");
        }
        Ok(transactions)
    }
}

fn merge_month(months: &mut Vec<MonthDetail>, updated: MonthDetail) {
    if let Some(existing) = months.iter_mut().find(|m| m.month == updated.month) {
        *existing = updated;
    } else {
        months.push(updated);
    }
}

fn remove_month(months: &mut Vec<MonthDetail>, month: MonthKey) {
    remove_where(months, |m| m.month == month);
}

/// Sort ascending by month key and drop months that carry no information:
/// anything beyond the horizon (next calendar month), and fully-empty months
/// whose numeric fields are all exactly zero.
fn sort_and_prune_months(months: &mut Vec<MonthDetail>, horizon: MonthKey) {
    months.sort_by_key(|m| m.month);
    months.retain(|m| {
        m.month <= horizon
            && !(m.activity.is_zero()
                && m.budgeted.is_zero()
                && m.income.is_zero()
                && m.to_be_budgeted.is_zero())
    });
}

fn merge_transaction(transactions: &mut Vec<HybridTransaction>, updated: HybridTransaction) {
    if updated.deleted {
        remove_where(transactions, |t| t.id == updated.id);
    } else if let Some(existing) = transactions.iter_mut().find(|t| t.id == updated.id) {
        *existing = updated;
    } else {
        transactions.push(updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn month(key: &str, income: i64) -> MonthDetail {
        MonthDetail {
            month: MonthKey::from_str(key).unwrap(),
            income: Milliunits::from_scaled_i64(income),
            budgeted: Milliunits::zero(),
            activity: Milliunits::zero(),
            to_be_budgeted: Milliunits::zero(),
            categories: Vec::new(),
            deleted: false,
        }
    }

    fn transaction(id: &str, amount: i64, deleted: bool) -> HybridTransaction {
        HybridTransaction {
            id: YnabTransactionId(id.to_string()),
            date: NaiveDate::from_ymd(2019, 2, 1),
            amount: Milliunits::from_scaled_i64(amount),
            memo: None,
            cleared: Cleared::Cleared,
            approved: true,
            account_id: YnabAccountId("account".to_string()),
            payee_id: None,
            payee_name: None,
            category_id: None,
            deleted,
        }
    }

    #[test]
    fn test_merge_month_overwrites_existing() {
        let mut months = vec![month("2019-01-01", 1_000)];
        merge_month(&mut months, month("2019-01-01", 2_000));
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].income, Milliunits::from_scaled_i64(2_000));
    }

    #[test]
    fn test_merge_month_appends_new() {
        let mut months = vec![month("2019-01-01", 1_000)];
        merge_month(&mut months, month("2019-02-01", 2_000));
        assert_eq!(months.len(), 2);
    }

    #[test]
    fn test_remove_month() {
        let mut months = vec![month("2019-01-01", 1_000), month("2019-02-01", 2_000)];
        remove_month(&mut months, MonthKey::from_str("2019-01-01").unwrap());
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month.to_string(), "2019-02-01");
    }

    #[test]
    fn test_sort_and_prune_drops_months_beyond_horizon() {
        let horizon = MonthKey::from_str("2019-03-01").unwrap();
        let mut months = vec![
            month("2019-04-01", 1_000),
            month("2019-03-01", 1_000),
            month("2019-02-01", 1_000),
        ];
        sort_and_prune_months(&mut months, horizon);
        let keys: Vec<String> = months.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(keys, vec!["2019-02-01", "2019-03-01"]);
    }

    #[test]
    fn test_sort_and_prune_drops_fully_empty_months() {
        let horizon = MonthKey::from_str("2019-03-01").unwrap();
        let mut months = vec![month("2019-01-01", 0), month("2019-02-01", 1_000)];
        sort_and_prune_months(&mut months, horizon);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month.to_string(), "2019-02-01");
    }

    #[test]
    fn test_merge_transaction_create_update_delete() {
        let mut transactions = Vec::new();
        merge_transaction(&mut transactions, transaction("t1", -5_000, false));
        assert_eq!(transactions.len(), 1);
        merge_transaction(&mut transactions, transaction("t1", -3_000, false));
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, Milliunits::from_scaled_i64(-3_000));
        merge_transaction(&mut transactions, transaction("t1", -3_000, true));
        assert!(transactions.is_empty());
    }
}

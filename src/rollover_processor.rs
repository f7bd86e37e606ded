use chrono::NaiveDate;
use log::{debug, warn};
use std::cmp;
use std::collections::HashMap;

use crate::cache::*;
use crate::entity_resolver::*;
use crate::errors::*;
use crate::month_synchronizer::*;
use crate::settings::*;
use crate::types::*;
use crate::ynab_client::*;
use crate::ynab_models::*;

/// The reconciliation engine: walks the synchronized months oldest-first,
/// computes the rollover adjustment needed for every category, accumulates
/// the per-month offset that nets the adjustments to zero, and re-budgets the
/// rollover category to absorb the configured offset groups.
///
/// The engine is pure apart from its own month snapshot: it mutates cached
/// balances through `propagate_balance` to mirror what the service would
/// compute after write-back, so multi-month propagation is correct on a
/// single read.  All remote effects are returned as `RolloverModifications`.
pub struct RolloverProcessor<'a> {
    entities: &'a ResolvedEntities,
    current_month: MonthKey,
    months: Vec<MonthDetail>,
    category_positions: Vec<HashMap<YnabCategoryId, usize>>,
    existing_rollovers: HashMap<NaiveDate, HashMap<YnabCategoryId, ExistingRollover>>,
}

#[derive(Clone, Debug)]
struct ExistingRollover {
    id: YnabTransactionId,
    amount: Milliunits,
}

/// Everything the run decided to change, batched for saving: at most one
/// bulk create call, one bulk update call, and one budgeted patch per month.
#[derive(Debug)]
pub struct RolloverModifications {
    pub create_transactions: Vec<SaveTransaction>,
    pub update_transactions: Vec<UpdateTransaction>,
    pub budgeted_updates: Vec<BudgetedUpdate>,
}

#[derive(Debug, PartialEq)]
pub struct BudgetedUpdate {
    pub month: MonthKey,
    pub category_id: YnabCategoryId,
    pub budgeted: Milliunits,
}

impl<'a> RolloverProcessor<'a> {
    /// Full `apply` workflow: resolve ids, sync the snapshot, reconcile,
    /// save.
    pub fn run(cache: &Cache, ynab_client: &YnabBudgetClient, settings: &Settings) -> Result<()> {
        let entities = EntityResolver::new(cache, ynab_client, settings).resolve()?;
        let current_month = MonthKey::containing(chrono::Local::today().naive_local());
        let snapshot = MonthSynchronizer::new(cache, ynab_client, settings)
            .sync(&entities.rollover_payee_id, current_month.next())?;
        let modifications =
            RolloverProcessor::new(snapshot, &entities, current_month).process();
        save_modifications(ynab_client, modifications, settings.dry_run)
    }

    pub fn new(
        snapshot: BudgetSnapshot,
        entities: &'a ResolvedEntities,
        current_month: MonthKey,
    ) -> RolloverProcessor<'a> {
        let category_positions = snapshot
            .months
            .iter()
            .map(|month| {
                month
                    .categories
                    .iter()
                    .enumerate()
                    .map(|(position, category)| (category.id.clone(), position))
                    .collect()
            })
            .collect();
        let mut existing_rollovers: HashMap<NaiveDate, HashMap<YnabCategoryId, ExistingRollover>> =
            HashMap::new();
        for transaction in snapshot.rollover_transactions {
            if let Some(category_id) = transaction.category_id {
                existing_rollovers
                    .entry(transaction.date)
                    .or_insert_with(HashMap::new)
                    .insert(
                        category_id,
                        ExistingRollover {
                            id: transaction.id,
                            amount: transaction.amount,
                        },
                    );
            }
        }
        RolloverProcessor {
            entities,
            current_month,
            months: snapshot.months,
            category_positions,
            existing_rollovers,
        }
    }

    /// Process every month through the current calendar month.  Later months
    /// stay in the snapshot as propagation targets but generate nothing.
    pub fn process(&mut self) -> RolloverModifications {
        let mut modifications = RolloverModifications::new();
        for index in 0..self.months.len() {
            if self.months[index].month > self.current_month {
                continue;
            }
            self.process_month(index, &mut modifications);
        }
        modifications
    }

    fn process_month(&mut self, index: usize, modifications: &mut RolloverModifications) {
        let month_key = self.months[index].month;
        let mut offset_amount = Milliunits::zero();
        let mut total_unbudgeted = Milliunits::zero();

        for position in 0..self.months[index].categories.len() {
            let (category_id, group_id, original_group_id, category_name) = {
                let category = &self.months[index].categories[position];
                (
                    category.id.clone(),
                    category.category_group_id.clone(),
                    category.original_category_group_id.clone(),
                    category.name.clone(),
                )
            };
            if self.is_excluded(&category_id, &group_id, &original_group_id) {
                continue;
            }

            // Only negative leftovers roll forward; the service already
            // carries positive balances natively.
            let balance_from_last_month =
                self.previous_balance(index, &category_id).negative_part();
            let existing = self.existing_rollover(month_key, &category_id);
            let existing_amount = existing
                .as_ref()
                .map(|e| e.amount)
                .unwrap_or_else(Milliunits::zero);

            offset_amount -= balance_from_last_month;

            if balance_from_last_month != existing_amount {
                match existing {
                    Some(existing) => {
                        println!(
                            "Updating adjustment for {} by {} to {} in {}",
                            category_name,
                            existing.amount - balance_from_last_month,
                            balance_from_last_month,
                            month_key
                        );
                        self.propagate_balance(
                            &category_id,
                            index,
                            balance_from_last_month - existing.amount,
                        );
                        modifications.update_transactions.push(self.update_transaction(
                            existing.id,
                            &category_id,
                            month_key,
                            balance_from_last_month,
                        ));
                    }
                    None => {
                        println!(
                            "Adding adjustment for {} of {} in {}",
                            category_name, balance_from_last_month, month_key
                        );
                        self.propagate_balance(&category_id, index, balance_from_last_month);
                        modifications.create_transactions.push(self.save_transaction(
                            &category_id,
                            month_key,
                            balance_from_last_month,
                        ));
                    }
                }
            }

            if self.in_offset_groups(&group_id, &original_group_id) {
                // Re-read: the adjustment above may have moved this balance.
                let balance = self.months[index].categories[position].balance;
                total_unbudgeted -= balance;
            }
        }

        self.process_month_offset(index, month_key, offset_amount, total_unbudgeted, modifications);
    }

    /// The single category-level counter-transaction plus the budgeted
    /// correction that keeps the rollover category's balance equal to the
    /// offset groups' total negative spend.
    fn process_month_offset(
        &mut self,
        index: usize,
        month_key: MonthKey,
        offset_amount: Milliunits,
        total_unbudgeted: Milliunits,
        modifications: &mut RolloverModifications,
    ) {
        let rollover_category_id = self.entities.rollover_category_id.clone();
        let position = self.category_positions[index]
            .get(&rollover_category_id)
            .copied();
        let existing = self.existing_rollover(month_key, &rollover_category_id);
        let existing_amount = existing
            .as_ref()
            .map(|e| e.amount)
            .unwrap_or_else(Milliunits::zero);
        // The offset transaction must go out whenever the adjustments did,
        // even if this month's detail is missing the rollover category;
        // otherwise the month's adjustments would not net to zero.
        let transaction_needs_update = offset_amount != existing_amount;
        let balance_needs_update = match position {
            Some(position) => {
                transaction_needs_update
                    || total_unbudgeted != self.months[index].categories[position].balance
            }
            None => false,
        };

        if transaction_needs_update {
            match existing {
                Some(existing) => {
                    println!(
                        "Updating rollover offset transaction by {} to {} in {}",
                        existing.amount - offset_amount,
                        offset_amount,
                        month_key
                    );
                    self.propagate_balance(
                        &rollover_category_id,
                        index,
                        offset_amount - existing.amount,
                    );
                    modifications.update_transactions.push(self.update_transaction(
                        existing.id,
                        &rollover_category_id,
                        month_key,
                        offset_amount,
                    ));
                }
                None => {
                    println!(
                        "Adding rollover offset transaction of {} in {}",
                        offset_amount, month_key
                    );
                    self.propagate_balance(&rollover_category_id, index, offset_amount);
                    modifications.create_transactions.push(self.save_transaction(
                        &rollover_category_id,
                        month_key,
                        offset_amount,
                    ));
                }
            }
        }

        let position = match position {
            Some(position) => position,
            None => {
                warn!(
                    "Rollover category not present in {}; skipping budgeted correction",
                    month_key
                );
                return;
            }
        };
        if balance_needs_update {
            let (balance, budgeted) = {
                let category = &self.months[index].categories[position];
                (category.balance, category.budgeted)
            };
            let desired_budgeted = total_unbudgeted - (balance - budgeted);
            let delta = desired_budgeted - budgeted;
            println!(
                "Updating rollover offset budgeted in {} by {} (from {} to {} for a balance of {})",
                month_key, delta, budgeted, desired_budgeted, total_unbudgeted
            );
            self.propagate_balance(&rollover_category_id, index, delta);
            modifications.budgeted_updates.push(BudgetedUpdate {
                month: month_key,
                category_id: rollover_category_id,
                budgeted: desired_budgeted,
            });
        }
    }

    /// Forward-carry a balance change through later months, mirroring the
    /// service's own rollover of positive balances.  A positive balance
    /// passes the change through (capped at wiping the cushion); a
    /// non-positive balance only carries the portion that pushes it above
    /// zero.  Stops at the first zero carry or when the months run out.
    fn propagate_balance(
        &mut self,
        category_id: &YnabCategoryId,
        start_index: usize,
        amount: Milliunits,
    ) {
        let mut index = start_index;
        let mut amount = amount;
        while !amount.is_zero() && index < self.months.len() {
            let position = match self.category_positions[index].get(category_id) {
                Some(&position) => position,
                None => return,
            };
            let category = &mut self.months[index].categories[position];
            let balance = category.balance;
            let carry = if balance > Milliunits::zero() {
                cmp::max(amount, -balance)
            } else {
                cmp::max(Milliunits::zero(), balance + amount)
            };
            category.balance = balance + amount;
            amount = carry;
            index += 1;
        }
    }

    fn is_excluded(
        &self,
        category_id: &YnabCategoryId,
        group_id: &YnabCategoryGroupId,
        original_group_id: &Option<YnabCategoryGroupId>,
    ) -> bool {
        category_id == &self.entities.inflows_category_id
            || category_id == &self.entities.rollover_category_id
            || match &self.entities.payments_group_id {
                Some(payments_group_id) => {
                    group_id == payments_group_id
                        || original_group_id.as_ref() == Some(payments_group_id)
                }
                None => false,
            }
    }

    fn in_offset_groups(
        &self,
        group_id: &YnabCategoryGroupId,
        original_group_id: &Option<YnabCategoryGroupId>,
    ) -> bool {
        self.entities.offset_group_ids.iter().any(|offset_group_id| {
            group_id == offset_group_id || original_group_id.as_ref() == Some(offset_group_id)
        })
    }

    /// Balance of the category in the month before `index`.  A category that
    /// did not exist the previous month has no leftover to carry.
    fn previous_balance(&self, index: usize, category_id: &YnabCategoryId) -> Milliunits {
        if index == 0 {
            return Milliunits::zero();
        }
        self.category_positions[index - 1]
            .get(category_id)
            .map(|&position| self.months[index - 1].categories[position].balance)
            .unwrap_or_else(Milliunits::zero)
    }

    fn existing_rollover(
        &self,
        month_key: MonthKey,
        category_id: &YnabCategoryId,
    ) -> Option<ExistingRollover> {
        self.existing_rollovers
            .get(&month_key.as_date())
            .and_then(|by_category| by_category.get(category_id))
            .cloned()
    }

    fn save_transaction(
        &self,
        category_id: &YnabCategoryId,
        month_key: MonthKey,
        amount: Milliunits,
    ) -> SaveTransaction {
        SaveTransaction {
            account_id: self.entities.rollover_account_id.clone(),
            date: month_key.as_date(),
            amount,
            payee_id: Some(self.entities.rollover_payee_id.clone()),
            payee_name: None,
            category_id: Some(category_id.clone()),
            memo: None,
            cleared: Some(Cleared::Cleared),
            approved: Some(true),
        }
    }

    fn update_transaction(
        &self,
        id: YnabTransactionId,
        category_id: &YnabCategoryId,
        month_key: MonthKey,
        amount: Milliunits,
    ) -> UpdateTransaction {
        UpdateTransaction {
            id,
            account_id: self.entities.rollover_account_id.clone(),
            date: month_key.as_date(),
            amount,
            payee_id: Some(self.entities.rollover_payee_id.clone()),
            payee_name: None,
            category_id: Some(category_id.clone()),
            memo: None,
            cleared: Some(Cleared::Cleared),
            approved: Some(true),
        }
    }
}

impl RolloverModifications {
    pub fn new() -> RolloverModifications {
        RolloverModifications {
            create_transactions: Vec::new(),
            update_transactions: Vec::new(),
            budgeted_updates: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.create_transactions.is_empty()
            && self.update_transactions.is_empty()
            && self.budgeted_updates.is_empty()
    }
}

/// Save everything computed by the scan.  All mutations were computed from
/// fully-propagated local state before any is sent, so ordering between the
/// individual calls does not matter.
fn save_modifications(
    ynab_client: &YnabBudgetClient,
    modifications: RolloverModifications,
    dry_run: bool,
) -> Result<()> {
    if modifications.is_empty() {
        println!("No rollover changes; nothing to do!");
        return Ok(());
    }
    debug!("Modifications to save to YNAB: {:#?}", modifications);
    for update in &modifications.budgeted_updates {
        if !dry_run {
            ynab_client.update_month_category(update.month, &update.category_id, update.budgeted)?;
        }
    }
    if !modifications.create_transactions.is_empty() {
        println!(
            "Creating {} rollover transaction{}.",
            modifications.create_transactions.len(),
            if modifications.create_transactions.len() == 1 { "" } else { "s" }
        );
        if !dry_run {
            ynab_client.create_transactions(modifications.create_transactions)?;
            println!("Done creating.");
        }
    }
    if !modifications.update_transactions.is_empty() {
        println!(
            "Updating {} rollover transaction{}.",
            modifications.update_transactions.len(),
            if modifications.update_transactions.len() == 1 { "" } else { "s" }
        );
        if !dry_run {
            ynab_client.update_transactions(modifications.update_transactions)?;
            println!("Done updating.");
        }
    }
    if dry_run {
        println!();
        println!("NOTE: No changes were actually saved.");
        println!("Re-run with '--yes' to save the changes to YNAB.");
    } else {
        println!("All done.");
    }
    Ok(())
}

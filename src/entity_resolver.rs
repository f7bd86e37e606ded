use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::*;
use crate::errors::*;
use crate::settings::*;
use crate::types::*;
use crate::ynab_client::*;
use crate::ynab_models::*;

/// The stable identifiers everything downstream works in terms of.  Resolved
/// from configured display names on the first run and cached; the credit card
/// payments group is advisory and may be absent.
#[derive(Debug)]
pub struct ResolvedEntities {
    pub rollover_account_id: YnabAccountId,
    pub rollover_payee_id: YnabPayeeId,
    pub payments_group_id: Option<YnabCategoryGroupId>,
    pub rollover_category_id: YnabCategoryId,
    pub inflows_category_id: YnabCategoryId,
    pub offset_group_ids: Vec<YnabCategoryGroupId>,
}

// The group/category ids are resolved from a single category-groups listing,
// so they are cached together under one compound key.
#[derive(Debug, Deserialize, Serialize)]
struct CachedGroupIds {
    payments_group_id: Option<YnabCategoryGroupId>,
    rollover_category_id: YnabCategoryId,
    inflows_category_id: YnabCategoryId,
    offset_group_ids: Vec<YnabCategoryGroupId>,
}

pub struct EntityResolver<'a> {
    cache: &'a Cache,
    ynab_client: &'a YnabBudgetClient<'a>,
    settings: &'a Settings,
}

impl<'a> EntityResolver<'a> {
    pub fn new(
        cache: &'a Cache,
        ynab_client: &'a YnabBudgetClient,
        settings: &'a Settings,
    ) -> EntityResolver<'a> {
        EntityResolver {
            cache,
            ynab_client,
            settings,
        }
    }

    pub fn resolve(&self) -> Result<ResolvedEntities> {
        let rollover_account_id = self.resolve_rollover_account_id()?;
        let rollover_payee_id = self.resolve_rollover_payee_id()?;
        let group_ids = self.resolve_group_ids()?;
        ensure!(
            !rollover_account_id.0.is_empty()
                && !rollover_payee_id.0.is_empty()
                && !group_ids.rollover_category_id.0.is_empty()
                && !group_ids.inflows_category_id.0.is_empty(),
            format!(
                "Failed to resolve rollover account ({}), rollover payee ({}), \
                 rollover category ({}), or inflows category ({}). \
                 Please clear the cache with the 'clear' command.",
                rollover_account_id,
                rollover_payee_id,
                group_ids.rollover_category_id,
                group_ids.inflows_category_id
            )
        );
        Ok(ResolvedEntities {
            rollover_account_id,
            rollover_payee_id,
            payments_group_id: group_ids.payments_group_id,
            rollover_category_id: group_ids.rollover_category_id,
            inflows_category_id: group_ids.inflows_category_id,
            offset_group_ids: group_ids.offset_group_ids,
        })
    }

    fn resolve_rollover_account_id(&self) -> Result<YnabAccountId> {
        let cache_key = self.settings.rollover_account_id_key();
        if let Some(id) = self.cache.get::<YnabAccountId>(&cache_key)? {
            debug!("Using cached rollover account id: {}", id);
            return Ok(id);
        }
        println!("Getting accounts from YNAB...");
        let accounts = self.ynab_client.get_accounts()?;
        let account = accounts
            .into_iter()
            .find(|account| account.name == self.settings.rollover_account_name)
            .chain_err(|| {
                format!(
                    "Rollover account was not found. Please create an account called \"{}\".",
                    self.settings.rollover_account_name
                )
            })?;
        self.cache.put(&cache_key, &account.id)?;
        Ok(account.id)
    }

    /// Also used standalone by the `zero` command, which needs no other ids.
    pub fn resolve_rollover_payee_id(&self) -> Result<YnabPayeeId> {
        let cache_key = self.settings.rollover_payee_id_key();
        if let Some(id) = self.cache.get::<YnabPayeeId>(&cache_key)? {
            debug!("Using cached rollover payee id: {}", id);
            return Ok(id);
        }
        println!("Getting payees from YNAB...");
        let payees = self.ynab_client.get_payees()?;
        let payee = payees
            .into_iter()
            .find(|payee| payee.name == self.settings.rollover_payee_name)
            .chain_err(|| {
                format!(
                    "Rollover payee was not found. Please create a payee called \"{}\".",
                    self.settings.rollover_payee_name
                )
            })?;
        self.cache.put(&cache_key, &payee.id)?;
        Ok(payee.id)
    }

    fn resolve_group_ids(&self) -> Result<CachedGroupIds> {
        let cache_key = self.settings.group_ids_key();
        if let Some(ids) = self.cache.get::<CachedGroupIds>(&cache_key)? {
            debug!("Using cached group/category ids: {:?}", ids);
            return Ok(ids);
        }
        println!("Getting category groups from YNAB...");
        let groups = self.ynab_client.get_category_groups()?;
        let ids = Self::resolve_from_groups(&groups, self.settings)?;
        if ids.payments_group_id.is_none() {
            println!(
                "Didn't find a \"{}\" group. Do you not have any credit cards set up? \
                 If you do, please report this.",
                self.settings.payments_group_name
            );
        }
        self.cache.put(&cache_key, &ids)?;
        Ok(ids)
    }

    /// Resolve the configured names against a fetched category-group listing.
    /// A missing rollover or inflows category is a fatal configuration error
    /// naming the exact category to create; the payments group is advisory.
    fn resolve_from_groups(
        groups: &[CategoryGroupWithCategories],
        settings: &Settings,
    ) -> Result<CachedGroupIds> {
        let payments_group_id = groups
            .iter()
            .find(|group| group.name == settings.payments_group_name)
            .map(|group| group.id.clone());
        let rollover_category_id =
            Self::find_category_id(groups, &settings.rollover_category_name).chain_err(|| {
                format!(
                    "Rollover category was not found. Please create a budget category called \"{}\".",
                    settings.rollover_category_name
                )
            })?;
        let inflows_category_id =
            Self::find_category_id(groups, &settings.inflows_category_name).chain_err(|| {
                format!(
                    "Inflows category was not found. Expected a category called \"{}\".",
                    settings.inflows_category_name
                )
            })?;
        let offset_group_ids = groups
            .iter()
            .filter(|group| {
                settings
                    .offset_group_names
                    .iter()
                    .any(|name| name == &group.name)
            })
            .map(|group| group.id.clone())
            .collect();
        Ok(CachedGroupIds {
            payments_group_id,
            rollover_category_id,
            inflows_category_id,
            offset_group_ids,
        })
    }

    fn find_category_id(
        groups: &[CategoryGroupWithCategories],
        name: &str,
    ) -> Option<YnabCategoryId> {
        groups.iter().find_map(|group| {
            group
                .categories
                .iter()
                .find(|category| category.name == name)
                .map(|category| category.id.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, group_id: &str, name: &str) -> Category {
        Category {
            id: YnabCategoryId(id.to_string()),
            category_group_id: YnabCategoryGroupId(group_id.to_string()),
            original_category_group_id: None,
            name: name.to_string(),
            budgeted: Milliunits::zero(),
            activity: Milliunits::zero(),
            balance: Milliunits::zero(),
            deleted: false,
        }
    }

    fn group(id: &str, name: &str, categories: Vec<Category>) -> CategoryGroupWithCategories {
        CategoryGroupWithCategories {
            id: YnabCategoryGroupId(id.to_string()),
            name: name.to_string(),
            deleted: false,
            categories,
        }
    }

    fn settings() -> Settings {
        Settings {
            budget_id: "last-used".to_string(),
            rollover_account_name: "Budget rollover".to_string(),
            rollover_payee_name: "Budget rollover".to_string(),
            rollover_category_name: "Rollover offset".to_string(),
            inflows_category_name: "Inflow: Ready to Assign".to_string(),
            payments_group_name: "Credit Card Payments".to_string(),
            offset_group_names: vec!["Unbudgeted".to_string()],
            dry_run: true,
        }
    }

    fn full_groups() -> Vec<CategoryGroupWithCategories> {
        vec![
            group(
                "g1",
                "Credit Card Payments",
                vec![category("c1", "g1", "Visa")],
            ),
            group(
                "g2",
                "Meta",
                vec![
                    category("c2", "g2", "Rollover offset"),
                    category("c3", "g2", "Inflow: Ready to Assign"),
                ],
            ),
            group("g3", "Unbudgeted", vec![category("c4", "g3", "Travel")]),
        ]
    }

    #[test]
    fn test_resolve_from_groups_resolves_all_ids() {
        let ids = EntityResolver::resolve_from_groups(&full_groups(), &settings()).unwrap();
        assert_eq!(
            ids.payments_group_id,
            Some(YnabCategoryGroupId("g1".to_string()))
        );
        assert_eq!(ids.rollover_category_id, YnabCategoryId("c2".to_string()));
        assert_eq!(ids.inflows_category_id, YnabCategoryId("c3".to_string()));
        assert_eq!(
            ids.offset_group_ids,
            vec![YnabCategoryGroupId("g3".to_string())]
        );
    }

    #[test]
    fn test_missing_rollover_category_is_a_fatal_error_naming_it() {
        let groups = vec![group(
            "g2",
            "Meta",
            vec![category("c3", "g2", "Inflow: Ready to Assign")],
        )];
        let err = EntityResolver::resolve_from_groups(&groups, &settings()).unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("create a budget category called \"Rollover offset\""),
            "error should name the category to create: {}",
            message
        );
    }

    #[test]
    fn test_missing_payments_group_is_not_an_error() {
        let groups = vec![group(
            "g2",
            "Meta",
            vec![
                category("c2", "g2", "Rollover offset"),
                category("c3", "g2", "Inflow: Ready to Assign"),
            ],
        )];
        let ids = EntityResolver::resolve_from_groups(&groups, &settings()).unwrap();
        assert_eq!(ids.payments_group_id, None);
        assert!(ids.offset_group_ids.is_empty());
    }

    #[test]
    fn test_find_category_id_searches_across_groups() {
        let groups = vec![
            group("g1", "Immediate", vec![category("c1", "g1", "Groceries")]),
            group("g2", "Savings", vec![category("c2", "g2", "Rollover offset")]),
        ];
        assert_eq!(
            EntityResolver::find_category_id(&groups, "Rollover offset"),
            Some(YnabCategoryId("c2".to_string()))
        );
        assert_eq!(EntityResolver::find_category_id(&groups, "Vacation"), None);
    }
}

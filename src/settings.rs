/// Configuration assembled once at startup and passed by reference into the
/// resolver, synchronizer and processors.  The cache keys are compound keys
/// over the configured names, so changing a name naturally invalidates the
/// cached identifiers resolved under the old one.
#[derive(Debug)]
pub struct Settings {
    pub budget_id: String,
    pub rollover_account_name: String,
    pub rollover_payee_name: String,
    pub rollover_category_name: String,
    pub inflows_category_name: String,
    pub payments_group_name: String,
    pub offset_group_names: Vec<String>,
    pub dry_run: bool,
}

impl Settings {
    pub fn rollover_account_id_key(&self) -> String {
        format!("{}_account_{}", self.budget_id, self.rollover_account_name)
    }

    pub fn rollover_payee_id_key(&self) -> String {
        format!("{}_payee_{}", self.budget_id, self.rollover_payee_name)
    }

    pub fn group_ids_key(&self) -> String {
        format!(
            "{}_groups_{}_{}_{}_{}",
            self.budget_id,
            self.payments_group_name,
            self.rollover_category_name,
            self.inflows_category_name,
            self.offset_group_names.join("_")
        )
    }

    pub fn months_knowledge_key(&self) -> String {
        format!("{}_months_knowledge", self.budget_id)
    }

    pub fn months_data_key(&self) -> String {
        format!("{}_months_data", self.budget_id)
    }

    pub fn rollover_transactions_knowledge_key(&self) -> String {
        format!("{}_rollover_transactions_knowledge", self.budget_id)
    }

    pub fn rollover_transactions_data_key(&self) -> String {
        format!("{}_rollover_transactions_data", self.budget_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            budget_id: "last-used".to_string(),
            rollover_account_name: "Budget rollover".to_string(),
            rollover_payee_name: "Budget rollover".to_string(),
            rollover_category_name: "Rollover offset".to_string(),
            inflows_category_name: "Inflow: Ready to Assign".to_string(),
            payments_group_name: "Credit Card Payments".to_string(),
            offset_group_names: vec!["Unbudgeted".to_string(), "Gifts".to_string()],
            dry_run: true,
        }
    }

    #[test]
    fn test_cache_keys_include_configured_names() {
        let settings = settings();
        assert_eq!(
            settings.rollover_account_id_key(),
            "last-used_account_Budget rollover"
        );
        assert_eq!(
            settings.group_ids_key(),
            "last-used_groups_Credit Card Payments_Rollover offset_Inflow: Ready to Assign_Unbudgeted_Gifts"
        );
    }
}

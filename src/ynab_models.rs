//! Serde models for the slice of the YNAB v1 API this tool uses.  Month
//! details and rollover transactions double as the locally cached snapshot
//! types, so they round-trip through serde rather than only deserializing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct AccountsData {
    pub accounts: Vec<Account>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Account {
    pub id: YnabAccountId,
    pub name: String,
    pub note: Option<String>,
    pub balance: Milliunits,
    pub closed: bool,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct PayeesData {
    pub payees: Vec<Payee>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Payee {
    pub id: YnabPayeeId,
    pub name: String,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoryGroupsData {
    pub category_groups: Vec<CategoryGroupWithCategories>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CategoryGroupWithCategories {
    pub id: YnabCategoryGroupId,
    pub name: String,
    pub deleted: bool,
    pub categories: Vec<Category>,
}

/// One category's state within one budget month.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Category {
    pub id: YnabCategoryId,
    pub category_group_id: YnabCategoryGroupId,
    /// The group the category belonged to before it was moved, if ever.
    /// Retained so former members of a group are still recognized.
    #[serde(default)]
    pub original_category_group_id: Option<YnabCategoryGroupId>,
    pub name: String,
    pub budgeted: Milliunits,
    pub activity: Milliunits,
    pub balance: Milliunits,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct MonthSummariesData {
    pub months: Vec<MonthSummary>,
    pub server_knowledge: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct MonthDetailData {
    pub month: MonthDetail,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MonthDetail {
    pub month: MonthKey,
    pub income: Milliunits,
    pub budgeted: Milliunits,
    pub activity: Milliunits,
    pub to_be_budgeted: Milliunits,
    pub categories: Vec<Category>,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsData {
    pub transactions: Vec<HybridTransaction>,
    pub server_knowledge: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HybridTransaction {
    pub id: YnabTransactionId,
    pub date: NaiveDate,
    pub amount: Milliunits,
    pub memo: Option<String>,
    pub cleared: Cleared,
    pub approved: bool,
    pub account_id: YnabAccountId,
    #[serde(default)]
    pub payee_id: Option<YnabPayeeId>,
    #[serde(default)]
    pub payee_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<YnabCategoryId>,
    pub deleted: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cleared {
    Cleared,
    Uncleared,
    Reconciled,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SaveTransaction {
    pub account_id: YnabAccountId,
    pub date: NaiveDate,
    pub amount: Milliunits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<YnabPayeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<YnabCategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<Cleared>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateTransaction {
    pub id: YnabTransactionId,
    pub account_id: YnabAccountId,
    pub date: NaiveDate,
    pub amount: Milliunits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<YnabPayeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<YnabCategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<Cleared>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SaveTransactionsWrapper {
    pub transactions: Vec<SaveTransaction>,
}

#[derive(Debug, Serialize)]
pub struct UpdateTransactionsWrapper {
    pub transactions: Vec<UpdateTransaction>,
}

#[derive(Debug, Serialize)]
pub struct SaveMonthCategoryWrapper {
    pub category: SaveMonthCategory,
}

#[derive(Debug, Serialize)]
pub struct SaveMonthCategory {
    pub budgeted: Milliunits,
}

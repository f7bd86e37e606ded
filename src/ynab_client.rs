use chrono::NaiveDate;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::*;
use crate::types::*;
use crate::utilities::*;
use crate::ynab_models::*;

const YNAB_API_BASE_URL: &str = "https://api.youneedabudget.com/v1";

pub struct YnabBudgetClient<'a> {
    client: reqwest::Client,
    access_token: String,
    pub budget_id: &'a str,
}

impl<'a> YnabBudgetClient<'a> {
    pub fn new(access_token: String, budget_id: &'a str) -> YnabBudgetClient {
        YnabBudgetClient {
            client: reqwest::Client::new(),
            access_token,
            budget_id,
        }
    }

    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        self.get_json::<AccountsData>("accounts", &[], "Failed to load accounts from YNAB")
            .map(|data| data.accounts)
    }

    pub fn get_payees(&self) -> Result<Vec<Payee>> {
        self.get_json::<PayeesData>("payees", &[], "Failed to load payees from YNAB")
            .map(|data| data.payees)
    }

    pub fn get_category_groups(&self) -> Result<Vec<CategoryGroupWithCategories>> {
        self.get_json::<CategoryGroupsData>(
            "categories",
            &[],
            "Failed to load category groups from YNAB",
        )
        .map(|data| data.category_groups)
    }

    /// Month summaries changed since the given server knowledge (or all
    /// months when none is given), plus the new knowledge token.
    pub fn get_budget_months(&self, last_knowledge: Option<i64>) -> Result<MonthSummariesData> {
        let mut query = Vec::new();
        if let Some(knowledge) = last_knowledge {
            query.push(("last_knowledge_of_server", knowledge.to_string()));
        }
        self.get_json("months", &query, "Failed to load budget months from YNAB")
    }

    pub fn get_budget_month(&self, month: MonthKey) -> Result<MonthDetail> {
        self.get_json::<MonthDetailData>(
            &format!("months/{}", month),
            &[],
            "Failed to load budget month detail from YNAB",
        )
        .map(|data| data.month)
    }

    pub fn get_transactions_by_payee(
        &self,
        payee_id: &YnabPayeeId,
        since_date: Option<NaiveDate>,
        last_knowledge: Option<i64>,
    ) -> Result<TransactionsData> {
        let mut query = Vec::new();
        if let Some(date) = since_date {
            query.push(("since_date", format_iso_date(date)));
        }
        if let Some(knowledge) = last_knowledge {
            query.push(("last_knowledge_of_server", knowledge.to_string()));
        }
        self.get_json(
            &format!("payees/{}/transactions", payee_id),
            &query,
            "Failed to load payee transactions from YNAB",
        )
    }

    pub fn get_transactions_by_account(
        &self,
        account_id: &YnabAccountId,
        since_date: Option<NaiveDate>,
    ) -> Result<TransactionsData> {
        let mut query = Vec::new();
        if let Some(date) = since_date {
            query.push(("since_date", format_iso_date(date)));
        }
        self.get_json(
            &format!("accounts/{}/transactions", account_id),
            &query,
            "Failed to load account transactions from YNAB",
        )
    }

    pub fn create_transactions(&self, transactions: Vec<SaveTransaction>) -> Result<()> {
        let wrapper = SaveTransactionsWrapper { transactions };
        self.send_json(
            Method::Post,
            "transactions",
            &wrapper,
            "Failed to save new transactions to YNAB",
        )
    }

    pub fn update_transactions(&self, transactions: Vec<UpdateTransaction>) -> Result<()> {
        let wrapper = UpdateTransactionsWrapper { transactions };
        self.send_json(
            Method::Patch,
            "transactions",
            &wrapper,
            "Failed to save changed transactions to YNAB",
        )
    }

    /// Set the budgeted amount of one category in one month.  Budgeted
    /// amounts are a month-category property, not a transaction, so this is
    /// the only targeted (non-bulk) mutation.
    pub fn update_month_category(
        &self,
        month: MonthKey,
        category_id: &YnabCategoryId,
        budgeted: Milliunits,
    ) -> Result<()> {
        let wrapper = SaveMonthCategoryWrapper {
            category: SaveMonthCategory { budgeted },
        };
        self.send_json(
            Method::Patch,
            &format!("months/{}/categories/{}", month, category_id),
            &wrapper,
            "Failed to save month category budgeted amount to YNAB",
        )
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &'static str,
    ) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let mut response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .chain_err(|| context)?
            .error_for_status()
            .chain_err(|| context)?;
        let envelope: ResponseEnvelope<T> = response.json().chain_err(|| context)?;
        Ok(envelope.data)
    }

    fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        context: &'static str,
    ) -> Result<()> {
        let url = self.url(path);
        debug!("{:?} {}", method, url);
        let builder = match method {
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
        };
        let mut response = builder
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .chain_err(|| context)?
            .error_for_status()
            .chain_err(|| context)?;
        let raw: serde_json::Value = response.json().chain_err(|| context)?;
        debug!("Response from YNAB: {:#?}", raw);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/budgets/{}/{}", YNAB_API_BASE_URL, self.budget_id, path)
    }
}

#[derive(Debug)]
enum Method {
    Post,
    Patch,
}

use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_DATABASE_FILENAME: &str = "cache.sqlite3";

pub const DEFAULT_BUDGET_ID: &str = "last-used";
pub const DEFAULT_ROLLOVER_PAYEE: &str = "Budget rollover";
pub const DEFAULT_ROLLOVER_ACCOUNT: &str = "Budget rollover";
pub const DEFAULT_ROLLOVER_CATEGORY: &str = "Rollover offset";
pub const DEFAULT_INFLOWS_CATEGORY: &str = "Inflow: Ready to Assign";
pub const DEFAULT_PAYMENTS_GROUP: &str = "Credit Card Payments";
pub const DEFAULT_OFFSET_GROUPS: &str = "Unbudgeted";

pub const MARKET_CHANGE_PAYEE_NAME: &str = "Market Change";

pub const YES_ARG: &str = "yes";
pub const YNAB_ACCESS_TOKEN_ARG: &str = "ynab-access-token";
pub const YNAB_ACCESS_TOKEN_ENV: &str = "YNAB_ACCESS_TOKEN";
pub const YNAB_BUDGET_ID_ARG: &str = "budget-id";
pub const YNAB_BUDGET_ID_ENV: &str = "YNAB_BUDGET_ID";
pub const ROLLOVER_ACCOUNT_ARG: &str = "rollover-account";
pub const ROLLOVER_ACCOUNT_ENV: &str = "R4Y_ROLLOVER_ACCOUNT";
pub const ROLLOVER_PAYEE_ARG: &str = "rollover-payee";
pub const ROLLOVER_PAYEE_ENV: &str = "R4Y_ROLLOVER_PAYEE";
pub const ROLLOVER_CATEGORY_ARG: &str = "rollover-category";
pub const ROLLOVER_CATEGORY_ENV: &str = "R4Y_ROLLOVER_CATEGORY";
pub const INFLOWS_CATEGORY_ARG: &str = "inflows-category";
pub const INFLOWS_CATEGORY_ENV: &str = "R4Y_INFLOWS_CATEGORY";
pub const PAYMENTS_GROUP_ARG: &str = "payments-group";
pub const PAYMENTS_GROUP_ENV: &str = "R4Y_PAYMENTS_GROUP";
pub const OFFSET_GROUPS_ARG: &str = "offset-groups";
pub const OFFSET_GROUPS_ENV: &str = "R4Y_OFFSET_GROUPS";
pub const DATABASE_FILE_ARG: &str = "database-file";
pub const DATABASE_FILE_ENV: &str = "R4Y_DATABASE_FILE";

pub const APPLY_SUBCOMMAND: &str = "apply";
pub const ZERO_SUBCOMMAND: &str = "zero";
pub const CLEAR_SUBCOMMAND: &str = "clear";
pub const SCHEDULE_SUBCOMMAND: &str = "schedule";
pub const MARKET_VALUE_SUBCOMMAND: &str = "market-value";

/// How often the `schedule` subcommand re-runs `apply`.
pub const SCHEDULE_INTERVAL_SECONDS: u64 = 120;

lazy_static! {
    /// Matches account notes such as "Balance: 0.521 BTC".
    pub static ref MARKET_BALANCE_REGEX: Regex =
        Regex::new(r"^Balance: (-?[0-9]+(?:\.[0-9]+)?) (.+)$")
            .expect("MARKET_BALANCE_REGEX should be valid");
}

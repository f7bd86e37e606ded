use std::env;
use std::ffi::OsStr;
use std::thread;
use std::time::Duration;

use log::error;

use crate::cache::*;
use crate::constants::*;
use crate::errors::*;
use crate::market_value_processor::*;
use crate::rollover_processor::*;
use crate::settings::*;
use crate::ynab_client::*;
use crate::zero_processor::*;

pub fn run() -> Result<()> {
    initialize()?;
    run_clap_matches(get_clap_matches())
}

fn initialize() -> Result<()> {
    openssl_probe::init_ssl_cert_env_vars();
    dotenv::dotenv().ok();
    env_logger::init();

    let proj_dirs = directories::ProjectDirs::from("io", "rollovers4ynab", clap::crate_name!())
        .chain_err(|| "Failed to determine user data directory")?;
    let mut default_database_file = proj_dirs.data_dir().to_path_buf();
    default_database_file.push(DEFAULT_DATABASE_FILENAME);

    default_env(DATABASE_FILE_ENV, default_database_file);
    default_env(YNAB_BUDGET_ID_ENV, DEFAULT_BUDGET_ID);
    default_env(ROLLOVER_ACCOUNT_ENV, DEFAULT_ROLLOVER_ACCOUNT);
    default_env(ROLLOVER_PAYEE_ENV, DEFAULT_ROLLOVER_PAYEE);
    default_env(ROLLOVER_CATEGORY_ENV, DEFAULT_ROLLOVER_CATEGORY);
    default_env(INFLOWS_CATEGORY_ENV, DEFAULT_INFLOWS_CATEGORY);
    default_env(PAYMENTS_GROUP_ENV, DEFAULT_PAYMENTS_GROUP);
    default_env(OFFSET_GROUPS_ENV, DEFAULT_OFFSET_GROUPS);

    Ok(())
}

fn get_clap_matches() -> clap::ArgMatches<'static> {
    clap::App::new(clap::crate_name!())
        .version(option_env!("CI_BUILD_VERSION").unwrap_or(clap::crate_version!()))
        .author(clap::crate_authors!())
        .about(clap::crate_description!())
        .arg(
            clap::Arg::with_name(YES_ARG)
                .long(YES_ARG)
                .short("y")
                .help("Save changes to YNAB budget and database (without this, runs in \"dry run\" mode)"))
        .arg(
            clap::Arg::with_name(YNAB_ACCESS_TOKEN_ARG)
                .env(YNAB_ACCESS_TOKEN_ENV)
                .long(YNAB_ACCESS_TOKEN_ARG)
                .value_name("KEY")
                .help("YNAB personal access token (see documentation for setup)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            clap::Arg::with_name(YNAB_BUDGET_ID_ARG)
                .env(YNAB_BUDGET_ID_ENV)
                .long(YNAB_BUDGET_ID_ARG)
                .value_name("ID")
                .help("YNAB budget identifier (defaults to the last-used budget)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name(ROLLOVER_ACCOUNT_ARG)
                .env(ROLLOVER_ACCOUNT_ENV)
                .long(ROLLOVER_ACCOUNT_ARG)
                .value_name("NAME")
                .help("Name of the account rollover transactions are booked in")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name(ROLLOVER_PAYEE_ARG)
                .env(ROLLOVER_PAYEE_ENV)
                .long(ROLLOVER_PAYEE_ARG)
                .value_name("NAME")
                .help("Name of the payee that marks rollover transactions")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name(ROLLOVER_CATEGORY_ARG)
                .env(ROLLOVER_CATEGORY_ENV)
                .long(ROLLOVER_CATEGORY_ARG)
                .value_name("NAME")
                .help("Name of the budget category that absorbs rollover offsets")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name(INFLOWS_CATEGORY_ARG)
                .env(INFLOWS_CATEGORY_ENV)
                .long(INFLOWS_CATEGORY_ARG)
                .value_name("NAME")
                .help("Name of the category income inflows land in")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name(PAYMENTS_GROUP_ARG)
                .env(PAYMENTS_GROUP_ENV)
                .long(PAYMENTS_GROUP_ARG)
                .value_name("NAME")
                .help("Name of the credit card payments category group")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name(OFFSET_GROUPS_ARG)
                .env(OFFSET_GROUPS_ENV)
                .long(OFFSET_GROUPS_ARG)
                .value_name("NAMES")
                .help("Comma-separated names of category groups whose balances the rollover category absorbs")
                .takes_value(true)
                .use_delimiter(true),
        )
        .arg(
            clap::Arg::with_name(DATABASE_FILE_ARG)
                .env(DATABASE_FILE_ENV)
                .long(DATABASE_FILE_ARG)
                .value_name("PATH")
                .help("Set the database file where local data will be stored")
                .takes_value(true),
        )
        .subcommand(
            clap::SubCommand::with_name(APPLY_SUBCOMMAND)
                .about("Reconcile rollover transactions once and exit"),
        )
        .subcommand(
            clap::SubCommand::with_name(SCHEDULE_SUBCOMMAND)
                .about("Reconcile rollover transactions on a fixed interval"),
        )
        .subcommand(
            clap::SubCommand::with_name(MARKET_VALUE_SUBCOMMAND)
                .about("Mark asset-tracking accounts to their current market value"),
        )
        .subcommand(
            clap::SubCommand::with_name(ZERO_SUBCOMMAND)
                .about("Set all rollover transaction amounts to zero"),
        )
        .subcommand(
            clap::SubCommand::with_name(CLEAR_SUBCOMMAND)
                .about("Clear the local cache of resolved identifiers and synced data"),
        )
        .get_matches()
}

fn run_clap_matches(matches: clap::ArgMatches) -> Result<()> {
    let dry_run = !matches.is_present(YES_ARG);
    let settings = Settings {
        budget_id: matches
            .value_of(YNAB_BUDGET_ID_ARG)
            .expect("CLAP matches should have YNAB_BUDGET_ID_ARG")
            .to_string(),
        rollover_account_name: matches
            .value_of(ROLLOVER_ACCOUNT_ARG)
            .expect("CLAP matches should have ROLLOVER_ACCOUNT_ARG")
            .to_string(),
        rollover_payee_name: matches
            .value_of(ROLLOVER_PAYEE_ARG)
            .expect("CLAP matches should have ROLLOVER_PAYEE_ARG")
            .to_string(),
        rollover_category_name: matches
            .value_of(ROLLOVER_CATEGORY_ARG)
            .expect("CLAP matches should have ROLLOVER_CATEGORY_ARG")
            .to_string(),
        inflows_category_name: matches
            .value_of(INFLOWS_CATEGORY_ARG)
            .expect("CLAP matches should have INFLOWS_CATEGORY_ARG")
            .to_string(),
        payments_group_name: matches
            .value_of(PAYMENTS_GROUP_ARG)
            .expect("CLAP matches should have PAYMENTS_GROUP_ARG")
            .to_string(),
        offset_group_names: matches
            .values_of(OFFSET_GROUPS_ARG)
            .map(|values| values.map(str::to_string).collect())
            .unwrap_or_default(),
        dry_run,
    };
    let ynab_client = YnabBudgetClient::new(
        matches
            .value_of(YNAB_ACCESS_TOKEN_ARG)
            .expect("CLAP matches should have YNAB_ACCESS_TOKEN_ARG")
            .to_string(),
        &settings.budget_id,
    );
    let cache = Cache::establish_connection(
        matches
            .value_of(DATABASE_FILE_ARG)
            .expect("CLAP matches should have DATABASE_FILE_ARG"),
        dry_run,
    )?;
    let command = match matches.subcommand_name() {
        Some(name) => name.to_string(),
        None => prompt_command()?,
    };
    match command.as_str() {
        APPLY_SUBCOMMAND => RolloverProcessor::run(&cache, &ynab_client, &settings),
        SCHEDULE_SUBCOMMAND => run_schedule(&cache, &ynab_client, &settings),
        MARKET_VALUE_SUBCOMMAND => MarketValueProcessor::run(&ynab_client, &settings),
        ZERO_SUBCOMMAND => ZeroProcessor::run(&cache, &ynab_client, &settings),
        CLEAR_SUBCOMMAND => {
            cache.clear()?;
            println!("Cache cleared.");
            Ok(())
        }
        QUIT_MENU_ITEM => Ok(()),
        _ => bail!(format!("Unknown command: {}", command)),
    }
}

const QUIT_MENU_ITEM: &str = "quit";

/// Interactive fallback when no subcommand is given.
fn prompt_command() -> Result<String> {
    let commands = [
        APPLY_SUBCOMMAND,
        SCHEDULE_SUBCOMMAND,
        MARKET_VALUE_SUBCOMMAND,
        ZERO_SUBCOMMAND,
        CLEAR_SUBCOMMAND,
        QUIT_MENU_ITEM,
    ];
    let selection = dialoguer::Select::new()
        .with_prompt("What would you like to do?")
        .items(&commands)
        .default(0)
        .interact()
        .chain_err(|| "Failed to read command selection")?;
    Ok(commands[selection].to_string())
}

/// Re-run `apply` on a fixed interval.  One failed run is logged and does
/// not stop the schedule; transient service errors resolve themselves.
fn run_schedule(cache: &Cache, ynab_client: &YnabBudgetClient, settings: &Settings) -> Result<()> {
    println!(
        "Reconciling rollovers every {} seconds. Press Ctrl-C to stop.",
        SCHEDULE_INTERVAL_SECONDS
    );
    loop {
        if let Err(err) = RolloverProcessor::run(cache, ynab_client, settings) {
            for (index, cause) in err.iter().enumerate() {
                if index == 0 {
                    error!("Scheduled run failed: {}", cause);
                } else {
                    error!("Caused by: {}", cause);
                }
            }
        }
        thread::sleep(Duration::from_secs(SCHEDULE_INTERVAL_SECONDS));
    }
}

fn default_env<V: AsRef<OsStr>>(var_name: &str, default_value: V) {
    if let Err(env::VarError::NotPresent) = env::var(var_name) {
        env::set_var(var_name, default_value);
    }
}

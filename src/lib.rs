#![warn(clippy::all)]

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate error_chain;

mod cache;
mod cli;
mod constants;
mod entity_resolver;
mod market_price_client;
mod market_value_processor;
mod month_synchronizer;
mod rollover_processor;
mod schema;
mod settings;
mod types;
mod utilities;
mod ynab_client;
mod ynab_models;
mod zero_processor;

mod errors {
    error_chain! {}
}

pub use cli::run;

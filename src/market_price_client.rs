use log::debug;
use std::collections::HashMap;

use crate::errors::*;

const PRICE_API_BASE_URL: &str = "https://min-api.cryptocompare.com/data";

/// Client for the CryptoCompare spot price API, used to value tracking
/// accounts that hold a quantity of some traded asset.
pub struct MarketPriceClient {
    client: reqwest::Client,
}

impl MarketPriceClient {
    pub fn new() -> MarketPriceClient {
        MarketPriceClient {
            client: reqwest::Client::new(),
        }
    }

    /// Current USD price of one unit of the given symbol (e.g. "BTC").
    pub fn get_usd_price(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/price", PRICE_API_BASE_URL);
        debug!("GET {} for symbol {}", url, symbol);
        let mut response = self
            .client
            .get(&url)
            .query(&[("fsym", symbol), ("tsyms", "USD")])
            .send()
            .chain_err(|| "Failed to request market price")?
            .error_for_status()
            .chain_err(|| "Failed to request market price")?;
        let prices: HashMap<String, f64> = response
            .json()
            .chain_err(|| "Failed to parse market price response")?;
        let price = prices
            .get("USD")
            .cloned()
            .chain_err(|| format!("No USD price returned for symbol: {}", symbol))?;
        debug!("Price of {}: {} USD", symbol, price);
        Ok(price)
    }
}

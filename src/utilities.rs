use chrono::NaiveDate;

use crate::errors::*;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

pub fn parse_iso_date(iso_date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(iso_date, ISO_DATE_FORMAT)
        .chain_err(|| format!("Invalid ISO date string (YYYY-MM-DD): {}", iso_date))
}

/// Remove and return the first element matching the predicate.
pub fn remove_where<T, P: FnMut(&T) -> bool>(items: &mut Vec<T>, predicate: P) -> Option<T> {
    items.iter().position(predicate).map(|index| items.remove(index))
}

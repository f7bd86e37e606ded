use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops;

use crate::errors::*;
use crate::utilities::*;

pub use rust_decimal::prelude::Zero;

/// A monetary amount in YNAB's integer minor units (thousandths of the major
/// currency unit).  All arithmetic stays at scale 3, so no rounding drift can
/// accumulate across months.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Milliunits(Decimal);

/// The first-of-month date YNAB uses both as a time axis and as the key of a
/// budget month ("2019-01-01").
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MonthKey(NaiveDate);

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct YnabAccountId(pub String);

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct YnabPayeeId(pub String);

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct YnabCategoryId(pub String);

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct YnabCategoryGroupId(pub String);

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct YnabTransactionId(pub String);

impl Milliunits {
    const SCALE: u32 = 3;

    pub fn from_scaled_i64(value: i64) -> Milliunits {
        Milliunits(Decimal::new(value, Self::SCALE))
    }

    pub fn to_scaled_i64(self) -> i64 {
        assert!(
            self.0.scale() == Self::SCALE,
            "Milliunits Decimal scale should be {}, but is {}",
            Self::SCALE,
            self.0.scale()
        );
        let mut result = self.0;
        result
            .set_scale(0)
            .expect("Milliunits Decimal scale should be settable to 0");
        result
            .to_i64()
            .expect("Milliunits Decimal should be convertible to i64")
    }

    /// The negative portion of this amount: `min(self, 0)`.
    pub fn negative_part(self) -> Milliunits {
        std::cmp::min(self, Milliunits::zero())
    }
}

impl ops::Add for Milliunits {
    type Output = Milliunits;
    fn add(self, other: Milliunits) -> Milliunits {
        let result = Milliunits(self.0 + other.0);
        assert_eq!(result.0.scale(), Self::SCALE);
        result
    }
}

impl ops::AddAssign for Milliunits {
    fn add_assign(&mut self, other: Milliunits) {
        self.0 += other.0;
        assert_eq!(self.0.scale(), Self::SCALE);
    }
}

impl ops::Sub for Milliunits {
    type Output = Milliunits;
    fn sub(self, other: Milliunits) -> Milliunits {
        let result = Milliunits(self.0 - other.0);
        assert_eq!(result.0.scale(), Self::SCALE);
        result
    }
}

impl ops::SubAssign for Milliunits {
    fn sub_assign(&mut self, other: Milliunits) {
        self.0 -= other.0;
        assert_eq!(self.0.scale(), Self::SCALE);
    }
}

impl ops::Neg for Milliunits {
    type Output = Milliunits;
    fn neg(self) -> Milliunits {
        let result = Milliunits(self.0.neg());
        assert_eq!(result.0.scale(), Self::SCALE);
        result
    }
}

impl Zero for Milliunits {
    fn zero() -> Milliunits {
        Milliunits::from_scaled_i64(0)
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Milliunits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The YNAB wire format and the snapshot cache both carry amounts as scaled
// integers, never as decimal strings.
impl Serialize for Milliunits {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_scaled_i64())
    }
}

impl<'de> Deserialize<'de> for Milliunits {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Milliunits, D::Error> {
        i64::deserialize(deserializer).map(Milliunits::from_scaled_i64)
    }
}

impl MonthKey {
    /// The month containing the given date.
    pub fn containing(date: NaiveDate) -> MonthKey {
        MonthKey(
            date.with_day(1)
                .expect("every month should have a first day"),
        )
    }

    pub fn from_str(iso_date: &str) -> Result<MonthKey> {
        let date = parse_iso_date(iso_date)?;
        ensure!(
            date.day() == 1,
            format!("Month key should be a first-of-month date: {}", iso_date)
        );
        Ok(MonthKey(date))
    }

    pub fn next(self) -> MonthKey {
        let (year, month) = if self.0.month() == 12 {
            (self.0.year() + 1, 1)
        } else {
            (self.0.year(), self.0.month() + 1)
        };
        MonthKey(NaiveDate::from_ymd(year, month, 1))
    }

    pub fn as_date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_iso_date(self.0))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso_date(self.0))
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<MonthKey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let date = parse_iso_date(&raw).map_err(serde::de::Error::custom)?;
        // YNAB month keys are always first-of-month; tolerate stray days by
        // truncating rather than failing a whole sync.
        Ok(MonthKey::containing(date))
    }
}

impl fmt::Display for YnabAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for YnabPayeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for YnabCategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for YnabCategoryGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for YnabTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milliunits_from_to_scaled_i64() {
        assert_eq!(Milliunits::from_scaled_i64(12_345).to_scaled_i64(), 12_345);
        assert_eq!(Milliunits::from_scaled_i64(-5_000).to_scaled_i64(), -5_000);
    }

    #[test]
    fn test_milliunits_arithmetic_keeps_scale() {
        let sum = Milliunits::from_scaled_i64(2_000) + Milliunits::from_scaled_i64(-5_000);
        assert_eq!(sum, Milliunits::from_scaled_i64(-3_000));
        assert_eq!((-sum).to_scaled_i64(), 3_000);
    }

    #[test]
    fn test_milliunits_negative_part() {
        assert_eq!(
            Milliunits::from_scaled_i64(-1_200).negative_part(),
            Milliunits::from_scaled_i64(-1_200)
        );
        assert_eq!(
            Milliunits::from_scaled_i64(1_200).negative_part(),
            Milliunits::zero()
        );
    }

    #[test]
    fn test_milliunits_serde_as_scaled_i64() {
        let amount = Milliunits::from_scaled_i64(-5_000);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "-5000");
        assert_eq!(
            serde_json::from_str::<Milliunits>("-5000").unwrap(),
            amount
        );
    }

    #[test]
    fn test_month_key_containing_and_next() {
        let key = MonthKey::containing(NaiveDate::from_ymd(2019, 12, 17));
        assert_eq!(key.to_string(), "2019-12-01");
        assert_eq!(key.next().to_string(), "2020-01-01");
        assert_eq!(key.next().next().to_string(), "2020-02-01");
    }

    #[test]
    fn test_month_key_from_str() {
        assert_eq!(
            MonthKey::from_str("2019-02-01").unwrap(),
            MonthKey::containing(NaiveDate::from_ymd(2019, 2, 1))
        );
        assert!(MonthKey::from_str("2019-02-02").is_err());
    }

    #[test]
    fn test_month_key_serde_round_trip() {
        let key = MonthKey::from_str("2019-02-01").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2019-02-01\"");
        assert_eq!(
            serde_json::from_str::<MonthKey>("\"2019-02-01\"").unwrap(),
            key
        );
    }
}

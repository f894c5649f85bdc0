use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    Sqlite,
    Type,
};
use thiserror::Error;

pub const CURRENCY_CODE: &str = "USD";
pub const CURRENCY_CODE_LOWER: &str = "usd";
/// The number of decimal places in one minor currency unit (cents).
pub const MINOR_UNIT_DIGITS: u32 = 2;

//--------------------------------------       Amount        ---------------------------------------------------------
/// An exact decimal amount of money in the store currency.
///
/// Catalog prices, line-item prices and order totals are all `Amount`s. Arithmetic is exact; no rounding happens
/// until the amount is converted to [`MinorUnits`] for the card processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Builds an amount from an integer number of minor units, e.g. `from_minor_units(2500)` is 25.00.
    pub fn from_minor_units(units: i64) -> Self {
        Self(Decimal::new(units, MINOR_UNIT_DIGITS))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Converts the amount to integer minor units.
    ///
    /// This is the one place where money gets rounded. Fractions of a minor unit are rounded half away from zero, so
    /// 10.005 becomes 1001 and -10.005 becomes -1001.
    pub fn to_minor_units(&self) -> Result<MinorUnits, AmountConversionError> {
        let factor = Decimal::from(10i64.pow(MINOR_UNIT_DIGITS));
        self.0
            .checked_mul(factor)
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|rounded| rounded.to_i64())
            .map(MinorUnits)
            .ok_or_else(|| AmountConversionError(format!("{} is too large to express in minor units", self.0)))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<i64> for Amount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self).map_err(|e| AmountConversionError(format!("{s}: {e}")))
    }
}

/// Writes the exact decimal value, without any rounding, so that `Display` output can be persisted and parsed back.
impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Amounts are persisted as decimal text (never REAL), so the stored value is exactly the value that was priced.
impl Type<Sqlite> for Amount {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Amount {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
        <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Amount {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(text.parse::<Amount>()?)
    }
}

//--------------------------------------     MinorUnits      ---------------------------------------------------------
/// An integer amount in the smallest currency unit (cents). Only ever produced by [`Amount::to_minor_units`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}¢", self.0)
    }
}

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::errors::{BillingError, Result};

/// decimal places kept for amounts (dinar millimes)
pub const MONEY_SCALE: u32 = 3;

/// currency amount with millime precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(MONEY_SCALE))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> std::result::Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s.trim())?.round_dp(MONEY_SCALE)))
    }

    /// create from integer amount
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor units (millimes, cents).
    /// scales past what `Decimal` can hold fail with `InvalidAmount`.
    pub fn from_minor(amount: i64, scale: u32) -> Result<Self> {
        Decimal::try_new(amount, scale)
            .map(Money::from_decimal)
            .map_err(|_| BillingError::InvalidAmount {
                amount: format!("{}e-{}", amount, scale),
            })
    }

    /// create from a float coming off a form or json number.
    /// NaN and infinities are rejected.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(BillingError::InvalidAmount {
                amount: value.to_string(),
            });
        }
        Decimal::from_f64(value)
            .map(Money::from_decimal)
            .ok_or_else(|| BillingError::InvalidAmount {
                amount: value.to_string(),
            })
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// fails with `InvalidAmount` unless strictly positive
    pub fn ensure_positive(self) -> Result<Self> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(BillingError::InvalidAmount {
                amount: self.to_string(),
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(MONEY_SCALE))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(MONEY_SCALE);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(MONEY_SCALE))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

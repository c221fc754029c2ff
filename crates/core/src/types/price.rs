//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices as JSON floats. They are converted to
//! [`Decimal`] at the edge so that cart totals never accumulate binary
//! floating point error.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Round to the currency's minor unit, half away from zero.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency_code.minor_units(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency_code: self.currency_code,
        }
    }
}

impl fmt::Display for Price {
    /// Formats as `$12.50` for decimal currencies and `$19.990` (dot as
    /// thousands separator, no decimals) for CLP.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        match self.currency_code {
            CurrencyCode::CLP => {
                let digits = rounded.amount.abs().trunc().to_string();
                let sign = if rounded.amount.is_sign_negative() && !rounded.amount.is_zero() {
                    "-"
                } else {
                    ""
                };
                write!(f, "{sign}${}", group_thousands(&digits, '.'))
            }
            CurrencyCode::USD => write!(f, "${:.2}", rounded.amount),
            CurrencyCode::EUR => write!(f, "€{:.2}", rounded.amount),
        }
    }
}

/// Insert `separator` every three digits from the right.
fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    CLP,
}

impl CurrencyCode {
    /// Number of decimal places in the currency's minor unit.
    #[must_use]
    pub const fn minor_units(&self) -> u32 {
        match self {
            Self::USD | Self::EUR => 2,
            Self::CLP => 0,
        }
    }
}

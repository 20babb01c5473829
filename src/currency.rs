//! The currencies a transaction can be recorded in.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A supported ISO 4217 currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
    Eur,
    Gbp,
    Aud,
    Cad,
    Sgd,
    Jpy,
    Cny,
    Chf,
    Aed,
    Sar,
    Nzd,
    Sek,
    Nok,
    Dkk,
    Zar,
    Thb,
    Myr,
    Krw,
    Idr,
}

impl Currency {
    /// Every supported currency in display order.
    pub const ALL: [Currency; 21] = [
        Currency::Inr,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Aud,
        Currency::Cad,
        Currency::Sgd,
        Currency::Jpy,
        Currency::Cny,
        Currency::Chf,
        Currency::Aed,
        Currency::Sar,
        Currency::Nzd,
        Currency::Sek,
        Currency::Nok,
        Currency::Dkk,
        Currency::Zar,
        Currency::Thb,
        Currency::Myr,
        Currency::Krw,
        Currency::Idr,
    ];

    /// The currency new transactions default to.
    pub const DEFAULT: Currency = Currency::Usd;

    /// The currency the remote service converts every amount into.
    pub const REPORTING: Currency = Currency::Inr;

    pub fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Sgd => "SGD",
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
            Currency::Chf => "CHF",
            Currency::Aed => "AED",
            Currency::Sar => "SAR",
            Currency::Nzd => "NZD",
            Currency::Sek => "SEK",
            Currency::Nok => "NOK",
            Currency::Dkk => "DKK",
            Currency::Zar => "ZAR",
            Currency::Thb => "THB",
            Currency::Myr => "MYR",
            Currency::Krw => "KRW",
            Currency::Idr => "IDR",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Inr => "Indian Rupee",
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Gbp => "British Pound",
            Currency::Aud => "Australian Dollar",
            Currency::Cad => "Canadian Dollar",
            Currency::Sgd => "Singapore Dollar",
            Currency::Jpy => "Japanese Yen",
            Currency::Cny => "Chinese Yuan",
            Currency::Chf => "Swiss Franc",
            Currency::Aed => "UAE Dirham",
            Currency::Sar => "Saudi Riyal",
            Currency::Nzd => "New Zealand Dollar",
            Currency::Sek => "Swedish Krona",
            Currency::Nok => "Norwegian Krone",
            Currency::Dkk => "Danish Krone",
            Currency::Zar => "South African Rand",
            Currency::Thb => "Thai Baht",
            Currency::Myr => "Malaysian Ringgit",
            Currency::Krw => "South Korean Won",
            Currency::Idr => "Indonesian Rupiah",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let code = code.trim();

        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::UnsupportedCurrency(code.to_owned()))
    }
}

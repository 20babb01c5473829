//! Defines the core data models for transactions as exchanged with the remote
//! transaction service.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::currency::Currency;

// ============================================================================
// MODELS
// ============================================================================

/// The ID the remote service assigns to a transaction.
pub type TransactionId = i64;

/// An expense or income recorded by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction, immutable after creation.
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(with = "calendar_date")]
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount in `currency`.
    pub original_amount: f64,
    /// The currency the transaction was recorded in.
    pub currency: Currency,
    /// The amount converted to the reporting currency by the remote service.
    #[serde(
        rename = "amount_in_inr",
        alias = "amountInBaseUnit",
        alias = "amountInInr",
        default
    )]
    pub amount_in_base_unit: f64,
    /// Whether the transaction has been soft deleted.
    #[serde(default)]
    pub is_deleted: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        date: Date,
        description: &str,
        original_amount: f64,
        currency: Currency,
    ) -> NewTransaction {
        NewTransaction {
            date,
            description: description.to_owned(),
            original_amount,
            currency,
        }
    }
}

/// The fields the client supplies when creating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub description: String,
    pub original_amount: f64,
    pub currency: Currency,
}

/// A partial update to a transaction. Fields set to `None` are left untouched
/// by the remote service and are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(
        with = "calendar_date::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

impl From<NewTransaction> for TransactionPatch {
    fn from(transaction: NewTransaction) -> Self {
        Self {
            date: Some(transaction.date),
            description: Some(transaction.description),
            original_amount: Some(transaction.original_amount),
            currency: Some(transaction.currency),
        }
    }
}

/// Serde helpers for calendar dates.
///
/// Dates are always written as `YYYY-MM-DD`. When reading, an ISO date-time
/// is also accepted and truncated to its calendar date.
pub(crate) mod calendar_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(text: &str) -> Result<Date, time::error::Parse> {
        let text = text.trim();
        let calendar_part = text.get(..10).unwrap_or(text);

        Date::parse(calendar_part, DATE_FORMAT)
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| super::parse(&text).map_err(D::Error::custom))
                .transpose()
        }
    }
}

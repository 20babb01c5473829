//! The typed interface to the remote transaction service.
//!
//! [TransactionApi] is the seam between the controllers and the network:
//! [HttpTransactionClient] implements it over HTTP and the tests substitute an
//! in-memory fake.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
};

pub use http::HttpTransactionClient;

/// One page of transactions and the number of transactions across all pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: u64,
}

/// The message used by the remote service when none of the uploaded rows were stored.
pub const NOTHING_UPLOADED_MESSAGE: &str = "No transactions were uploaded.";

fn default_upload_message() -> String {
    "CSV uploaded successfully!".to_owned()
}

/// The outcome of one CSV import as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    #[serde(default = "default_upload_message")]
    pub message: String,
    /// Rows of the file that were rejected as duplicates of other rows.
    #[serde(default)]
    pub duplicate_rows: Vec<serde_json::Value>,
    /// Rows of the file that the service had already stored, as echoed by the service.
    #[serde(default, rename = "repeatsInDB")]
    pub repeats_in_db: Vec<serde_json::Value>,
    /// One message per row that could not be imported.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl UploadSummary {
    /// A summary for an upload that failed before the service produced one.
    pub fn from_error(error: &Error) -> Self {
        let message = error.to_string();

        Self {
            message: message.clone(),
            duplicate_rows: Vec::new(),
            repeats_in_db: Vec::new(),
            errors: vec![message],
        }
    }
}

/// A CSV file selected by the user for import.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// The operations offered by the remote transaction service.
///
/// Every call suspends until the service responds or the request fails.
/// Failures are normalized to [Error::Network], [Error::Server],
/// [Error::Conflict] or [Error::InvalidResponse].
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Get a page of active transactions.
    async fn list(&self, page: u64, limit: u64) -> Result<TransactionPage, Error>;

    /// Get a page of active transactions whose description or currency
    /// matches `query`, ignoring case.
    async fn search(&self, query: &str, page: u64, limit: u64)
    -> Result<TransactionPage, Error>;

    /// Get a page of soft-deleted transactions.
    async fn list_deleted(&self, page: u64, limit: u64) -> Result<TransactionPage, Error>;

    /// Create a transaction.
    ///
    /// Fails with [Error::Conflict] if the service already has an equivalent transaction.
    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction, Error>;

    async fn update(
        &self,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error>;

    async fn soft_delete(&self, id: TransactionId) -> Result<Transaction, Error>;

    async fn restore(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Permanently remove a transaction, returning the confirmation message.
    async fn hard_delete(&self, id: TransactionId) -> Result<String, Error>;

    async fn batch_soft_delete(&self, ids: &[TransactionId]) -> Result<String, Error>;

    async fn batch_restore(&self, ids: &[TransactionId]) -> Result<String, Error>;

    async fn batch_hard_delete(&self, ids: &[TransactionId]) -> Result<String, Error>;

    /// Upload a CSV file of transactions.
    ///
    /// Individual rows may be stored, reported as duplicates or reported as
    /// errors within the same summary.
    async fn import_csv(&self, file: CsvFile) -> Result<UploadSummary, Error>;

    /// Download every transaction as CSV.
    async fn export_csv(&self) -> Result<Vec<u8>, Error>;
}

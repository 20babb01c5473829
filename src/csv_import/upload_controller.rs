//! Sends CSV files to the remote service and keeps the summary of the last
//! import for the import page and the upload log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    Error,
    alert::Alert,
    client::{CsvFile, NOTHING_UPLOADED_MESSAGE, TransactionApi, UploadSummary},
    csv_import::alert::{failure_alert, summary_alert},
    transaction::Refetch,
};

/// Where the controller is in the upload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    /// The last upload finished and its summary is available.
    Summarized,
    /// The last upload failed. Its summary holds the error.
    Failed,
}

#[derive(Debug)]
struct UploadState {
    status: UploadStatus,
    summary: Option<UploadSummary>,
    generation: u64,
}

pub struct UploadController {
    client: Arc<dyn TransactionApi>,
    on_success: Arc<dyn Refetch>,
    state: Mutex<UploadState>,
}

impl UploadController {
    /// Create a controller that reloads `on_success` after every upload that
    /// stored transactions.
    pub fn new(client: Arc<dyn TransactionApi>, on_success: Arc<dyn Refetch>) -> Self {
        Self {
            client,
            on_success,
            state: Mutex::new(UploadState {
                status: UploadStatus::Idle,
                summary: None,
                generation: 0,
            }),
        }
    }

    /// Import `file` and return the alert describing the outcome.
    ///
    /// The file is checked locally first. A file that fails the check is
    /// reported exactly like an upload the remote service rejected.
    pub async fn upload(&self, file: CsvFile) -> Alert {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.status = UploadStatus::Uploading;
            state.generation
        };

        tracing::debug!(
            "Uploading {} ({} bytes)",
            file.file_name,
            file.contents.len()
        );

        let result = match check_csv(&file.contents) {
            Ok(()) => self.client.import_csv(file).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(summary) => {
                let stored_transactions = summary.message != NOTHING_UPLOADED_MESSAGE;
                let alert = summary_alert(&summary);
                self.finish(generation, UploadStatus::Summarized, summary);

                if stored_transactions {
                    if let Err(error) = self.on_success.refetch().await {
                        tracing::warn!("Could not reload transactions after import: {error}");
                    }
                }

                alert
            }
            Err(error) => {
                let alert = failure_alert(&error);
                self.finish(
                    generation,
                    UploadStatus::Failed,
                    UploadSummary::from_error(&error),
                );

                alert
            }
        }
    }

    /// Store the outcome unless a newer upload was started in the meantime.
    fn finish(&self, generation: u64, status: UploadStatus, summary: UploadSummary) {
        let mut state = self.lock();

        if state.generation != generation {
            tracing::debug!("Discarding the summary of a superseded upload");
            return;
        }

        state.status = status;
        state.summary = Some(summary);
    }

    pub fn status(&self) -> UploadStatus {
        self.lock().status
    }

    /// The summary of the last finished upload, if any.
    pub fn summary(&self) -> Option<UploadSummary> {
        self.lock().summary.clone()
    }

    /// The last summary as pretty-printed JSON, if any.
    pub fn summary_json(&self) -> Option<String> {
        let summary = self.summary()?;

        match serde_json::to_string_pretty(&summary) {
            Ok(json) => Some(json),
            Err(error) => {
                tracing::error!("Could not serialize the upload summary: {error}");
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check that `contents` is a non-empty CSV file with a header row.
fn check_csv(contents: &[u8]) -> Result<(), Error> {
    if contents.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(contents);
    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(Error::InvalidCSV("missing header row".to_owned()));
    }

    Ok(())
}

//! Defines the route for downloading every transaction as a CSV file.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{AppState, Error, client::TransactionApi};

const EXPORT_FILE_NAME: &str = "transactions.csv";

/// The state needed to export transactions.
#[derive(Clone)]
pub struct ExportState {
    /// The remote transaction service.
    pub api: Arc<dyn TransactionApi>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
        }
    }
}

/// Download the CSV export of the remote service as an attachment.
pub async fn get_export(State(state): State<ExportState>) -> Result<Response, Error> {
    let contents = state
        .api
        .export_csv()
        .await
        .inspect_err(|error| tracing::error!("Could not export transactions: {error}"))?;

    tracing::debug!("Exporting {} bytes of transactions", contents.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        contents,
    )
        .into_response())
}

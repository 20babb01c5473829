//! Implements a struct that holds the state of the dashboard server.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    Error,
    client::TransactionApi,
    csv_import::UploadController,
    pagination::PaginationConfig,
    session::SessionManager,
    timezone::get_local_offset,
    transaction::{ListView, TransactionListController},
};

/// The state of the dashboard server.
///
/// Every controller exists once per server and is shared by all requests.
#[derive(Clone)]
pub struct AppState {
    /// The log-in state of the user.
    pub session: SessionManager,

    /// The remote transaction service.
    pub api: Arc<dyn TransactionApi>,

    /// The list of active transactions shown on the dashboard.
    pub transactions: Arc<TransactionListController>,

    /// The list of soft-deleted transactions.
    pub deleted_transactions: Arc<TransactionListController>,

    /// The CSV import state.
    pub uploads: Arc<UploadController>,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// The client ID for the Google sign-in button, if configured.
    pub google_client_id: Option<String>,
}

impl AppState {
    /// Create the controllers on top of `api`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Kolkata".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known timezone.
    pub fn new(
        session: SessionManager,
        api: Arc<dyn TransactionApi>,
        local_timezone: &str,
        pagination_config: PaginationConfig,
        google_client_id: Option<String>,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        let transactions = Arc::new(TransactionListController::new(
            ListView::Active,
            api.clone(),
            &pagination_config,
        ));
        let deleted_transactions = Arc::new(TransactionListController::new(
            ListView::Deleted,
            api.clone(),
            &pagination_config,
        ));
        let uploads = Arc::new(UploadController::new(api.clone(), transactions.clone()));

        Ok(Self {
            session,
            api,
            transactions,
            deleted_transactions,
            uploads,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            google_client_id,
        })
    }

    /// The list controller for `view`.
    pub fn list(&self, view: ListView) -> &Arc<TransactionListController> {
        match view {
            ListView::Active => &self.transactions,
            ListView::Deleted => &self.deleted_transactions,
        }
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.session.clone()
    }
}

//! Route handlers for the list controls: paging, rows per page, search and
//! selection. Each responds with the re-rendered `#transaction-list` fragment.

use std::sync::Arc;

use axum::{
    Form,
    extract::{FromRef, Path, State},
    response::Response,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    pagination::PaginationConfig,
    transaction::{
        core::TransactionId,
        list_controller::{ListView, TransactionListController},
        view::list_response,
    },
};

/// The state needed by the handlers that act on a transaction list.
#[derive(Clone)]
pub struct ListsState {
    /// The list of active transactions.
    pub transactions: Arc<TransactionListController>,
    /// The list of soft-deleted transactions.
    pub deleted_transactions: Arc<TransactionListController>,
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl ListsState {
    pub fn list(&self, view: ListView) -> &Arc<TransactionListController> {
        match view {
            ListView::Active => &self.transactions,
            ListView::Deleted => &self.deleted_transactions,
        }
    }

    /// Render `view`, adding `alert` to the response if given.
    pub fn respond(&self, view: ListView, alert: Option<Alert>) -> Response {
        list_response(
            &self.list(view).snapshot(),
            &self.pagination_config,
            alert,
        )
    }
}

impl FromRef<AppState> for ListsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transactions: state.transactions.clone(),
            deleted_transactions: state.deleted_transactions.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageForm {
    page: u64,
}

#[derive(Debug, Deserialize)]
pub struct LimitForm {
    limit: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    search: String,
}

/// The notification for a list that could not be loaded. The list also
/// keeps showing the failure until the next successful load.
fn fetch_failure_alert(error: &Error) -> Alert {
    Alert::Error {
        message: "Failed to fetch transactions".to_owned(),
        details: error.to_string(),
    }
}

/// Show another page of the list.
pub async fn post_list_page(
    State(state): State<ListsState>,
    Path(view): Path<ListView>,
    Form(form): Form<PageForm>,
) -> Response {
    let alert = match state.list(view).set_page(form.page).await {
        Ok(()) => None,
        Err(error) => {
            tracing::debug!("Could not load page {} of the {view} list: {error}", form.page);
            Some(fetch_failure_alert(&error))
        }
    };

    state.respond(view, alert)
}

/// Change the number of rows per page.
pub async fn post_list_limit(
    State(state): State<ListsState>,
    Path(view): Path<ListView>,
    Form(form): Form<LimitForm>,
) -> Response {
    let alert = match state.list(view).set_limit(form.limit).await {
        Ok(()) => None,
        Err(error) => {
            tracing::debug!("Could not load the {view} list with {} rows: {error}", form.limit);
            Some(fetch_failure_alert(&error))
        }
    };

    state.respond(view, alert)
}

/// Filter the list by a search term.
pub async fn post_list_search(
    State(state): State<ListsState>,
    Path(view): Path<ListView>,
    Form(form): Form<SearchForm>,
) -> Response {
    let alert = match state.list(view).set_search(&form.search).await {
        Ok(()) => None,
        Err(error) => {
            tracing::debug!("Could not search the {view} list: {error}");
            Some(fetch_failure_alert(&error))
        }
    };

    state.respond(view, alert)
}

/// Select every row on the page, or clear the selection.
pub async fn post_toggle_select_all(
    State(state): State<ListsState>,
    Path(view): Path<ListView>,
) -> Response {
    state.list(view).toggle_select_all();

    state.respond(view, None)
}

/// Select or deselect one row.
pub async fn post_toggle_selection(
    State(state): State<ListsState>,
    Path((view, transaction_id)): Path<(ListView, TransactionId)>,
) -> Response {
    let alert = match state.list(view).toggle_selection(transaction_id) {
        Ok(_) => None,
        Err(error) => {
            tracing::warn!("Could not toggle the selection of {transaction_id}: {error}");
            Some(Alert::from(&error))
        }
    };

    state.respond(view, alert)
}

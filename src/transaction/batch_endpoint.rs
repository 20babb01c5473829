//! Route handlers for the actions on the selected transactions.

use axum::{extract::State, response::Response};

use crate::transaction::{list_controller::ListView, list_endpoints::ListsState};

/// Soft delete the transactions selected in the active list.
pub async fn batch_delete_endpoint(State(state): State<ListsState>) -> Response {
    let alert = state.transactions.batch_soft_delete().await;

    state.respond(ListView::Active, Some(alert))
}

/// Restore the transactions selected in the deleted list.
pub async fn batch_restore_endpoint(State(state): State<ListsState>) -> Response {
    let alert = state.deleted_transactions.batch_restore().await;

    state.respond(ListView::Deleted, Some(alert))
}

/// Permanently delete the transactions selected in the deleted list.
pub async fn batch_purge_endpoint(State(state): State<ListsState>) -> Response {
    let alert = state.deleted_transactions.batch_hard_delete().await;

    state.respond(ListView::Deleted, Some(alert))
}

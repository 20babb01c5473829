//! Route handlers for the row actions: soft delete in the active view, and
//! restore or permanent delete in the deleted view.

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::transaction::{
    core::TransactionId, list_controller::ListView, list_endpoints::ListsState,
};

/// A route handler for soft deleting a transaction, responds with the active
/// list and an alert.
///
/// The status code is always 200 OK or htmx will not swap the list.
pub async fn delete_transaction_endpoint(
    State(state): State<ListsState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let alert = state.transactions.soft_delete(transaction_id).await;

    state.respond(ListView::Active, Some(alert))
}

/// A route handler for restoring a soft-deleted transaction, responds with
/// the deleted list and an alert.
pub async fn restore_transaction_endpoint(
    State(state): State<ListsState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let alert = state.deleted_transactions.restore(transaction_id).await;

    state.respond(ListView::Deleted, Some(alert))
}

/// A route handler for permanently deleting a soft-deleted transaction.
pub async fn purge_transaction_endpoint(
    State(state): State<ListsState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let alert = state.deleted_transactions.hard_delete(transaction_id).await;

    state.respond(ListView::Deleted, Some(alert))
}

//! Defines the route handler for the page for editing a transaction.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    timezone::current_local_date,
    transaction::{
        core::TransactionId,
        form::{FormAction, TransactionFormDefaults, TransactionFormState, transaction_form_page},
    },
};

/// Renders the page for editing a transaction.
///
/// The remote service has no endpoint for a single transaction, so the
/// transaction is taken from the page loaded on the dashboard.
pub async fn get_edit_transaction_page(
    State(state): State<TransactionFormState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;
    let transaction = state.transactions.transaction(transaction_id).ok_or_else(|| {
        tracing::warn!("Transaction {transaction_id} is not on the loaded page");
        Error::NotFound
    })?;
    let profile = state.session.profile();

    Ok(transaction_form_page(
        FormAction::Edit(transaction_id),
        &TransactionFormDefaults::from_transaction(&transaction, today),
        profile.as_ref(),
    )
    .into_response())
}

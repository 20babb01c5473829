//! Defines the endpoint for updating a transaction.

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};

use crate::{
    timezone::current_local_date,
    transaction::{
        core::TransactionId,
        form::{TransactionForm, TransactionFormState, form_submission_response},
    },
};

/// A route handler for updating a transaction.
///
/// Redirects to the dashboard on success, otherwise responds with an error alert.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionFormState>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match current_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let alert = state.transactions.update(transaction_id, &form, today).await;

    form_submission_response(alert)
}

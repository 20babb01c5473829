//! Defines the endpoint for creating a new transaction.

use axum::{Form, extract::State, response::Response};

use crate::{
    timezone::current_local_date,
    transaction::form::{TransactionForm, TransactionFormState, form_submission_response},
};

/// A route handler for creating a new transaction.
///
/// Redirects to the dashboard on success, otherwise responds with an error alert.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionFormState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match current_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let alert = state.transactions.create(&form, today).await;

    form_submission_response(alert)
}

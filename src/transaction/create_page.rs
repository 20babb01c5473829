//! Defines the route handler for the page for creating a new transaction.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    timezone::current_local_date,
    transaction::form::{
        FormAction, TransactionFormDefaults, TransactionFormState, transaction_form_page,
    },
};

/// Renders the page for creating a transaction.
pub async fn get_create_transaction_page(
    State(state): State<TransactionFormState>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;
    let profile = state.session.profile();

    Ok(transaction_form_page(
        FormAction::Create,
        &TransactionFormDefaults::new_transaction(today),
        profile.as_ref(),
    )
    .into_response())
}

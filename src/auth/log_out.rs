//! Log-out route handler that ends the session and redirects users.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};

use crate::{endpoints, session::SessionManager};

/// End the session and redirect the client to the log-in page.
pub async fn get_log_out(State(session): State<SessionManager>) -> Response {
    session.logout();

    Redirect::to(endpoints::LOG_IN_VIEW).into_response()
}

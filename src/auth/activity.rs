//! The heartbeat the page script sends while the user is active.

use axum::http::StatusCode;

/// Acknowledge a heartbeat.
///
/// The auth guard in front of this route already pushed back the inactivity
/// deadline, so there is nothing left to do here.
pub async fn post_activity() -> StatusCode {
    StatusCode::NO_CONTENT
}

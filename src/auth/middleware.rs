//! Authentication middleware that checks the session, counts requests as
//! activity, and handles redirects to the log-in page.

use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    AppState,
    auth::redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    endpoints,
    session::SessionManager,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The log-in state of the user.
    pub session: SessionManager,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            session: state.session.clone(),
        }
    }
}

/// Run the request if the user is logged in, otherwise return the response
/// from `get_redirect` pointing at the log-in page.
///
/// Every request that passes the guard counts as user activity and pushes
/// back the inactivity log out.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    if !state.session.is_authenticated() {
        let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
            if request.uri().path().starts_with("/api") {
                tracing::warn!(
                    "Missing or invalid HTMX headers for /api request. Falling back to dashboard."
                );
            } else {
                tracing::warn!("Invalid redirect URL from request URI. Falling back to dashboard.");
            }

            build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
                .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
        });

        tracing::debug!(
            "Not logged in, redirecting {} to {log_in_redirect_url}",
            request.uri()
        );
        return get_redirect(&log_in_redirect_url);
    }

    state.session.record_activity();

    next.run(request).await
}

/// Middleware function that checks that the user is logged in.
/// The request is executed normally if they are, otherwise a redirect to the log-in page is returned.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware function that checks that the user is logged in.
/// The request is executed normally if they are, otherwise a HTMX redirect to the log-in page is returned.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

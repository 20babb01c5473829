//! This file defines the routes for displaying the log-in page and handling log-in requests.
//!
//! The identity provider signs the user in on the client and hands the page an
//! identity token, which is posted here to start the session.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::redirect::normalize_redirect_url,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, base,
        loading_spinner, log_in_card,
    },
    session::{Credential, SessionManager},
};

const GOOGLE_IDENTITY_SCRIPT: &str = "https://accounts.google.com/gsi/client";

fn log_in_form(
    error_message: Option<&str>,
    redirect_url: Option<&str>,
    google_client_id: Option<&str>,
) -> Markup {
    html! {
        form
            id="log-in-form"
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#credential, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            @if let Some(client_id) = google_client_id {
                div
                    id="g_id_onload"
                    data-client_id=(client_id)
                    data-callback="handleCredentialResponse"
                    data-auto_prompt="false"
                {}

                div class="g_id_signin" data-type="standard" {}

                p class="text-sm font-light text-gray-500 dark:text-gray-400"
                {
                    "Or paste an identity token below."
                }
            }

            div
            {
                label for="credential" class=(FORM_LABEL_STYLE) { "Identity token" }

                textarea
                    name="credential"
                    id="credential"
                    rows="4"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE)
                {}

                @if let Some(error_message) = error_message
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The state needed to show the log-in page and perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The log-in state of the user.
    pub session: SessionManager,
    /// The client ID for the Google sign-in button, if configured.
    pub google_client_id: Option<String>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            session: state.session.clone(),
            google_client_id: state.google_client_id.clone(),
        }
    }
}

/// Display the log-in page, or go straight to the dashboard if already logged in.
pub async fn get_log_in_page(
    State(state): State<LogInState>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");

    if state.session.is_authenticated() {
        return Redirect::to(redirect_url.as_deref().unwrap_or(endpoints::DASHBOARD_VIEW))
            .into_response();
    }

    let log_in_form = log_in_form(
        None,
        redirect_url.as_deref(),
        state.google_client_id.as_deref(),
    );
    let content = log_in_card("Log in to your account", &log_in_form);
    let head_elements = match state.google_client_id {
        Some(_) => vec![HeadElement::ScriptLink(GOOGLE_IDENTITY_SCRIPT.to_owned())],
        None => Vec::new(),
    };

    base("Log In", &head_elements, &content).into_response()
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request the session is started and the client is
/// redirected to the dashboard, or the page they came from.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    Form(log_in_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(log_in_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let credential = match Credential::from_id_token(log_in_data.credential.trim()) {
        Ok(credential) => credential,
        Err(error) => {
            tracing::warn!("Rejected identity token: {error}");
            let message = Error::InvalidCredential.to_string();

            return log_in_form(
                Some(&message),
                redirect_url,
                state.google_client_id.as_deref(),
            )
            .into_response();
        }
    };

    state.session.login(credential);

    (
        HxRedirect(redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW).to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The data posted by the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The identity token issued by the identity provider.
    #[serde(default)]
    pub credential: String,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}

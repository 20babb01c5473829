//! Transient notifications shown to the user after an action.
//!
//! Alerts are rendered into the `#alert-container` element defined in the
//! base layout, either as the swap target of a failed request or as an
//! out-of-band swap alongside a regular fragment.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

use crate::Error;

/// A message for the user, styled by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action succeeded.
    Success { message: String, details: String },
    /// The action succeeded without further details.
    SuccessSimple { message: String },
    /// Neutral information, e.g. an action that had nothing to do.
    Info { message: String },
    /// The action failed.
    Error { message: String, details: String },
    /// The action failed without further details.
    ErrorSimple { message: String },
}

impl Alert {
    /// The headline of the alert.
    pub fn message(&self) -> &str {
        match self {
            Alert::Success { message, .. }
            | Alert::SuccessSimple { message }
            | Alert::Info { message }
            | Alert::Error { message, .. }
            | Alert::ErrorSimple { message } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. } | Alert::ErrorSimple { .. })
    }

    pub fn into_html(self) -> Markup {
        let (container_style, icon, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, "✓", message, details),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, "✓", message, String::new()),
            Alert::Info { message } => (INFO_STYLE, "ℹ", message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, "!", message, details),
            Alert::ErrorSimple { message } => (ERROR_STYLE, "!", message, String::new()),
        };

        html! {
            div
                role="alert"
                class={"flex items-start gap-3 p-4 mb-4 rounded-lg shadow " (container_style)}
            {
                span class="font-bold" aria-hidden="true" { (icon) }

                div class="flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if !details.is_empty() {
                        p class="text-sm" { (details) }
                    }
                }

                button
                    type="button"
                    class="ml-auto text-lg leading-none"
                    aria-label="Dismiss"
                    onclick="this.closest('#alert-container').classList.add('hidden')"
                {
                    "×"
                }
            }
        }
    }

    /// Render the alert as an out-of-band swap into the alert container so
    /// it can accompany another fragment in the same response.
    pub fn into_oob_html(self) -> Markup {
        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                (self.into_html())
            }
        }
    }
}

const SUCCESS_STYLE: &str = "text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400";
const INFO_STYLE: &str = "text-blue-800 bg-blue-50 dark:bg-gray-800 dark:text-blue-400";
const ERROR_STYLE: &str = "text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400";

impl From<&Error> for Alert {
    fn from(error: &Error) -> Self {
        match error {
            Error::Network(_) => Alert::Error {
                message: error.to_string(),
                details: "Check your connection and try again.".to_owned(),
            },
            Error::InvalidResponse(_) => Alert::Error {
                message: "Unexpected response".to_owned(),
                details: "The transaction service sent a response that could not be read."
                    .to_owned(),
            },
            error => Alert::ErrorSimple {
                message: error.to_string(),
            },
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}

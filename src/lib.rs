//! A web dashboard for managing financial transactions stored by a remote
//! transaction service.
//!
//! The library serves HTML pages and htmx fragments directly. Each browser
//! interaction is routed to one of three controllers that own what the user
//! currently sees:
//!
//! - the session manager, which tracks log-in state and logs the user out
//!   after a period of inactivity,
//! - the transaction list controllers for the active and deleted views,
//! - the upload controller, which reconciles CSV imports.
//!
//! The controllers talk to the remote service through [TransactionApi].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod client;
mod csv_import;
mod currency;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod pagination;
mod routing;
mod session;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use client::{HttpTransactionClient, TransactionApi};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use session::{FileSessionStore, INACTIVITY_TIMEOUT, SessionManager};

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response, transaction::ListView,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required form field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A date in the future was used to create or edit a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The date could not be parsed as a calendar date (YYYY-MM-DD).
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The transaction description was empty or only whitespace.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// The amount could not be parsed as a finite decimal number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// The amount was below zero.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// The currency code is not one of the supported currencies.
    #[error("{0} is not a supported currency")]
    UnsupportedCurrency(String),

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The uploaded CSV file had no content.
    #[error("The CSV file is empty")]
    EmptyFile,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The identity token could not be decoded into a user profile.
    #[error("Log in failed. Please try again.")]
    InvalidCredential,

    /// The request never reached the remote transaction service, e.g. the
    /// connection was refused or timed out.
    ///
    /// The string holds the underlying cause and is only meant for the logs.
    #[error("Network error occurred")]
    Network(String),

    /// The remote transaction service responded with a failure status.
    #[error("{message}")]
    Server {
        /// The HTTP status code of the response.
        status: u16,
        /// The message from the response body.
        message: String,
    },

    /// The remote transaction service rejected a transaction because an
    /// equivalent one already exists.
    #[error("{0}")]
    Conflict(String),

    /// The remote transaction service responded with a body that could not be read.
    #[error("the server sent a response that could not be read: {0}")]
    InvalidResponse(String),

    /// A batch operation was requested while no transactions were selected.
    #[error("No transactions selected")]
    NothingSelected,

    /// The transaction is not on the currently loaded page.
    #[error("transaction {0} is not on the current page")]
    NotOnPage(i64),

    /// The operation is not offered in the given list view.
    #[error("this action is not available in the {0} view")]
    WrongView(ListView),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The persisted session could not be read or written.
    #[error("could not access the session store: {0}")]
    SessionStore(String),
}

impl Error {
    /// Whether the error was caused by invalid user input that was caught
    /// before anything was sent to the remote service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingField(_)
                | Error::FutureDate(_)
                | Error::InvalidDate(_)
                | Error::EmptyDescription
                | Error::InvalidAmount(_)
                | Error::NegativeAmount
                | Error::UnsupportedCurrency(_)
                | Error::NotCSV
                | Error::EmptyFile
                | Error::InvalidCSV(_)
                | Error::InvalidCredential
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::Network(cause) => {
                tracing::error!("Could not reach the transaction service: {cause}");
                (
                    StatusCode::BAD_GATEWAY,
                    InternalServerError {
                        description: "Could not reach the transaction service",
                        fix: "Check your connection and try again.",
                    }
                    .into_html(),
                )
                    .into_response()
            }
            Error::Server { status, message } => {
                tracing::error!("The transaction service responded with {status}: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    InternalServerError {
                        description: "The transaction service reported an error",
                        fix: &message,
                    }
                    .into_html(),
                )
                    .into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let status = match &self {
            error if error.is_validation() => StatusCode::BAD_REQUEST,
            Error::NothingSelected | Error::WrongView(_) => StatusCode::BAD_REQUEST,
            Error::NotOnPage(_) | Error::NotFound => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Network(_) | Error::Server { .. } | Error::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let alert = match self {
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            },
            Error::SessionStore(cause) => {
                tracing::error!("Session store failure: {cause}");
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                }
            }
            error => Alert::from(&error),
        };

        (status, Html(alert.into_html().into_string())).into_response()
    }
}

//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

use std::fmt::Display;

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users, listing the active transactions.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing soft-deleted transactions.
pub const DELETED_VIEW: &str = "/deleted";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for importing transactions from a CSV file.
pub const IMPORT_VIEW: &str = "/transactions/import";
/// The raw summary of the last CSV import.
pub const IMPORT_LOG_VIEW: &str = "/transactions/import/log";
/// The route for downloading every transaction as CSV.
pub const EXPORT: &str = "/transactions/export";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route the page script reports user activity to.
pub const ACTIVITY: &str = "/api/activity";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or soft delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to restore a soft-deleted transaction.
pub const RESTORE_TRANSACTION: &str = "/api/transactions/{transaction_id}/restore";
/// The route to permanently delete a soft-deleted transaction.
pub const PURGE_TRANSACTION: &str = "/api/transactions/{transaction_id}/purge";
/// The route to soft delete the selected transactions.
pub const BATCH_DELETE: &str = "/api/transactions/batch/delete";
/// The route to restore the selected transactions.
pub const BATCH_RESTORE: &str = "/api/transactions/batch/restore";
/// The route to permanently delete the selected transactions.
pub const BATCH_PURGE: &str = "/api/transactions/batch/purge";
/// The route to upload a CSV file for importing transactions.
pub const IMPORT: &str = "/api/import";
/// The route to change the page of a list.
pub const LIST_PAGE: &str = "/api/lists/{view}/page";
/// The route to change the rows per page of a list.
pub const LIST_LIMIT: &str = "/api/lists/{view}/limit";
/// The route to search a list.
pub const LIST_SEARCH: &str = "/api/lists/{view}/search";
/// The route to select or deselect every row on the page of a list.
pub const LIST_SELECTION: &str = "/api/lists/{view}/selection";
/// The route to select or deselect one row of a list.
pub const LIST_SELECTION_ITEM: &str = "/api/lists/{view}/selection/{transaction_id}";

/// Replace the first parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
/// Call the function once per parameter for paths with several.
///
/// This function assumes that an endpoint path only contains ASCII characters.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::{endpoints, transaction::ListView};

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::DELETED_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::IMPORT_VIEW,
            endpoints::IMPORT_LOG_VIEW,
            endpoints::EXPORT,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::ACTIVITY,
            endpoints::TRANSACTIONS_API,
            endpoints::BATCH_DELETE,
            endpoints::BATCH_RESTORE,
            endpoints::BATCH_PURGE,
            endpoints::IMPORT,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn parameterized_endpoints_are_valid_uris_once_formatted() {
        for endpoint in [
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::TRANSACTION,
            endpoints::RESTORE_TRANSACTION,
            endpoints::PURGE_TRANSACTION,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, 1));
        }

        for endpoint in [
            endpoints::LIST_PAGE,
            endpoints::LIST_LIMIT,
            endpoints::LIST_SEARCH,
            endpoints::LIST_SELECTION,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, ListView::Active));
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
    }

    #[test]
    fn replaces_parameters_one_at_a_time() {
        let formatted_path = format_endpoint(
            &format_endpoint(endpoints::LIST_SELECTION_ITEM, ListView::Deleted),
            42,
        );

        assert_eq!(formatted_path, "/api/lists/deleted/selection/42");
    }
}

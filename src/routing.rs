//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_activity, post_log_in},
    csv_import::{get_import_log_page, get_import_page, import_transactions},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        batch_delete_endpoint, batch_purge_endpoint, batch_restore_endpoint,
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_create_transaction_page, get_dashboard_page, get_deleted_page,
        get_edit_transaction_page, get_export, post_list_limit, post_list_page, post_list_search,
        post_toggle_select_all, post_toggle_selection, purge_transaction_endpoint,
        restore_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::DELETED_VIEW, get(get_deleted_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .route(endpoints::IMPORT_LOG_VIEW, get(get_import_log_page))
        .route(endpoints::EXPORT, get(get_export))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are requested by htmx and need the HX-Redirect header for auth redirects to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::ACTIVITY, post(post_activity))
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                delete(delete_transaction_endpoint).put(edit_transaction_endpoint),
            )
            .route(
                endpoints::RESTORE_TRANSACTION,
                post(restore_transaction_endpoint),
            )
            .route(
                endpoints::PURGE_TRANSACTION,
                delete(purge_transaction_endpoint),
            )
            .route(endpoints::BATCH_DELETE, post(batch_delete_endpoint))
            .route(endpoints::BATCH_RESTORE, post(batch_restore_endpoint))
            .route(endpoints::BATCH_PURGE, post(batch_purge_endpoint))
            .route(endpoints::IMPORT, post(import_transactions))
            .route(endpoints::LIST_PAGE, post(post_list_page))
            .route(endpoints::LIST_LIMIT, post(post_list_limit))
            .route(endpoints::LIST_SEARCH, post(post_list_search))
            .route(endpoints::LIST_SELECTION, post(post_toggle_select_all))
            .route(endpoints::LIST_SELECTION_ITEM, post(post_toggle_selection))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

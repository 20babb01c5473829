//! Defines the route handlers for the dashboard and the deleted transactions page.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    csv_import::{UploadSource, upload_form_view},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    session::{SessionManager, UserProfile},
    transaction::{
        list_controller::{ListSnapshot, ListView},
        list_endpoints::ListsState,
        view::transaction_list_view,
    },
};

fn dashboard_view(
    snapshot: &ListSnapshot,
    state: &ListsState,
    profile: Option<&UserProfile>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, profile).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                div class="flex flex-wrap items-center justify-between gap-4"
                {
                    h2 class="text-xl font-bold" { "Transactions" }

                    div class="flex items-center gap-4"
                    {
                        a href=(endpoints::EXPORT) class=(LINK_STYLE) { "Export CSV" }

                        a
                            href=(endpoints::NEW_TRANSACTION_VIEW)
                            class={ "w-auto " (BUTTON_PRIMARY_STYLE) }
                        {
                            "Add Transaction"
                        }
                    }
                }

                (upload_form_view(UploadSource::Dashboard))

                (transaction_list_view(snapshot, &state.pagination_config, false))
            }
        }
    };

    base("Dashboard", &[], &content)
}

fn deleted_view(
    snapshot: &ListSnapshot,
    state: &ListsState,
    profile: Option<&UserProfile>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DELETED_VIEW, profile).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                h2 class="text-xl font-bold" { "Deleted Transactions" }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Restore transactions to show them on the dashboard again, \
                    or delete them permanently."
                }

                (transaction_list_view(snapshot, &state.pagination_config, false))
            }
        }
    };

    base("Deleted Transactions", &[], &content)
}

/// Load the current page of `view` so the page never shows stale rows.
///
/// A failed load is shown in the list, the page is still rendered.
async fn load(state: &ListsState, view: ListView) -> ListSnapshot {
    let list = state.list(view);

    if let Err(error) = list.refetch().await {
        tracing::warn!("Could not load the {view} transactions for the page: {error}");
    }

    list.snapshot()
}

/// Render the dashboard with the active transactions.
pub async fn get_dashboard_page(
    State(state): State<ListsState>,
    State(session): State<SessionManager>,
) -> Response {
    let snapshot = load(&state, ListView::Active).await;
    let profile = session.profile();

    dashboard_view(&snapshot, &state, profile.as_ref()).into_response()
}

/// Render the page with the soft-deleted transactions.
pub async fn get_deleted_page(
    State(state): State<ListsState>,
    State(session): State<SessionManager>,
) -> Response {
    let snapshot = load(&state, ListView::Deleted).await;
    let profile = session.profile();

    deleted_view(&snapshot, &state, profile.as_ref()).into_response()
}

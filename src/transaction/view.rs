//! Renders a transaction list as the `#transaction-list` fragment.
//!
//! The fragment is the swap target of every list interaction: paging, rows
//! per page, search, selection and the row actions all respond with a freshly
//! rendered fragment.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    alert::Alert,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DANGER_STYLE, BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_base_amount,
        format_date, format_original_amount,
    },
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators},
    transaction::{
        core::Transaction,
        list_controller::{FetchStatus, ListSnapshot, ListView},
    },
};

/// The max number of graphemes to display in the transaction table rows before
/// trunctating and displaying ellipses.
const MAX_DESCRIPTION_GRAPHEMES: usize = 32;

/// The ID of the element that list interactions swap.
pub const TRANSACTION_LIST_ID: &str = "transaction-list";

/// Respond with the rendered list and, if given, an alert swapped into the
/// alert container.
///
/// The status is always 200 OK so that htmx performs the swap.
pub fn list_response(
    snapshot: &ListSnapshot,
    config: &PaginationConfig,
    alert: Option<Alert>,
) -> Response {
    let content = html! {
        (transaction_list_view(snapshot, config, false))

        @if let Some(alert) = alert {
            (alert.into_oob_html())
        }
    };

    Html(content.into_string()).into_response()
}

/// Render the table of `snapshot` with its controls.
///
/// Set `oob` to swap the list out-of-band, e.g. alongside the response of a
/// CSV upload.
pub fn transaction_list_view(snapshot: &ListSnapshot, config: &PaginationConfig, oob: bool) -> Markup {
    let target = format!("#{TRANSACTION_LIST_ID}");

    html! {
        div
            id=(TRANSACTION_LIST_ID)
            hx-target=(target)
            hx-swap="outerHTML"
            hx-swap-oob=[oob.then_some("true")]
            data-view=(snapshot.view)
            class="w-full space-y-4"
        {
            (toolbar_view(snapshot))

            @match &snapshot.status {
                FetchStatus::Failed(message) => {
                    div
                        role="alert"
                        class="p-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
                    {
                        span class="font-semibold" { "Could not load transactions: " }
                        (message)
                        " "
                        a href=(page_url(snapshot.view)) class=(LINK_STYLE) { "Retry" }
                    }
                }
                FetchStatus::Loading => {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Loading..." }
                }
                FetchStatus::Idle | FetchStatus::Loaded => {}
            }

            div class="relative overflow-x-auto shadow-md rounded-lg"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class="px-6 py-3"
                            {
                                input
                                    type="checkbox"
                                    id="select-all"
                                    aria-label="Select all transactions on this page"
                                    hx-post=(format_endpoint(endpoints::LIST_SELECTION, snapshot.view))
                                    checked[snapshot.all_selected()]
                                    disabled[snapshot.transactions.is_empty()];
                            }
                            th scope="col" class="px-6 py-3" { "Date" }
                            th scope="col" class="px-6 py-3" { "Description" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount (₹)" }
                            th scope="col" class="px-6 py-3" { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for transaction in &snapshot.transactions {
                            (transaction_row_view(
                                transaction,
                                snapshot.view,
                                snapshot.is_selected(transaction.id),
                            ))
                        }

                        @if snapshot.transactions.is_empty() {
                            tr class=(TABLE_ROW_STYLE) data-empty-row="true"
                            {
                                td colspan="6" class="px-6 py-4 text-center"
                                {
                                    (empty_message(snapshot))
                                }
                            }
                        }
                    }
                }
            }

            (pagination_view(snapshot, config))
        }
    }
}

fn page_url(view: ListView) -> &'static str {
    match view {
        ListView::Active => endpoints::DASHBOARD_VIEW,
        ListView::Deleted => endpoints::DELETED_VIEW,
    }
}

fn empty_message(snapshot: &ListSnapshot) -> &'static str {
    match (snapshot.view, &snapshot.search) {
        (ListView::Active, Some(_)) => "No transactions match your search.",
        (ListView::Active, None) => "No transactions yet. Add one or import a CSV file.",
        (ListView::Deleted, _) => "No deleted transactions.",
    }
}

fn toolbar_view(snapshot: &ListSnapshot) -> Markup {
    let selected_count = snapshot.selection.len();
    let nothing_selected = selected_count == 0;

    html! {
        div class="flex flex-wrap items-center justify-between gap-4"
        {
            @match snapshot.view {
                ListView::Active => {
                    input
                        type="search"
                        name="search"
                        id="search"
                        placeholder="Search description or currency"
                        aria-label="Search transactions"
                        value=[snapshot.search.as_deref()]
                        hx-post=(format_endpoint(endpoints::LIST_SEARCH, snapshot.view))
                        hx-trigger="input changed delay:500ms, search"
                        class={ "max-w-xs " (FORM_TEXT_INPUT_STYLE) };

                    div class="flex gap-2"
                    {
                        button
                            type="button"
                            id="batch-delete"
                            hx-post=(endpoints::BATCH_DELETE)
                            hx-confirm="Delete the selected transactions?"
                            disabled[nothing_selected]
                            class=(BUTTON_DANGER_STYLE)
                        {
                            "Delete Selected (" (selected_count) ")"
                        }
                    }
                }
                ListView::Deleted => {
                    div class="flex gap-2"
                    {
                        button
                            type="button"
                            id="batch-restore"
                            hx-post=(endpoints::BATCH_RESTORE)
                            disabled[nothing_selected]
                            class=(BUTTON_SECONDARY_STYLE)
                        {
                            "Restore Selected (" (selected_count) ")"
                        }

                        button
                            type="button"
                            id="batch-purge"
                            hx-post=(endpoints::BATCH_PURGE)
                            hx-confirm="Permanently delete the selected transactions? This cannot be undone."
                            disabled[nothing_selected]
                            class=(BUTTON_DANGER_STYLE)
                        {
                            "Delete Selected Permanently (" (selected_count) ")"
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row_view(transaction: &Transaction, view: ListView, is_selected: bool) -> Markup {
    let (description, tooltip) = format_description(&transaction.description);
    let selection_url = format_endpoint(
        &format_endpoint(endpoints::LIST_SELECTION_ITEM, view),
        transaction.id,
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                input
                    type="checkbox"
                    name="selected"
                    value=(transaction.id)
                    aria-label={ "Select " (transaction.description) }
                    hx-post=(selection_url)
                    checked[is_selected];
            }
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.date) { (format_date(transaction.date)) }
            }
            td class=(TABLE_CELL_STYLE) title=[tooltip] { (description) }
            td class="px-6 py-4 text-right"
            {
                (format_original_amount(transaction.original_amount, transaction.currency))
            }
            td class="px-6 py-4 text-right" { (format_base_amount(transaction.amount_in_base_unit)) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (row_actions_view(transaction, view))
                }
            }
        }
    }
}

fn row_actions_view(transaction: &Transaction, view: ListView) -> Markup {
    match view {
        ListView::Active => {
            let confirm_message = format!(
                "Are you sure you want to delete the transaction '{}'?",
                transaction.description
            );

            html! {
                a
                    href=(format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
                    class=(LINK_STYLE)
                {
                    "Edit"
                }

                button
                    type="button"
                    hx-delete=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                    hx-confirm=(confirm_message)
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
        ListView::Deleted => {
            let confirm_message = format!(
                "Are you sure you want to permanently delete the transaction '{}'? This cannot be undone.",
                transaction.description
            );

            html! {
                button
                    type="button"
                    hx-post=(format_endpoint(endpoints::RESTORE_TRANSACTION, transaction.id))
                    class=(LINK_STYLE)
                {
                    "Restore"
                }

                button
                    type="button"
                    hx-delete=(format_endpoint(endpoints::PURGE_TRANSACTION, transaction.id))
                    hx-confirm=(confirm_message)
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete Permanently"
                }
            }
        }
    }
}

fn pagination_view(snapshot: &ListSnapshot, config: &PaginationConfig) -> Markup {
    let page_count = snapshot.page_count();
    let page_url = format_endpoint(endpoints::LIST_PAGE, snapshot.view);
    let indicators = create_pagination_indicators(snapshot.page, page_count, config.max_pages);
    let page_vals = |page: u64| format!(r#"{{"page": {page}}}"#);

    html! {
        div class="flex flex-wrap items-center justify-between gap-4 text-sm"
        {
            div class="flex flex-col"
            {
                span id="total-count" { "Total Transactions: " (snapshot.total) }
                span id="page-status" { "Page " (snapshot.page) " of " (page_count) }
            }

            nav aria-label="Pagination" class="flex items-center gap-2"
            {
                button
                    type="button"
                    id="previous-page"
                    hx-post=(page_url)
                    hx-vals=(page_vals(snapshot.page.saturating_sub(1).max(1)))
                    disabled[!snapshot.has_previous_page()]
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Previous"
                }

                ul class="flex items-center gap-1"
                {
                    @for indicator in indicators {
                        @match indicator {
                            PaginationIndicator::CurrPage(page) => {
                                li
                                {
                                    span
                                        aria-current="page"
                                        class="px-3 py-2 font-semibold text-blue-600 dark:text-white"
                                    {
                                        (page)
                                    }
                                }
                            }
                            PaginationIndicator::Page(page) => {
                                li
                                {
                                    button
                                        type="button"
                                        hx-post=(page_url)
                                        hx-vals=(page_vals(page))
                                        class="px-3 py-2 hover:text-blue-600 dark:hover:text-white"
                                    {
                                        (page)
                                    }
                                }
                            }
                            PaginationIndicator::Ellipsis => {
                                li class="px-3 py-2" { "..." }
                            }
                            // Covered by the previous and next buttons.
                            PaginationIndicator::BackButton(_)
                            | PaginationIndicator::NextButton(_) => {}
                        }
                    }
                }

                button
                    type="button"
                    id="next-page"
                    hx-post=(page_url)
                    hx-vals=(page_vals(snapshot.page + 1))
                    disabled[!snapshot.has_next_page()]
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Next"
                }
            }

            label class="flex items-center gap-2"
            {
                "Rows per page"

                select
                    name="limit"
                    id="limit"
                    hx-post=(format_endpoint(endpoints::LIST_LIMIT, snapshot.view))
                    hx-trigger="change"
                    class="p-2 rounded text-sm bg-gray-50 border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                {
                    @for option in page_size_options(config, snapshot.limit) {
                        option value=(option) selected[option == snapshot.limit] { (option) }
                    }
                }
            }
        }
    }
}

/// The configured page sizes plus the current one if it is not among them.
fn page_size_options(config: &PaginationConfig, current: u64) -> Vec<u64> {
    let mut options = config.page_size_options.clone();

    if !options.contains(&current) {
        options.push(current);
        options.sort_unstable();
    }

    options
}

fn format_description(description: &str) -> (String, Option<&str>) {
    let description_length = description.graphemes(true).count();

    if description_length <= MAX_DESCRIPTION_GRAPHEMES {
        (description.to_owned(), None)
    } else {
        let truncated: String = description
            .graphemes(true)
            .take(MAX_DESCRIPTION_GRAPHEMES - 3)
            .collect();
        let truncated = truncated + "...";
        (truncated, Some(description))
    }
}

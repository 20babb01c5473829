//! The CSV upload form, the page that shows the summary of the last import
//! and the page with the raw upload log.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, endpoints,
    client::UploadSummary,
    csv_import::upload_controller::{UploadController, UploadStatus},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
    pagination::PaginationConfig,
    session::SessionManager,
    transaction::TransactionListController,
};

/// The ID of the element that shows the summary of the last import.
pub const IMPORT_SUMMARY_ID: &str = "import-summary";

/// The page an upload was started from, which decides what the response updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSource {
    /// The dashboard, whose transaction list is refreshed.
    Dashboard,
    /// The import page, whose summary is refreshed.
    Import,
}

impl UploadSource {
    fn as_form_value(self) -> &'static str {
        match self {
            UploadSource::Dashboard => "dashboard",
            UploadSource::Import => "import",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim() {
            "dashboard" => Some(UploadSource::Dashboard),
            "import" => Some(UploadSource::Import),
            _ => None,
        }
    }
}

/// The state needed for the import pages and the upload endpoint.
#[derive(Clone)]
pub struct ImportState {
    /// The CSV import state.
    pub uploads: Arc<UploadController>,
    /// The list of active transactions, refreshed after an upload from the dashboard.
    pub transactions: Arc<TransactionListController>,
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
    /// The log-in state of the user.
    pub session: SessionManager,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            uploads: state.uploads.clone(),
            transactions: state.transactions.clone(),
            pagination_config: state.pagination_config.clone(),
            session: state.session.clone(),
        }
    }
}

/// The form for uploading a CSV file.
pub fn upload_form_view(source: UploadSource) -> Markup {
    html! {
        form
            hx-post=(endpoints::IMPORT)
            enctype="multipart/form-data"
            hx-disabled-elt="#file, #upload-button"
            hx-indicator="#upload-indicator"
            hx-swap="none"
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4"
        {
            input type="hidden" name="source" value=(source.as_form_value());

            div
            {
                label
                    for="file"
                    class="block mb-2 text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Choose a CSV file to upload"
                }

                input
                    id="file"
                    type="file"
                    name="file"
                    accept=".csv,text/csv"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button
                type="submit"
                id="upload-button"
                class={ "w-auto " (BUTTON_PRIMARY_STYLE) }
            {
                span class="inline htmx-indicator" id="upload-indicator" { (loading_spinner()) }
                " Upload CSV"
            }
        }
    }
}

/// The counts of the last import.
///
/// Set `oob` to swap the summary out-of-band after an upload.
pub fn import_summary_view(
    status: UploadStatus,
    summary: Option<&UploadSummary>,
    oob: bool,
) -> Markup {
    html! {
        section
            id=(IMPORT_SUMMARY_ID)
            hx-swap-oob=[oob.then_some("true")]
            class="w-full max-w-xl space-y-2"
        {
            h3 class="text-lg font-semibold" { "Last import" }

            @match (status, summary) {
                (UploadStatus::Uploading, _) => {
                    p { "Uploading..." }
                }
                (_, None) => {
                    p class="text-gray-500 dark:text-gray-400" { "No files uploaded yet." }
                }
                (status, Some(summary)) => {
                    p id="import-message" class=(status_style(status)) { (summary.message) }

                    dl class="grid grid-cols-2 gap-1 text-sm"
                    {
                        dt { "Duplicate rows" }
                        dd id="duplicate-count" { (summary.duplicate_rows.len()) }
                        dt { "Already stored" }
                        dd id="repeat-count" { (summary.repeats_in_db.len()) }
                        dt { "Errors" }
                        dd id="error-count" { (summary.errors.len()) }
                    }

                    @if !summary.errors.is_empty() {
                        ul class="list-disc pl-5 text-sm text-red-600 dark:text-red-400"
                        {
                            @for error in &summary.errors {
                                li { (error) }
                            }
                        }
                    }

                    a href=(endpoints::IMPORT_LOG_VIEW) class=(LINK_STYLE) { "View upload log" }
                }
            }
        }
    }
}

fn status_style(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Failed => "font-semibold text-red-600 dark:text-red-400",
        _ => "font-semibold text-green-700 dark:text-green-400",
    }
}

/// Route handler for the import CSV page.
pub async fn get_import_page(State(state): State<ImportState>) -> Response {
    let profile = state.session.profile();
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW, profile.as_ref()).into_html();
    let summary = state.uploads.summary();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-xl space-y-6"
            {
                h2 class="text-xl font-bold" { "Import Transactions" }

                p
                {
                    "Upload a CSV file with the columns date, description, \
                    original amount and currency."
                }

                (upload_form_view(UploadSource::Import))

                (import_summary_view(state.uploads.status(), summary.as_ref(), false))
            }
        }
    };

    base("Import Transactions", &[], &content).into_response()
}

/// Route handler for the raw JSON summary of the last import.
pub async fn get_import_log_page(State(state): State<ImportState>) -> Response {
    let profile = state.session.profile();
    let nav_bar = NavBar::new(endpoints::IMPORT_LOG_VIEW, profile.as_ref()).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-4"
            {
                h2 class="text-xl font-bold" { "Upload Log" }

                @match state.uploads.summary_json() {
                    Some(json) => {
                        pre
                            id="upload-log"
                            class="p-4 overflow-x-auto text-sm rounded bg-gray-100 dark:bg-gray-800"
                        {
                            (json)
                        }
                    }
                    None => p { "No files uploaded yet." }
                }

                a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "Back to import" }
            }
        }
    };

    base("Upload Log", &[], &content).into_response()
}

//! Turns the outcome of a CSV import into the alert shown to the user.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

use crate::{
    Error,
    alert::Alert,
    client::{NOTHING_UPLOADED_MESSAGE, UploadSummary},
};

/// The alert for an import the remote service accepted.
///
/// Uploads where nothing was stored are informational rather than a success.
pub fn summary_alert(summary: &UploadSummary) -> Alert {
    if summary.message == NOTHING_UPLOADED_MESSAGE {
        tracing::info!("Import completed: no new transactions");
        return Alert::Info {
            message: summary.message.clone(),
        };
    }

    let details = summary_details(summary);
    tracing::info!("Import completed: {details}");

    Alert::Success {
        message: summary.message.clone(),
        details,
    }
}

/// The alert for an import that failed as a whole.
pub fn failure_alert(error: &Error) -> Alert {
    tracing::warn!("Import failed: {error}");

    match error {
        Error::NotCSV => Alert::ErrorSimple {
            message: "File type must be CSV.".to_owned(),
        },
        Error::Network(_) => Alert::from(error),
        error => Alert::Error {
            message: "Import failed".to_owned(),
            details: error.to_string(),
        },
    }
}

/// A one-line summary of the rows that were not stored, e.g.
/// "2 duplicate rows, 0 already stored, 1 error."
pub fn summary_details(summary: &UploadSummary) -> String {
    let formatter = get_thousands_separator_formatter();
    let count = |n: usize| formatter.fmt_string(n);

    format!(
        "{} duplicate {}, {} already stored, {} {}.",
        count(summary.duplicate_rows.len()),
        plural(summary.duplicate_rows.len(), "row", "rows"),
        count(summary.repeats_in_db.len()),
        count(summary.errors.len()),
        plural(summary.errors.len(), "error", "errors"),
    )
}

fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

fn get_thousands_separator_formatter() -> &'static Formatter {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();

    FORMATTER.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .unwrap_or_else(|_| Formatter::new())
            .precision(Precision::Decimals(0))
    })
}

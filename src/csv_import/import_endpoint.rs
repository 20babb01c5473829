//! Defines the endpoint that receives CSV uploads.

use axum::{
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    client::CsvFile,
    csv_import::{
        alert::failure_alert,
        import_page::{ImportState, UploadSource, import_summary_view},
    },
    transaction::transaction_list_view,
};

/// Route handler for importing transactions from a CSV file.
///
/// The file is handed to the upload controller. The response carries the
/// alert for the outcome and, depending on where the upload was started,
/// either the refreshed transaction list or the refreshed import summary.
pub async fn import_transactions(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Response {
    let (file, source) = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(error) => {
            tracing::debug!("Rejected upload: {error}");
            return (StatusCode::BAD_REQUEST, failure_alert(&error)).into_response();
        }
    };

    let alert = state.uploads.upload(file).await;

    let content = html! {
        (alert.into_oob_html())

        @match source {
            UploadSource::Dashboard => {
                (transaction_list_view(
                    &state.transactions.snapshot(),
                    &state.pagination_config,
                    true,
                ))
            }
            UploadSource::Import => {
                (import_summary_view(
                    state.uploads.status(),
                    state.uploads.summary().as_ref(),
                    true,
                ))
            }
        }
    };

    Html(content.into_string()).into_response()
}

async fn read_upload(multipart: &mut Multipart) -> Result<(CsvFile, UploadSource), Error> {
    let mut file = None;
    let mut source = UploadSource::Import;

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        tracing::error!("Could not read multipart form: {error}");
        Error::MultipartError(error.body_text())
    })? {
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some("file") => file = Some(read_csv_field(field).await?),
            Some("source") => {
                let value = field.text().await.map_err(|error| {
                    Error::MultipartError(format!("could not read the upload source: {error}"))
                })?;
                source = UploadSource::from_form_value(&value).unwrap_or_else(|| {
                    tracing::warn!("Unknown upload source {value:?}, assuming the import page");
                    UploadSource::Import
                });
            }
            other => tracing::debug!("Ignoring multipart field {other:?}"),
        }
    }

    let file =
        file.ok_or_else(|| Error::MultipartError("the form did not contain a file".to_owned()))?;

    Ok((file, source))
}

async fn read_csv_field(field: Field<'_>) -> Result<CsvFile, Error> {
    let file_name = match field.file_name() {
        Some(file_name) => file_name.to_owned(),
        None => {
            tracing::error!("Could not get file name from multipart form field: {field:#?}");
            return Err(Error::MultipartError(
                "Could not get file name from multipart form field".to_owned(),
            ));
        }
    };

    let is_csv = field.content_type() == Some("text/csv")
        || file_name.to_ascii_lowercase().ends_with(".csv");
    if !is_csv {
        return Err(Error::NotCSV);
    }

    let contents = match field.bytes().await {
        Ok(contents) => contents.to_vec(),
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    tracing::debug!("Received file '{}' that is {} bytes", file_name, contents.len());

    Ok(CsvFile {
        file_name,
        contents,
    })
}

//! Importing transactions from CSV files through the remote service.

mod alert;
mod import_endpoint;
mod import_page;
mod upload_controller;

pub use import_endpoint::import_transactions;
pub use import_page::{UploadSource, get_import_log_page, get_import_page, upload_form_view};
pub use upload_controller::UploadController;

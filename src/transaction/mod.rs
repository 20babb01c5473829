//! Transactions as stored by the remote service.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the form used to create and edit one
//! - The list controllers that own the active and deleted tables
//! - View handlers for transaction-related web pages and fragments

mod batch_endpoint;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod export_endpoint;
mod form;
mod list_controller;
mod list_endpoints;
mod transactions_page;
mod view;

pub use batch_endpoint::{batch_delete_endpoint, batch_purge_endpoint, batch_restore_endpoint};
pub use core::{NewTransaction, Transaction, TransactionId, TransactionPatch};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::{
    delete_transaction_endpoint, purge_transaction_endpoint, restore_transaction_endpoint,
};
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use export_endpoint::get_export;
pub use list_controller::{ListView, Refetch, TransactionListController};
pub use list_endpoints::{
    post_list_limit, post_list_page, post_list_search, post_toggle_select_all,
    post_toggle_selection,
};
pub use transactions_page::{get_dashboard_page, get_deleted_page};
pub use view::transaction_list_view;

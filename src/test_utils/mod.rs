#![allow(missing_docs)]

pub(crate) mod alert;
pub(crate) mod fake_api;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;
pub(crate) mod state;

pub(crate) use alert::{assert_alert_message, must_get_alert_message};
pub(crate) use fake_api::{FakeTransactionApi, sample_transaction};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button, assert_form_submit_button_with_text, assert_hx_endpoint,
    must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok, get_header};
pub(crate) use state::{logged_in_session, logged_out_session, test_app_state};

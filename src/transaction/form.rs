//! The transaction form shared by the create and edit pages, and the
//! validation that runs before anything is sent to the remote service.

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    currency::Currency,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    session::{SessionManager, UserProfile},
    transaction::{
        core::{NewTransaction, Transaction, TransactionId, calendar_date},
        list_controller::TransactionListController,
    },
};

/// The raw form fields as submitted by the browser.
///
/// Every field is kept as text so that validation can report which field is
/// wrong instead of failing to deserialize the whole form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub original_amount: String,
    #[serde(default)]
    pub currency: String,
}

impl TransactionForm {
    /// Check the form and convert it into a transaction.
    ///
    /// `today` is the current date in the user's timezone, transactions may
    /// not be dated after it.
    ///
    /// # Errors
    /// Returns a validation error for the first invalid field.
    pub fn validate(&self, today: Date) -> Result<NewTransaction, Error> {
        let date_text = self.date.trim();
        if date_text.is_empty() {
            return Err(Error::MissingField("Date"));
        }
        let date = calendar_date::parse(date_text)
            .map_err(|_| Error::InvalidDate(date_text.to_owned()))?;
        if date > today {
            return Err(Error::FutureDate(date));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let amount_text = self.original_amount.trim();
        if amount_text.is_empty() {
            return Err(Error::MissingField("Amount"));
        }
        let original_amount: f64 = amount_text
            .parse()
            .ok()
            .filter(|amount: &f64| amount.is_finite())
            .ok_or_else(|| Error::InvalidAmount(amount_text.to_owned()))?;
        if original_amount < 0.0 {
            return Err(Error::NegativeAmount);
        }

        if self.currency.trim().is_empty() {
            return Err(Error::MissingField("Currency"));
        }
        let currency: Currency = self.currency.parse()?;

        Ok(Transaction::build(
            date,
            description,
            original_amount,
            currency,
        ))
    }
}

/// The values to pre-fill the form with.
pub struct TransactionFormDefaults<'a> {
    pub date: Date,
    pub description: Option<&'a str>,
    pub original_amount: Option<f64>,
    pub currency: Currency,
    pub max_date: Date,
}

impl TransactionFormDefaults<'_> {
    /// Defaults for a new transaction: today, no description, zero in the default currency.
    pub fn new_transaction(today: Date) -> Self {
        Self {
            date: today,
            description: None,
            original_amount: Some(0.0),
            currency: Currency::DEFAULT,
            max_date: today,
        }
    }
}

impl<'a> TransactionFormDefaults<'a> {
    /// Defaults taken from an existing transaction.
    pub fn from_transaction(transaction: &'a Transaction, today: Date) -> Self {
        Self {
            date: transaction.date,
            description: Some(&transaction.description),
            original_amount: Some(transaction.original_amount),
            currency: transaction.currency,
            max_date: today,
        }
    }
}

pub fn transaction_form_fields(defaults: &TransactionFormDefaults<'_>) -> Markup {
    let amount_str = defaults
        .original_amount
        .map(|amount| format!("{amount:.2}"));

    html! {
        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[defaults.description]
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="original_amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            input
                name="original_amount"
                id="original_amount"
                type="number"
                step="0.01"
                min="0"
                placeholder="0.00"
                required
                value=[amount_str.as_deref()]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="currency"
                class=(FORM_LABEL_STYLE)
            {
                "Currency"
            }

            select
                name="currency"
                id="currency"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for currency in Currency::ALL {
                    option
                        value=(currency.code())
                        selected[currency == defaults.currency]
                    {
                        (currency.code()) " - " (currency.name())
                    }
                }
            }
        }
    }
}

/// The state needed by the pages and endpoints that create or edit transactions.
#[derive(Clone)]
pub struct TransactionFormState {
    /// The list of active transactions, which owns the mutations.
    pub transactions: Arc<TransactionListController>,
    /// The log-in state of the user.
    pub session: SessionManager,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionFormState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transactions: state.transactions.clone(),
            session: state.session.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Whether the form creates a new transaction or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Edit(TransactionId),
}

/// Render a full page with the transaction form.
pub fn transaction_form_page(
    action: FormAction,
    defaults: &TransactionFormDefaults<'_>,
    profile: Option<&UserProfile>,
) -> Markup {
    let (title, submit_text, active_endpoint) = match action {
        FormAction::Create => (
            "New Transaction",
            "Create Transaction",
            endpoints::NEW_TRANSACTION_VIEW,
        ),
        FormAction::Edit(_) => (
            "Edit Transaction",
            "Update Transaction",
            endpoints::EDIT_TRANSACTION_VIEW,
        ),
    };
    let (create_url, edit_url) = match action {
        FormAction::Create => (Some(endpoints::TRANSACTIONS_API.to_owned()), None),
        FormAction::Edit(id) => (None, Some(format_endpoint(endpoints::TRANSACTION, id))),
    };
    let nav_bar = NavBar::new(active_endpoint, profile).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=[create_url]
                hx-put=[edit_url]
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { (title) }

                (transaction_form_fields(defaults))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator"
                    {
                        (loading_spinner())
                    }
                    " " (submit_text)
                }

                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Cancel" }
            }
        }
    };

    base(title, &[], &content)
}

/// Respond to a form submission with the outcome of the mutation.
///
/// An error alert is returned for the alert container. On success the client
/// goes back to the dashboard.
pub fn form_submission_response(alert: Alert) -> Response {
    if alert.is_error() {
        (StatusCode::UNPROCESSABLE_ENTITY, alert).into_response()
    } else {
        (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response()
    }
}

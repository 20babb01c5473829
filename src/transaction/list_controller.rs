//! The state behind the transaction tables: which page is shown, how many rows
//! per page, the search term, the loaded rows and the selection.
//!
//! Every change of inputs starts a new fetch. Fetches are tagged with a
//! generation number and a response is only applied if no newer fetch has been
//! started since, so a slow response for an old page can never overwrite the
//! page the user asked for last.

use std::{
    collections::{BTreeSet, HashSet},
    fmt::Display,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    alert::Alert,
    client::{TransactionApi, TransactionPage},
    pagination::{PaginationConfig, page_count},
    transaction::{
        core::{Transaction, TransactionId, TransactionPatch},
        form::TransactionForm,
    },
};

/// Which transactions a list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListView {
    /// Transactions that have not been deleted.
    Active,
    /// Soft-deleted transactions that can be restored or deleted permanently.
    Deleted,
}

impl Display for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListView::Active => f.write_str("active"),
            ListView::Deleted => f.write_str("deleted"),
        }
    }
}

/// Where the list is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing has been requested yet.
    Idle,
    Loading,
    Loaded,
    /// The latest fetch failed. The rows from the last successful fetch are kept.
    Failed(String),
}

/// A copy of the list state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub view: ListView,
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub transactions: Vec<Transaction>,
    pub total: u64,
    pub status: FetchStatus,
    pub selection: BTreeSet<TransactionId>,
}

impl ListSnapshot {
    pub fn page_count(&self) -> u64 {
        page_count(self.total, self.limit)
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn is_selected(&self, id: TransactionId) -> bool {
        self.selection.contains(&id)
    }

    /// Whether every row on the page is selected. False for an empty page.
    pub fn all_selected(&self) -> bool {
        !self.transactions.is_empty()
            && self
                .transactions
                .iter()
                .all(|transaction| self.selection.contains(&transaction.id))
    }
}

/// Something that can reload its data after the remote collection changed.
#[async_trait]
pub trait Refetch: Send + Sync {
    async fn refetch(&self) -> Result<(), Error>;
}

#[derive(Debug)]
struct ListState {
    page: u64,
    limit: u64,
    search: Option<String>,
    transactions: Vec<Transaction>,
    total: u64,
    status: FetchStatus,
    selection: BTreeSet<TransactionId>,
    generation: u64,
    /// The inputs the shown rows were fetched with.
    loaded: LoadedInputs,
}

#[derive(Debug, Clone)]
struct LoadedInputs {
    page: u64,
    limit: u64,
    search: Option<String>,
}

/// The inputs of one fetch, captured when it was started.
#[derive(Debug)]
struct FetchRequest {
    generation: u64,
    page: u64,
    limit: u64,
    search: Option<String>,
}

enum FetchOutcome {
    Applied,
    /// A newer fetch was started while this one was in flight.
    Superseded,
    /// The page no longer exists, fetch the last page instead.
    Clamped(FetchRequest),
    Failed(Error),
}

impl ListState {
    fn begin_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.status = FetchStatus::Loading;

        FetchRequest {
            generation: self.generation,
            page: self.page,
            limit: self.limit,
            search: self.search.clone(),
        }
    }

    /// Go back to the inputs of the shown rows so the page number and
    /// filters always describe what is on screen.
    fn restore_loaded_inputs(&mut self) {
        let LoadedInputs {
            page,
            limit,
            search,
        } = self.loaded.clone();

        self.page = page;
        self.limit = limit;
        self.search = search;
    }

    fn contains(&self, id: TransactionId) -> bool {
        self.transactions
            .iter()
            .any(|transaction| transaction.id == id)
    }
}

/// The single source of truth for one transaction table.
pub struct TransactionListController {
    view: ListView,
    client: Arc<dyn TransactionApi>,
    state: Mutex<ListState>,
}

impl TransactionListController {
    pub fn new(
        view: ListView,
        client: Arc<dyn TransactionApi>,
        pagination_config: &PaginationConfig,
    ) -> Self {
        let page = pagination_config.default_page.max(1);
        let limit = pagination_config.default_page_size.max(1);

        Self {
            view,
            client,
            state: Mutex::new(ListState {
                page,
                limit,
                search: None,
                transactions: Vec::new(),
                total: 0,
                status: FetchStatus::Idle,
                selection: BTreeSet::new(),
                generation: 0,
                loaded: LoadedInputs {
                    page,
                    limit,
                    search: None,
                },
            }),
        }
    }

    pub fn view(&self) -> ListView {
        self.view
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.lock();

        ListSnapshot {
            view: self.view,
            page: state.page,
            limit: state.limit,
            search: state.search.clone(),
            transactions: state.transactions.clone(),
            total: state.total,
            status: state.status.clone(),
            selection: state.selection.clone(),
        }
    }

    /// The transaction with `id` if it is on the loaded page.
    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.lock()
            .transactions
            .iter()
            .find(|transaction| transaction.id == id)
            .cloned()
    }

    /// Load the current page with the current inputs.
    ///
    /// # Errors
    /// Returns the error of the fetch if the remote call failed. The rows of
    /// the last successful fetch stay in place.
    pub async fn refetch(&self) -> Result<(), Error> {
        let mut request = self.lock().begin_fetch();

        loop {
            let result = self.fetch(&request).await;

            match self.apply(request, result) {
                FetchOutcome::Applied | FetchOutcome::Superseded => return Ok(()),
                FetchOutcome::Clamped(next) => request = next,
                FetchOutcome::Failed(error) => return Err(error),
            }
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<TransactionPage, Error> {
        tracing::debug!(
            "Fetching {} transactions page {} (limit {}, search {:?})",
            self.view,
            request.page,
            request.limit,
            request.search
        );

        match (self.view, request.search.as_deref()) {
            (ListView::Active, Some(query)) => {
                self.client
                    .search(query, request.page, request.limit)
                    .await
            }
            (ListView::Active, None) => self.client.list(request.page, request.limit).await,
            (ListView::Deleted, _) => {
                self.client
                    .list_deleted(request.page, request.limit)
                    .await
            }
        }
    }

    fn apply(
        &self,
        request: FetchRequest,
        result: Result<TransactionPage, Error>,
    ) -> FetchOutcome {
        let mut state = self.lock();

        if request.generation != state.generation {
            tracing::debug!(
                "Discarding stale response for {} page {}",
                self.view,
                request.page
            );
            return FetchOutcome::Superseded;
        }

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!("Could not load {} transactions: {error}", self.view);
                state.status = FetchStatus::Failed(error.to_string());
                state.restore_loaded_inputs();
                return FetchOutcome::Failed(error);
            }
        };

        let last_page = page_count(page.total, request.limit);
        if request.page > last_page {
            tracing::debug!(
                "Page {} is past the last page {last_page}, loading the last page",
                request.page
            );
            state.page = last_page;
            return FetchOutcome::Clamped(state.begin_fetch());
        }

        let ids: HashSet<TransactionId> = page
            .transactions
            .iter()
            .map(|transaction| transaction.id)
            .collect();
        state.selection.retain(|id| ids.contains(id));
        state.transactions = page.transactions;
        state.total = page.total;
        state.status = FetchStatus::Loaded;
        state.loaded = LoadedInputs {
            page: request.page,
            limit: request.limit,
            search: request.search,
        };

        FetchOutcome::Applied
    }

    /// Show page `page`, clearing the selection.
    ///
    /// Choosing the page that is already shown does nothing.
    pub async fn set_page(&self, page: u64) -> Result<(), Error> {
        {
            let mut state = self.lock();
            let page = page.max(1);

            if page == state.page {
                return Ok(());
            }

            state.page = page;
            state.selection.clear();
        }

        self.refetch().await
    }

    /// Show the next page unless the last page is already shown.
    pub async fn next_page(&self) -> Result<(), Error> {
        let next = {
            let state = self.lock();
            let last_page = page_count(state.total, state.limit);

            if state.page >= last_page {
                return Ok(());
            }

            state.page + 1
        };

        self.set_page(next).await
    }

    /// Show the previous page unless the first page is already shown.
    pub async fn previous_page(&self) -> Result<(), Error> {
        let previous = {
            let state = self.lock();

            if state.page <= 1 {
                return Ok(());
            }

            state.page - 1
        };

        self.set_page(previous).await
    }

    /// Show `limit` rows per page starting again from the first page.
    pub async fn set_limit(&self, limit: u64) -> Result<(), Error> {
        {
            let mut state = self.lock();
            let limit = limit.max(1);

            if limit == state.limit {
                return Ok(());
            }

            state.limit = limit;
            state.page = 1;
            state.selection.clear();
        }

        self.refetch().await
    }

    /// Filter the list by `term` starting again from the first page.
    ///
    /// A blank term removes the filter. The deleted view cannot be searched
    /// and ignores the term.
    pub async fn set_search(&self, term: &str) -> Result<(), Error> {
        let term = term.trim();
        let search = (!term.is_empty()).then(|| term.to_owned());

        if self.view == ListView::Deleted {
            if search.is_some() {
                tracing::warn!("Ignoring search term {term:?} for the deleted transactions");
            }
            return Ok(());
        }

        {
            let mut state = self.lock();

            if search == state.search {
                return Ok(());
            }

            state.search = search;
            state.page = 1;
            state.selection.clear();
        }

        self.refetch().await
    }

    /// Add `id` to the selection, or remove it if it is already selected.
    ///
    /// Returns whether `id` is now selected.
    ///
    /// # Errors
    /// Returns [Error::NotOnPage] if `id` is not on the loaded page.
    pub fn toggle_selection(&self, id: TransactionId) -> Result<bool, Error> {
        let mut state = self.lock();

        if !state.contains(id) {
            return Err(Error::NotOnPage(id));
        }

        if state.selection.remove(&id) {
            Ok(false)
        } else {
            state.selection.insert(id);
            Ok(true)
        }
    }

    /// Select every row on the page, or clear the selection if every row is
    /// already selected.
    ///
    /// Returns whether the page is now fully selected.
    pub fn toggle_select_all(&self) -> bool {
        let mut state = self.lock();
        let page_ids: BTreeSet<TransactionId> = state
            .transactions
            .iter()
            .map(|transaction| transaction.id)
            .collect();

        if !page_ids.is_empty() && page_ids.is_subset(&state.selection) {
            state.selection.clear();
            false
        } else {
            let selected_all = !page_ids.is_empty();
            state.selection = page_ids;
            selected_all
        }
    }

    pub async fn create(&self, form: &TransactionForm, today: Date) -> Alert {
        if let Err(error) = self.ensure_view(ListView::Active) {
            return Alert::from(&error);
        }

        let transaction = match form.validate(today) {
            Ok(transaction) => transaction,
            Err(error) => return invalid_transaction_alert(error),
        };

        self.mutate(
            "Transaction added successfully!",
            "Could not add transaction",
            || self.client.create(&transaction),
        )
        .await
    }

    pub async fn update(&self, id: TransactionId, form: &TransactionForm, today: Date) -> Alert {
        if let Err(error) = self.ensure_view(ListView::Active) {
            return Alert::from(&error);
        }

        let patch = match form.validate(today) {
            Ok(transaction) => TransactionPatch::from(transaction),
            Err(error) => return invalid_transaction_alert(error),
        };

        self.mutate(
            "Transaction updated successfully!",
            "Could not update transaction",
            || self.client.update(id, &patch),
        )
        .await
    }

    pub async fn soft_delete(&self, id: TransactionId) -> Alert {
        if let Err(error) = self.ensure_view(ListView::Active) {
            return Alert::from(&error);
        }

        self.mutate(
            "Transaction deleted successfully!",
            "Could not delete transaction",
            || self.client.soft_delete(id),
        )
        .await
    }

    pub async fn restore(&self, id: TransactionId) -> Alert {
        if let Err(error) = self.ensure_view(ListView::Deleted) {
            return Alert::from(&error);
        }

        self.mutate(
            "Transaction restored successfully!",
            "Could not restore transaction",
            || self.client.restore(id),
        )
        .await
    }

    pub async fn hard_delete(&self, id: TransactionId) -> Alert {
        if let Err(error) = self.ensure_view(ListView::Deleted) {
            return Alert::from(&error);
        }

        self.mutate(
            "Transaction permanently deleted!",
            "Could not delete transaction",
            || self.client.hard_delete(id),
        )
        .await
    }

    pub async fn batch_soft_delete(&self) -> Alert {
        let ids = match self.selected_ids(ListView::Active) {
            Ok(ids) => ids,
            Err(error) => return Alert::from(&error),
        };

        self.mutate(
            "Selected transactions deleted successfully!",
            "Could not delete the selected transactions",
            || self.client.batch_soft_delete(&ids),
        )
        .await
    }

    pub async fn batch_restore(&self) -> Alert {
        let ids = match self.selected_ids(ListView::Deleted) {
            Ok(ids) => ids,
            Err(error) => return Alert::from(&error),
        };

        self.mutate(
            "Selected transactions restored successfully!",
            "Could not restore the selected transactions",
            || self.client.batch_restore(&ids),
        )
        .await
    }

    pub async fn batch_hard_delete(&self) -> Alert {
        let ids = match self.selected_ids(ListView::Deleted) {
            Ok(ids) => ids,
            Err(error) => return Alert::from(&error),
        };

        self.mutate(
            "Selected transactions permanently deleted!",
            "Could not delete the selected transactions",
            || self.client.batch_hard_delete(&ids),
        )
        .await
    }

    fn ensure_view(&self, allowed: ListView) -> Result<(), Error> {
        if self.view == allowed {
            Ok(())
        } else {
            tracing::warn!("Rejected a {allowed} view action in the {} view", self.view);
            Err(Error::WrongView(self.view))
        }
    }

    fn selected_ids(&self, allowed: ListView) -> Result<Vec<TransactionId>, Error> {
        self.ensure_view(allowed)?;
        let state = self.lock();

        if state.selection.is_empty() {
            return Err(Error::NothingSelected);
        }

        Ok(state.selection.iter().copied().collect())
    }

    /// Run a remote mutation and reload the page if it succeeded.
    ///
    /// A failed mutation leaves the list untouched.
    async fn mutate<F, Fut, T>(&self, success: &str, failure: &str, operation: F) -> Alert
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if let Err(error) = operation().await {
            tracing::warn!("{failure}: {error}");
            return Alert::Error {
                message: failure.to_owned(),
                details: error.to_string(),
            };
        }

        tracing::info!("{success}");
        self.lock().selection.clear();

        if let Err(error) = self.refetch().await {
            tracing::warn!("Could not reload {} transactions: {error}", self.view);
        }

        Alert::SuccessSimple {
            message: success.to_owned(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn invalid_transaction_alert(error: Error) -> Alert {
    tracing::debug!("Rejected transaction form: {error}");

    Alert::Error {
        message: "Invalid transaction".to_owned(),
        details: error.to_string(),
    }
}

#[async_trait]
impl Refetch for TransactionListController {
    async fn refetch(&self) -> Result<(), Error> {
        TransactionListController::refetch(self).await
    }
}

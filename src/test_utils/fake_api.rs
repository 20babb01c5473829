//! An in-memory stand-in for the remote transaction service.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use time::{Date, macros::date};

use crate::{
    Error,
    client::{CsvFile, TransactionApi, TransactionPage, UploadSummary},
    currency::Currency,
    transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
};

const SAMPLE_DATE: Date = date!(2024 - 01 - 01);

/// Counts of the remote calls made so far, by kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallCounts {
    pub list: usize,
    pub search: usize,
    pub deleted: usize,
    pub mutations: usize,
    pub uploads: usize,
    pub exports: usize,
}

#[derive(Debug)]
struct FakeState {
    transactions: Vec<Transaction>,
    next_id: TransactionId,
    offline: bool,
    page_delays: HashMap<u64, Duration>,
    search_delays: HashMap<String, Duration>,
    upload_summary: UploadSummary,
    upload_failure: Option<(u16, String)>,
    uploaded_files: Vec<CsvFile>,
    calls: CallCounts,
}

#[derive(Debug)]
pub(crate) struct FakeTransactionApi {
    state: Mutex<FakeState>,
}

impl Default for FakeTransactionApi {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeState {
                transactions: Vec::new(),
                next_id: 1,
                offline: false,
                page_delays: HashMap::new(),
                search_delays: HashMap::new(),
                upload_summary: UploadSummary {
                    message: "CSV uploaded successfully!".to_owned(),
                    duplicate_rows: Vec::new(),
                    repeats_in_db: Vec::new(),
                    errors: Vec::new(),
                },
                upload_failure: None,
                uploaded_files: Vec::new(),
                calls: CallCounts::default(),
            }),
        }
    }
}

/// A stored transaction with predictable fields: "Transaction {id}" for
/// `id` US dollars.
pub(crate) fn sample_transaction(id: TransactionId) -> Transaction {
    Transaction {
        id,
        date: SAMPLE_DATE,
        description: format!("Transaction {id}"),
        original_amount: id as f64,
        currency: Currency::Usd,
        amount_in_base_unit: id as f64 * 83.0,
        is_deleted: false,
    }
}

impl FakeTransactionApi {
    /// A service holding the transactions 1 to `count`.
    pub(crate) fn with_transactions(count: i64) -> Self {
        let api = Self::default();
        {
            let mut state = api.lock();
            state.transactions = (1..=count).map(sample_transaction).collect();
            state.next_id = count + 1;
        }
        api
    }

    /// Store a transaction with `description` and return it.
    pub(crate) fn insert_transaction(&self, description: &str) -> Transaction {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;

        let transaction = Transaction {
            description: description.to_owned(),
            ..sample_transaction(id)
        };
        state.transactions.push(transaction.clone());

        transaction
    }

    pub(crate) fn mark_deleted(&self, ids: &[TransactionId]) {
        let mut state = self.lock();

        for transaction in &mut state.transactions {
            if ids.contains(&transaction.id) {
                transaction.is_deleted = true;
            }
        }
    }

    pub(crate) fn stored(&self, id: TransactionId) -> Option<Transaction> {
        self.lock()
            .transactions
            .iter()
            .find(|transaction| transaction.id == id)
            .cloned()
    }

    /// Make every call fail with a network error until set back to `false`.
    pub(crate) fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Hold back responses for `page` of any list for `delay`.
    pub(crate) fn delay_page(&self, page: u64, delay: Duration) {
        self.lock().page_delays.insert(page, delay);
    }

    /// Hold back responses for searches for `query` for `delay`.
    pub(crate) fn delay_search(&self, query: &str, delay: Duration) {
        self.lock().search_delays.insert(query.to_owned(), delay);
    }

    pub(crate) fn set_upload_summary(&self, summary: UploadSummary) {
        self.lock().upload_summary = summary;
    }

    /// Make uploads fail with the given HTTP status and message.
    pub(crate) fn fail_uploads(&self, status: u16, message: &str) {
        self.lock().upload_failure = Some((status, message.to_owned()));
    }

    pub(crate) fn uploaded_files(&self) -> Vec<CsvFile> {
        self.lock().uploaded_files.clone()
    }

    pub(crate) fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls().list
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.calls().search
    }

    pub(crate) fn mutation_calls(&self) -> usize {
        self.calls().mutations
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.calls().uploads
    }

    /// The number of calls of any kind.
    pub(crate) fn remote_calls(&self) -> usize {
        let calls = self.calls();
        calls.list + calls.search + calls.deleted + calls.mutations + calls.uploads + calls.exports
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Check connectivity and count the call. The lock is released before returning.
    fn begin_call(&self, count: impl FnOnce(&mut CallCounts)) -> Result<(), Error> {
        let mut state = self.lock();
        count(&mut state.calls);

        if state.offline {
            Err(Error::Network("connection refused".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn page_of(
        &self,
        delay: Option<Duration>,
        page: u64,
        limit: u64,
        filter: impl Fn(&Transaction) -> bool,
    ) -> TransactionPage {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        let mut matches: Vec<&Transaction> = state
            .transactions
            .iter()
            .filter(|transaction| filter(transaction))
            .collect();
        matches.sort_by_key(|transaction| transaction.id);

        let limit = limit.max(1) as usize;
        let offset = (page.max(1) as usize - 1) * limit;

        TransactionPage {
            total: matches.len() as u64,
            transactions: matches
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        }
    }

    fn modify(
        &self,
        id: TransactionId,
        change: impl FnOnce(&mut Transaction),
    ) -> Result<Transaction, Error> {
        let mut state = self.lock();
        let transaction = state
            .transactions
            .iter_mut()
            .find(|transaction| transaction.id == id)
            .ok_or_else(not_found)?;

        change(transaction);

        Ok(transaction.clone())
    }
}

fn not_found() -> Error {
    Error::Server {
        status: 404,
        message: "Transaction not found".to_owned(),
    }
}

fn is_duplicate(stored: &Transaction, new: &NewTransaction) -> bool {
    !stored.is_deleted
        && stored.date == new.date
        && stored.description == new.description
        && stored.original_amount == new.original_amount
        && stored.currency == new.currency
}

#[async_trait]
impl TransactionApi for FakeTransactionApi {
    async fn list(&self, page: u64, limit: u64) -> Result<TransactionPage, Error> {
        self.begin_call(|calls| calls.list += 1)?;
        let delay = self.lock().page_delays.get(&page).copied();

        Ok(self
            .page_of(delay, page, limit, |transaction| !transaction.is_deleted)
            .await)
    }

    async fn search(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> Result<TransactionPage, Error> {
        self.begin_call(|calls| calls.search += 1)?;
        let delay = {
            let state = self.lock();
            state
                .search_delays
                .get(query)
                .or_else(|| state.page_delays.get(&page))
                .copied()
        };
        let query = query.to_lowercase();

        Ok(self
            .page_of(delay, page, limit, |transaction| {
                !transaction.is_deleted
                    && (transaction.description.to_lowercase().contains(&query)
                        || transaction.currency.code().to_lowercase() == query)
            })
            .await)
    }

    async fn list_deleted(&self, page: u64, limit: u64) -> Result<TransactionPage, Error> {
        self.begin_call(|calls| calls.deleted += 1)?;
        let delay = self.lock().page_delays.get(&page).copied();

        Ok(self
            .page_of(delay, page, limit, |transaction| transaction.is_deleted)
            .await)
    }

    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        let mut state = self.lock();

        if state
            .transactions
            .iter()
            .any(|stored| is_duplicate(stored, transaction))
        {
            return Err(Error::Conflict("Transaction already exists".to_owned()));
        }

        let id = state.next_id;
        state.next_id += 1;
        let created = Transaction {
            id,
            date: transaction.date,
            description: transaction.description.clone(),
            original_amount: transaction.original_amount,
            currency: transaction.currency,
            amount_in_base_unit: transaction.original_amount * 83.0,
            is_deleted: false,
        };
        state.transactions.push(created.clone());

        Ok(created)
    }

    async fn update(
        &self,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;

        self.modify(id, |transaction| {
            if let Some(date) = patch.date {
                transaction.date = date;
            }
            if let Some(description) = &patch.description {
                transaction.description = description.clone();
            }
            if let Some(original_amount) = patch.original_amount {
                transaction.original_amount = original_amount;
            }
            if let Some(currency) = patch.currency {
                transaction.currency = currency;
            }
        })
    }

    async fn soft_delete(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        self.modify(id, |transaction| transaction.is_deleted = true)
    }

    async fn restore(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        self.modify(id, |transaction| transaction.is_deleted = false)
    }

    async fn hard_delete(&self, id: TransactionId) -> Result<String, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        let mut state = self.lock();
        let count_before = state.transactions.len();
        state.transactions.retain(|transaction| transaction.id != id);

        if state.transactions.len() == count_before {
            Err(not_found())
        } else {
            Ok("Transaction permanently deleted".to_owned())
        }
    }

    async fn batch_soft_delete(&self, ids: &[TransactionId]) -> Result<String, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        self.mark_deleted(ids);

        Ok(format!("{} transactions deleted", ids.len()))
    }

    async fn batch_restore(&self, ids: &[TransactionId]) -> Result<String, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        let mut state = self.lock();

        for transaction in &mut state.transactions {
            if ids.contains(&transaction.id) {
                transaction.is_deleted = false;
            }
        }

        Ok(format!("{} transactions restored", ids.len()))
    }

    async fn batch_hard_delete(&self, ids: &[TransactionId]) -> Result<String, Error> {
        self.begin_call(|calls| calls.mutations += 1)?;
        self.lock()
            .transactions
            .retain(|transaction| !ids.contains(&transaction.id));

        Ok(format!("{} transactions permanently deleted", ids.len()))
    }

    async fn import_csv(&self, file: CsvFile) -> Result<UploadSummary, Error> {
        self.begin_call(|calls| calls.uploads += 1)?;
        let mut state = self.lock();
        state.uploaded_files.push(file);

        match &state.upload_failure {
            Some((status, message)) => Err(Error::Server {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(state.upload_summary.clone()),
        }
    }

    async fn export_csv(&self) -> Result<Vec<u8>, Error> {
        self.begin_call(|calls| calls.exports += 1)?;
        let state = self.lock();
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(["id", "date", "description", "original_amount", "currency"])
            .unwrap();
        for transaction in state.transactions.iter().filter(|t| !t.is_deleted) {
            writer
                .write_record([
                    transaction.id.to_string(),
                    transaction.date.to_string(),
                    transaction.description.clone(),
                    transaction.original_amount.to_string(),
                    transaction.currency.code().to_owned(),
                ])
                .unwrap();
        }

        Ok(writer.into_inner().unwrap())
    }
}

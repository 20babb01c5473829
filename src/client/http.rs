//! The HTTP implementation of [TransactionApi].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, multipart};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::watch;

use crate::{
    Error,
    client::{CsvFile, TransactionApi, TransactionPage, UploadSummary},
    transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
};

/// The default time to wait for the remote service before giving up.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Talks to the remote transaction service over HTTP.
///
/// The bearer token is read from a watch channel on every request so that the
/// client always uses the token of the current session, and sends no token
/// once the user has logged out.
#[derive(Debug, Clone)]
pub struct HttpTransactionClient {
    http: reqwest::Client,
    base_url: String,
    token: watch::Receiver<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionBody {
    transaction: Transaction,
}

#[derive(Debug, Serialize)]
struct BatchBody<'a> {
    ids: &'a [TransactionId],
}

impl HttpTransactionClient {
    /// Create a client for the service at `base_url`, e.g. "http://localhost:5000/api".
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client could not be created.
    pub fn new(
        base_url: &str,
        token: watch::Receiver<Option<String>>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Network(error.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/transactions{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let token = self.token.borrow().clone();
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|error| {
            tracing::warn!("Could not reach the transaction service: {error}");
            Error::Network(error.to_string())
        })?;

        let status = response.status();
        tracing::debug!("{} responded with {status}", response.url());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message_from_body(&body);
        tracing::warn!("The transaction service responded with {status}: {message}");

        if status == StatusCode::CONFLICT {
            Err(Error::Conflict(message))
        } else {
            Err(Error::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|error| {
                tracing::warn!("Could not read the transaction service response: {error}");
                Error::InvalidResponse(error.to_string())
            })
    }

    async fn send_for_transaction(&self, request: RequestBuilder) -> Result<Transaction, Error> {
        self.send_json::<TransactionBody>(request)
            .await
            .map(|body| body.transaction)
    }

    async fn send_for_message(&self, request: RequestBuilder) -> Result<String, Error> {
        self.send_json::<MessageBody>(request)
            .await
            .map(|body| body.message)
    }
}

/// Extract the display message from an error response body.
///
/// The `error` field takes precedence over `message`.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error.or(body.message))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_owned())
}

#[async_trait]
impl TransactionApi for HttpTransactionClient {
    async fn list(&self, page: u64, limit: u64) -> Result<TransactionPage, Error> {
        let request = self
            .http
            .get(self.url(""))
            .query(&[("page", page), ("limit", limit)]);

        self.send_json(request).await
    }

    async fn search(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> Result<TransactionPage, Error> {
        let page = page.to_string();
        let limit = limit.to_string();
        let request = self.http.get(self.url("/search")).query(&[
            ("query", query),
            ("page", page.as_str()),
            ("limit", limit.as_str()),
        ]);

        self.send_json(request).await
    }

    async fn list_deleted(&self, page: u64, limit: u64) -> Result<TransactionPage, Error> {
        let request = self
            .http
            .get(self.url("/soft-deleted"))
            .query(&[("page", page), ("limit", limit)]);

        self.send_json(request).await
    }

    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction, Error> {
        let request = self.http.post(self.url("")).json(transaction);

        self.send_json(request).await
    }

    async fn update(
        &self,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error> {
        let request = self.http.patch(self.url(&format!("/{id}"))).json(patch);

        self.send_for_transaction(request).await
    }

    async fn soft_delete(&self, id: TransactionId) -> Result<Transaction, Error> {
        let request = self.http.patch(self.url(&format!("/{id}/soft-delete")));

        self.send_for_transaction(request).await
    }

    async fn restore(&self, id: TransactionId) -> Result<Transaction, Error> {
        let request = self.http.patch(self.url(&format!("/{id}/restore")));

        self.send_for_transaction(request).await
    }

    async fn hard_delete(&self, id: TransactionId) -> Result<String, Error> {
        let request = self.http.delete(self.url(&format!("/{id}")));

        self.send_for_message(request).await
    }

    async fn batch_soft_delete(&self, ids: &[TransactionId]) -> Result<String, Error> {
        let request = self
            .http
            .put(self.url("/batch-soft-delete"))
            .json(&BatchBody { ids });

        self.send_for_message(request).await
    }

    async fn batch_restore(&self, ids: &[TransactionId]) -> Result<String, Error> {
        let request = self
            .http
            .put(self.url("/batch-restore"))
            .json(&BatchBody { ids });

        self.send_for_message(request).await
    }

    async fn batch_hard_delete(&self, ids: &[TransactionId]) -> Result<String, Error> {
        let request = self
            .http
            .put(self.url("/batch-hard-delete"))
            .json(&BatchBody { ids });

        self.send_for_message(request).await
    }

    async fn import_csv(&self, file: CsvFile) -> Result<UploadSummary, Error> {
        let part = multipart::Part::bytes(file.contents)
            .file_name(file.file_name)
            .mime_str("text/csv")
            .map_err(|error| Error::MultipartError(error.to_string()))?;
        let form = multipart::Form::new().part("file", part);
        let request = self.http.post(self.url("/upload-csv")).multipart(form);

        self.send_json(request).await
    }

    async fn export_csv(&self) -> Result<Vec<u8>, Error> {
        let request = self.http.get(self.url("/export-csv"));

        let bytes = self.send(request).await?.bytes().await.map_err(|error| {
            tracing::warn!("Could not read the exported CSV: {error}");
            Error::InvalidResponse(error.to_string())
        })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        Json, Router,
        extract::{Multipart, Path, Query, State},
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        response::IntoResponse,
        routing::{get, patch, post, put},
    };
    use serde::Deserialize;
    use serde_json::json;
    use time::macros::date;
    use tokio::{net::TcpListener, sync::watch};

    use crate::{
        Error,
        client::{CsvFile, HttpTransactionClient, TransactionApi},
        currency::Currency,
        transaction::{NewTransaction, Transaction, TransactionPatch},
    };

    use super::error_message_from_body;

    #[derive(Debug, Default)]
    struct Received {
        authorization: Vec<Option<String>>,
        queries: Vec<(String, u64, u64)>,
        batch_ids: Vec<Vec<i64>>,
        uploaded_files: Vec<(String, String)>,
    }

    type Shared = Arc<Mutex<Received>>;

    #[derive(Deserialize)]
    struct SearchQuery {
        #[serde(default)]
        query: String,
        page: u64,
        limit: u64,
    }

    #[derive(Deserialize)]
    struct BatchRequest {
        ids: Vec<i64>,
    }

    fn coffee(id: i64) -> Transaction {
        Transaction {
            id,
            date: date!(2024 - 01 - 01),
            description: "Coffee".to_owned(),
            original_amount: 4.5,
            currency: Currency::Usd,
            amount_in_base_unit: 374.85,
            is_deleted: false,
        }
    }

    fn record_auth(received: &Shared, headers: &HeaderMap) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        received.lock().unwrap().authorization.push(authorization);
    }

    async fn list_handler(
        State(received): State<Shared>,
        headers: HeaderMap,
        Query(query): Query<SearchQuery>,
    ) -> impl IntoResponse {
        record_auth(&received, &headers);
        received
            .lock()
            .unwrap()
            .queries
            .push((query.query, query.page, query.limit));

        Json(json!({
            "transactions": [coffee(1)],
            "total": 31,
            "page": query.page,
            "limit": query.limit,
            "totalPages": 2
        }))
    }

    async fn create_handler(Json(transaction): Json<NewTransaction>) -> impl IntoResponse {
        if transaction.description == "Duplicate" {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Transaction already exists" })),
            )
                .into_response();
        }

        Json(coffee(42)).into_response()
    }

    async fn update_handler(
        Path(id): Path<i64>,
        Json(patch): Json<TransactionPatch>,
    ) -> impl IntoResponse {
        let mut transaction = coffee(id);
        if let Some(description) = patch.description {
            transaction.description = description;
        }

        Json(json!({ "message": "Transaction updated", "transaction": transaction }))
    }

    async fn soft_delete_handler(Path(id): Path<i64>) -> impl IntoResponse {
        if id == 404 {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Transaction not found" })),
            )
                .into_response();
        }

        let mut transaction = coffee(id);
        transaction.is_deleted = true;
        Json(json!({ "message": "Transaction soft deleted", "transaction": transaction }))
            .into_response()
    }

    async fn batch_handler(
        State(received): State<Shared>,
        Json(body): Json<BatchRequest>,
    ) -> impl IntoResponse {
        let count = body.ids.len();
        received.lock().unwrap().batch_ids.push(body.ids);

        Json(json!({ "message": format!("{count} transactions soft deleted") }))
    }

    async fn upload_handler(
        State(received): State<Shared>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_owned();
            let text = field.text().await.unwrap();
            received.lock().unwrap().uploaded_files.push((name, text));
        }

        Json(json!({
            "message": "2 transactions uploaded.",
            "duplicateRows": [{ "row": 3 }],
            "repeatsInDB": [coffee(1)],
            "errors": ["Row 5: invalid date"]
        }))
    }

    async fn broken_handler() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
    }

    async fn slow_handler() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "transactions": [], "total": 0 }))
    }

    async fn spawn_fake_service() -> (SocketAddr, Shared) {
        let received = Shared::default();
        let app = Router::new()
            .route("/api/transactions", get(list_handler).post(create_handler))
            .route("/api/transactions/search", get(list_handler))
            .route("/api/transactions/soft-deleted", get(slow_handler))
            .route(
                "/api/transactions/{id}",
                patch(update_handler).delete(broken_handler),
            )
            .route(
                "/api/transactions/{id}/soft-delete",
                patch(soft_delete_handler),
            )
            .route("/api/transactions/batch-soft-delete", put(batch_handler))
            .route("/api/transactions/upload-csv", post(upload_handler))
            .route(
                "/api/transactions/export-csv",
                get(|| async { "id,date,description\n1,2024-01-01,Coffee\n" }),
            )
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (address, received)
    }

    fn new_client(address: SocketAddr, token: Option<&str>) -> HttpTransactionClient {
        let (_, receiver) = watch::channel(token.map(str::to_owned));
        HttpTransactionClient::new(
            &format!("http://{address}/api/"),
            receiver,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_sends_page_limit_and_bearer_token() {
        let (address, received) = spawn_fake_service().await;
        let client = new_client(address, Some("token-123"));

        let page = client.list(2, 25).await.unwrap();

        assert_eq!(page.total, 31);
        assert_eq!(page.transactions, vec![coffee(1)]);
        let received = received.lock().unwrap();
        assert_eq!(received.queries, vec![(String::new(), 2, 25)]);
        assert_eq!(
            received.authorization,
            vec![Some("Bearer token-123".to_owned())]
        );
    }

    #[tokio::test]
    async fn requests_without_session_carry_no_token() {
        let (address, received) = spawn_fake_service().await;
        let client = new_client(address, None);

        client.list(1, 25).await.unwrap();

        assert_eq!(received.lock().unwrap().authorization, vec![None]);
    }

    #[tokio::test]
    async fn token_changes_are_picked_up_by_later_requests() {
        let (address, received) = spawn_fake_service().await;
        let (sender, receiver) = watch::channel(Some("first".to_owned()));
        let client = HttpTransactionClient::new(
            &format!("http://{address}/api"),
            receiver,
            Duration::from_secs(1),
        )
        .unwrap();

        client.list(1, 25).await.unwrap();
        sender.send_replace(None);
        client.list(1, 25).await.unwrap();

        assert_eq!(
            received.lock().unwrap().authorization,
            vec![Some("Bearer first".to_owned()), None]
        );
    }

    #[tokio::test]
    async fn search_encodes_query() {
        let (address, received) = spawn_fake_service().await;
        let client = new_client(address, None);

        client.search("coffee & tea", 1, 10).await.unwrap();

        assert_eq!(
            received.lock().unwrap().queries,
            vec![("coffee & tea".to_owned(), 1, 10)]
        );
    }

    #[tokio::test]
    async fn create_conflict_maps_to_conflict_error() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);
        let transaction = Transaction::build(date!(2024 - 01 - 01), "Duplicate", 4.5, Currency::Usd);

        let result = client.create(&transaction).await;

        assert_eq!(
            result,
            Err(Error::Conflict("Transaction already exists".to_owned()))
        );
    }

    #[tokio::test]
    async fn create_returns_new_transaction() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);
        let transaction = Transaction::build(date!(2024 - 01 - 01), "Coffee", 4.5, Currency::Usd);

        let created = client.create(&transaction).await.unwrap();

        assert_eq!(created.id, 42);
    }

    #[tokio::test]
    async fn update_unwraps_transaction_envelope() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);
        let patch = TransactionPatch {
            description: Some("Tea".to_owned()),
            ..Default::default()
        };

        let updated = client.update(3, &patch).await.unwrap();

        assert_eq!(updated.id, 3);
        assert_eq!(updated.description, "Tea");
    }

    #[tokio::test]
    async fn soft_delete_returns_flagged_transaction() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);

        let deleted = client.soft_delete(9).await.unwrap();

        assert!(deleted.is_deleted);
    }

    #[tokio::test]
    async fn server_message_field_is_used_when_error_field_is_missing() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);

        let result = client.soft_delete(404).await;

        assert_eq!(
            result,
            Err(Error::Server {
                status: 404,
                message: "Transaction not found".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn unstructured_error_body_uses_fallback_message() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);

        let result = client.hard_delete(1).await;

        assert_eq!(
            result,
            Err(Error::Server {
                status: 500,
                message: "An error occurred".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn batch_sends_ids_and_returns_message() {
        let (address, received) = spawn_fake_service().await;
        let client = new_client(address, None);

        let message = client.batch_soft_delete(&[1, 2, 3]).await.unwrap();

        assert_eq!(message, "3 transactions soft deleted");
        assert_eq!(received.lock().unwrap().batch_ids, vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn import_uploads_file_field() {
        let (address, received) = spawn_fake_service().await;
        let client = new_client(address, None);
        let file = CsvFile {
            file_name: "bank.csv".to_owned(),
            contents: b"date,description\n2024-01-01,Coffee\n".to_vec(),
        };

        let summary = client.import_csv(file).await.unwrap();

        assert_eq!(summary.message, "2 transactions uploaded.");
        assert_eq!(summary.duplicate_rows.len(), 1);
        assert_eq!(summary.repeats_in_db.len(), 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(
            received.lock().unwrap().uploaded_files,
            vec![(
                "file".to_owned(),
                "date,description\n2024-01-01,Coffee\n".to_owned()
            )]
        );
    }

    #[tokio::test]
    async fn export_returns_raw_bytes() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);

        let bytes = client.export_csv().await.unwrap();

        assert_eq!(bytes, b"id,date,description\n1,2024-01-01,Coffee\n".to_vec());
    }

    #[tokio::test]
    async fn timeout_is_a_network_error() {
        let (address, _) = spawn_fake_service().await;
        let client = new_client(address, None);

        let result = client.list_deleted(1, 25).await;

        assert!(
            matches!(result, Err(Error::Network(_))),
            "want network error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let client = new_client(address, None);

        let result = client.list(1, 25).await;

        assert!(
            matches!(result, Err(Error::Network(_))),
            "want network error, got {result:?}"
        );
    }

    #[test]
    fn error_field_takes_precedence_over_message() {
        let message = error_message_from_body(r#"{"error": "Bad date", "message": "Failed"}"#);

        assert_eq!(message, "Bad date");
    }
}

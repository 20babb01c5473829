use std::{sync::Arc, time::Duration};

use serde_json::json;

use crate::{
    AppState, PaginationConfig,
    session::{Credential, MemorySessionStore, SessionManager, make_id_token},
    test_utils::FakeTransactionApi,
};

/// A session with nobody logged in.
pub(crate) fn logged_out_session() -> SessionManager {
    SessionManager::init(MemorySessionStore::default(), Duration::from_secs(600))
}

/// A session with Ada logged in.
pub(crate) fn logged_in_session() -> SessionManager {
    let session = logged_out_session();
    let token = make_id_token(&json!({ "name": "Ada Lovelace", "email": "ada@example.com" }));
    session.login(Credential::from_id_token(&token).expect("Could not decode test token"));

    session
}

/// The app state on top of `api` with a logged in user, UTC and the default
/// pagination config.
pub(crate) fn test_app_state(api: &Arc<FakeTransactionApi>) -> AppState {
    AppState::new(
        logged_in_session(),
        api.clone(),
        "Etc/UTC",
        PaginationConfig::default(),
        None,
    )
    .expect("Could not create app state")
}

//! Tracks whether the user is logged in and logs them out after a period of
//! inactivity.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::{sync::watch, task::JoinHandle};

use crate::session::{
    credential::{Credential, UserProfile},
    store::{SessionRecord, SessionStore},
};

/// How long the user may be inactive before they are logged out.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// The single source of truth for the log-in state.
///
/// Cloning is cheap and every clone refers to the same session. At most one
/// expiry timer is pending at any time: arming a new deadline aborts the
/// previous timer before spawning the next one.
#[derive(Debug, Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: Box<dyn SessionStore>,
    timeout: Duration,
    state: Mutex<SessionState>,
    token: watch::Sender<Option<String>>,
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    profile: Option<UserProfile>,
    deadline: Option<OffsetDateTime>,
    expiry_timer: Option<JoinHandle<()>>,
    /// Incremented whenever the timer is replaced or cancelled so a timer that
    /// already fired can tell it is out of date.
    timer_epoch: u64,
}

/// A persisted record that has every value needed to resume a session.
struct StoredSession {
    token: String,
    profile: UserProfile,
    deadline: OffsetDateTime,
}

impl TryFrom<&SessionRecord> for StoredSession {
    type Error = &'static str;

    fn try_from(record: &SessionRecord) -> Result<Self, Self::Error> {
        let token = record
            .auth_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or("the auth token is missing")?;
        let profile = record
            .user
            .as_deref()
            .and_then(|user| serde_json::from_str(user).ok())
            .ok_or("the user profile is missing or unreadable")?;
        let deadline = record
            .logout_deadline
            .as_deref()
            .and_then(|deadline| OffsetDateTime::parse(deadline, &Rfc3339).ok())
            .ok_or("the logout deadline is missing or unreadable")?;

        Ok(Self {
            token: token.to_owned(),
            profile,
            deadline,
        })
    }
}

impl SessionManager {
    /// Create the session manager and resume the persisted session if it has
    /// not expired yet.
    ///
    /// Expired or incomplete records are cleared so that no partial session
    /// is left behind. Must be called from within a tokio runtime.
    pub fn init(store: impl SessionStore + 'static, timeout: Duration) -> Self {
        let (token, _) = watch::channel(None);
        let manager = Self {
            inner: Arc::new(Inner {
                store: Box::new(store),
                timeout,
                state: Mutex::default(),
                token,
            }),
        };

        manager.resume();
        manager
    }

    fn resume(&self) {
        let record = match self.inner.store.load() {
            Ok(record) => record,
            Err(error) => {
                tracing::error!("Could not load the persisted session: {error}");
                return;
            }
        };

        if record.is_empty() {
            return;
        }

        let session = match StoredSession::try_from(&record) {
            Ok(session) => session,
            Err(reason) => {
                tracing::warn!("Discarding incomplete session record: {reason}");
                self.inner.clear_store();
                return;
            }
        };

        let remaining = session.deadline - OffsetDateTime::now_utc();
        let remaining = match Duration::try_from(remaining) {
            Ok(remaining) if !remaining.is_zero() => remaining,
            _ => {
                tracing::info!("The persisted session expired at {}", session.deadline);
                self.inner.clear_store();
                return;
            }
        };

        tracing::info!("Resuming session for {}", session.profile.email);
        let mut state = self.inner.lock_state();
        state.token = Some(session.token.clone());
        state.profile = Some(session.profile);
        state.deadline = Some(session.deadline);
        self.arm_timer(&mut state, remaining);
        drop(state);

        self.inner.token.send_replace(Some(session.token));
    }

    /// Start a session for `credential` and arm the inactivity deadline.
    pub fn login(&self, credential: Credential) {
        let (token, profile) = credential.into_parts();
        tracing::info!("Logged in as {}", profile.email);

        let mut state = self.inner.lock_state();
        state.token = Some(token.clone());
        state.profile = Some(profile);
        self.extend_deadline(&mut state);
        drop(state);

        self.inner.token.send_replace(Some(token));
    }

    /// End the session, clear every persisted value and cancel the pending expiry.
    pub fn logout(&self) {
        let mut state = self.inner.lock_state();
        cancel_timer(&mut state);

        if state.token.is_some() {
            tracing::info!("Logged out");
        }

        self.end_session(&mut state);
    }

    /// Push the inactivity deadline back to a full timeout from now.
    ///
    /// Does nothing when nobody is logged in.
    pub fn record_activity(&self) {
        let mut state = self.inner.lock_state();

        if state.token.is_none() {
            return;
        }

        self.extend_deadline(&mut state);
    }

    /// Cancel the pending expiry without touching the persisted record, e.g.
    /// when the server shuts down.
    pub fn teardown(&self) {
        let mut state = self.inner.lock_state();
        cancel_timer(&mut state);
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock_state().token.is_some()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.lock_state().profile.clone()
    }

    pub fn deadline(&self) -> Option<OffsetDateTime> {
        self.inner.lock_state().deadline
    }

    /// A receiver that always holds the bearer token of the current session,
    /// or `None` while logged out.
    pub fn token_source(&self) -> watch::Receiver<Option<String>> {
        self.inner.token.subscribe()
    }

    fn extend_deadline(&self, state: &mut SessionState) {
        let deadline = OffsetDateTime::now_utc() + self.inner.timeout;
        state.deadline = Some(deadline);
        self.inner.persist(state);
        self.arm_timer(state, self.inner.timeout);
    }

    fn arm_timer(&self, state: &mut SessionState, delay: Duration) {
        cancel_timer(state);
        let epoch = state.timer_epoch;
        let inner = Arc::downgrade(&self.inner);

        state.expiry_timer = Some(tokio::spawn(expire_after(inner, delay, epoch)));
    }

    fn end_session(&self, state: &mut SessionState) {
        state.token = None;
        state.profile = None;
        state.deadline = None;
        self.inner.clear_store();
        self.inner.token.send_replace(None);
    }

    fn expire(&self, epoch: u64) {
        let mut state = self.inner.lock_state();

        if state.timer_epoch != epoch || state.token.is_none() {
            return;
        }

        tracing::info!("Logging out after {:?} of inactivity", self.inner.timeout);
        // This task is the timer, so it is detached rather than aborted.
        state.expiry_timer = None;
        state.timer_epoch += 1;
        self.end_session(&mut state);
    }
}

async fn expire_after(inner: Weak<Inner>, delay: Duration, epoch: u64) {
    tokio::time::sleep(delay).await;

    if let Some(inner) = inner.upgrade() {
        SessionManager { inner }.expire(epoch);
    }
}

fn cancel_timer(state: &mut SessionState) {
    if let Some(timer) = state.expiry_timer.take() {
        timer.abort();
    }
    state.timer_epoch += 1;
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &SessionState) {
        let user = match state.profile.as_ref().map(serde_json::to_string).transpose() {
            Ok(user) => user,
            Err(error) => {
                tracing::error!("Could not serialize the user profile: {error}");
                return;
            }
        };
        let logout_deadline = state
            .deadline
            .and_then(|deadline| deadline.format(&Rfc3339).ok());

        let record = SessionRecord {
            auth_token: state.token.clone(),
            user,
            logout_deadline,
        };

        if let Err(error) = self.store.save(&record) {
            tracing::error!("Could not persist the session: {error}");
        }
    }

    fn clear_store(&self) {
        if let Err(error) = self.store.clear() {
            tracing::error!("Could not clear the persisted session: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::json;
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{
        Error,
        session::{
            credential::{Credential, make_id_token},
            manager::{INACTIVITY_TIMEOUT, SessionManager},
            store::{MemorySessionStore, SessionRecord, SessionStore},
        },
    };

    /// Lets the test observe a store that has been moved into the manager.
    #[derive(Debug, Clone, Default)]
    struct SharedStore(Arc<MemorySessionStore>);

    impl SessionStore for SharedStore {
        fn load(&self) -> Result<SessionRecord, Error> {
            self.0.load()
        }

        fn save(&self, record: &SessionRecord) -> Result<(), Error> {
            self.0.save(record)
        }

        fn clear(&self) -> Result<(), Error> {
            self.0.clear()
        }
    }

    impl SharedStore {
        fn with_record(record: SessionRecord) -> Self {
            Self(Arc::new(MemorySessionStore::with_record(record)))
        }

        fn record(&self) -> SessionRecord {
            self.0.load().unwrap()
        }
    }

    fn test_credential() -> Credential {
        let token = make_id_token(&json!({ "name": "Ada", "email": "ada@example.com" }));
        Credential::from_id_token(&token).unwrap()
    }

    fn record_with_deadline(deadline: OffsetDateTime) -> SessionRecord {
        SessionRecord {
            auth_token: Some("token".to_owned()),
            user: Some(r#"{"name":"Ada","email":"ada@example.com"}"#.to_owned()),
            logout_deadline: Some(deadline.format(&Rfc3339).unwrap()),
        }
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn starts_logged_out_without_record() {
        let session = SessionManager::init(SharedStore::default(), INACTIVITY_TIMEOUT);

        assert!(!session.is_authenticated());
        assert_eq!(session.profile(), None);
        assert_eq!(*session.token_source().borrow(), None);
    }

    #[tokio::test]
    async fn login_persists_complete_record() {
        let store = SharedStore::default();
        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);
        let credential = test_credential();

        session.login(credential.clone());

        assert!(session.is_authenticated());
        assert_eq!(session.profile().unwrap().name, "Ada");
        let record = store.record();
        assert_eq!(record.auth_token.as_deref(), Some(credential.token()));
        assert!(record.user.unwrap().contains("ada@example.com"));
        assert!(record.logout_deadline.is_some());
        assert_eq!(
            session.token_source().borrow().as_deref(),
            Some(credential.token())
        );
    }

    #[tokio::test]
    async fn logout_clears_all_three_keys() {
        let store = SharedStore::default();
        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);
        session.login(test_credential());

        session.logout();

        assert!(!session.is_authenticated());
        assert!(store.record().is_empty());
        assert_eq!(*session.token_source().borrow(), None);
    }

    #[tokio::test]
    async fn reload_after_logout_is_unauthenticated() {
        let store = SharedStore::default();
        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);
        session.login(test_credential());
        session.logout();

        let reloaded = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);

        assert!(!reloaded.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_inactivity() {
        let store = SharedStore::default();
        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);
        session.login(test_credential());

        advance(INACTIVITY_TIMEOUT - Duration::from_secs(1)).await;
        assert!(session.is_authenticated());

        advance(Duration::from_secs(2)).await;
        assert!(!session.is_authenticated());
        assert!(store.record().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_pushes_back_the_deadline() {
        let session = SessionManager::init(SharedStore::default(), INACTIVITY_TIMEOUT);
        session.login(test_credential());

        advance(Duration::from_secs(9 * 60)).await;
        session.record_activity();
        advance(Duration::from_secs(9 * 60)).await;

        assert!(
            session.is_authenticated(),
            "want session alive 9 minutes after the last activity"
        );

        advance(Duration::from_secs(2 * 60)).await;

        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_while_logged_out_does_nothing() {
        let store = SharedStore::default();
        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);

        session.record_activity();

        assert!(!session.is_authenticated());
        assert!(store.record().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_cancels_pending_expiry_of_a_later_session() {
        let session = SessionManager::init(SharedStore::default(), INACTIVITY_TIMEOUT);
        session.login(test_credential());
        advance(Duration::from_secs(8 * 60)).await;
        session.logout();

        session.login(test_credential());
        advance(Duration::from_secs(3 * 60)).await;

        assert!(
            session.is_authenticated(),
            "the first session's timer must not log out the second session"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resumes_unexpired_session_with_remaining_time() {
        let deadline = OffsetDateTime::now_utc() + Duration::from_secs(5 * 60);
        let store = SharedStore::with_record(record_with_deadline(deadline));

        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);

        assert!(session.is_authenticated());
        assert_eq!(session.profile().unwrap().email, "ada@example.com");
        assert_eq!(session.token_source().borrow().as_deref(), Some("token"));

        advance(Duration::from_secs(5 * 60 + 1)).await;

        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn expired_record_is_cleared() {
        let deadline = OffsetDateTime::now_utc() - Duration::from_secs(1);
        let store = SharedStore::with_record(record_with_deadline(deadline));

        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);

        assert!(!session.is_authenticated());
        assert!(store.record().is_empty());
    }

    #[tokio::test]
    async fn partial_record_is_cleared() {
        let store = SharedStore::with_record(SessionRecord {
            auth_token: Some("token".to_owned()),
            user: None,
            logout_deadline: None,
        });

        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);

        assert!(!session.is_authenticated());
        assert!(store.record().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_keeps_record_but_stops_timer() {
        let store = SharedStore::default();
        let session = SessionManager::init(store.clone(), INACTIVITY_TIMEOUT);
        session.login(test_credential());

        session.teardown();
        advance(INACTIVITY_TIMEOUT * 2).await;

        assert!(session.is_authenticated());
        assert!(!store.record().is_empty());
    }
}

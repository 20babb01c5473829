//! The log-in state of the single user of the dashboard.
//!
//! - [SessionManager] owns the authenticated flag and the inactivity timer.
//! - `SessionStore` persists the token, profile and deadline between restarts.
//! - [Credential] decodes the identity token from the identity provider.

mod credential;
mod manager;
mod store;

pub use credential::{Credential, UserProfile};
pub use manager::{INACTIVITY_TIMEOUT, SessionManager};
pub use store::FileSessionStore;

#[cfg(test)]
pub(crate) use credential::make_id_token;
#[cfg(test)]
pub(crate) use store::MemorySessionStore;

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Authenticated identity held by the client.
///
/// A profile can only exist alongside a token; dropping the session drops
/// both. This is also the record persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    #[serde(default)]
    user: Option<Profile>,
    saved_at: DateTime<Utc>,
}

impl Session {
    /// Build a session stamped with the current time.
    pub fn new(token: impl Into<String>, user: Option<Profile>) -> Self {
        Self {
            token: token.into(),
            user,
            saved_at: Utc::now(),
        }
    }

    /// Opaque bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Cached user profile, if known.
    pub fn user(&self) -> Option<&Profile> {
        self.user.as_ref()
    }

    /// When the record was last written.
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    /// Copy of this session carrying `user`.
    pub fn with_user(&self, user: Profile) -> Self {
        Self::new(self.token.clone(), Some(user))
    }

    /// Current state of this session.
    pub fn status(&self) -> SessionStatus {
        match &self.user {
            Some(profile) => SessionStatus::Authenticated(profile.clone()),
            None => SessionStatus::ProfileIncomplete,
        }
    }
}

/// Outcome of inspecting the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No token.
    Anonymous,
    /// A token without a known profile.
    ProfileIncomplete,
    /// Token and profile are both present.
    Authenticated(Profile),
}

impl SessionStatus {
    /// Whether a token is present.
    pub fn has_token(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

/// Immutable snapshot of the outbound credentials.
///
/// Requests read this once when they are built, so a request already in
/// flight keeps the token it started with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: Arc<str>,
}

impl Credentials {
    /// Bearer token to attach.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Shared view of the current session.
///
/// Cloned into the HTTP client for reading; only the session store writes.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Snapshot of the credentials to attach to the next request.
    pub fn credentials(&self) -> Option<Credentials> {
        self.inner.read().as_ref().map(|session| Credentials {
            token: Arc::from(session.token()),
        })
    }

    /// Copy of the current session.
    pub fn current(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    /// Profile of the current session, if any.
    pub fn profile(&self) -> Option<Profile> {
        self.inner
            .read()
            .as_ref()
            .and_then(|session| session.user().cloned())
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.inner
            .read()
            .as_ref()
            .map_or(SessionStatus::Anonymous, Session::status)
    }

    pub(crate) fn replace(&self, session: Option<Session>) {
        *self.inner.write() = session;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_snapshot_outlives_replacement() {
        let handle = SessionHandle::default();
        assert!(handle.credentials().is_none());

        handle.replace(Some(Session::new("first", None)));
        let snapshot = handle.credentials().expect("token present");
        handle.replace(Some(Session::new("second", None)));

        assert_eq!(snapshot.token(), "first");
        assert_eq!(handle.credentials().map(|c| c.token().to_string()), Some("second".to_string()));
        assert_eq!(handle.status(), SessionStatus::ProfileIncomplete);
        assert!(!format!("{snapshot:?}").contains("first"));
    }
}

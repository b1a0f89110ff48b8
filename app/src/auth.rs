//! Authentication boundary.
//!
//! The provider supplies a stable user id for the signed-in principal;
//! without one, every remote operation is skipped and the app runs
//! local-only. What persists across launches is the provider-issued
//! session token, never a credential.

use crate::storage::KeyValueStorage;
use encore_core::{Result, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::RwLock;

const SESSION_KEY: &str = "session";

/// A signed-in principal: the stable user id plus the long-lived token the
/// auth provider issued for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub refresh_token: String,
}

/// Supplies the current principal. Sign-in/sign-up flows live in the
/// platform shell; the sync core only needs to know who, if anyone, is
/// signed in right now.
pub trait AuthProvider: Send + Sync {
    /// Stable id of the signed-in user, or `None` for anonymous use.
    fn user_id(&self) -> Option<UserId>;
}

/// Persists the session token between launches.
pub struct SessionStore {
    kv: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStorage>) -> Self {
        Self { kv }
    }

    /// Load the persisted session, if any. An undecodable document is
    /// treated as signed-out rather than an error.
    pub async fn load(&self) -> Result<Option<Session>> {
        let Some(raw) = self.kv.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding undecodable persisted session");
                self.kv.remove(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }

    /// Persist a session after sign-in.
    pub async fn store(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)
            .map_err(|e| encore_core::Error::StorageWriteFailed(e.to_string()))?;
        self.kv.set(SESSION_KEY, &raw).await
    }

    /// Forget the session on sign-out.
    pub async fn clear(&self) -> Result<()> {
        self.kv.remove(SESSION_KEY).await
    }
}

/// An in-process provider holding whatever session the shell established.
/// Doubles as the test provider.
#[derive(Debug, Default)]
pub struct StaticAuth {
    session: RwLock<Option<Session>>,
}

impl StaticAuth {
    /// An anonymous provider.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A provider already signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<UserId>) -> Self {
        Self {
            session: RwLock::new(Some(Session {
                user_id: user_id.into(),
                refresh_token: String::new(),
            })),
        }
    }

    /// Install a session established by the shell.
    pub fn set_session(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
    }
}

impl AuthProvider for StaticAuth {
    fn user_id(&self) -> Option<UserId> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.user_id.clone()))
    }
}

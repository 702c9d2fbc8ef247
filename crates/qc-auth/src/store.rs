use std::sync::{Arc, RwLock};

use crate::errors::{AuthError, Result};
use crate::session::Session;

/// Trait for storing and retrieving the signed-in session
///
/// There is at most one session. Readers see either the previous record or
/// the new one, never a partial write.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, `None` when signed out
    async fn load(&self) -> Option<Session>;

    /// Replace the stored session wholesale
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored session (sign-out)
    async fn clear(&self) -> Result<()>;
}

/// In-memory session store for testing and simple use cases
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(Some(session))),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Option<Session> {
        self.session.read().ok()?.clone()
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self
            .session
            .write()
            .map_err(|_| AuthError::PersistenceFailed("Lock poisoned".to_string()))? =
            Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self
            .session
            .write()
            .map_err(|_| AuthError::PersistenceFailed("Lock poisoned".to_string()))? = None;
        Ok(())
    }
}

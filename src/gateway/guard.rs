use crate::gateway::error::ApiError;
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Caller side of the 401 policy: a rejected token is dropped from the
/// store so the next request goes out without it.
#[derive(Clone)]
pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Pass `result` through, clearing the session first if it is a 401
    pub fn check<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(err) = &result {
            if err.is_unauthorized() {
                info!("Session rejected by backend, logging out");
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear session: {:#}", e);
                }
            }
        }
        result
    }
}

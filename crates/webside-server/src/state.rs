//! Shared request state
//!
//! All runtime access goes through one exclusive gate around the [`Inspector`]. The
//! gate is a blocking lock taken and released inside a handler body, never across an
//! await point.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::error;
use webside_engine::{Inspector, ReflectError, ReflectResult};

use crate::error::ApiError;

struct Shared {
    inspector: Mutex<Inspector>,
    fatal: Mutex<Option<String>>,
    shutdown: Notify,
}

/// Handle cloned into every handler
#[derive(Clone)]
pub struct AppState {
    shared: Arc<Shared>,
}

impl AppState {
    /// Wrap a session
    pub fn new(inspector: Inspector) -> Self {
        Self {
            shared: Arc::new(Shared {
                inspector: Mutex::new(inspector),
                fatal: Mutex::new(None),
                shutdown: Notify::new(),
            }),
        }
    }

    /// Run `operation` with exclusive access to the session
    ///
    /// A fatal error is recorded and requests shutdown before being answered.
    pub fn run<T>(
        &self,
        operation: impl FnOnce(&mut Inspector) -> ReflectResult<T>,
    ) -> Result<T, ApiError> {
        let result = {
            let mut inspector = self.shared.inspector.lock();
            operation(&mut inspector)
        };
        result.map_err(|err| {
            if let ReflectError::Fatal(reason) = &err {
                self.escalate(reason);
            }
            ApiError::from(err)
        })
    }

    fn escalate(&self, reason: &str) {
        error!(reason = %reason, "fatal runtime error, shutting down");
        let mut fatal = self.shared.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(reason.to_string());
        }
        self.shared.shutdown.notify_one();
    }

    /// Reason of the first fatal error, if any
    pub fn fatal_reason(&self) -> Option<String> {
        self.shared.fatal.lock().clone()
    }

    /// Resolves once a fatal error has been recorded
    pub async fn fatal_error(&self) {
        self.shared.shutdown.notified().await;
    }
}

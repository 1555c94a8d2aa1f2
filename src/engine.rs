//! Engine lifecycle
//!
//! One [`KtuvitClient`] serves the whole process. [`EngineCell`] builds it on
//! the first `initialize` call and hands out the same instance afterwards;
//! the client is immutable, so readers never lock.
//!
//! [`run_blocking`] lets synchronous code (configuration validation) drive the
//! async client without touching the caller's runtime.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::api::{KtuvitClient, KtuvitError};

/// Holds the process-wide client
#[derive(Default)]
pub struct EngineCell {
    instance: OnceLock<Arc<KtuvitClient>>,
}

impl EngineCell {
    pub const fn new() -> Self {
        Self {
            instance: OnceLock::new(),
        }
    }

    /// Store `client` unless an instance already exists; returns the live instance
    pub fn initialize(&self, client: KtuvitClient) -> Arc<KtuvitClient> {
        self.initialize_with(|| client)
    }

    /// Like [`initialize`](Self::initialize), building the client only if needed
    pub fn initialize_with(&self, init: impl FnOnce() -> KtuvitClient) -> Arc<KtuvitClient> {
        let mut created = false;
        let instance = self.instance.get_or_init(|| {
            created = true;
            Arc::new(init())
        });
        if created {
            debug!(base_url = instance.base_url(), "Ktuvit engine initialized");
        } else {
            debug!("Ktuvit engine already initialized");
        }
        Arc::clone(instance)
    }

    pub fn get(&self) -> Option<Arc<KtuvitClient>> {
        self.instance.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }
}

/// Run `future` to completion on a dedicated thread with its own
/// current-thread runtime, blocking the caller until it finishes.
///
/// Safe to call from inside a tokio runtime: the caller's scheduler is never
/// asked to drive the future.
pub fn run_blocking<F, T>(future: F) -> Result<T, KtuvitError>
where
    F: Future<Output = T> + Send,
    T: Send,
{
    std::thread::scope(|scope| {
        scope
            .spawn(move || -> Result<T, KtuvitError> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| KtuvitError::Runtime(e.to_string()))?;
                Ok(runtime.block_on(future))
            })
            .join()
            .map_err(|_| KtuvitError::Runtime("blocking worker panicked".to_string()))?
    })
}

//! Bounded access to completion-service instances
//!
//! A local model can only serve one generation at a time, so concurrent
//! requests are queued instead of being sent straight through. The pool
//! holds a fixed set of provider instances and a fair semaphore with one
//! permit per instance: callers are admitted strictly in arrival order and
//! each admitted caller gets an idle instance to itself.
//!
//! The configured timeout covers both the wait for admission and the call
//! itself. A timed-out call is cancelled and retried exactly once after a
//! short backoff; a second timeout is reported as [`PoolError::Timeout`].
//! Provider errors are returned as-is and never retried.
//!
//! # Examples
//!
//! ```
//! use vitae_llm::{CompletionPool, MockProvider, PoolConfig};
//!
//! let pool = CompletionPool::single(MockProvider::new("{}"), PoolConfig::default());
//! assert_eq!(pool.size(), 1);
//! assert_eq!(pool.model_name(), "mock");
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use vitae_domain::{CompletionProvider, CompletionRequest, CompletionResponse};

/// Attempts per call: the original plus one retry after a timeout
pub const MAX_ATTEMPTS: u32 = 2;

/// Pool timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Wall-clock limit per attempt, covering queueing and generation (seconds)
    pub timeout_secs: u64,

    /// Pause before the single retry after a timeout (milliseconds)
    pub retry_backoff_ms: u64,
}

impl PoolConfig {
    /// Get the per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the retry backoff as a Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 180,
            retry_backoff_ms: 1_000,
        }
    }
}

/// Errors surfaced by the pool
#[derive(Error, Debug)]
pub enum PoolError<E> {
    /// Every attempt ran past the timeout
    #[error("Completion timed out after {attempts} attempts of {timeout:?}")]
    Timeout {
        /// Per-attempt limit
        timeout: Duration,
        /// Attempts made
        attempts: u32,
    },

    /// The pool was shut down
    #[error("Completion pool is shut down")]
    Closed,

    /// The pool was created without instances
    #[error("Completion pool needs at least one instance")]
    Empty,

    /// The provider returned an error
    #[error("Provider error: {0}")]
    Provider(#[source] E),
}

/// Fixed-size pool of completion providers with FIFO admission
pub struct CompletionPool<P> {
    instances: Vec<P>,
    idle: Mutex<Vec<usize>>,
    permits: Semaphore,
    config: PoolConfig,
}

/// An instance checked out of the pool; returns itself on drop
struct Checkout<'a, P> {
    pool: &'a CompletionPool<P>,
    index: usize,
    _permit: SemaphorePermit<'a>,
}

impl<P> Drop for Checkout<'_, P> {
    fn drop(&mut self) {
        // Runs before the permit is released, so the next caller always
        // finds an idle instance.
        self.pool
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.index);
    }
}

impl<P: CompletionProvider> CompletionPool<P> {
    /// Create a pool over the given instances
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Empty`] if `instances` is empty.
    pub fn new(instances: Vec<P>, config: PoolConfig) -> Result<Self, PoolError<P::Error>> {
        if instances.is_empty() {
            return Err(PoolError::Empty);
        }

        let size = instances.len();
        info!(
            "Completion pool ready: {} instance(s) of '{}', timeout {:?}",
            size,
            instances[0].model_name(),
            config.timeout()
        );

        Ok(Self {
            instances,
            idle: Mutex::new((0..size).rev().collect()),
            permits: Semaphore::new(size),
            config,
        })
    }

    /// Create a pool with a single instance
    pub fn single(provider: P, config: PoolConfig) -> Self {
        let instances = vec![provider];
        Self {
            idle: Mutex::new(vec![0]),
            permits: Semaphore::new(1),
            instances,
            config,
        }
    }

    /// Number of instances
    pub fn size(&self) -> usize {
        self.instances.len()
    }

    /// Instances not currently serving a call
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Model name of the pooled instances
    pub fn model_name(&self) -> &str {
        self.instances[0].model_name()
    }

    /// Timing configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Stop admitting new calls; in-flight calls run to completion
    pub fn shutdown(&self) {
        if !self.permits.is_closed() {
            info!("Completion pool shutting down");
            self.permits.close();
        }
    }

    /// True once [`shutdown`](Self::shutdown) has been called
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Complete a request on the next idle instance
    ///
    /// # Errors
    ///
    /// - [`PoolError::Timeout`] if both attempts exceed the timeout
    /// - [`PoolError::Closed`] if the pool is shut down
    /// - [`PoolError::Provider`] if the provider fails
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, PoolError<P::Error>> {
        let limit = self.config.timeout();

        for attempt in 1..=MAX_ATTEMPTS {
            match timeout(limit, self.attempt(request)).await {
                Ok(result) => return result,
                Err(_) => {
                    warn!(
                        "Completion attempt {}/{} timed out after {:?}",
                        attempt, MAX_ATTEMPTS, limit
                    );
                    if attempt < MAX_ATTEMPTS {
                        sleep(self.config.retry_backoff()).await;
                    }
                }
            }
        }

        Err(PoolError::Timeout {
            timeout: limit,
            attempts: MAX_ATTEMPTS,
        })
    }

    async fn attempt(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, PoolError<P::Error>> {
        let queued_at = Instant::now();
        let checkout = self.checkout().await?;
        debug!(
            "Instance {} admitted after {:?}",
            checkout.index,
            queued_at.elapsed()
        );

        self.instances[checkout.index]
            .complete(request)
            .await
            .map_err(PoolError::Provider)
    }

    async fn checkout(&self) -> Result<Checkout<'_, P>, PoolError<P::Error>> {
        let permit = self.permits.acquire().await.map_err(|_| PoolError::Closed)?;
        let index = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        // Permits never outnumber idle instances, so an admitted caller
        // always finds one.
        match index {
            Some(index) => Ok(Checkout {
                pool: self,
                index,
                _permit: permit,
            }),
            None => Err(PoolError::Closed),
        }
    }
}

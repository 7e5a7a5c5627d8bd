//! Retry decorator with exponential backoff.
//!
//! The retry loop is an explicit state machine: [`RetryState`] counts attempts and
//! decides, after each failure, whether to wait and try again or give up. Waiting is
//! delegated to a [`RetryScheduler`], so exhaustion can be exercised without sleeping.
//! A [`RetryCancellation`] stops the loop between attempts or while it is waiting.

use super::TrackerTransport;
use crate::error::{Result, TrackerError};
use crate::event::TrackerEvent;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, warn};

pub const RETRY_TRANSPORT: &str = "RetryTransport";

/// Backoff configuration.
///
/// The delay before retry `n` (0-based) is `min(min_timeout * retry_factor^n, max_timeout)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    /// Overall budget for a single `handle` call, `None` for no limit.
    pub max_retry_time: Option<Duration>,
    pub min_timeout: Duration,
    pub max_timeout: Duration,
    pub retry_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_retry_time: None,
            min_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(30),
            retry_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_max_retry_time(mut self, max_retry_time: Duration) -> Self {
        self.max_retry_time = Some(max_retry_time);
        self
    }

    pub fn with_timeouts(mut self, min_timeout: Duration, max_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self.max_timeout = max_timeout.max(min_timeout);
        self
    }

    pub fn with_retry_factor(mut self, retry_factor: f64) -> Self {
        self.retry_factor = retry_factor;
        self
    }

    /// Fixed delay between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self::default()
            .with_timeouts(delay, delay)
            .with_retry_factor(1.0)
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.min_timeout.as_secs_f64() * self.retry_factor.powi(exponent);

        if !secs.is_finite() || secs >= self.max_timeout.as_secs_f64() {
            self.max_timeout
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Attempt bookkeeping for one `handle` call
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn start_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Decides what follows a failed attempt, `elapsed` being the time spent since the
    /// first attempt started.
    pub fn record_failure(&self, elapsed: Duration) -> RetryDecision {
        if self.attempts >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }

        let delay = self.policy.delay_for(self.attempts.saturating_sub(1));

        match self.policy.max_retry_time {
            Some(budget) if elapsed + delay > budget => RetryDecision::GiveUp,
            _ => RetryDecision::RetryAfter(delay),
        }
    }
}

/// Waits between two attempts.
#[async_trait]
pub trait RetryScheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl RetryScheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Default)]
struct CancelSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared handle cancelling the retries of one or more [`RetryTransport`]s.
///
/// Once cancelled, no new attempt is started and pending waits end immediately, until
/// [`RetryCancellation::reset`] is called.
#[derive(Debug, Default, Clone)]
pub struct RetryCancellation {
    signal: Arc<CancelSignal>,
}

impl RetryCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.signal.cancelled.store(true, Ordering::SeqCst);
        self.signal.notify.notify_waiters();
    }

    pub fn reset(&self) {
        self.signal.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`RetryCancellation::cancel`] has been called.
    pub async fn cancelled(&self) {
        let notified = self.signal.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel can't be missed.
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Retries the wrapped transport until it accepts the batch or the policy gives up.
pub struct RetryTransport {
    transport: Arc<dyn TrackerTransport>,
    policy: RetryPolicy,
    scheduler: Arc<dyn RetryScheduler>,
    cancellation: RetryCancellation,
}

impl RetryTransport {
    /// Create a retrying transport with the default [`RetryPolicy`].
    ///
    /// # Arguments
    ///
    /// * `transport` - The transport whose failures are retried
    pub fn new(transport: Arc<dyn TrackerTransport>) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    /// Create a retrying transport.
    ///
    /// # Arguments
    ///
    /// * `transport` - The transport whose failures are retried
    /// * `policy` - Attempt limit, time budget and backoff delays
    pub fn with_policy(transport: Arc<dyn TrackerTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            scheduler: Arc::new(TokioScheduler),
            cancellation: RetryCancellation::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn RetryScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Shares `cancellation` with this transport, e.g. to cancel several at once.
    pub fn with_cancellation(mut self, cancellation: RetryCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancellation(&self) -> &RetryCancellation {
        &self.cancellation
    }
}

fn cancelled_error(attempts: u32) -> TrackerError {
    TrackerError::Cancelled(format!("{} cancelled after {} attempts", RETRY_TRANSPORT, attempts))
}

#[async_trait]
impl TrackerTransport for RetryTransport {
    fn transport_name(&self) -> &str {
        RETRY_TRANSPORT
    }

    fn is_usable(&self) -> bool {
        self.transport.is_usable()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        let started = Instant::now();
        let mut state = RetryState::new(self.policy.clone());

        loop {
            if self.cancellation.is_cancelled() {
                return Err(cancelled_error(state.attempts()));
            }

            let attempt = state.start_attempt();
            debug!(
                "{} attempt {}/{} on {}",
                RETRY_TRANSPORT,
                attempt,
                self.policy.max_attempts,
                self.transport.transport_name()
            );

            let error = match self.transport.handle(events.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            match state.record_failure(started.elapsed()) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        "{} attempt {}/{} failed, retrying in {:?}: {}",
                        RETRY_TRANSPORT, attempt, self.policy.max_attempts, delay, error
                    );
                    tokio::select! {
                        _ = self.scheduler.sleep(delay) => {}
                        _ = self.cancellation.cancelled() => {
                            debug!("{} cancelled while waiting: {}", RETRY_TRANSPORT, error);
                            return Err(cancelled_error(attempt));
                        }
                    }
                }
                RetryDecision::GiveUp => {
                    warn!("{} giving up after {} attempts: {}", RETRY_TRANSPORT, attempt, error);
                    return Err(TrackerError::RetriesExhausted {
                        attempts: attempt,
                        last_error: Box::new(error),
                    });
                }
            }
        }
    }
}

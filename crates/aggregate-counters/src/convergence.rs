//! Bounded waits on telemetry values.
//!
//! Every watched signal moves through [`WaitState`]: `Unknown` until the
//! wait starts, `Polling` while values are read, then `Converged` or
//! `TimedOut`. Two flavors exist:
//!
//! - [`Convergence::await_value`] polls a path until it reads an exact value
//! - [`Convergence::watch`] consumes a subscription until an update
//!   satisfies a predicate
//!
//! [`Convergence::settle`] is the residual fixed delay for convergence that
//! has no observable signal.

use std::fmt::Debug;
use std::time::Duration;

use aggtest_client::{decode, lookup_as, ClientError, ClientResult, Telemetry, TelemetryPath};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::TimingConfig;
use crate::error::{AggTestError, AggTestResult};

/// Progress of one bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Unknown,
    Polling,
    Converged,
    TimedOut,
}

impl WaitState {
    /// Returns true once the wait has finished either way.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, WaitState::Converged | WaitState::TimedOut)
    }
}

/// Tracks and logs the state of one wait.
#[derive(Debug)]
pub struct WaitTracker {
    path: String,
    state: WaitState,
}

impl WaitTracker {
    pub fn new(path: &TelemetryPath) -> Self {
        Self {
            path: path.to_string(),
            state: WaitState::Unknown,
        }
    }

    pub fn state(&self) -> WaitState {
        self.state
    }

    /// Moves to `next`. Terminal states are final.
    pub fn advance(&mut self, next: WaitState) {
        if self.state.is_terminal() || self.state == next {
            return;
        }
        debug!(path = %self.path, from = ?self.state, to = ?next, "wait state changed");
        self.state = next;
    }
}

/// Wait bounds shared by every convergence check of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    timeout: Duration,
    poll_interval: Duration,
}

impl Convergence {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.convergence_timeout(), timing.poll_interval())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Polls `path` until it reads `expected`.
    ///
    /// Fails with [`AggTestError::ConvergenceTimeout`] carrying the last
    /// observed value once the bound passes.
    #[instrument(skip(self, client, expected), fields(path = %path))]
    pub async fn await_value<C, T>(&self, client: &C, path: &TelemetryPath, expected: &T) -> AggTestResult<T>
    where
        C: Telemetry + ?Sized,
        T: DeserializeOwned + PartialEq + Debug,
    {
        let mut tracker = WaitTracker::new(path);
        tracker.advance(WaitState::Polling);

        let mut last = None;
        let polled = tokio::time::timeout(
            self.timeout,
            poll_until(client, path, expected, self.poll_interval, &mut last),
        )
        .await;

        match polled {
            Ok(Ok(value)) => {
                tracker.advance(WaitState::Converged);
                Ok(value)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracker.advance(WaitState::TimedOut);
                warn!(expected = ?expected, last = ?last, "value did not converge");
                Err(AggTestError::timeout(path.to_string(), self.timeout, describe(&last)))
            }
        }
    }

    /// Subscribes to `path` and returns the first update satisfying
    /// `predicate`. Updates with no value never satisfy it.
    #[instrument(skip(self, client, predicate), fields(path = %path))]
    pub async fn watch<C, T, F>(&self, client: &C, path: &TelemetryPath, predicate: F) -> AggTestResult<T>
    where
        C: Telemetry + ?Sized,
        T: DeserializeOwned + Debug,
        F: Fn(&T) -> bool,
    {
        let mut tracker = WaitTracker::new(path);
        let stream = client.subscribe(path).await?;
        tracker.advance(WaitState::Polling);

        let mut last = None;
        let watched = tokio::time::timeout(
            self.timeout,
            next_matching(stream, path, &predicate, &mut last),
        )
        .await;

        match watched {
            Ok(Ok(value)) => {
                tracker.advance(WaitState::Converged);
                Ok(value)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracker.advance(WaitState::TimedOut);
                warn!(last = ?last, "watch predicate never held");
                Err(AggTestError::timeout(path.to_string(), self.timeout, describe(&last)))
            }
        }
    }

    /// Waits a fixed `delay` for convergence the test cannot observe.
    pub async fn settle(&self, delay: Duration, reason: &str) {
        if delay.is_zero() {
            return;
        }
        info!(?delay, reason, "Settling");
        tokio::time::sleep(delay).await;
    }
}

async fn poll_until<C, T>(
    client: &C,
    path: &TelemetryPath,
    expected: &T,
    interval: Duration,
    last: &mut Option<T>,
) -> ClientResult<T>
where
    C: Telemetry + ?Sized,
    T: DeserializeOwned + PartialEq,
{
    loop {
        match lookup_as::<T, C>(client, path).await? {
            Some(value) if &value == expected => return Ok(value),
            observed => *last = observed,
        }
        tokio::time::sleep(interval).await;
    }
}

async fn next_matching<T, F>(
    mut stream: BoxStream<'static, Option<Value>>,
    path: &TelemetryPath,
    predicate: &F,
    last: &mut Option<T>,
) -> ClientResult<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    while let Some(update) = stream.next().await {
        let Some(value) = update else {
            continue;
        };
        let value: T = decode(path, value)?;
        if predicate(&value) {
            return Ok(value);
        }
        *last = Some(value);
    }
    Err(ClientError::SubscriptionClosed {
        path: path.to_string(),
    })
}

fn describe<T: Debug>(last: &Option<T>) -> String {
    match last {
        Some(value) => format!("{:?}", value),
        None => "no value".to_string(),
    }
}

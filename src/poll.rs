//! State convergence polling
//!
//! Waits for a resource to reach one of a set of target states by calling a
//! refresh function on an interval. States in the pending set keep the poll
//! going; anything else is an error. The engine itself knows nothing about
//! HTTP statuses: [`gone_as_deleted`] wraps a refresh so that a
//! deleted-equivalent response reads as the `DELETED` state.

use crate::context::Context;
use crate::error::{Error, GonePolicy, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default convergence window
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120 * 60);

/// Delay before the first refresh
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Minimum spacing between two refreshes
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Canonical observable states
pub mod state {
    pub const CREATING: &str = "CREATING";
    pub const RESERVED: &str = "RESERVED";
    pub const ACTIVE: &str = "ACTIVE";
    pub const INACTIVE: &str = "INACTIVE";
    pub const DEPLOYING: &str = "DEPLOYING";
    pub const STARTING: &str = "STARTING";
    pub const RESTARTING: &str = "RESTARTING";
    pub const STOPPING: &str = "STOPPING";
    pub const STOPPED: &str = "STOPPED";
    pub const EDITING: &str = "EDITING";
    pub const UPGRADING: &str = "UPGRADING";
    pub const TERMINATING: &str = "TERMINATING";
    pub const DELETING: &str = "DELETING";
    pub const DELETED: &str = "DELETED";
    pub const SOFT_DELETED: &str = "SOFT_DELETED";
    pub const AVAILABLE: &str = "AVAILABLE";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    pub const RUNNING: &str = "RUNNING";
    pub const ATTACHED: &str = "ATTACHED";
    pub const ERROR: &str = "ERROR";
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// What to wait for and how long
#[derive(Debug, Clone)]
pub struct Waiter {
    pub resource: String,
    pub pending: Vec<String>,
    pub target: Vec<String>,
    pub timeout: Duration,
    pub delay: Duration,
    pub min_interval: Duration,
}

impl Waiter {
    pub fn new(resource: impl Into<String>, pending: &[&str], target: &[&str]) -> Self {
        Self {
            resource: resource.into(),
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Poll `refresh` until it reports a target state
    ///
    /// `refresh` returns `(value, state)`; its errors end the wait immediately.
    /// Returns the value observed with the first target state.
    pub async fn wait<T, F, Fut>(&self, ctx: &Context, mut refresh: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String)>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut last_state = String::new();

        tracing::debug!(
            "waiting for {} to reach {:?} (pending {:?})",
            self.resource,
            self.target,
            self.pending
        );

        if !self.delay.is_zero() {
            self.sleep_until(ctx, Instant::now() + self.delay, deadline)
                .await?;
        }

        loop {
            if Instant::now() >= deadline {
                return Err(self.timeout_error(last_state));
            }

            let (value, current) = ctx.run(refresh()).await?;
            tracing::trace!("{} state: {}", self.resource, current);

            if self.target.iter().any(|t| *t == current) {
                tracing::debug!("{} reached {}", self.resource, current);
                return Ok(value);
            }
            if !self.pending.iter().any(|p| *p == current) {
                return Err(Error::UnexpectedState {
                    resource: self.resource.clone(),
                    state: current,
                    target: self.target.clone(),
                });
            }
            last_state = current;

            self.sleep_until(ctx, Instant::now() + self.min_interval, deadline)
                .await?;
        }
    }

    async fn sleep_until(&self, ctx: &Context, wake: Instant, deadline: Instant) -> Result<()> {
        let wake = wake.min(deadline);
        ctx.run(async {
            tokio::time::sleep_until(wake).await;
            Ok(())
        })
        .await
    }

    fn timeout_error(&self, last_state: String) -> Error {
        Error::Timeout {
            resource: self.resource.clone(),
            target: self.target.clone(),
            last_state,
            timeout: self.timeout,
        }
    }
}

/// Map a deleted-equivalent refresh error to the `DELETED` state
///
/// With `error_on_not_found` set, every error passes through unchanged.
pub async fn gone_as_deleted<T, Fut>(
    fut: Fut,
    policy: GonePolicy,
    error_on_not_found: bool,
) -> Result<(Option<T>, String)>
where
    Fut: Future<Output = Result<(T, String)>>,
{
    match fut.await {
        Ok((value, s)) => Ok((Some(value), s)),
        Err(e) if !error_on_not_found && e.is_deleted_equivalent(policy) => {
            tracing::debug!("treating status {} as deleted", e.status());
            Ok((None, state::DELETED.to_string()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn api_error(status: u16) -> Error {
        Error::Api {
            status,
            method: "GET".to_string(),
            url: "https://h/vpc".to_string(),
            message: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaches_target_after_pending() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let states = Arc::new(Mutex::new(vec!["ACTIVE", "CREATING", "CREATING"]));
        let waiter = Waiter::new("vpc", &[state::CREATING], &[state::ACTIVE]);

        let result = waiter
            .wait(&Context::new(), || {
                let seen = seen.clone();
                let states = states.clone();
                async move {
                    let s = states.lock().unwrap().pop().unwrap_or("ACTIVE").to_string();
                    seen.lock().unwrap().push(s.clone());
                    Ok((42, s))
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &["CREATING", "CREATING", "ACTIVE"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_default_window() {
        let started = Instant::now();
        let waiter = Waiter::new("vpc", &[state::CREATING], &[state::ACTIVE]);
        let err = waiter
            .wait(&Context::new(), || async { Ok(((), state::CREATING.to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { ref last_state, .. } if last_state == "CREATING"));
        assert!(started.elapsed() >= DEFAULT_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_fails() {
        let waiter = Waiter::new("subnet", &[state::CREATING], &[state::ACTIVE]);
        let err = waiter
            .wait(&Context::new(), || async { Ok(((), state::ERROR.to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedState { ref state, .. } if state == "ERROR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_error_is_not_retried() {
        let calls = Arc::new(Mutex::new(0));
        let waiter = Waiter::new("vpc", &[state::CREATING], &[state::ACTIVE]);
        let c = calls.clone();
        let err = waiter
            .wait(&Context::new(), move || {
                let c = c.clone();
                async move {
                    *c.lock().unwrap() += 1;
                    Err::<((), String), _>(api_error(500))
                }
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_poll() {
        let ctx = Context::new();
        let waiter = Waiter::new("vpc", &[state::CREATING], &[state::ACTIVE]);
        let other = ctx.clone();
        let handle = tokio::spawn(async move {
            waiter
                .wait(&other, || async { Ok(((), state::CREATING.to_string())) })
                .await
        });
        tokio::time::sleep(Duration::from_secs(30)).await;
        ctx.cancel();
        assert!(matches!(handle.await.unwrap(), Err(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gone_as_deleted_converges_delete() {
        let waiter = Waiter::new("vpc", &[state::TERMINATING], &[state::DELETED]);
        let calls = Arc::new(Mutex::new(0));
        let c = calls.clone();
        let value: Option<()> = waiter
            .wait(&Context::new(), move || {
                let c = c.clone();
                gone_as_deleted(
                    async move {
                        let mut n = c.lock().unwrap();
                        *n += 1;
                        if *n < 3 {
                            Ok(((), state::TERMINATING.to_string()))
                        } else {
                            Err(api_error(404))
                        }
                    },
                    GonePolicy::NotFound,
                    false,
                )
            })
            .await
            .unwrap();
        assert!(value.is_none());
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gone_as_deleted_respects_policy() {
        let res = gone_as_deleted(
            async { Err::<((), String), _>(api_error(403)) },
            GonePolicy::NotFound,
            false,
        )
        .await;
        assert_eq!(res.unwrap_err().status(), 403);

        let res = gone_as_deleted(
            async { Err::<((), String), _>(api_error(403)) },
            GonePolicy::NotFoundOrForbidden,
            false,
        )
        .await
        .unwrap();
        assert_eq!(res.1, "DELETED");

        let res = gone_as_deleted(
            async { Err::<((), String), _>(api_error(404)) },
            GonePolicy::NotFound,
            true,
        )
        .await;
        assert!(res.is_err());
    }
}

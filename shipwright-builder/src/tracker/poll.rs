//! Generic bounded polling
//!
//! Repeats a fetch until a selector picks a value out of the fetched state or
//! the attempt budget runs out, sleeping a fixed interval between attempts.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Attempt budget of one polling phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollBudget {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Outcome of a polling phase that did not hit a fetch error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The selector matched on attempt `attempts`
    Ready { value: T, attempts: u32 },
    /// Every attempt ran without a match
    Exhausted { attempts: u32 },
}

/// Polls `fetch` until `select` returns a value or the budget is spent
///
/// A fetch error ends polling immediately and is returned as-is; callers
/// that want to tolerate transient errors must absorb them inside `fetch`.
/// No delay follows the final attempt.
pub async fn poll_until<S, T, E, F, Fut, P>(
    label: &str,
    budget: PollBudget,
    mut fetch: F,
    mut select: P,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    P: FnMut(S) -> Option<T>,
{
    for attempt in 1..=budget.max_attempts {
        let state = fetch().await?;

        if let Some(value) = select(state) {
            debug!("{}: ready after {} attempt(s)", label, attempt);
            return Ok(PollOutcome::Ready {
                value,
                attempts: attempt,
            });
        }

        debug!("{}: attempt {}/{} not ready", label, attempt, budget.max_attempts);

        if attempt < budget.max_attempts {
            tokio::time::sleep(budget.interval).await;
        }
    }

    Ok(PollOutcome::Exhausted {
        attempts: budget.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn budget(max_attempts: u32) -> PollBudget {
        PollBudget::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn test_ready_on_matching_attempt() {
        let calls = Cell::new(0u32);
        let outcome = poll_until(
            "test",
            budget(5),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Ok::<_, ()>(n) }
            },
            |n| (n == 3).then_some(n * 10),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Ready { value: 30, attempts: 3 });
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_after_budget() {
        let calls = Cell::new(0u32);
        let outcome = poll_until(
            "test",
            budget(4),
            || {
                calls.set(calls.get() + 1);
                async { Ok::<_, ()>(()) }
            },
            |_| None::<()>,
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 4 });
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_fetch_error_stops_polling() {
        let calls = Cell::new(0u32);
        let result = poll_until(
            "test",
            budget(10),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n == 2 { Err("boom") } else { Ok(n) } }
            },
            |_| None::<u32>,
        )
        .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls.get(), 2);
    }
}

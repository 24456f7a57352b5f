use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use common::{Environment, Result};

/// Restarts a failed worker with exponential backoff in production.
///
/// Outside `prod` the first failure is returned so the process exits with
/// the cause. Each attempt calls `launch` again, which rebuilds connections;
/// the uncommitted trigger is redelivered to the new worker.
pub struct Supervisor {
    environment: Environment,
    backoff: Duration,
    max_backoff: Duration,
}

impl Supervisor {
    pub fn new(environment: Environment, backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            environment,
            backoff,
            max_backoff: max_backoff.max(backoff),
        }
    }

    /// Run `launch` until it returns `Ok`, or until it fails outside `prod`.
    pub async fn run<F, Fut>(&self, mut launch: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut backoff = self.backoff;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            info!(attempt, environment = %self.environment, "Starting worker");

            match launch().await {
                Ok(()) => {
                    info!(attempt, "Worker finished");
                    return Ok(());
                }
                Err(e) if self.environment != Environment::Prod => {
                    error!(attempt, kind = ?e.kind(), error = %e, "Worker failed, not restarting outside prod");
                    return Err(e);
                }
                Err(e) => {
                    // A worker that stayed up longer than the cap was healthy
                    if started.elapsed() >= self.max_backoff {
                        backoff = self.backoff;
                    }
                    warn!(
                        attempt,
                        kind = ?e.kind(),
                        error = %e,
                        backoff = ?backoff,
                        "Worker failed, restarting"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.max_backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use common::Error;

    fn supervisor(environment: Environment) -> Supervisor {
        Supervisor::new(environment, Duration::from_millis(1), Duration::from_millis(4))
    }

    fn flaky(failures: u32, attempts: Arc<AtomicU32>) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        move || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                if n <= failures {
                    Err(Error::Store(format!("attempt {n} failed")))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[tokio::test]
    async fn prod_restarts_until_the_worker_succeeds() {
        let attempts = Arc::new(AtomicU32::new(0));
        supervisor(Environment::Prod)
            .run(flaky(3, attempts.clone()))
            .await
            .unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_prod_returns_the_first_failure() {
        for env in [Environment::Dev, Environment::Test, Environment::Stg] {
            let attempts = Arc::new(AtomicU32::new(0));
            let err = supervisor(env)
                .run(flaky(3, attempts.clone()))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Store(_)));
            assert_eq!(attempts.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn max_backoff_never_below_base() {
        let s = Supervisor::new(Environment::Prod, Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(s.max_backoff, Duration::from_secs(5));
    }
}

/// Periodic run loop: one iteration, then a pause, until shutdown or the
/// iteration limit.
use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ErrorPolicy;
use crate::render::clock::Frame;
use crate::render::error::RenderError;

/// Work performed on every tick.
pub trait Iteration {
    fn run_once(&mut self, out: &mut dyn Write) -> Result<Frame, RenderError>;
}

/// Suspends the loop between iterations.
pub trait Pacer {
    fn pause(&mut self, period: Duration) -> impl Future<Output = ()>;
}

#[derive(Debug, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&mut self, period: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(period)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub failures: u64,
}

pub struct Ticker<P> {
    period: Duration,
    policy: ErrorPolicy,
    max_iterations: Option<u64>,
    pacer: P,
}

impl<P: Pacer> Ticker<P> {
    pub fn new(period: Duration, policy: ErrorPolicy, max_iterations: Option<u64>, pacer: P) -> Self {
        Self {
            period,
            policy,
            max_iterations,
            pacer,
        }
    }

    /// Run until `shutdown` resolves, the iteration limit is reached, or an
    /// iteration fails under `ErrorPolicy::Abort`.
    pub async fn run<I, F>(
        &mut self,
        job: &mut I,
        out: &mut dyn Write,
        shutdown: F,
    ) -> Result<RunSummary>
    where
        I: Iteration,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();

        loop {
            summary.iterations += 1;
            let n = summary.iterations;

            match job.run_once(out) {
                Ok(frame) => debug!("Tick {}: {}", n, frame.timestamp),
                Err(e) => match self.policy {
                    ErrorPolicy::Abort => {
                        return Err(e).with_context(|| format!("Tick {n} failed"));
                    }
                    ErrorPolicy::Continue => {
                        summary.failures += 1;
                        warn!("Tick {} failed: {:#}", n, anyhow::Error::new(e));
                    }
                },
            }

            if self.max_iterations.is_some_and(|max| n >= max) {
                info!("Reached {} iteration(s), stopping", n);
                break;
            }

            tokio::select! {
                _ = self.pacer.pause(self.period) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} iteration(s)", n);
                    break;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::context::TextExtent;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingPacer {
        pauses: Vec<Duration>,
    }

    impl Pacer for RecordingPacer {
        fn pause(&mut self, period: Duration) -> impl Future<Output = ()> {
            self.pauses.push(period);
            std::future::ready(())
        }
    }

    struct StalledPacer;

    impl Pacer for StalledPacer {
        fn pause(&mut self, _period: Duration) -> impl Future<Output = ()> {
            std::future::pending()
        }
    }

    /// Announces "tick N"; fails on the listed iterations.
    struct FakeJob {
        calls: u64,
        fail_on: Vec<u64>,
    }

    impl FakeJob {
        fn new(fail_on: &[u64]) -> Self {
            Self {
                calls: 0,
                fail_on: fail_on.to_vec(),
            }
        }
    }

    impl Iteration for FakeJob {
        fn run_once(&mut self, out: &mut dyn Write) -> Result<Frame, RenderError> {
            self.calls += 1;
            if self.fail_on.contains(&self.calls) {
                return Err(RenderError::Encode {
                    reason: format!("call {}", self.calls),
                });
            }
            let frame = Frame {
                timestamp: format!("tick {}", self.calls),
                path: PathBuf::from("/tmp/custom-clock.png"),
                extent: TextExtent::default(),
            };
            frame.announce(out)?;
            Ok(frame)
        }
    }

    #[tokio::test]
    async fn test_counted_run_pauses_between_iterations() {
        let mut ticker = Ticker::new(
            Duration::from_secs(1),
            ErrorPolicy::Abort,
            Some(3),
            RecordingPacer::default(),
        );
        let mut job = FakeJob::new(&[]);
        let mut out = Vec::new();

        let summary = ticker
            .run(&mut job, &mut out, std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary, RunSummary { iterations: 3, failures: 0 });
        // No pause after the last iteration.
        assert_eq!(ticker.pacer.pauses, vec![Duration::from_secs(1); 2]);

        let stdout = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(
            lines,
            vec![
                "/tmp/custom-clock.png",
                "tick 1",
                "/tmp/custom-clock.png",
                "tick 2",
                "/tmp/custom-clock.png",
                "tick 3",
            ]
        );
    }

    #[tokio::test]
    async fn test_abort_policy_stops_on_first_failure() {
        let mut ticker = Ticker::new(
            Duration::from_secs(1),
            ErrorPolicy::Abort,
            Some(5),
            RecordingPacer::default(),
        );
        let mut job = FakeJob::new(&[2]);
        let mut out = Vec::new();

        let err = ticker
            .run(&mut job, &mut out, std::future::pending())
            .await
            .unwrap_err();

        assert_eq!(job.calls, 2);
        assert!(err.to_string().contains("Tick 2"));
        assert!(matches!(
            err.downcast_ref::<RenderError>(),
            Some(RenderError::Encode { .. })
        ));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_continue_policy_counts_failures() {
        let mut ticker = Ticker::new(
            Duration::from_millis(10),
            ErrorPolicy::Continue,
            Some(4),
            RecordingPacer::default(),
        );
        let mut job = FakeJob::new(&[1, 3]);
        let mut out = Vec::new();

        let summary = ticker
            .run(&mut job, &mut out, std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary, RunSummary { iterations: 4, failures: 2 });
        assert_eq!(ticker.pacer.pauses.len(), 3);
        let stdout = String::from_utf8(out).unwrap();
        assert!(stdout.contains("tick 2"));
        assert!(stdout.contains("tick 4"));
        assert!(!stdout.contains("tick 1"));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pause() {
        let mut ticker = Ticker::new(Duration::from_secs(3600), ErrorPolicy::Abort, None, StalledPacer);
        let mut job = FakeJob::new(&[]);
        let mut out = Vec::new();

        let summary = ticker
            .run(&mut job, &mut out, std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(summary.iterations, 1);
        assert_eq!(job.calls, 1);
    }

    #[tokio::test]
    async fn test_tokio_pacer_sleeps() {
        let mut pacer = TokioPacer;
        let start = tokio::time::Instant::now();
        pacer.pause(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}

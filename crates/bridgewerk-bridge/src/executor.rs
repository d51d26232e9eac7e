// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background executor for bridge work.
//
// Owns a dedicated tokio runtime. The parallel pool is the runtime's blocking
// pool (bounded, idle threads expire). The sequential queue is one task
// draining an unbounded channel, running each job to completion before
// taking the next, so jobs run in submission order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tracing::{info, warn};

use bridgewerk_core::config::ExecutorConfig;
use bridgewerk_core::error::{BridgeError, Result};

/// A unit of work submitted to the executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

static SHARED: OnceCell<Arc<BridgeExecutor>> = OnceCell::new();

pub struct BridgeExecutor {
    runtime: Runtime,
    serial: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    closed: AtomicBool,
}

impl BridgeExecutor {
    pub fn new(config: &ExecutorConfig) -> Result<Self> {
        let parallel_threads = config.parallel_threads();
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(parallel_threads)
            .thread_keep_alive(Duration::from_secs(config.idle_timeout_secs))
            .thread_name("bridgewerk-executor")
            .enable_all()
            .build()?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        runtime.spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = tokio::task::spawn_blocking(job).await {
                    warn!(error = %e, "serial job failed");
                }
            }
        });

        info!(
            parallel_threads,
            idle_timeout_secs = config.idle_timeout_secs,
            "bridge executor started"
        );
        Ok(Self {
            runtime,
            serial: Mutex::new(Some(tx)),
            closed: AtomicBool::new(false),
        })
    }

    /// Process-wide executor built from the default configuration on first use.
    pub fn shared() -> Result<Arc<Self>> {
        SHARED
            .get_or_try_init(|| Self::new(&ExecutorConfig::default()).map(Arc::new))
            .cloned()
    }

    /// Queue `job` on the sequential queue. Failures are logged and dropped.
    pub fn execute_serial(&self, job: impl FnOnce() + Send + 'static) {
        if let Err(e) = self.try_execute_serial(job) {
            warn!(error = %e, "serial submission dropped");
        }
    }

    /// Run `job` on the parallel pool. Failures are logged and dropped.
    pub fn execute_parallel(&self, job: impl FnOnce() + Send + 'static) {
        if let Err(e) = self.try_execute_parallel(job) {
            warn!(error = %e, "parallel submission dropped");
        }
    }

    pub fn try_execute_serial(&self, job: impl FnOnce() + Send + 'static) -> Result<()> {
        let guard = self.serial.lock();
        let sender = guard
            .as_ref()
            .ok_or_else(|| BridgeError::Executor("sequential queue is closed".into()))?;
        sender
            .send(Box::new(job))
            .map_err(|_| BridgeError::Executor("sequential queue has stopped".into()))
    }

    pub fn try_execute_parallel(&self, job: impl FnOnce() + Send + 'static) -> Result<()> {
        if self.is_closed() {
            return Err(BridgeError::Executor("parallel pool is closed".into()));
        }
        drop(self.runtime.spawn_blocking(job));
        Ok(())
    }

    /// Stop accepting work. Queued serial jobs still run.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.serial.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close and wait up to `timeout` for running work to finish.
    pub fn shutdown(self, timeout: Duration) {
        self.close();
        self.runtime.shutdown_timeout(timeout);
        info!("bridge executor shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    fn executor() -> BridgeExecutor {
        let config = ExecutorConfig {
            parallel_threads: Some(4),
            idle_timeout_secs: 1,
        };
        BridgeExecutor::new(&config).expect("executor")
    }

    #[test]
    fn serial_jobs_run_in_submission_order() {
        let executor = executor();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = std_mpsc::channel();

        for i in 0..50 {
            let seen = Arc::clone(&seen);
            executor.execute_serial(move || {
                if i % 7 == 0 {
                    std::thread::sleep(Duration::from_millis(2));
                }
                seen.lock().push(i);
            });
        }
        executor.execute_serial(move || tx.send(()).expect("signal"));

        rx.recv_timeout(Duration::from_secs(5)).expect("queue drained");
        assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());
        executor.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn parallel_jobs_all_run() {
        let executor = executor();
        let (tx, rx) = std_mpsc::channel();
        for i in 0..8 {
            let tx = tx.clone();
            executor.execute_parallel(move || tx.send(i).expect("send"));
        }
        let mut got: Vec<i32> = (0..8)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("job ran"))
            .collect();
        got.sort_unstable();
        assert_eq!(got, (0..8).collect::<Vec<_>>());
        executor.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn closed_executor_rejects_or_swallows_submissions() {
        let executor = executor();
        executor.close();

        assert!(matches!(
            executor.try_execute_serial(|| {}),
            Err(BridgeError::Executor(_))
        ));
        assert!(matches!(
            executor.try_execute_parallel(|| {}),
            Err(BridgeError::Executor(_))
        ));
        executor.execute_serial(|| {});
        executor.execute_parallel(|| {});
        executor.shutdown(Duration::from_secs(1));
    }
}

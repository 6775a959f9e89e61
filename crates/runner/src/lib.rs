//! A concurrent application runner that manages long-running processes with
//! graceful shutdown.
//!
//! The runner orchestrates named app processes and cleanup functions:
//! - Processes run concurrently until one fails or a shutdown signal arrives
//! - SIGTERM/SIGINT cancel every process through a shared token
//! - Closers execute afterward with a bounded timeout, regardless of outcome
//!
//! # Example
//!
//! ```no_run
//! use fleetstat_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = Runner::new()
//!         .with_named_process("ticker", |ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => break,
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("tick");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("cleaning up");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//!
//!     if result.is_err() {
//!         std::process::exit(1);
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Type alias for an app process function.
/// Takes a cancellation token and returns a future that resolves to Result<(), anyhow::Error>
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
        + Send,
>;

/// Type alias for a closer function.
/// Returns a future that resolves to Result<(), anyhow::Error>
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send>;

/// A concurrent application runner with graceful shutdown.
///
/// App processes run concurrently until one fails or a shutdown signal is
/// received; closers execute afterward. `run` returns the first process
/// error so the binary decides the exit code.
pub struct Runner {
    app_processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a new Runner with no processes and a 10 second closer timeout.
    pub fn new() -> Self {
        Self {
            app_processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a named app process to the runner.
    ///
    /// Processes run concurrently. If any process returns an error, all
    /// processes are cancelled and closers are executed. The name appears in
    /// lifecycle logs.
    pub fn with_named_process<N, F, Fut>(mut self, name: N, process: F) -> Self
    where
        N: Into<String>,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.app_processes
            .push((name.into(), Box::new(|token| Box::pin(process(token)))));
        self
    }

    /// Adds a closer to the runner.
    ///
    /// Closers are executed after all app processes have stopped, regardless
    /// of whether they stopped due to error or cancellation. All closers
    /// attempt to execute even if some fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Sets the timeout for executing closers. Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Sets a custom cancellation token for external control over shutdown.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs all app processes and waits for completion or a shutdown signal.
    ///
    /// Returns the first process error, or `Ok(())` when every process
    /// stopped cleanly.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let token = Arc::new(self.cancellation_token);
        let mut join_set = JoinSet::new();
        let closer_timeout = self.closer_timeout;
        let closers = self.closers;

        // Spawn all app processes
        for (name, process) in self.app_processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                tracing::debug!(process = %name, "starting app process");
                let result = process((*process_token).clone()).await;
                (name, result)
            });
        }

        // Spawn signal handler
        let signal_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("received shutdown signal");
                    signal_token.cancel();
                }
                Err(err) => {
                    tracing::error!("error setting up signal handler: {}", err);
                }
            }
        });

        // Also handle SIGTERM on Unix systems
        #[cfg(unix)]
        {
            let sigterm_token = token.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        tracing::info!("received SIGTERM signal");
                        sigterm_token.cancel();
                    }
                    Err(err) => {
                        tracing::error!("error setting up SIGTERM handler: {}", err);
                    }
                }
            });
        }

        // Wait for any process to complete or fail
        let mut first_error = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((name, Ok(()))) => {
                    tracing::debug!(process = %name, "app process completed");
                }
                Ok((name, Err(err))) => {
                    tracing::error!(process = %name, "app process error: {:#}", err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                    token.cancel();
                }
                Err(err) => {
                    tracing::error!("app process panicked: {}", err);
                    token.cancel();
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        // Let remaining processes observe cancellation and finish; abort
        // anything still running after the bounded wait
        let drain = async {
            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok((name, Ok(()))) => {
                        tracing::debug!(process = %name, "app process completed");
                    }
                    Ok((name, Err(err))) => {
                        tracing::error!(process = %name, "app process error during shutdown: {:#}", err);
                    }
                    Err(err) => {
                        tracing::error!("app process panicked during shutdown: {}", err);
                    }
                }
            }
        };
        if tokio::time::timeout(closer_timeout, drain).await.is_err() {
            tracing::error!("processes did not stop within {:?}, aborting", closer_timeout);
            join_set.shutdown().await;
        }

        // Execute closers with timeout
        if !closers.is_empty() {
            tracing::info!("running closers with timeout of {:?}", closer_timeout);

            let closer_result =
                tokio::time::timeout(closer_timeout, Self::run_closers(closers)).await;

            match closer_result {
                Ok(_) => {
                    tracing::info!("all closers completed");
                }
                Err(_) => {
                    tracing::error!("closers timed out after {:?}", closer_timeout);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs all closers concurrently.
    async fn run_closers(closers: Vec<Closer>) {
        let mut closer_set = JoinSet::new();

        for closer in closers {
            closer_set.spawn(async move { closer().await });
        }

        while let Some(result) = closer_set.join_next().await {
            match result {
                Ok(Ok(())) => {
                    tracing::debug!("closer completed");
                }
                Ok(Err(err)) => {
                    tracing::error!("closer error: {:#}", err);
                }
                Err(err) => {
                    tracing::error!("closer panicked: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cancelled_processes_stop_cleanly() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token_clone.cancel();
        });

        let result = Runner::new()
            .with_named_process("waiter", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_cancellation_token(token)
            .run()
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_process_error_cancels_siblings_and_is_returned() {
        let sibling_stopped = Arc::new(AtomicBool::new(false));
        let sibling_flag = sibling_stopped.clone();

        let result = Runner::new()
            .with_named_process("failing", |_ctx| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(anyhow::anyhow!("boom"))
            })
            .with_named_process("sibling", move |ctx| async move {
                ctx.cancelled().await;
                sibling_flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .run()
            .await;

        assert!(result.is_err());
        assert!(sibling_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_closer_execution() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let closer_flag = closer_called.clone();

        let token = CancellationToken::new();
        token.cancel();

        let result = Runner::new()
            .with_named_process("noop", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || {
                let flag = closer_flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_cancellation_token(token)
            .with_closer_timeout(Duration::from_secs(1))
            .run()
            .await;

        assert!(result.is_ok());
        assert!(closer_called.load(Ordering::SeqCst));
    }
}

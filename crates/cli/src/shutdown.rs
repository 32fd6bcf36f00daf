use engine_config::report::summary::RunReport;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Listens for SIGINT and SIGTERM and cancels the run. The executor checks
/// the token between work items and between records, so an in-flight
/// transaction always finishes.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let cancel_token = self.cancel_token.clone();
        let shutdown_flag = self.shutdown_requested.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                signal::ctrl_c()
                    .await
                    .expect("Failed to install SIGINT handler");
            };

            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received SIGINT (Ctrl+C), finishing the current record");
                }
                _ = terminate => {
                    info!("Received SIGTERM, finishing the current record");
                }
            }

            shutdown_flag.store(true, Ordering::SeqCst);
            cancel_token.cancel();

            warn!("Remaining records and work items will be reported as cancelled");
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Exit codes for the CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// A command failed, or a run finished with item errors or failed records.
    GeneralError = 1,
    ShutdownRequested = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    /// 130 only when work was actually left undone by a cancellation.
    pub fn for_report(report: &RunReport) -> Self {
        if report.cancelled {
            ExitCode::ShutdownRequested
        } else if report.has_failures() {
            ExitCode::GeneralError
        } else {
            ExitCode::Success
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

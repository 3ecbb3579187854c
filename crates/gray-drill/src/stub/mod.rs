//! In-process stub of the admin ops API
//!
//! [`StubHost`] owns a loopback listener and a background serve task. It is
//! released on every exit path: [`StubHost::shutdown`] drains gracefully,
//! and dropping the host signals shutdown and aborts the task.

mod handler;

pub use handler::{create_router, Envelope, OverviewQuery};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DrillError, Result};
use crate::plan::StagePlan;

/// Upper bound for a graceful drain before the serve task is aborted
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Running stub ops API
pub struct StubHost {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl StubHost {
    /// Bind an ephemeral loopback port and start serving `plan`
    pub async fn start(plan: Arc<StagePlan>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(DrillError::Bind)?;
        let addr = listener.local_addr().map_err(DrillError::Bind)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = create_router(plan);
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(%addr, "stub ops host listening");

        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop serving and wait for the listener to close
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        let Some(mut task) = self.task.take() else {
            return;
        };

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => debug!(addr = %self.addr, "stub ops host stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "stub ops host exited with error"),
            Ok(Err(e)) => warn!(error = %e, "stub ops host task failed"),
            Err(_) => {
                warn!(addr = %self.addr, "stub ops host did not drain in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }
    }
}

impl Drop for StubHost {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            debug!(addr = %self.addr, "stub ops host dropped, aborting serve task");
            task.abort();
        }
    }
}

//! Concurrent lock-cycle dispatch
//!
//! Runs the configured number of worker tasks, each performing one
//! acquire/hold/release cycle against the shared channel. The release is
//! scoped, not best-effort: every worker arms a [`ReleaseGuard`] before
//! acquiring, and the guard pushes the UNLOCK frame itself if the worker
//! exits any way other than an explicit release.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use lockmgr_api::codec;
use lockmgr_api::model::LockRequest;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::LockClient;
use crate::error::ClientError;
use crate::transport::Outbound;

/// Which step of the cycle a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    Acquire,
    Hold,
    Release,
}

/// One isolated worker failure. Never aborts sibling workers.
#[derive(Debug)]
pub struct WorkerFailure {
    pub worker: u32,
    pub phase: CyclePhase,
    pub error: ClientError,
}

/// Aggregate outcome of one cycle across all workers.
#[derive(Debug)]
pub struct CycleReport {
    /// How many workers the cycle dispatched.
    pub workers: usize,
    pub failures: Vec<WorkerFailure>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Dispatch `worker_count` concurrent lock cycles and wait for all of
/// them. Failures are collected, never propagated across workers.
pub(crate) async fn run_cycle(
    client: Arc<LockClient>,
    lock_name: String,
    hold_duration: Duration,
) -> CycleReport {
    let workers = client.config().worker_count;
    info!(workers, lock = %lock_name, "Dispatching lock cycle workers");

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers as u32 {
        let client = Arc::clone(&client);
        let lock_name = lock_name.clone();
        handles.push(tokio::spawn(lock_cycle(
            client,
            lock_name,
            hold_duration,
            worker,
        )));
    }

    let mut failures = Vec::new();
    for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(worker_failures) => failures.extend(worker_failures),
            Err(e) => {
                error!(worker, error = %e, "Worker task died during its cycle");
                failures.push(WorkerFailure {
                    worker: worker as u32,
                    phase: CyclePhase::Hold,
                    error: ClientError::Worker(e.to_string()),
                });
            }
        }
    }

    debug!(workers, failures = failures.len(), "Lock cycle complete");
    CycleReport { workers, failures }
}

/// One worker: arm the release, try to acquire, hold, release.
async fn lock_cycle(
    client: Arc<LockClient>,
    lock_name: String,
    hold_duration: Duration,
    worker: u32,
) -> Vec<WorkerFailure> {
    let mut failures = Vec::new();

    let guard = ReleaseGuard::arm(Arc::clone(&client), &lock_name, worker).await;

    match client.send_trylock_request(&lock_name, worker).await {
        Ok(()) => debug!(worker, "Acquisition request issued"),
        Err(error) => {
            // the coordinator may have granted the hold anyway; the
            // release below still runs
            warn!(worker, %error, "Acquisition request failed to reach the transport");
            failures.push(WorkerFailure {
                worker,
                phase: CyclePhase::Acquire,
                error,
            });
        }
    }

    tokio::time::sleep(hold_duration).await;

    if let Err(error) = guard.release().await {
        warn!(worker, %error, "Release request failed to reach the transport");
        failures.push(WorkerFailure {
            worker,
            phase: CyclePhase::Release,
            error,
        });
    }

    failures
}

/// Scoped release of one acquisition.
///
/// Armed before the acquisition request is issued. The normal path is an
/// explicit [`release`](Self::release); if the worker is cancelled or
/// panics during the hold, the drop path pushes the UNLOCK frame straight
/// onto the outbound queue captured at arm time.
pub(crate) struct ReleaseGuard {
    client: Arc<LockClient>,
    lock_name: String,
    worker: u32,
    outbound: Option<mpsc::Sender<Outbound>>,
    armed: bool,
}

impl ReleaseGuard {
    pub(crate) async fn arm(client: Arc<LockClient>, lock_name: &str, worker: u32) -> Self {
        let outbound = client.outbound_handle().await;
        Self {
            client,
            lock_name: lock_name.to_string(),
            worker,
            outbound,
            armed: true,
        }
    }

    /// Issue the matching unlock through the regular send path.
    pub(crate) async fn release(mut self) -> crate::error::Result<()> {
        self.armed = false;
        self.client
            .send_unlock_request(&self.lock_name, self.worker)
            .await
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let request = LockRequest::unlock(&self.lock_name, self.client.requestor_id(self.worker));
        let Some(outbound) = self.outbound.as_ref() else {
            warn!(requestor = %request.requestor_id, "Release skipped, never connected");
            return;
        };

        match codec::encode(&request) {
            Ok(frame) => {
                if outbound
                    .try_send(Outbound {
                        frame,
                        completed: None,
                    })
                    .is_err()
                {
                    warn!(
                        requestor = %request.requestor_id,
                        "Release request lost, transport channel already closed"
                    );
                }
            }
            Err(e) => error!(error = %e, "Failed to encode release request"),
        }
    }
}

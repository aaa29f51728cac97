//! Lock client facade
//!
//! Provides `LockClient`, the public start/stop surface over one shared
//! transport channel, the three request-issuing operations, and the
//! completion correlator that reports each send's outcome asynchronously.

use std::sync::Arc;
use std::time::Duration;

use lockmgr_api::model::LockRequest;
use parking_lot::Mutex;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatcher::{self, CycleReport};
use crate::error::{ClientError, Result};
use crate::transport::{
    Connection, Outbound, ResponseHandler, ResponseHandlerSlot, SendCompletion, SendListener,
    SendListenerSlot,
};

/// Configuration for the lock client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Coordinator address, host:port.
    pub server_addr: String,
    /// Number of concurrent worker tasks a cycle dispatches.
    pub worker_count: usize,
    /// How long each worker holds between acquisition and release.
    pub hold_duration: Duration,
    /// Resource name the default cycle contends on.
    pub lock_name: String,
    /// Client identity; generated when unset. Setting it makes requestor
    /// ids deterministic, which tests rely on.
    pub client_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", lockmgr_api::DEFAULT_COORDINATOR_PORT),
            worker_count: 10,
            hold_duration: Duration::from_millis(500),
            lock_name: "lock".to_string(),
            client_id: None,
        }
    }
}

impl ClientConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_hold_duration(mut self, hold_duration: Duration) -> Self {
        self.hold_duration = hold_duration;
        self
    }

    pub fn with_lock_name(mut self, lock_name: impl Into<String>) -> Self {
        self.lock_name = lock_name.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

/// Lifecycle state of the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    New,
    Running,
    Stoppable,
    Stopped,
}

/// Client connector for the lock coordinator.
///
/// One client owns at most one transport channel, shared by every
/// concurrent caller. Sends are fire-and-forget: each request's outcome
/// is reported asynchronously through logs and the optional
/// [`SendListener`].
pub struct LockClient {
    config: ClientConfig,
    id: String,
    connection: Arc<RwLock<Option<Connection>>>,
    state: Mutex<ClientState>,
    send_listener: SendListenerSlot,
    response_handler: ResponseHandlerSlot,
}

impl LockClient {
    pub fn new(config: ClientConfig) -> Self {
        let id = config
            .client_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            config,
            id,
            connection: Arc::new(RwLock::new(None)),
            state: Mutex::new(ClientState::New),
            send_listener: SendListenerSlot::default(),
            response_handler: ResponseHandlerSlot::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The client-wide identity all requestor ids derive from.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ClientState {
        *self.state.lock()
    }

    /// Build the requestor identity for one logical caller: the client
    /// identity plus an explicit per-caller discriminator.
    pub fn requestor_id(&self, discriminator: u32) -> String {
        format!("{}-{}", self.id, discriminator)
    }

    /// Register the observer invoked once per send completion.
    pub fn set_send_listener<L: SendListener>(&self, listener: L) {
        *self.send_listener.write() = Some(Arc::new(listener));
    }

    /// Register the handler invoked for each decoded coordinator response.
    pub fn set_response_handler<H: ResponseHandler>(&self, handler: H) {
        *self.response_handler.write() = Some(Arc::new(handler));
    }

    /// Connect to the coordinator. Must be called (directly or through
    /// [`start`](Self::start)) before requests can be issued.
    pub async fn connect(&self) -> Result<()> {
        let conn = Connection::connect(&self.config.server_addr, self.response_handler.clone())
            .await?;

        let previous = self.connection.write().await.replace(conn);
        if let Some(previous) = previous {
            // one channel per client: a re-connect supersedes the old one
            previous.close().await;
        }

        *self.state.lock() = ClientState::Running;
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Start the client: connect, run one full lock cycle with the
    /// configured worker count, and wait for every worker to finish.
    ///
    /// Connection failure is terminal for the run; no workers are
    /// dispatched. Per-worker failures never abort siblings and are
    /// returned aggregated in the [`CycleReport`].
    pub async fn start(self: &Arc<Self>) -> Result<CycleReport> {
        self.connect().await?;

        info!("Client starts sending requests to the coordinator");
        let report = self
            .run_cycle(&self.config.lock_name, self.config.hold_duration)
            .await;

        {
            // a forced stop() mid-cycle already moved the state on
            let mut state = self.state.lock();
            if *state == ClientState::Running {
                *state = ClientState::Stoppable;
            }
        }
        if !report.is_clean() {
            warn!(
                failures = report.failures.len(),
                "Lock cycle finished with failures"
            );
        }
        Ok(report)
    }

    /// Run one lock/hold/unlock cycle across the configured number of
    /// concurrent workers, returning once all of them completed.
    pub async fn run_cycle(self: &Arc<Self>, lock_name: &str, hold_duration: Duration) -> CycleReport {
        dispatcher::run_cycle(Arc::clone(self), lock_name.to_string(), hold_duration).await
    }

    /// Stop the client: close the transport channel, then release the
    /// I/O execution context. Idempotent; safe to call before `start`,
    /// after a failed `start`, or while workers are still in flight (their
    /// in-flight sends then fail with a transport error).
    pub async fn stop(&self) {
        let connection = self.connection.write().await.take();
        match connection {
            Some(connection) => {
                connection.close().await;
                info!("Client stopped");
            }
            None => debug!("Stop requested with no open channel"),
        }
        *self.state.lock() = ClientState::Stopped;
    }

    /// Send a blocking lock request for `lock_name`.
    pub async fn send_lock_request(&self, lock_name: &str, discriminator: u32) -> Result<()> {
        self.send_request(LockRequest::lock(lock_name, self.requestor_id(discriminator)))
            .await
    }

    /// Send a try-lock request for `lock_name`.
    pub async fn send_trylock_request(&self, lock_name: &str, discriminator: u32) -> Result<()> {
        self.send_request(LockRequest::trylock(
            lock_name,
            self.requestor_id(discriminator),
        ))
        .await
    }

    /// Send an unlock request for `lock_name`.
    pub async fn send_unlock_request(&self, lock_name: &str, discriminator: u32) -> Result<()> {
        self.send_request(LockRequest::unlock(
            lock_name,
            self.requestor_id(discriminator),
        ))
        .await
    }

    /// Common sending path: enqueue on the shared channel and hand the
    /// completion to the correlator. Fire-and-forget for the caller.
    async fn send_request(&self, request: LockRequest) -> Result<()> {
        let completion = {
            let guard = self.connection.read().await;
            let conn = guard.as_ref().ok_or(ClientError::NotConnected)?;
            conn.send(&request).await?
        };

        self.spawn_correlator(request, completion);
        Ok(())
    }

    /// Await one send's completion off to the side, log the outcome, and
    /// notify the registered listener. Fires exactly once per request.
    fn spawn_correlator(&self, request: LockRequest, completion: SendCompletion) {
        let listener = self.send_listener.read().clone();

        tokio::spawn(async move {
            let result = match completion.await {
                Ok(result) => result,
                // writer went away before flushing the frame
                Err(_) => Err(ClientError::ChannelClosed),
            };

            match &result {
                Ok(()) => debug!(
                    kind = request.kind.as_str(),
                    requestor = %request.requestor_id,
                    "Client sends request success"
                ),
                Err(error) => warn!(
                    kind = request.kind.as_str(),
                    requestor = %request.requestor_id,
                    %error,
                    "Client sends request failed"
                ),
            }

            if let Some(listener) = listener {
                listener.on_send_complete(&request, &result);
            }
        });
    }

    /// Handle to the live connection's outbound queue, if any. Release
    /// guards capture this so a release can be issued even while the
    /// connection slot is contended or the worker is being torn down.
    pub(crate) async fn outbound_handle(&self) -> Option<mpsc::Sender<Outbound>> {
        self.connection.read().await.as_ref().map(Connection::outbound)
    }
}

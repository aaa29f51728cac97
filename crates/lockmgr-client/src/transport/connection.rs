//! Transport channel lifecycle management
//!
//! Owns the single TCP connection to the lock coordinator together with
//! its I/O execution context: a writer task that serializes every
//! outbound frame onto the socket, and a reader task that drains decoded
//! coordinator responses. Teardown closes the channel first and releases
//! the two tasks after, never the other way around.

use bytes::BytesMut;
use lockmgr_api::codec::{self, CodecError};
use lockmgr_api::model::{LockRequest, LockResponse};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Outbound, ResponseHandlerSlot, SendCompletion};
use crate::error::{ClientError, Result};

/// Outbound queue depth shared by every concurrent sender.
const OUTBOUND_QUEUE: usize = 256;

/// An established transport channel to the lock coordinator.
///
/// Safe for concurrent sends from any number of workers; the writer task
/// is the only thing that touches the socket, so frames from different
/// workers never interleave on the wire.
pub struct Connection {
    addr: String,
    outbound_tx: mpsc::Sender<Outbound>,
    shutdown_tx: oneshot::Sender<()>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Establish the channel. Fails with [`ClientError::Connect`] when the
    /// coordinator is unreachable; no retry is attempted.
    pub(crate) async fn connect(addr: &str, response_handler: ResponseHandlerSlot) -> Result<Self> {
        info!("Connecting to lock coordinator at {}", addr);

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(OUTBOUND_QUEUE);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let writer = tokio::spawn(write_loop(write_half, outbound_rx, shutdown_rx));
        let reader = tokio::spawn(read_loop(read_half, response_handler));

        Ok(Self {
            addr: addr.to_string(),
            outbound_tx,
            shutdown_tx,
            writer,
            reader,
        })
    }

    /// Enqueue one request for the writer task. Returns the completion
    /// signal for the eventual flush; enqueueing itself never blocks on
    /// the socket.
    pub(crate) async fn send(&self, request: &LockRequest) -> Result<SendCompletion> {
        let frame = codec::encode(request)?;
        let (done_tx, done_rx) = oneshot::channel();

        self.outbound_tx
            .send(Outbound {
                frame,
                completed: Some(done_tx),
            })
            .await
            .map_err(|_| ClientError::ChannelClosed)?;

        Ok(done_rx)
    }

    /// Clone of the outbound queue handle, for senders that must enqueue
    /// without going back through the connection slot (release guards).
    pub(crate) fn outbound(&self) -> mpsc::Sender<Outbound> {
        self.outbound_tx.clone()
    }

    /// Close the channel, then release the I/O execution context.
    ///
    /// Sends issued from this point fail; frames already queued are still
    /// flushed before the socket's write half is shut down. Both task
    /// handles are awaited, so all channel resources are gone when this
    /// returns.
    pub(crate) async fn close(self) {
        let Self {
            addr,
            outbound_tx,
            shutdown_tx,
            writer,
            reader,
        } = self;

        drop(outbound_tx);
        let _ = shutdown_tx.send(());
        let _ = writer.await;

        reader.abort();
        let _ = reader.await;

        info!("Transport channel to {} closed", addr);
    }
}

async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut healthy = true;

    loop {
        let next = tokio::select! {
            _ = &mut shutdown_rx => break,
            next = outbound_rx.recv() => next,
        };
        let Some(out) = next else { break };

        healthy = write_one(&mut write_half, out).await;
        if !healthy {
            break;
        }
    }

    // Teardown has begun: refuse new sends, settle what is already queued.
    outbound_rx.close();
    while let Some(out) = outbound_rx.recv().await {
        if healthy {
            healthy = write_one(&mut write_half, out).await;
        } else {
            reject(out);
        }
    }

    if healthy {
        let _ = write_half.shutdown().await;
    }
    debug!("Transport write loop ended");
}

/// Write one frame and fire its completion. Returns false once the socket
/// is unusable.
async fn write_one(write_half: &mut OwnedWriteHalf, out: Outbound) -> bool {
    match write_half.write_all(&out.frame).await {
        Ok(()) => {
            match out.completed {
                Some(done) => {
                    let _ = done.send(Ok(()));
                }
                // Release-guard frames carry no completion; the flush is
                // only visible here.
                None => debug!("Queued release frame flushed"),
            }
            true
        }
        Err(e) => {
            warn!(error = %e, "Write to the lock coordinator failed");
            if let Some(done) = out.completed {
                let _ = done.send(Err(ClientError::SendFailed(e)));
            }
            false
        }
    }
}

fn reject(out: Outbound) {
    if let Some(done) = out.completed {
        let _ = done.send(Err(ClientError::ChannelClosed));
    }
}

async fn read_loop(mut read_half: OwnedReadHalf, handler: ResponseHandlerSlot) {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        match codec::decode::<LockResponse>(&mut buf) {
            Ok(Some(response)) => {
                debug!(
                    requestor = %response.requestor_id,
                    status = ?response.status,
                    "Coordinator response received"
                );
                let handler = handler.read().clone();
                if let Some(handler) = handler {
                    handler.on_response(&response);
                }
                continue;
            }
            Ok(None) => {}
            Err(e @ CodecError::Malformed(_)) => {
                warn!(error = %e, "Skipping malformed coordinator response");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Response stream unreadable");
                break;
            }
        }

        match read_half.read_buf(&mut buf).await {
            Ok(0) => {
                debug!("Lock coordinator closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Read from the lock coordinator failed");
                break;
            }
        }
    }
}

//! Transport channel surface
//!
//! Defines the outbound queue item with its completion signal and the
//! listener seams through which send completions and decoded coordinator
//! responses are reported.

pub mod connection;

use std::sync::Arc;

use bytes::Bytes;
use lockmgr_api::model::{LockRequest, LockResponse};
use parking_lot::RwLock;
use tokio::sync::oneshot;

use crate::error::Result;

pub use connection::Connection;

/// One frame queued for the writer task. The completion signal, when
/// present, fires exactly once: `Ok(())` after the frame was flushed to
/// the transport, `Err` when it never got there.
pub(crate) struct Outbound {
    pub(crate) frame: Bytes,
    pub(crate) completed: Option<oneshot::Sender<Result<()>>>,
}

/// Receiver half of a send completion signal.
pub(crate) type SendCompletion = oneshot::Receiver<Result<()>>;

pub(crate) type SendListenerSlot = Arc<RwLock<Option<Arc<dyn SendListener>>>>;
pub(crate) type ResponseHandlerSlot = Arc<RwLock<Option<Arc<dyn ResponseHandler>>>>;

/// Observer for send completions.
///
/// Invoked once per issued request, asynchronously relative to the call
/// that sent it. The result reflects whether the request reached the
/// transport, never the coordinator's grant/deny decision.
pub trait SendListener: Send + Sync + 'static {
    fn on_send_complete(&self, request: &LockRequest, result: &Result<()>);
}

/// A send listener that invokes a closure.
pub struct FnSendListener<F>
where
    F: Fn(&LockRequest, &Result<()>) + Send + Sync + 'static,
{
    f: F,
}

impl<F> FnSendListener<F>
where
    F: Fn(&LockRequest, &Result<()>) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> SendListener for FnSendListener<F>
where
    F: Fn(&LockRequest, &Result<()>) + Send + Sync + 'static,
{
    fn on_send_complete(&self, request: &LockRequest, result: &Result<()>) {
        (self.f)(request, result);
    }
}

/// Handler for decoded coordinator responses.
///
/// Responses are not correlated back to individual requests; handlers see
/// them in arrival order as the reader task decodes them.
pub trait ResponseHandler: Send + Sync + 'static {
    fn on_response(&self, response: &LockResponse);
}

/// A response handler that invokes a closure.
pub struct FnResponseHandler<F>
where
    F: Fn(&LockResponse) + Send + Sync + 'static,
{
    f: F,
}

impl<F> FnResponseHandler<F>
where
    F: Fn(&LockResponse) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ResponseHandler for FnResponseHandler<F>
where
    F: Fn(&LockResponse) + Send + Sync + 'static,
{
    fn on_response(&self, response: &LockResponse) {
        (self.f)(response);
    }
}

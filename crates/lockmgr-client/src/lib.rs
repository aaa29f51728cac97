//! Lockmgr Client - connector SDK for the lock coordinator
//!
//! This crate provides:
//! - `LockClient`, the start/stop lifecycle surface over one shared transport channel
//! - Concurrent lock/hold/unlock worker cycles with scoped, guaranteed release
//! - Fire-and-forget sends with asynchronous per-request completion reporting
//! - Decoded coordinator responses surfaced through a registrable handler

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod transport;

pub use client::{ClientConfig, ClientState, LockClient};
pub use dispatcher::{CyclePhase, CycleReport, WorkerFailure};
pub use error::{ClientError, Result};
pub use transport::{FnResponseHandler, FnSendListener, ResponseHandler, SendListener};

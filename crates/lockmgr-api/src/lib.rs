//! Lockmgr API - wire model for the lock coordinator protocol
//!
//! This crate provides:
//! - Request/response models exchanged with the lock coordinator
//! - The framing codec (length-prefixed self-describing records)

pub mod codec;
pub mod model;

pub use codec::{CodecError, MAX_FRAME_LEN};
pub use model::{DEFAULT_COORDINATOR_PORT, LockRequest, LockResponse, RequestKind, ResponseStatus};

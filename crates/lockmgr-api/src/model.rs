//! Request and response models for lock coordinator communication

use serde::{Deserialize, Serialize};

/// Default port the lock coordinator listens on.
pub const DEFAULT_COORDINATOR_PORT: u16 = 8088;

/// The kind of lock operation a request carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestKind {
    /// Blocking acquisition: the coordinator queues the requestor until granted.
    Lock,
    /// Non-blocking acquisition: granted or denied immediately.
    Trylock,
    /// Release a previously requested lock.
    Unlock,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Lock => "LOCK",
            RequestKind::Trylock => "TRYLOCK",
            RequestKind::Unlock => "UNLOCK",
        }
    }
}

/// One lock operation, immutable once constructed.
///
/// `requestor_id` must be unique per logical caller across concurrently
/// outstanding requests; the coordinator matches acquisitions and releases
/// by it. The client layer does not deduplicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    /// Name of the contended resource.
    pub target_name: String,
    /// Identity of the logical caller (client id + per-worker discriminator).
    pub requestor_id: String,
    pub kind: RequestKind,
}

impl LockRequest {
    pub fn new(
        target_name: impl Into<String>,
        requestor_id: impl Into<String>,
        kind: RequestKind,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            requestor_id: requestor_id.into(),
            kind,
        }
    }

    pub fn lock(target_name: impl Into<String>, requestor_id: impl Into<String>) -> Self {
        Self::new(target_name, requestor_id, RequestKind::Lock)
    }

    pub fn trylock(target_name: impl Into<String>, requestor_id: impl Into<String>) -> Self {
        Self::new(target_name, requestor_id, RequestKind::Trylock)
    }

    pub fn unlock(target_name: impl Into<String>, requestor_id: impl Into<String>) -> Self {
        Self::new(target_name, requestor_id, RequestKind::Unlock)
    }
}

/// Outcome reported by the coordinator for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Granted,
    Denied,
    Released,
}

/// A coordinator response, symmetric to [`LockRequest`] on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResponse {
    pub target_name: String,
    pub requestor_id: String,
    pub status: ResponseStatus,
}

impl LockResponse {
    pub fn new(
        target_name: impl Into<String>,
        requestor_id: impl Into<String>,
        status: ResponseStatus,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            requestor_id: requestor_id.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = LockRequest::trylock("lock", "client-3");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "targetName": "lock",
                "requestorId": "client-3",
                "kind": "TRYLOCK",
            })
        );
    }

    #[test]
    fn test_request_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&RequestKind::Lock).unwrap(),
            "\"LOCK\""
        );
        assert_eq!(
            serde_json::to_string(&RequestKind::Unlock).unwrap(),
            "\"UNLOCK\""
        );
        let kind: RequestKind = serde_json::from_str("\"TRYLOCK\"").unwrap();
        assert_eq!(kind, RequestKind::Trylock);
    }

    #[test]
    fn test_response_decodes_same_fields() {
        let raw = r#"{"targetName":"lock","requestorId":"client-0","status":"GRANTED"}"#;
        let response: LockResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.target_name, "lock");
        assert_eq!(response.requestor_id, "client-0");
        assert_eq!(response.status, ResponseStatus::Granted);
    }

    #[test]
    fn test_unlock_ctor_pairs_with_trylock() {
        let acquire = LockRequest::trylock("orders", "c-1");
        let release = LockRequest::unlock("orders", "c-1");
        assert_eq!(acquire.target_name, release.target_name);
        assert_eq!(acquire.requestor_id, release.requestor_id);
        assert_eq!(release.kind, RequestKind::Unlock);
    }
}

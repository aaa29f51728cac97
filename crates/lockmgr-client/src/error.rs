//! Client error types for the lockmgr SDK

use lockmgr_api::codec::CodecError;

/// Error type for lock client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection not ready")]
    NotConnected,

    #[error("transport channel closed")]
    ChannelClosed,

    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    /// True when the request never reached the transport, as opposed to
    /// failing inside it.
    pub fn is_send_failure(&self) -> bool {
        matches!(
            self,
            ClientError::NotConnected | ClientError::ChannelClosed | ClientError::SendFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::NotConnected;
        assert_eq!(err.to_string(), "connection not ready");

        let err = ClientError::ChannelClosed;
        assert_eq!(err.to_string(), "transport channel closed");

        let err = ClientError::Worker("panicked".to_string());
        assert_eq!(err.to_string(), "worker task failed: panicked");

        let err = ClientError::Connect {
            addr: "127.0.0.1:8088".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.to_string().starts_with("failed to connect to 127.0.0.1:8088"));
    }

    #[test]
    fn test_send_failure_classification() {
        assert!(ClientError::NotConnected.is_send_failure());
        assert!(ClientError::ChannelClosed.is_send_failure());
        assert!(
            ClientError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"))
                .is_send_failure()
        );
        assert!(!ClientError::Worker("x".to_string()).is_send_failure());
    }

    #[test]
    fn test_from_codec_error() {
        let codec_err = CodecError::Oversized(1_000_000);
        let err: ClientError = codec_err.into();
        assert!(matches!(err, ClientError::Codec(_)));
    }
}

use thiserror::Error;

/// Errors surfaced by the record codec, the handshake state machine and the
/// connection facade.
///
/// There is no global error queue. Every failure travels through a `Result`
/// to the call site that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A complete record declared more interior bytes than it carried.
    /// Recoverable at the codec level by supplying more input.
    #[error("Truncated input")]
    Truncated,

    /// Structurally invalid wire data. Fatal for the connection.
    #[error("Malformed data: {0}")]
    Malformed(&'static str),

    /// The peer selected a cipher suite outside the configured set.
    #[error("Unsupported cipher suite 0x{0:04x}")]
    UnsupportedCipher(u16),

    /// The presented certificate does not cover the requested server name.
    #[error("Server name does not match certificate")]
    HostnameMismatch,

    /// The handshake reached the terminal Failed state.
    #[error("Handshake failed during {stage}: {reason}")]
    HandshakeFailed {
        stage: &'static str,
        reason: FailReason,
    },

    /// Application data I/O attempted before the handshake completed.
    #[error("Connection is not established")]
    NotEstablished,

    /// The transport reached EOF or the peer sent close_notify.
    #[error("Transport closed")]
    TransportClosed,

    /// The transport returned an I/O error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The peer sent a fatal alert.
    #[error("Received fatal alert {0}")]
    PeerAlert(u8),

    /// An operation in the crypto provider failed.
    #[error("Crypto error: {0}")]
    CryptoError(String),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Reason a handshake ended in the terminal `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// ServerHello selected a cipher suite we did not offer.
    UnsupportedCipher(u16),
    /// Leaf certificate does not cover the requested server name.
    HostnameMismatch,
    /// Certificate could not be parsed or failed chain inspection.
    BadCertificate,
    /// ServerKeyExchange signature did not verify.
    BadSignature,
    /// Server Finished verify_data did not match the transcript.
    BadFinished,
    /// The peer aborted with a fatal alert.
    PeerAlert(u8),
    /// A message arrived out of order or with impossible contents.
    ProtocolViolation(&'static str),
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailReason::UnsupportedCipher(suite) => {
                write!(f, "unsupported cipher suite 0x{:04x}", suite)
            }
            FailReason::HostnameMismatch => write!(f, "hostname mismatch"),
            FailReason::BadCertificate => write!(f, "bad certificate"),
            FailReason::BadSignature => write!(f, "bad signature"),
            FailReason::BadFinished => write!(f, "bad finished verify_data"),
            FailReason::PeerAlert(code) => write!(f, "peer alert {}", code),
            FailReason::ProtocolViolation(what) => write!(f, "protocol violation: {}", what),
        }
    }
}

use thiserror::Error;

/// Rejection of a malformed raw event at the producer boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEvent {
    /// Tag value outside the known set
    #[error("unknown event tag {0}")]
    UnknownTag(u8),
    /// `Finished` payload that does not parse as an exit code
    #[error("exit code is not an integer: {0:?}")]
    NonIntegerExitCode(String),
}

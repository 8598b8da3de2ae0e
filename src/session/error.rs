//! Error kinds surfaced at the session's entry points.
//!
//! Each enum maps one-to-one onto the numeric codes a C caller would get
//! back from `ikcp_send`/`ikcp_recv`/`ikcp_input`; `as_code` is provided for
//! callers porting code that still switches on those integers, but `Result`
//! is the primary interface.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("payload must not be empty")]
    InvalidArgument,
    #[error("message would need more than 255 fragments at the current MTU")]
    FragmentOverflow,
}

impl SendError {
    pub fn as_code(&self) -> i32 {
        match self {
            SendError::InvalidArgument => -1,
            SendError::FragmentOverflow => -2,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecvError {
    #[error("no complete message is ready")]
    EmptyQueue,
    #[error("peek failed despite a non-empty receive queue")]
    InternalInconsistency,
    #[error("caller's buffer ({available} bytes) is smaller than the ready message ({needed} bytes)")]
    BufferTooSmall { needed: usize, available: usize },
}

impl RecvError {
    pub fn as_code(&self) -> i32 {
        match self {
            RecvError::EmptyQueue => -1,
            RecvError::InternalInconsistency => -2,
            RecvError::BufferTooSmall { .. } => -3,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("segment conv {found} does not match session conv {expected}")]
    ConvMismatch { expected: u32, found: u32 },
    #[error("datagram is shorter than a segment header ({len} < 24)")]
    ShortHeader { len: usize },
    #[error("segment declares {declared} payload bytes but only {available} remain")]
    DeclaredLengthExceedsBuffer { declared: u32, available: usize },
    #[error("unknown command byte {0}")]
    UnknownCommand(u8),
}

impl InputError {
    pub fn as_code(&self) -> i32 {
        match self {
            InputError::ShortHeader { .. } => -1,
            InputError::DeclaredLengthExceedsBuffer { .. } => -2,
            InputError::UnknownCommand(_) => -3,
            InputError::ConvMismatch { .. } => -1,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mtu must be at least 50 bytes, got {0}")]
    MtuTooSmall(u32),
}

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::{Handle, State};

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("{operation} is not valid in state {state}")]
    InvalidState {
        operation: &'static str,
        state:     State,
    },

    #[error("unknown or consumed handle {0}")]
    UnknownHandle(Handle),

    #[error("handle {0} is in use by another operation")]
    Busy(Handle),

    #[error("hashing cancelled after {processed} of {total} bytes")]
    Cancelled { processed: u64, total: u64 },

    #[error("failed to open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("input ended early: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HashError {
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidState { .. } | Self::UnknownHandle(_) | Self::Busy(_) => {
                ResultCode::InvalidContext
            }
            Self::Cancelled { .. } => ResultCode::Cancelled,
            Self::Open { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ResultCode::NotFound
            }
            Self::Open { .. } | Self::Truncated { .. } | Self::Io(_) => ResultCode::IoError,
        }
    }
}

pub type Result<T> = std::result::Result<T, HashError>;

/// Status codes reported across the handle boundary.
///
/// Numeric values are stable and match the C header.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success        = 0,
    InvalidContext = -1,
    NotFound       = -2,
    Cancelled      = -4,
    IoError        = -5,
}

impl ResultCode {
    pub fn as_raw(self) -> i32 { self as i32 }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Success),
            -1 => Some(Self::InvalidContext),
            -2 => Some(Self::NotFound),
            -4 => Some(Self::Cancelled),
            -5 => Some(Self::IoError),
            _ => None,
        }
    }

    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => e.code(),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::InvalidContext => "invalid context",
            Self::NotFound => "not found",
            Self::Cancelled => "cancelled",
            Self::IoError => "i/o error",
        };
        f.write_str(name)
    }
}

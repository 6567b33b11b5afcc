//! Error types for ds205a-core

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Frame codec errors
///
/// Variants fall into two groups the session layer treats differently:
/// framing failures (`FrameTooShort`, `InvalidHeader`) count against the
/// read retry budget, while `DeviceIdMismatch` and `CommandFailed` mean the
/// exchange completed but was rejected and must never be retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command payload exceeds the 3 data bytes a frame carries
    #[error("Command data too large: {size} bytes (max: {max} bytes)")]
    DataTooLarge {
        size: usize,
        max: usize,
    },

    /// Response buffer is shorter than a full frame
    #[error("Frame too short: expected {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Response does not start with the response header byte
    #[error("Invalid frame header: 0x{actual:02X} (expected 0x{expected:02X})")]
    InvalidHeader {
        expected: u8,
        actual: u8,
    },

    /// Response came from a different machine number than the one addressed
    #[error("Device ID mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    DeviceIdMismatch {
        expected: u8,
        actual: u8,
    },

    /// Device reported a non-success command-execution byte
    #[error("Device rejected command: execution byte 0x{execution:02X} (success is 0x55)")]
    CommandFailed {
        execution: u8,
    },

    /// Unknown command code
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),
}

impl Error {
    /// Whether a retry of the exchange could plausibly succeed.
    ///
    /// Framing failures can be caused by bus noise and are worth retrying;
    /// a rejection (`DeviceIdMismatch`, `CommandFailed`) means the device
    /// received and refused the command, so retrying will not help.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. } | Self::InvalidHeader { .. }
        )
    }
}

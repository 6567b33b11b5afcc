//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Core(#[from] ds205a_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] ds205a_transport::Error),

    #[error("Device is not open")]
    NotOpen,

    #[error("Operation cancelled")]
    Cancelled,

    /// Read budget exhausted with a partial frame in the buffer
    #[error("Incomplete frame: received {} of {expected} bytes", partial.len())]
    IncompleteFrame {
        partial: Vec<u8>,
        expected: usize,
    },

    /// Read budget exhausted without a single byte arriving
    #[error("No data received from device")]
    NoData,

    /// Retry budget exhausted on a transient failure
    #[error("Command {command} failed after {attempts} attempts: {source}")]
    Exhausted {
        command: ds205a_core::CommandCode,
        attempts: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether the failure is transient and worth another attempt.
    ///
    /// Transport and framing failures can be caused by bus noise or missed
    /// timing. A parse rejection means the exchange completed and the
    /// device (or a wrong device) answered; repeating it cannot change the
    /// outcome.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::IncompleteFrame { .. } | Self::NoData => true,
            Self::Core(err) => err.is_recoverable(),
            _ => false,
        }
    }
}

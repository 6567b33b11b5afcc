//! Transport layer for the DS205A protocol
//!
//! Provides serial (RS-485) communication with the gate behind a small
//! capability trait, so the codec and session logic can be exercised
//! against an in-memory fake.

pub mod config;
pub mod error;
pub mod serial;

pub use config::{Parity, SerialConfig};
pub use error::{Error, Result};
pub use serial::SerialTransport;

use async_trait::async_trait;
use std::time::Duration;

/// Byte-level port capability consumed by the device session
///
/// The session owns exactly one implementation for its lifetime. Reads and
/// writes are raw: framing, resynchronization, and retry live above this
/// trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the port
    async fn open(&mut self) -> Result<()>;

    /// Close the port (idempotent; a second close is a no-op)
    async fn close(&mut self) -> Result<()>;

    /// Check if the port is open
    fn is_open(&self) -> bool;

    /// Write raw bytes, returning the number written
    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read raw bytes into `buf`, returning the number read
    ///
    /// A read that sees no data within the configured read timeout fails
    /// with [`Error::ReadTimeout`].
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Set the per-read timeout
    async fn set_read_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Set the per-write timeout
    async fn set_write_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Name of the underlying port, for diagnostics
    fn port_name(&self) -> String;
}

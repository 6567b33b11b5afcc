//! # ds205a
//!
//! Driver for DS205A serial-attached turnstile gates.
//!
//! ## Features
//!
//! - Typed command API for every gate operation
//! - Frame resynchronization over a noisy half-duplex RS-485 line
//! - Bounded retry with linear backoff
//! - Async/await API using Tokio, cooperative cancellation
//!
//! ## Quick Start
//!
//! ```no_run
//! use ds205a::{CancellationToken, Device, DeviceConfig};
//!
//! #[tokio::main]
//! async fn main() -> ds205a::Result<()> {
//!     let device = Device::new(
//!         DeviceConfig::new("/dev/ttyUSB0").with_device_id(0x01),
//!     )?;
//!     let cancel = CancellationToken::new();
//!
//!     device.open().await?;
//!
//!     let status = device.get_status(&cancel).await?;
//!     println!("{status}");
//!
//!     device.left_open(1, &cancel).await?;
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;

// Re-exports
pub use config::DeviceConfig;
pub use device::Device;
pub use error::{Error, Result};

// Re-export protocol and transport types callers commonly need
pub use ds205a_core::{CommandCode, CommandFrame, ResponseFrame};
pub use ds205a_transport::{Parity, SerialConfig, Transport};
pub use ds205a_types::{DeviceInfo, DeviceStatus, PassageDirection};

// Cancellation token used by every operation
pub use tokio_util::sync::CancellationToken;

//! Device session configuration

use std::time::Duration;

use ds205a_transport::{Parity, SerialConfig};

use crate::error::{Error, Result};

/// Configuration for a [`Device`](crate::Device) session
///
/// Immutable once the device is constructed.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Serial port path, e.g. `/dev/ttyUSB0`
    pub port: String,

    /// Baud rate (default: 9600)
    pub baud_rate: u32,

    /// Data bits (default: 8)
    pub data_bits: u8,

    /// Stop bits (default: 1)
    pub stop_bits: u8,

    /// Parity (default: none)
    pub parity: Parity,

    /// Overall per-operation timeout (default: 5s)
    pub timeout: Duration,

    /// Per-read timeout at the transport (default: 2s)
    pub read_timeout: Duration,

    /// Per-write timeout at the transport (default: 2s)
    pub write_timeout: Duration,

    /// Machine number of the addressed gate (default: 0x01)
    pub device_id: u8,

    /// Number of retries after the first attempt (default: 3)
    pub retry_count: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
            device_id: 0x01,
            retry_count: 3,
        }
    }
}

impl DeviceConfig {
    /// Create a configuration for `port` with device defaults
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the addressed machine number
    pub fn with_device_id(mut self, device_id: u8) -> Self {
        self.device_id = device_id;
        self
    }

    /// Set the per-operation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count
    pub fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Validate the configuration without touching any port.
    ///
    /// Serial line parameters are checked by the transport's own
    /// validation; the session additionally requires a positive operation
    /// timeout.
    pub fn validate(&self) -> Result<()> {
        self.serial_config().validate().map_err(Error::Transport)?;

        if self.timeout.is_zero() {
            return Err(Error::Transport(ds205a_transport::Error::InvalidConfig(
                "timeout must be positive".into(),
            )));
        }

        Ok(())
    }

    /// Project the serial line portion of this configuration
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            stop_bits: self.stop_bits,
            parity: self.parity,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::new("/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.device_id, 0x01);
        assert_eq!(config.retry_count, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = DeviceConfig::new("/dev/ttyUSB1")
            .with_baud_rate(115200)
            .with_device_id(0x05)
            .with_timeout(Duration::from_secs(9))
            .with_retry_count(1);

        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.device_id, 0x05);
        assert_eq!(config.timeout, Duration::from_secs(9));
        assert_eq!(config.retry_count, 1);
    }

    #[test]
    fn test_validate_rejects_empty_port() {
        assert!(DeviceConfig::default().validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = DeviceConfig::new("/dev/ttyUSB0").with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}

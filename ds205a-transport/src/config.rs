//! Serial port configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Parity bit setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "odd" => Ok(Self::Odd),
            "even" => Ok(Self::Even),
            "mark" => Ok(Self::Mark),
            "space" => Ok(Self::Space),
            other => Err(Error::InvalidConfig(format!("invalid parity: {other}"))),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Odd => "odd",
            Self::Even => "even",
            Self::Mark => "mark",
            Self::Space => "space",
        };
        write!(f, "{s}")
    }
}

/// Serial line configuration
///
/// Validated before any port is touched; an invalid configuration never
/// reaches the transport.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port path, e.g. `/dev/ttyUSB0` or `COM3`
    pub port: String,

    /// Baud rate (the DS205A ships at 9600)
    pub baud_rate: u32,

    /// Data bits (5-8)
    pub data_bits: u8,

    /// Stop bits (1 or 2)
    pub stop_bits: u8,

    /// Parity
    pub parity: Parity,

    /// Per-read timeout
    pub read_timeout: Duration,

    /// Per-write timeout
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
        }
    }
}

impl SerialConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending field when the
    /// port is empty, the baud rate is zero, or data/stop bits fall outside
    /// their legal ranges.
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(Error::InvalidConfig("port cannot be empty".into()));
        }

        if self.baud_rate == 0 {
            return Err(Error::InvalidConfig(format!(
                "invalid baud rate: {}",
                self.baud_rate
            )));
        }

        if !(5..=8).contains(&self.data_bits) {
            return Err(Error::InvalidConfig(format!(
                "data bits must be between 5 and 8: {}",
                self.data_bits
            )));
        }

        if !(1..=2).contains(&self.stop_bits) {
            return Err(Error::InvalidConfig(format!(
                "stop bits must be 1 or 2: {}",
                self.stop_bits
            )));
        }

        Ok(())
    }

    pub(crate) fn serial_data_bits(&self) -> tokio_serial::DataBits {
        match self.data_bits {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        }
    }

    pub(crate) fn serial_stop_bits(&self) -> tokio_serial::StopBits {
        match self.stop_bits {
            2 => tokio_serial::StopBits::Two,
            _ => tokio_serial::StopBits::One,
        }
    }

    /// Map the parity to the backend's type.
    ///
    /// Mark and space parity are valid line settings but the serialport
    /// backend only implements none/odd/even, so they surface here rather
    /// than in [`SerialConfig::validate`].
    pub(crate) fn serial_parity(&self) -> Result<tokio_serial::Parity> {
        match self.parity {
            Parity::None => Ok(tokio_serial::Parity::None),
            Parity::Odd => Ok(tokio_serial::Parity::Odd),
            Parity::Even => Ok(tokio_serial::Parity::Even),
            Parity::Mark | Parity::Space => Err(Error::InvalidConfig(format!(
                "{} parity is not supported by the serial backend",
                self.parity
            ))),
        }
    }
}

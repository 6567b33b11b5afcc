//! Serial port transport
//!
//! RS-485 half-duplex link to the gate, driven through `tokio-serial`.
//! Timeouts are applied per read and per write; there is no end-to-end
//! deadline at this layer.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, trace, warn};

use crate::config::SerialConfig;
use crate::{error::*, Transport};

/// Serial transport for the DS205A gate
pub struct SerialTransport {
    config: SerialConfig,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Create a new, closed serial transport.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::InvalidConfig`] before any I/O if the
    /// configuration is invalid.
    pub fn new(config: SerialConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            stream: None,
        })
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let parity = self.config.serial_parity()?;

        debug!(port = %self.config.port, baud = self.config.baud_rate, "Opening serial port");

        let builder = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .data_bits(self.config.serial_data_bits())
            .stop_bits(self.config.serial_stop_bits())
            .parity(parity);

        let stream = builder
            .open_native_async()
            .map_err(|source| Error::OpenFailed {
                port: self.config.port.clone(),
                source,
            })?;

        debug!(port = %self.config.port, "Serial port open");

        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!(port = %self.config.port, "Closing serial port");
            drop(stream);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        trace!("Writing {} bytes: {:02X?}", data.len(), data);

        timeout(self.config.write_timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::WriteTimeout)??;

        Ok(data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        let n = timeout(self.config.read_timeout, stream.read(buf))
            .await
            .map_err(|_| Error::ReadTimeout)??;

        if n == 0 {
            return Err(Error::PortClosed);
        }

        trace!("Read {} bytes: {:02X?}", n, &buf[..n]);

        Ok(n)
    }

    async fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.config.read_timeout = timeout;
        Ok(())
    }

    async fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.config.write_timeout = timeout;
        Ok(())
    }

    fn port_name(&self) -> String {
        self.config.port.clone()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!(port = %self.config.port, "Serial transport dropped while still open");
        }
    }
}

//! High-level device session
//!
//! [`Device`] owns one transport handle for its lifetime and drives the
//! half-duplex command/response exchange: build frame, write, read with
//! frame resynchronization, decode, retry transient failures with linear
//! backoff.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use ds205a_core::constants::{RESPONSE_FRAME_SIZE, RESPONSE_HEADER, RESTART_CONFIRM};
use ds205a_core::{CommandCode, CommandFrame, ResponseFrame};
use ds205a_transport::{Error as TransportError, SerialTransport, Transport};
use ds205a_types::{DeviceInfo, DeviceStatus};

use crate::config::DeviceConfig;
use crate::error::{Error, Result};

/// Read budget: attempts per frame before giving up on resynchronization
const MAX_READ_ATTEMPTS: usize = 30;

/// Chunk size for accumulating reads
const READ_CHUNK_SIZE: usize = 32;

/// Linear backoff step between retry attempts
const RETRY_BACKOFF_MS: u64 = 100;

/// DS205A turnstile gate session
///
/// The session is `Closed` until [`Device::open`] succeeds; every typed
/// command fails with [`Error::NotOpen`] while closed. One lock guards the
/// transport handle so open/close cannot race an in-flight command; the
/// protocol itself is strictly request/response with no pipelining.
///
/// # Examples
///
/// ```no_run
/// use ds205a::{Device, DeviceConfig, CancellationToken};
///
/// #[tokio::main]
/// async fn main() -> ds205a::Result<()> {
///     let device = Device::new(DeviceConfig::new("/dev/ttyUSB0"))?;
///     let cancel = CancellationToken::new();
///
///     device.open().await?;
///     let status = device.get_status(&cancel).await?;
///     println!("{status}");
///     device.close().await?;
///
///     Ok(())
/// }
/// ```
pub struct Device {
    config: DeviceConfig,
    transport: RwLock<Box<dyn Transport>>,
}

impl Device {
    /// Create a session over a serial port.
    ///
    /// # Errors
    ///
    /// Fails fast with an `InvalidConfig` transport error before any I/O
    /// if the configuration is invalid.
    pub fn new(config: DeviceConfig) -> Result<Self> {
        config.validate()?;

        let transport = SerialTransport::new(config.serial_config())?;

        Ok(Self {
            config,
            transport: RwLock::new(Box::new(transport)),
        })
    }

    /// Create a session over a caller-supplied transport.
    ///
    /// Used to drive the session against an in-memory transport in tests;
    /// the session logic is identical either way.
    pub fn with_transport(config: DeviceConfig, transport: Box<dyn Transport>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            transport: RwLock::new(transport),
        })
    }

    /// The session configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Open the transport. Opening an already-open session is a no-op.
    pub async fn open(&self) -> Result<()> {
        let mut transport = self.transport.write().await;

        if transport.is_open() {
            return Ok(());
        }

        transport.open().await?;

        // Timeouts are part of the open sequence; close on the error path
        // so a half-configured handle is never left behind.
        if let Err(err) = transport.set_read_timeout(self.config.read_timeout).await {
            let _ = transport.close().await;
            return Err(err.into());
        }
        if let Err(err) = transport.set_write_timeout(self.config.write_timeout).await {
            let _ = transport.close().await;
            return Err(err.into());
        }

        info!(port = %transport.port_name(), device_id = self.config.device_id, "Device opened");
        Ok(())
    }

    /// Close the transport. A second close is a no-op.
    pub async fn close(&self) -> Result<()> {
        let mut transport = self.transport.write().await;

        if !transport.is_open() {
            return Ok(());
        }

        transport.close().await?;
        info!("Device closed");
        Ok(())
    }

    /// Whether the session is open
    pub async fn is_open(&self) -> bool {
        self.transport.read().await.is_open()
    }

    /// Query the gate's status
    pub async fn get_status(&self, cancel: &CancellationToken) -> Result<DeviceStatus> {
        let response = self
            .send_command(CommandCode::GetStatus, &[], cancel)
            .await?;

        let status = status_from_frame(&response);
        debug!(%status, "Status received");
        Ok(status)
    }

    /// Query basic device identity (projected from a status response)
    pub async fn get_device_info(&self, cancel: &CancellationToken) -> Result<DeviceInfo> {
        let response = self
            .send_command(CommandCode::GetStatus, &[], cancel)
            .await?;

        Ok(DeviceInfo::new(
            response.machine_number,
            response.version_number,
        ))
    }

    /// Open the left passage
    pub async fn left_open(&self, value: u8, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::LeftOpen, &[value], cancel)
            .await?;
        Ok(())
    }

    /// Hold the left passage permanently open
    pub async fn left_always_open(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::LeftAlwaysOpen, &[], cancel)
            .await?;
        Ok(())
    }

    /// Open the right passage
    pub async fn right_open(&self, value: u8, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::RightOpen, &[value], cancel)
            .await?;
        Ok(())
    }

    /// Hold the right passage permanently open
    pub async fn right_always_open(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::RightAlwaysOpen, &[], cancel)
            .await?;
        Ok(())
    }

    /// Close the gate
    pub async fn close_gate(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::CloseGate, &[], cancel)
            .await?;
        Ok(())
    }

    /// Forbid passage through the left side
    pub async fn forbid_left_passage(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::ForbidLeftPassage, &[], cancel)
            .await?;
        Ok(())
    }

    /// Forbid passage through the right side
    pub async fn forbid_right_passage(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::ForbidRightPassage, &[], cancel)
            .await?;
        Ok(())
    }

    /// Lift all passage restrictions
    pub async fn disable_restrictions(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::DisableRestrictions, &[], cancel)
            .await?;
        Ok(())
    }

    /// Reset the left-side pedestrian counters
    pub async fn reset_left_counters(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::ResetLeftCounters, &[], cancel)
            .await?;
        Ok(())
    }

    /// Reset the right-side pedestrian counters
    pub async fn reset_right_counters(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::ResetRightCounters, &[], cancel)
            .await?;
        Ok(())
    }

    /// Set device parameters
    pub async fn set_parameters(&self, value: u8, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::SetParameters, &[value], cancel)
            .await?;
        Ok(())
    }

    /// Restart the device
    pub async fn restart(&self, cancel: &CancellationToken) -> Result<()> {
        self.send_command(CommandCode::RestartDevice, &[RESTART_CONFIRM], cancel)
            .await?;
        Ok(())
    }

    /// Execute one command/response exchange with retry.
    ///
    /// Write and read failures are transient (bus noise, missed timing) and
    /// retried with linear backoff up to `retry_count` times. A response
    /// that decodes but is rejected — wrong machine number, non-success
    /// execution byte — surfaces immediately: the exchange completed and
    /// repeating it cannot change the outcome. Cancellation also surfaces
    /// immediately.
    async fn send_command(
        &self,
        command: CommandCode,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<ResponseFrame> {
        let frame = CommandFrame::build(self.config.device_id, command, data)?;
        let encoded = frame.encode();

        let mut transport = self.transport.write().await;
        if !transport.is_open() {
            return Err(Error::NotOpen);
        }

        let attempts = self.config.retry_count + 1;
        for attempt in 0..attempts {
            if attempt > 0 {
                debug!(%command, attempt, "Retrying command");
                sleep(Duration::from_millis(attempt as u64 * RETRY_BACKOFF_MS)).await;
            }

            if let Err(err) = transport.write(&encoded).await {
                warn!(%command, attempt, error = %err, "Failed to write command");
                if attempt + 1 == attempts {
                    return Err(Error::Exhausted {
                        command,
                        attempts,
                        source: Box::new(err.into()),
                    });
                }
                continue;
            }
            debug!(%command, tx = %hex::encode(&encoded), "TX");

            let raw = match read_frame(&mut **transport, cancel).await {
                Ok(raw) => raw,
                // Cancellation is the only non-transient read failure; it
                // surfaces as-is instead of consuming the retry budget.
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    warn!(%command, attempt, error = %err, "Failed to read response");
                    if attempt + 1 == attempts {
                        return Err(Error::Exhausted {
                            command,
                            attempts,
                            source: Box::new(err),
                        });
                    }
                    continue;
                }
            };
            debug!(%command, rx = %hex::encode(raw), "RX");

            let response = ResponseFrame::decode(&raw, self.config.device_id)?;
            return Ok(response);
        }

        // The final attempt always returns above; kept for completeness.
        Err(Error::Exhausted {
            command,
            attempts,
            source: Box::new(Error::NoData),
        })
    }
}

/// Read one response frame, recovering the frame boundary from the raw
/// byte stream.
///
/// Bytes are accumulated across reads; everything before the first
/// response header is discarded, and once a header is locked in it is
/// never revisited for the current frame attempt. The read budget bounds
/// worst-case latency: exhausting it yields [`Error::IncompleteFrame`]
/// (with whatever arrived) or [`Error::NoData`]. Cancellation is checked
/// before every read.
async fn read_frame(
    transport: &mut dyn Transport,
    cancel: &CancellationToken,
) -> Result<[u8; RESPONSE_FRAME_SIZE]> {
    let mut accumulated = BytesMut::with_capacity(READ_CHUNK_SIZE * 2);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut header_found = false;

    for _ in 0..MAX_READ_ATTEMPTS {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let n = match transport.read(&mut chunk).await {
            Ok(n) => n,
            // An empty read window is not a failure yet; the budget decides.
            Err(TransportError::ReadTimeout) => 0,
            Err(err) if accumulated.is_empty() => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, accumulated = accumulated.len(), "Read failed mid-frame");
                0
            }
        };

        if n == 0 {
            continue;
        }

        accumulated.extend_from_slice(&chunk[..n]);
        trace!(read = n, total = accumulated.len(), "Read chunk");

        if !header_found {
            match accumulated.iter().position(|&b| b == RESPONSE_HEADER) {
                Some(pos) => {
                    header_found = true;
                    if pos > 0 {
                        debug!(discarded = pos, "Discarding bytes before header");
                        accumulated.advance(pos);
                    }
                }
                // Nothing but noise so far; keep reading.
                None => continue,
            }
        }

        if accumulated.len() >= RESPONSE_FRAME_SIZE {
            let mut frame = [0u8; RESPONSE_FRAME_SIZE];
            frame.copy_from_slice(&accumulated[..RESPONSE_FRAME_SIZE]);
            return Ok(frame);
        }
    }

    if accumulated.is_empty() {
        debug!("No data received");
        Err(Error::NoData)
    } else {
        debug!(
            received = accumulated.len(),
            expected = RESPONSE_FRAME_SIZE,
            "Read budget exhausted with incomplete frame"
        );
        Err(Error::IncompleteFrame {
            partial: accumulated.to_vec(),
            expected: RESPONSE_FRAME_SIZE,
        })
    }
}

fn status_from_frame(frame: &ResponseFrame) -> DeviceStatus {
    DeviceStatus {
        machine_number: frame.machine_number,
        version_number: frame.version_number,
        fault_event: frame.fault_event,
        gate_status: frame.gate_status,
        alarm_event: frame.alarm_event,
        infrared_status: frame.infrared_status,
        power_supply_voltage: frame.power_supply_voltage,
        left_pedestrian_count: frame.left_count,
        right_pedestrian_count: frame.right_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use ds205a_core::checksum;
    use ds205a_core::constants::EXECUTION_SUCCESS;

    /// One scripted outcome for a `read` call
    enum ReadStep {
        Data(Vec<u8>),
        Timeout,
        Fail,
    }

    #[derive(Default)]
    struct FakeState {
        open: bool,
        reads: VecDeque<ReadStep>,
        /// Number of write calls, failed ones included
        write_attempts: usize,
        /// Write calls that fail before any succeed
        write_failures: usize,
        read_attempts: usize,
        written: Vec<Vec<u8>>,
    }

    /// Scripted in-memory transport
    struct FakeTransport {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeTransport {
        fn new() -> (Self, Arc<Mutex<FakeState>>) {
            let state = Arc::new(Mutex::new(FakeState {
                open: true,
                ..FakeState::default()
            }));
            (
                Self {
                    state: Arc::clone(&state),
                },
                state,
            )
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn open(&mut self) -> ds205a_transport::Result<()> {
            self.state.lock().unwrap().open = true;
            Ok(())
        }

        async fn close(&mut self) -> ds205a_transport::Result<()> {
            self.state.lock().unwrap().open = false;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.state.lock().unwrap().open
        }

        async fn write(&mut self, data: &[u8]) -> ds205a_transport::Result<usize> {
            let mut state = self.state.lock().unwrap();
            state.write_attempts += 1;
            if state.write_failures > 0 {
                state.write_failures -= 1;
                return Err(TransportError::Io(io::Error::other("write failed")));
            }
            state.written.push(data.to_vec());
            Ok(data.len())
        }

        async fn read(&mut self, buf: &mut [u8]) -> ds205a_transport::Result<usize> {
            let mut state = self.state.lock().unwrap();
            state.read_attempts += 1;
            match state.reads.pop_front() {
                Some(ReadStep::Data(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(ReadStep::Timeout) | None => Err(TransportError::ReadTimeout),
                Some(ReadStep::Fail) => Err(TransportError::Io(io::Error::other("read failed"))),
            }
        }

        async fn set_read_timeout(&mut self, _timeout: Duration) -> ds205a_transport::Result<()> {
            Ok(())
        }

        async fn set_write_timeout(&mut self, _timeout: Duration) -> ds205a_transport::Result<()> {
            Ok(())
        }

        fn port_name(&self) -> String {
            "fake".into()
        }
    }

    /// Well-formed 18-byte response for machine `machine`
    fn response_bytes(machine: u8, execution: u8) -> Vec<u8> {
        let mut buf = vec![0u8; RESPONSE_FRAME_SIZE];
        buf[0] = RESPONSE_HEADER;
        buf[1] = 0x12;
        buf[2] = machine;
        buf[4] = 0x01;
        buf[6..9].copy_from_slice(&[0x00, 0x01, 0x2C]); // left = 300
        buf[9..12].copy_from_slice(&[0x00, 0x00, 0x07]); // right = 7
        buf[13] = execution;
        buf[14] = 0x18;
        let cksum = checksum::transmit(&buf[1..RESPONSE_FRAME_SIZE - 1]);
        buf[RESPONSE_FRAME_SIZE - 1] = cksum;
        buf
    }

    fn test_device(retry_count: usize) -> (Device, Arc<Mutex<FakeState>>) {
        let (transport, state) = FakeTransport::new();
        let config = DeviceConfig::new("fake").with_retry_count(retry_count);
        let device = Device::with_transport(config, Box::new(transport)).unwrap();
        (device, state)
    }

    #[tokio::test]
    async fn test_get_status_projects_counters() {
        let (device, state) = test_device(0);
        state
            .lock()
            .unwrap()
            .reads
            .push_back(ReadStep::Data(response_bytes(0x01, EXECUTION_SUCCESS)));

        let cancel = CancellationToken::new();
        let status = device.get_status(&cancel).await.unwrap();

        assert_eq!(status.left_pedestrian_count, 300);
        assert_eq!(status.right_pedestrian_count, 7);
        assert_eq!(status.machine_number, 0x01);
        assert_eq!(status.power_supply_voltage, 0x18);
    }

    #[tokio::test]
    async fn test_resync_discards_leading_noise_across_split_reads() {
        let (device, state) = test_device(0);
        let frame = response_bytes(0x01, EXECUTION_SUCCESS);
        {
            let mut state = state.lock().unwrap();
            // Two noise bytes, then the frame split at an arbitrary point.
            let mut first = vec![0x01, 0x02];
            first.extend_from_slice(&frame[..7]);
            state.reads.push_back(ReadStep::Data(first));
            state.reads.push_back(ReadStep::Data(frame[7..].to_vec()));
        }

        let cancel = CancellationToken::new();
        let status = device.get_status(&cancel).await.unwrap();
        assert_eq!(status.left_pedestrian_count, 300);
    }

    #[tokio::test]
    async fn test_resync_consumes_only_first_of_queued_frames() {
        let (device, state) = test_device(0);
        {
            let mut state = state.lock().unwrap();
            // Two back-to-back frames in one read; the second is from a
            // different machine and must never be looked at.
            let mut bytes = response_bytes(0x01, EXECUTION_SUCCESS);
            bytes.extend(response_bytes(0x02, EXECUTION_SUCCESS));
            state.reads.push_back(ReadStep::Data(bytes));
        }

        let cancel = CancellationToken::new();
        assert!(device.get_status(&cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_command_while_closed_fails_without_io() {
        let (device, state) = test_device(3);
        state.lock().unwrap().open = false;

        let cancel = CancellationToken::new();
        let result = device.get_status(&cancel).await;

        assert!(matches!(result, Err(Error::NotOpen)));
        let state = state.lock().unwrap();
        assert_eq!(state.write_attempts, 0);
        assert_eq!(state.read_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failures_retried_until_success() {
        let (device, state) = test_device(3);
        {
            let mut state = state.lock().unwrap();
            state.write_failures = 2;
            state
                .reads
                .push_back(ReadStep::Data(response_bytes(0x01, EXECUTION_SUCCESS)));
        }

        let cancel = CancellationToken::new();
        assert!(device.close_gate(&cancel).await.is_ok());

        // Two failed writes plus the one that got through
        assert_eq!(state.lock().unwrap().write_attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_retried_until_success() {
        let (device, state) = test_device(3);
        {
            let mut state = state.lock().unwrap();
            state.reads.push_back(ReadStep::Fail);
            state
                .reads
                .push_back(ReadStep::Data(response_bytes(0x01, EXECUTION_SUCCESS)));
        }

        let cancel = CancellationToken::new();
        assert!(device.close_gate(&cancel).await.is_ok());
        assert_eq!(state.lock().unwrap().write_attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retry_budget_surfaces_with_attempt_count() {
        let (device, state) = test_device(2);
        state.lock().unwrap().write_failures = 10;

        let cancel = CancellationToken::new();
        let result = device.close_gate(&cancel).await;

        match result {
            Err(Error::Exhausted {
                attempts, source, ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, Error::Transport(_)));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(state.lock().unwrap().write_attempts, 3);
    }

    #[tokio::test]
    async fn test_device_id_mismatch_not_retried() {
        let (device, state) = test_device(3);
        state
            .lock()
            .unwrap()
            .reads
            .push_back(ReadStep::Data(response_bytes(0x02, EXECUTION_SUCCESS)));

        let cancel = CancellationToken::new();
        let result = device.get_status(&cancel).await;

        assert!(matches!(
            result,
            Err(Error::Core(ds205a_core::Error::DeviceIdMismatch {
                expected: 0x01,
                actual: 0x02
            }))
        ));
        // Rejection surfaced immediately, no second exchange
        assert_eq!(state.lock().unwrap().write_attempts, 1);
    }

    #[tokio::test]
    async fn test_device_reported_failure_not_retried() {
        let (device, state) = test_device(3);
        state
            .lock()
            .unwrap()
            .reads
            .push_back(ReadStep::Data(response_bytes(0x01, 0x00)));

        let cancel = CancellationToken::new();
        let result = device.left_always_open(&cancel).await;

        assert!(matches!(
            result,
            Err(Error::Core(ds205a_core::Error::CommandFailed {
                execution: 0x00
            }))
        ));
        assert_eq!(state.lock().unwrap().write_attempts, 1);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_read_loop() {
        let (device, state) = test_device(3);
        // Plenty of timeouts queued; cancellation must win before them.
        for _ in 0..10 {
            state.lock().unwrap().reads.push_back(ReadStep::Timeout);
        }

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = device.get_status(&cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        // Cancelled before the first read attempt
        assert_eq!(state.lock().unwrap().read_attempts, 0);
    }

    #[tokio::test]
    async fn test_read_budget_exhaustion_without_data() {
        let (device, state) = test_device(0);
        // Empty read script: every attempt times out

        let cancel = CancellationToken::new();
        let result = device.get_status(&cancel).await;

        match result {
            Err(Error::Exhausted { source, .. }) => {
                assert!(matches!(*source, Error::NoData));
            }
            other => panic!("expected Exhausted(NoData), got {other:?}"),
        }
        assert_eq!(state.lock().unwrap().read_attempts, MAX_READ_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_read_budget_exhaustion_with_partial_frame() {
        let (device, state) = test_device(0);
        state
            .lock()
            .unwrap()
            .reads
            .push_back(ReadStep::Data(vec![RESPONSE_HEADER, 0x12, 0x01]));

        let cancel = CancellationToken::new();
        let result = device.get_status(&cancel).await;

        match result {
            Err(Error::Exhausted { source, .. }) => match *source {
                Error::IncompleteFrame { partial, expected } => {
                    assert_eq!(partial.len(), 3);
                    assert_eq!(expected, RESPONSE_FRAME_SIZE);
                }
                other => panic!("expected IncompleteFrame, got {other:?}"),
            },
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restart_sends_confirmation_byte() {
        let (device, state) = test_device(0);
        state
            .lock()
            .unwrap()
            .reads
            .push_back(ReadStep::Data(response_bytes(0x01, EXECUTION_SUCCESS)));

        let cancel = CancellationToken::new();
        device.restart(&cancel).await.unwrap();

        let state = state.lock().unwrap();
        let written = &state.written[0];
        assert_eq!(written[3], 0x35);
        assert_eq!(written[4], RESTART_CONFIRM);
    }

    #[tokio::test]
    async fn test_open_and_close_are_idempotent() {
        let (device, _state) = test_device(0);

        device.open().await.unwrap();
        device.open().await.unwrap();
        assert!(device.is_open().await);

        device.close().await.unwrap();
        device.close().await.unwrap();
        assert!(!device.is_open().await);
    }
}

//! DS205A frame encoding and decoding
//!
//! The protocol is half-duplex with two fixed-length frame shapes: an
//! 8-byte command frame sent to the gate and an 18-byte response frame
//! coming back. All field extraction is positional.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::CommandCode,
    constants::*,
    error::{Error, Result},
};

/// Outbound command frame
///
/// # Frame Structure
///
/// ```text
/// ┌────────┬──────────┬───────────┬─────────┬───────┬───────┬───────┬──────────┐
/// │ Header │ Reserved │ Machine # │ Command │ Data0 │ Data1 │ Data2 │ Checksum │
/// │  0x7E  │   0x00   │  1 byte   │ 1 byte  │ 1 byte│ 1 byte│ 1 byte│  1 byte  │
/// └────────┴──────────┴───────────┴─────────┴───────┴───────┴───────┴──────────┘
/// ```
///
/// The checksum is the ones-complement of the mod-256 sum of bytes 1..=6
/// (everything except the header and the checksum itself).
///
/// # Examples
///
/// ```
/// use ds205a_core::{CommandFrame, CommandCode};
///
/// let frame = CommandFrame::build(0x01, CommandCode::GetStatus, &[]).unwrap();
/// let encoded = frame.encode();
/// assert_eq!(encoded.len(), 8);
/// assert_eq!(encoded[0], 0x7E);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Machine number of the addressed gate
    pub device_id: u8,

    /// Command code
    pub command: CommandCode,

    /// Data bytes, zero-padded to 3
    pub data: [u8; MAX_COMMAND_DATA],
}

impl CommandFrame {
    /// Build a command frame for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataTooLarge`] if more than 3 data bytes are given.
    /// Fewer bytes are padded with 0x00.
    pub fn build(device_id: u8, command: CommandCode, data: &[u8]) -> Result<Self> {
        if data.len() > MAX_COMMAND_DATA {
            return Err(Error::DataTooLarge {
                size: data.len(),
                max: MAX_COMMAND_DATA,
            });
        }

        let mut padded = [0u8; MAX_COMMAND_DATA];
        padded[..data.len()].copy_from_slice(data);

        Ok(Self {
            device_id,
            command,
            data: padded,
        })
    }

    /// Calculate the transmit checksum for this frame
    pub fn checksum(&self) -> u8 {
        checksum::transmit(&[
            COMMAND_RESERVED,
            self.device_id,
            self.command.into(),
            self.data[0],
            self.data[1],
            self.data[2],
        ])
    }

    /// Encode the frame to its 8-byte wire form
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(COMMAND_FRAME_SIZE);

        buf.put_u8(COMMAND_HEADER);
        buf.put_u8(COMMAND_RESERVED);
        buf.put_u8(self.device_id);
        buf.put_u8(self.command.into());
        buf.put_slice(&self.data);
        buf.put_u8(self.checksum());

        buf
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFrame")
            .field("device_id", &format!("0x{:02X}", self.device_id))
            .field("command", &self.command)
            .field("data", &format!("{:02X?}", self.data))
            .field("checksum", &format!("0x{:02X}", self.checksum()))
            .finish()
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandFrame[{}](device=0x{:02X}, data={:02X?})",
            self.command, self.device_id, self.data
        )
    }
}

/// Inbound response frame
///
/// # Frame Structure
///
/// ```text
/// offset  0: header (0x7F)
/// offset  1: version number
/// offset  2: machine number
/// offset  3: fault event
/// offset  4: gate status
/// offset  5: alarm event
/// offset  6: left pedestrian count  (3 bytes, big-endian)
/// offset  9: right pedestrian count (3 bytes, big-endian)
/// offset 12: infrared status
/// offset 13: command execution (0x55 = success)
/// offset 14: power supply voltage
/// offset 15: undefined
/// offset 16: undefined
/// offset 17: checksum
/// ```
///
/// The command-execution byte is the authoritative success signal. The
/// trailing checksum is verified into [`ResponseFrame::checksum_ok`] for
/// diagnostics but never causes rejection: observed device firmware emits
/// frames whose checksum does not validate even though the response is
/// otherwise correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Machine number of the responding gate
    pub machine_number: u8,

    /// Firmware version number
    pub version_number: u8,

    /// Fault event code
    pub fault_event: u8,

    /// Gate status code
    pub gate_status: u8,

    /// Alarm event code
    pub alarm_event: u8,

    /// Left pedestrian counter (24-bit on the wire, widened)
    pub left_count: u32,

    /// Right pedestrian counter (24-bit on the wire, widened)
    pub right_count: u32,

    /// Infrared sensor status
    pub infrared_status: u8,

    /// Command-execution byte (0x55 = success)
    pub command_execution: u8,

    /// Power supply voltage reading
    pub power_supply_voltage: u8,

    /// Whether the advisory RX checksum validated
    pub checksum_ok: bool,
}

impl ResponseFrame {
    /// Decode an 18-byte response frame.
    ///
    /// # Errors
    ///
    /// - [`Error::FrameTooShort`] if fewer than 18 bytes are given
    /// - [`Error::InvalidHeader`] if byte 0 is not 0x7F
    /// - [`Error::DeviceIdMismatch`] if the machine number is not
    ///   `expected_device_id` (cross-talk on a shared bus)
    /// - [`Error::CommandFailed`] if the command-execution byte is not 0x55
    pub fn decode(buf: &[u8], expected_device_id: u8) -> Result<Self> {
        if buf.len() < RESPONSE_FRAME_SIZE {
            return Err(Error::FrameTooShort {
                expected: RESPONSE_FRAME_SIZE,
                actual: buf.len(),
            });
        }

        if buf[0] != RESPONSE_HEADER {
            return Err(Error::InvalidHeader {
                expected: RESPONSE_HEADER,
                actual: buf[0],
            });
        }

        let machine_number = buf[2];
        if machine_number != expected_device_id {
            return Err(Error::DeviceIdMismatch {
                expected: expected_device_id,
                actual: machine_number,
            });
        }

        // Advisory only. Do not reject on mismatch.
        let checksum_ok = checksum::verify_receive(&buf[1..RESPONSE_FRAME_SIZE]);
        if !checksum_ok {
            tracing::trace!(
                machine = machine_number,
                "Response checksum did not validate (advisory)"
            );
        }

        let command_execution = buf[EXECUTION_OFFSET];
        if command_execution != EXECUTION_SUCCESS {
            return Err(Error::CommandFailed {
                execution: command_execution,
            });
        }

        Ok(Self {
            machine_number,
            version_number: buf[1],
            fault_event: buf[3],
            gate_status: buf[4],
            alarm_event: buf[5],
            left_count: BigEndian::read_u24(&buf[6..9]),
            right_count: BigEndian::read_u24(&buf[9..12]),
            infrared_status: buf[12],
            command_execution,
            power_supply_voltage: buf[14],
            checksum_ok,
        })
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResponseFrame(machine=0x{:02X}, gate=0x{:02X}, left={}, right={})",
            self.machine_number, self.gate_status, self.left_count, self.right_count
        )
    }
}

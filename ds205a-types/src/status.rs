//! Device status structures

use std::fmt;

/// Decoded device status, projected from a status response frame
///
/// Single-byte fields are kept as the raw codes the device reports; the
/// pedestrian counters are 24-bit on the wire and widened to `u32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
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

    /// Infrared sensor status
    pub infrared_status: u8,

    /// Power supply voltage reading
    pub power_supply_voltage: u8,

    /// Left pedestrian counter
    pub left_pedestrian_count: u32,

    /// Right pedestrian counter
    pub right_pedestrian_count: u32,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status[machine: 0x{:02X}, gate: 0x{:02X}, fault: 0x{:02X}, alarm: 0x{:02X}, left: {}, right: {}]",
            self.machine_number,
            self.gate_status,
            self.fault_event,
            self.alarm_event,
            self.left_pedestrian_count,
            self.right_pedestrian_count
        )
    }
}

/// Direction of a passage through the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassageDirection {
    /// No passage in progress
    #[default]
    None,
    /// Entry (left side)
    Entry,
    /// Exit (right side)
    Exit,
}

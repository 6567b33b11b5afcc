//! Device information structures

use std::fmt;

/// Basic device identity, projected from a status response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Machine number on the bus
    pub machine_number: u8,

    /// Firmware version number
    pub version_number: u8,
}

impl DeviceInfo {
    pub fn new(machine_number: u8, version_number: u8) -> Self {
        Self {
            machine_number,
            version_number,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[machine: 0x{:02X}, version: {}]",
            self.machine_number, self.version_number
        )
    }
}

//! Type definitions for the DS205A driver

pub mod device_info;
pub mod status;

pub use device_info::DeviceInfo;
pub use status::{DeviceStatus, PassageDirection};

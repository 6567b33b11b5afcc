//! Protocol constants

/// Header byte of an outbound command frame
pub const COMMAND_HEADER: u8 = 0x7E;

/// Header byte of an inbound response frame
pub const RESPONSE_HEADER: u8 = 0x7F;

/// Fixed size of a command frame in bytes
pub const COMMAND_FRAME_SIZE: usize = 8;

/// Fixed size of a response frame in bytes
pub const RESPONSE_FRAME_SIZE: usize = 18;

/// Maximum number of data bytes a command frame carries
pub const MAX_COMMAND_DATA: usize = 3;

/// Value of the command-execution byte on success
pub const EXECUTION_SUCCESS: u8 = 0x55;

/// Confirmation byte the RestartDevice command requires as data0
pub const RESTART_CONFIRM: u8 = 0x60;

/// Reserved byte following the command header (always zero)
pub const COMMAND_RESERVED: u8 = 0x00;

/// Offset of the command-execution byte in a response frame
pub const EXECUTION_OFFSET: usize = 13;

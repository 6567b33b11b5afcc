//! DS205A command code definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes
///
/// One byte per command, from the DS205A communication manual.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    /// Query device status
    GetStatus = 0x10,

    /// Reset left-side pedestrian counters
    ResetLeftCounters = 0x20,

    /// Reset right-side pedestrian counters
    ResetRightCounters = 0x21,

    /// Restart the device (requires confirmation byte 0x60 as data0)
    RestartDevice = 0x35,

    /// Open left passage (data0 = value)
    LeftOpen = 0x80,

    /// Hold left passage permanently open
    LeftAlwaysOpen = 0x81,

    /// Open right passage (data0 = value)
    RightOpen = 0x82,

    /// Hold right passage permanently open
    RightAlwaysOpen = 0x83,

    /// Close the gate
    CloseGate = 0x84,

    /// Forbid passage through the left side
    ForbidLeftPassage = 0x88,

    /// Forbid passage through the right side
    ForbidRightPassage = 0x89,

    /// Lift all passage restrictions
    DisableRestrictions = 0x8F,

    /// Set device parameters (data0 = value)
    SetParameters = 0x96,
}

impl CommandCode {
    /// Human-readable command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStatus => "GetStatus",
            Self::ResetLeftCounters => "ResetLeftCounters",
            Self::ResetRightCounters => "ResetRightCounters",
            Self::RestartDevice => "RestartDevice",
            Self::LeftOpen => "LeftOpen",
            Self::LeftAlwaysOpen => "LeftAlwaysOpen",
            Self::RightOpen => "RightOpen",
            Self::RightAlwaysOpen => "RightAlwaysOpen",
            Self::CloseGate => "CloseGate",
            Self::ForbidLeftPassage => "ForbidLeftPassage",
            Self::ForbidRightPassage => "ForbidRightPassage",
            Self::DisableRestrictions => "DisableRestrictions",
            Self::SetParameters => "SetParameters",
        }
    }
}

impl From<CommandCode> for u8 {
    fn from(cmd: CommandCode) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for CommandCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x10 => Ok(Self::GetStatus),
            0x20 => Ok(Self::ResetLeftCounters),
            0x21 => Ok(Self::ResetRightCounters),
            0x35 => Ok(Self::RestartDevice),
            0x80 => Ok(Self::LeftOpen),
            0x81 => Ok(Self::LeftAlwaysOpen),
            0x82 => Ok(Self::RightOpen),
            0x83 => Ok(Self::RightAlwaysOpen),
            0x84 => Ok(Self::CloseGate),
            0x88 => Ok(Self::ForbidLeftPassage),
            0x89 => Ok(Self::ForbidRightPassage),
            0x8F => Ok(Self::DisableRestrictions),
            0x96 => Ok(Self::SetParameters),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_conversion() {
        assert_eq!(u8::from(CommandCode::GetStatus), 0x10);
        assert_eq!(CommandCode::try_from(0x10).unwrap(), CommandCode::GetStatus);
        assert_eq!(u8::from(CommandCode::SetParameters), 0x96);
        assert_eq!(
            CommandCode::try_from(0x8F).unwrap(),
            CommandCode::DisableRestrictions
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            CommandCode::try_from(0x42),
            Err(Error::UnknownCommand(0x42))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(CommandCode::LeftOpen.to_string(), "LeftOpen(0x80)");
    }
}

//! # ds205a-core
//!
//! Core protocol implementation for the DS205A turnstile gate.
//!
//! This crate provides the low-level protocol primitives:
//! - Command and response frame encoding/decoding
//! - Checksum calculation (TX and RX algorithms)
//! - Command code definitions
//! - Protocol constants
//!
//! The codec is pure: no I/O happens here. Everything that talks to a
//! serial port lives in `ds205a-transport` and `ds205a`.

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;

pub use command::CommandCode;
pub use error::{Error, Result};
pub use frame::{CommandFrame, ResponseFrame};

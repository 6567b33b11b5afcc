//! DS205A checksum algorithms
//!
//! The protocol uses two different checks:
//!
//! - **TX**: sum the covered bytes modulo 256 and take the ones-complement.
//!   Appended to every outbound command frame over bytes 1..=6.
//! - **RX**: sum every byte after the header, add one; a correct frame sums
//!   to zero. Computed on inbound frames for diagnostics only — the
//!   command-execution byte, not the checksum, decides success.

use tracing::trace;

/// Calculate the transmit checksum over `bytes`.
///
/// # Algorithm
///
/// ```text
/// 1. Sum all bytes with wrapping (mod 256) arithmetic
/// 2. Return the ones-complement: !sum
/// ```
///
/// # Examples
///
/// ```
/// use ds205a_core::checksum;
///
/// let cksum = checksum::transmit(&[0x00, 0x01, 0x10, 0x00, 0x00, 0x00]);
/// assert_eq!(cksum, !0x11u8);
/// ```
pub fn transmit(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    let checksum = !sum;

    trace!(
        covered = bytes.len(),
        checksum = format!("0x{:02X}", checksum),
        "Calculated TX checksum"
    );

    checksum
}

/// Verify the receive checksum over `bytes` (everything after the header,
/// checksum byte included).
///
/// A correct frame satisfies `sum(bytes) + 1 == 0` in mod-256 arithmetic.
pub fn verify_receive(bytes: &[u8]) -> bool {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    sum.wrapping_add(1) == 0
}

//! Key to hash slot mapping.
//!
//! Uses CRC16/XMODEM (polynomial 0x1021, initial value 0) over the raw key
//! bytes, reduced modulo [`TOTAL_SLOTS`]. This is the checksum Valkey and Redis
//! use for cluster routing, so the slot printed here matches
//! `CLUSTER KEYSLOT` for the same key.
//!
//! Hash tags (`{...}` sections that narrow the hashed portion of a key) are
//! not interpreted: the whole key is always hashed. None of the keys this
//! crate writes contain braces.

use crc16::{State, XMODEM};

use super::distribution::TOTAL_SLOTS;

/// CRC16/XMODEM checksum of `data`.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    State::<XMODEM>::calculate(data)
}

/// Hash slot for raw key bytes.
pub fn key_slot_bytes(key: &[u8]) -> u16 {
    crc16_xmodem(key) % TOTAL_SLOTS
}

/// Hash slot for a string key, in `[0, 16384)`.
///
/// # Examples
///
/// ```
/// use booking_migrator::slots::key_slot;
///
/// assert_eq!(key_slot("foo"), 12182);
/// assert_eq!(key_slot(""), 0);
/// ```
pub fn key_slot(key: &str) -> u16 {
    key_slot_bytes(key.as_bytes())
}

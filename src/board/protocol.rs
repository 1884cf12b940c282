//! # Balance Board Report Protocol
//!
//! Wire-level constants and report parsing for the Balance Board HID
//! protocol.
//!
//! ## Outgoing reports
//!
//! | Report | Bytes | Description |
//! |--------|-------|-------------|
//! | Read calibration | `17 04 A4 00 20 00 20` | Read 0x20 bytes of board memory at 0xA40020 |
//! | Set data mode | `12 00 32` | Start streaming 0x32 sensor reports |
//! | Set LED | `11 xx` | Player-1 LED, payload 0x10 on / 0x00 off |
//!
//! ## Incoming reports
//!
//! Memory-read responses arrive as type `0x21`: a status byte whose low
//! nibble is an error code, a big-endian 16-bit address, and 16 payload
//! bytes. The calibration read yields two such blocks, at addresses 0x0020
//! and 0x0030.
//!
//! Sensor data arrives as type `0x32`: four big-endian signed 16-bit load
//! cell values in quadrant order **top-right, bottom-right, top-left,
//! bottom-left**. That order is fixed; the calibration decode uses the same
//! order so raw values and calibration points always line up.

/// Nintendo vendor ID
pub const NINTENDO_VID: u16 = 0x057e;

/// Balance Board product ID (reports as a Wiimote)
pub const BALANCE_BOARD_PID: u16 = 0x0306;

/// Incoming HID report length
pub const REPORT_LEN: usize = 64;

/// Memory-read response report type
pub const REPORT_TYPE_MEMORY_READ: u8 = 0x21;

/// Streaming sensor data report type
pub const REPORT_TYPE_SENSOR_DATA: u8 = 0x32;

/// Command to read the 32-byte factory calibration block
pub const READ_CALIBRATION_CMD: [u8; 7] = [0x17, 0x04, 0xA4, 0x00, 0x20, 0x00, 0x20];

/// Command to start streaming sensor reports
pub const SET_DATA_MODE_CMD: [u8; 3] = [0x12, 0x00, 0x32];

/// LED report type byte
pub const SET_LED_REPORT: u8 = 0x11;

/// LED payload for "on"
pub const LED_ON: u8 = 0x10;

/// LED payload for "off"
pub const LED_OFF: u8 = 0x00;

/// Address of the first calibration block
pub const CALIBRATION_BLOCK_LOW: u16 = 0x0020;

/// Address of the second calibration block
pub const CALIBRATION_BLOCK_HIGH: u16 = 0x0030;

/// Payload size of one memory-read block
pub const MEMORY_BLOCK_LEN: usize = 16;

/// Size of the assembled calibration blob (two blocks)
pub const CALIBRATION_BLOB_LEN: usize = 2 * MEMORY_BLOCK_LEN;

/// One 16-byte block of a memory-read response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    /// Low 16 bits of the source address.
    pub address: u16,
    /// Error code from the status byte's low nibble (0 = success).
    pub error: u8,
    /// Payload bytes.
    pub data: [u8; MEMORY_BLOCK_LEN],
}

/// Read a big-endian signed 16-bit value at `offset`.
#[inline]
pub fn read_s16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

/// Parse a streaming sensor report into four raw load cell values.
///
/// Returns `None` for any report that is not a complete `0x32` sensor
/// report; other report types the board emits are silently ignored.
///
/// # Examples
///
/// ```
/// use balance_bridge::board::protocol::parse_sensor_report;
///
/// let mut report = [0u8; 64];
/// report[0] = 0x32;
/// report[3] = 0x01; // top-right = 256
/// assert_eq!(parse_sensor_report(&report), Some([256, 0, 0, 0]));
///
/// report[0] = 0x21; // not a sensor report
/// assert_eq!(parse_sensor_report(&report), None);
/// ```
#[must_use]
pub fn parse_sensor_report(data: &[u8]) -> Option<[i16; 4]> {
    if data.len() < 11 || data[0] != REPORT_TYPE_SENSOR_DATA {
        return None;
    }

    let top_right = read_s16(data, 3);
    let bottom_right = read_s16(data, 5);
    let top_left = read_s16(data, 7);
    let bottom_left = read_s16(data, 9);

    Some([top_right, bottom_right, top_left, bottom_left])
}

/// Parse a memory-read response report.
///
/// Returns `None` for any report that is not a complete `0x21` memory-read
/// response. The error nibble is returned as-is; the caller decides whether
/// a non-zero code aborts the read.
#[must_use]
pub fn parse_memory_report(data: &[u8]) -> Option<MemoryBlock> {
    if data.len() < 6 + MEMORY_BLOCK_LEN || data[0] != REPORT_TYPE_MEMORY_READ {
        return None;
    }

    let error = data[3] & 0x0F;
    let address = u16::from_be_bytes([data[4], data[5]]);

    let mut block = [0u8; MEMORY_BLOCK_LEN];
    block.copy_from_slice(&data[6..6 + MEMORY_BLOCK_LEN]);

    Some(MemoryBlock {
        address,
        error,
        data: block,
    })
}

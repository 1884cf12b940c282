//! Trait abstraction for the board's HID channel to enable testing

use std::io;

use hidapi::HidApi;
use tracing::{debug, info};

use super::protocol::{BALANCE_BOARD_PID, NINTENDO_VID};
use crate::error::{BalanceBridgeError, Result};

/// Trait for duplex report I/O with the board
///
/// `read_timeout` returns `Ok(0)` when no report arrived within the
/// timeout; that is not an error, the caller simply polls again.
pub trait BoardChannel: Send {
    /// Write one outgoing report
    fn write(&mut self, report: &[u8]) -> io::Result<()>;

    /// Read one incoming report into `buf`, waiting at most `timeout_ms`.
    /// Returns the number of bytes read, 0 on timeout.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> io::Result<usize>;
}

/// HID-backed channel to a real Balance Board
pub struct HidBoardChannel {
    device: hidapi::HidDevice,
}

impl std::fmt::Debug for HidBoardChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidBoardChannel").finish_non_exhaustive()
    }
}

impl HidBoardChannel {
    /// Open the first Balance Board on the system
    ///
    /// # Errors
    ///
    /// Returns [`BalanceBridgeError::Connection`] if the HID subsystem is
    /// unavailable or no board is connected (not found, busy, or permission
    /// denied). The caller decides whether to rescan; there is no retry here.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use balance_bridge::board::channel::HidBoardChannel;
    ///
    /// let channel = HidBoardChannel::open()?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| BalanceBridgeError::Connection(format!("HID init failed: {}", e)))?;

        debug!(
            "Opening Balance Board (vendor 0x{:04x}, product 0x{:04x})",
            NINTENDO_VID, BALANCE_BOARD_PID
        );

        let device = api
            .open(NINTENDO_VID, BALANCE_BOARD_PID)
            .map_err(|e| BalanceBridgeError::Connection(format!("Failed to open board: {}", e)))?;

        info!("Connected to Balance Board");
        Ok(Self { device })
    }
}

impl BoardChannel for HidBoardChannel {
    fn write(&mut self, report: &[u8]) -> io::Result<()> {
        self.device
            .write(report)
            .map(|_| ())
            .map_err(io::Error::other)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> io::Result<usize> {
        self.device
            .read_timeout(buf, timeout_ms)
            .map_err(io::Error::other)
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::{MockBoardChannel, MockRead};
    use super::*;

    #[test]
    fn test_mock_records_writes() {
        let mut channel = MockBoardChannel::new();
        channel.write(&[0x11, 0x10]).unwrap();
        channel.write(&[0x12, 0x00, 0x32]).unwrap();

        let written = channel.written_reports();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0], vec![0x11, 0x10]);
    }

    #[test]
    fn test_mock_scripted_reads_in_order() {
        let mut channel = MockBoardChannel::new();
        channel.push_report(&[0x32, 0, 0]);
        channel.push_read(MockRead::Timeout);
        channel.push_report(&[0x21, 0, 0]);

        let mut buf = [0u8; 64];
        assert_eq!(channel.read_timeout(&mut buf, 20).unwrap(), 3);
        assert_eq!(buf[0], 0x32);
        assert_eq!(channel.read_timeout(&mut buf, 20).unwrap(), 0);
        assert_eq!(channel.read_timeout(&mut buf, 20).unwrap(), 3);
        assert_eq!(buf[0], 0x21);
    }

    #[test]
    fn test_mock_exhausted_script_times_out() {
        let mut channel = MockBoardChannel::new();
        let mut buf = [0u8; 64];
        assert_eq!(channel.read_timeout(&mut buf, 20).unwrap(), 0);
    }

    #[test]
    fn test_mock_read_error() {
        let mut channel = MockBoardChannel::new();
        channel.push_read(MockRead::Error(io::ErrorKind::BrokenPipe));

        let mut buf = [0u8; 64];
        let err = channel.read_timeout(&mut buf, 20).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_mock_write_error() {
        let mut channel = MockBoardChannel::new();
        channel.set_write_error(io::ErrorKind::PermissionDenied);
        assert!(channel.write(&[0x11, 0x10]).is_err());
    }
}

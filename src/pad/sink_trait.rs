//! Trait abstraction for the virtual pad to enable testing

use crate::error::Result;
use crate::mapping::actions::{DpadDirection, GamepadButton};

/// Trait for virtual gamepad output operations
///
/// Press/release and stick operations queue state; nothing reaches the host
/// until [`ControllerSink::commit`] flushes the batch. Commits are
/// fire-and-forget: callers do not wait for acknowledgement.
pub trait ControllerSink {
    /// Queue a button press
    fn press_button(&mut self, button: GamepadButton) -> Result<()>;

    /// Queue a button release
    fn release_button(&mut self, button: GamepadButton) -> Result<()>;

    /// Queue a d-pad direction press
    fn press_dpad(&mut self, direction: DpadDirection) -> Result<()>;

    /// Queue a d-pad direction release
    fn release_dpad(&mut self, direction: DpadDirection) -> Result<()>;

    /// Queue the stick axes (+x right, +y toward the top edge)
    fn set_stick(&mut self, x: i16, y: i16) -> Result<()>;

    /// Flush all queued operations as one batch
    fn commit(&mut self) -> Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::BalanceBridgeError;
    use std::sync::{Arc, Mutex};

    /// One recorded sink operation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SinkOp {
        Press(GamepadButton),
        Release(GamepadButton),
        PressDpad(DpadDirection),
        ReleaseDpad(DpadDirection),
        Stick(i16, i16),
        Commit,
    }

    /// Mock sink recording the full operation stream
    #[derive(Clone)]
    pub struct MockSink {
        pub ops: Arc<Mutex<Vec<SinkOp>>>,
        pub fail: Arc<Mutex<bool>>,
    }

    impl MockSink {
        pub fn new() -> Self {
            Self {
                ops: Arc::new(Mutex::new(Vec::new())),
                fail: Arc::new(Mutex::new(false)),
            }
        }

        pub fn ops(&self) -> Vec<SinkOp> {
            self.ops.lock().unwrap().clone()
        }

        /// Operations recorded since the last call, draining the log.
        pub fn take_ops(&self) -> Vec<SinkOp> {
            std::mem::take(&mut *self.ops.lock().unwrap())
        }

        pub fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn record(&self, op: SinkOp) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(BalanceBridgeError::Sink("mock sink failure".to_string()));
            }
            self.ops.lock().unwrap().push(op);
            Ok(())
        }
    }

    impl ControllerSink for MockSink {
        fn press_button(&mut self, button: GamepadButton) -> Result<()> {
            self.record(SinkOp::Press(button))
        }

        fn release_button(&mut self, button: GamepadButton) -> Result<()> {
            self.record(SinkOp::Release(button))
        }

        fn press_dpad(&mut self, direction: DpadDirection) -> Result<()> {
            self.record(SinkOp::PressDpad(direction))
        }

        fn release_dpad(&mut self, direction: DpadDirection) -> Result<()> {
            self.record(SinkOp::ReleaseDpad(direction))
        }

        fn set_stick(&mut self, x: i16, y: i16) -> Result<()> {
            self.record(SinkOp::Stick(x, y))
        }

        fn commit(&mut self) -> Result<()> {
            self.record(SinkOp::Commit)
        }
    }
}

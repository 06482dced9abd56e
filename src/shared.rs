//! Serialized access to one display from several execution contexts.
//!
//! Every operation on the display is a sequence of expander writes that must not be
//! interleaved with another operation's writes. `SharedDisplay` runs each operation
//! inside a critical section, which makes it usable from interrupt handlers and from
//! multiple cores alike. Operations should therefore stay short: a full content update
//! is 136 bus writes.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::{delay::DelayNs, i2c};

use crate::{command::Command, CharacterDisplayError, DisplayHandle};

pub struct SharedDisplay<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    inner: Mutex<RefCell<DisplayHandle<I2C, DELAY>>>,
}

impl<I2C, DELAY> SharedDisplay<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    pub const fn new(display: DisplayHandle<I2C, DELAY>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(display)),
        }
    }

    /// Runs `f` with exclusive access to the display. Calling `lock` again from inside
    /// `f` panics.
    pub fn lock<R>(&self, f: impl FnOnce(&mut DisplayHandle<I2C, DELAY>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn execute(&self, command: &Command<'_>) -> Result<(), CharacterDisplayError<I2C>> {
        self.lock(|display| display.execute(command))
    }

    pub fn into_inner(self) -> DisplayHandle<I2C, DELAY> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::{test_support::RecordingBus, ShiftDirection};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_shared_execute() {
        let shared = SharedDisplay::new(DisplayHandle::new(RecordingBus::new(), NoopDelay::new()));
        assert_eq!(
            shared.execute(&Command::Home),
            Err(CharacterDisplayError::NotInitialized)
        );
        shared.lock(|lcd| lcd.init().map(|_| ())).unwrap();
        shared
            .execute(&Command::WriteContent(b"shared\ndisplay"))
            .unwrap();
        shared.execute(&Command::Shift(ShiftDirection::Right)).unwrap();

        let mut lcd = shared.into_inner();
        assert_eq!(&lcd.state().display_buffer[1], b"display         ");
        // init, content, shift
        assert_eq!(lcd.i2c().writes().len(), 28 + 34 * 4 + 4);
    }

    #[test]
    fn test_operations_do_not_interleave() {
        let shared = SharedDisplay::new(DisplayHandle::new(RecordingBus::new(), NoopDelay::new()));
        shared.lock(|lcd| lcd.init().map(|_| ())).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..10 {
                    shared.execute(&Command::WriteContent(b"aaaa\nbbbb")).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..10 {
                    shared.execute(&Command::SetBacklight(false)).unwrap();
                    shared.execute(&Command::SetBacklight(true)).unwrap();
                }
            });
        });

        let mut lcd = shared.into_inner();
        let writes = lcd.i2c().writes();
        let content = &writes[28..];
        // every content update is an unbroken run of 136 writes between raw backlight bytes
        let mut run = 0;
        for &byte in content {
            if byte == 0xF0 || byte == 0xF8 {
                assert_eq!(run % 136, 0);
                run = 0;
            } else {
                run += 1;
            }
        }
        assert_eq!(run % 136, 0);
    }
}

//! This Rust `embedded-hal`-based library drives a 2x16 [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible character display that is attached through a PCF8574 I2C GPIO expander (the ubiquitous "I2C backpack") in a
//! `no_std` environment. The expander's P4-P7 pins carry the display's 4-bit data bus, P0-P3 carry RS, RW, Enable and the
//! backlight transistor.
//!
//! The PCF8574 cannot update a single pin and this driver never reads it back, so the driver keeps a shadow copy of
//! the display state (backlight, cursor, blink, display on/off, cursor position and the text last written) and
//! re-sends the complete expander byte on every bus write.
//!
//! Key features include:
//! - Flicker free two line content updates (lines are space padded instead of using the clear command)
//! - Cursor, blink, display and backlight control
//! - Display shifting and custom characters
//! - A symbolic command set (`Command`) for building control surfaces, including decoding of the legacy
//!   attribute-file payloads
//! - A critical-section based `SharedDisplay` for using one display from several contexts
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt` and `ufmt` logging frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! lcd-hdpcf = { version = "0.1", features = ["defmt"] }
//! ```
//! The `features = ["defmt"]` line is optional and enables the `defmt` feature, which allows the library's errors to be used with the `defmt` logging
//! framework. Another optional feature is `features = ["ufmt"]`, which enables `ufmt::uDisplay` for the error types.
//! Diagnostics are emitted through the `log` facade.
//!
//! Create and initialize the display:
//! ```rust
//! use lcd_hdpcf::DisplayHandle;
//!
//! // board setup
//! let i2c = ...; // I2C peripheral
//! let delay = ...; // DelayNs implementation
//!
//! let mut lcd = DisplayHandle::new(i2c, delay);
//! if let Err(e) = lcd.init() {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! lcd.write_content(b"Hello,\nworld!")?;
//! lcd.set_cursor_visible(false)?.set_backlight(true)?;
//! ```
//! Each method returns a `Result` that wraps the display object in `Ok()`, allowing for easy chaining of commands.
//!
//! ### Control surfaces
//! Every operation is also reachable through the `Command` enum, which validates its payload before any bus activity:
//! ```rust
//! use lcd_hdpcf::{Command, ShiftDirection};
//!
//! lcd.execute(&Command::WriteContent(b"12:00\nready"))?;
//! lcd.execute(&Command::Shift(ShiftDirection::Left))?;
//! ```
//! When the display is used from more than one execution context, wrap it in a `SharedDisplay` so that the nibble
//! sequences of two operations can never interleave on the bus.
//!
#![no_std]
#![allow(non_upper_case_globals)]
use core::fmt::Display;

use embedded_hal::{delay::DelayNs, i2c};

mod bit_configurations;
mod command;
mod config;
mod driver;
mod shared;
#[cfg(test)]
mod test_support;

pub use bit_configurations::LineBits;
pub use command::{Attribute, Command, LcdState, PayloadError};
pub use config::{DisplayConfig, DEFAULT_I2C_ADDRESS};
pub use driver::{
    hd44780::{ShiftDirection, CGRAM_SLOTS, MAX_CONTENT_LEN},
    sequencer::InitStep,
    state::{DeviceState, DisplayFlags, Row, LCD_COLS, LCD_ROWS},
    TransferMode, Transmitter,
};
pub use shared::SharedDisplay;

#[derive(Debug, PartialEq, Copy, Clone)]
/// Errors that can occur when driving the display
pub enum CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    /// I2C error returned from the underlying I2C implementation. The operation was
    /// aborted at the failing write; earlier writes may already have reached the display.
    BusError(I2C::Error),
    /// Content exceeds two lines of 16 characters plus two line breaks
    TooLong,
    /// Custom character address outside of 0..=7
    InvalidAddress,
    /// The power-on sequence failed, the display was not made available
    InitFailed {
        step: InitStep,
        cause: I2C::Error,
    },
    /// An operation was attempted before a successful `init`
    NotInitialized,
    /// A control surface write carried no bytes
    EmptyPayload,
}

impl<I2C> From<PayloadError> for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::TooLong => CharacterDisplayError::TooLong,
            PayloadError::InvalidAddress => CharacterDisplayError::InvalidAddress,
            PayloadError::Empty => CharacterDisplayError::EmptyPayload,
        }
    }
}

impl<I2C> From<&CharacterDisplayError<I2C>> for &'static str
where
    I2C: i2c::I2c,
{
    fn from(err: &CharacterDisplayError<I2C>) -> Self {
        match err {
            CharacterDisplayError::BusError(_) => "I2C bus error",
            CharacterDisplayError::TooLong => "Content too long",
            CharacterDisplayError::InvalidAddress => "Invalid CGRAM address",
            CharacterDisplayError::InitFailed { .. } => "Initialization failed",
            CharacterDisplayError::NotInitialized => "Display not initialized",
            CharacterDisplayError::EmptyPayload => "Empty payload",
        }
    }
}

#[cfg(feature = "defmt")]
impl<I2C> defmt::Format for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CharacterDisplayError::InitFailed { step, .. } => {
                defmt::write!(fmt, "Initialization failed at {}", step)
            }
            _ => {
                let msg: &'static str = From::from(self);
                defmt::write!(fmt, "{}", msg);
            }
        }
    }
}

#[cfg(feature = "ufmt")]
impl<I2C> ufmt::uDisplay for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match self {
            CharacterDisplayError::InitFailed { step, .. } => {
                ufmt::uwrite!(w, "Initialization failed at {}", step)
            }
            _ => {
                let msg: &'static str = From::from(self);
                ufmt::uwrite!(w, "{}", msg)
            }
        }
    }
}

impl<I2C> Display for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CharacterDisplayError::InitFailed { step, cause } => {
                write!(f, "Initialization failed at {}: {:?}", step, cause)
            }
            _ => {
                let msg: &'static str = From::from(self);
                write!(f, "{}", msg)
            }
        }
    }
}

/// One attached display: the expander bus, the delay provider and the shadow device
/// state. Nothing is global, several displays on different addresses each get their
/// own handle.
pub struct DisplayHandle<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    device: driver::hd44780::Hd44780<I2C, DELAY>,
    ready: bool,
}

impl<I2C, DELAY> DisplayHandle<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Create a new display object with the default I2C address and settings.
    pub fn new(i2c: I2C, delay: DELAY) -> Self {
        Self::with_config(i2c, delay, DisplayConfig::default())
    }

    /// Create a new display object with a specific I2C address for the expander.
    pub fn new_with_address(i2c: I2C, address: u8, delay: DELAY) -> Self {
        Self::with_config(i2c, delay, DisplayConfig::default().with_address(address))
    }

    /// Create a new display object with explicit attach-time settings.
    pub fn with_config(i2c: I2C, delay: DELAY, config: DisplayConfig) -> Self {
        Self {
            device: driver::hd44780::Hd44780::new(i2c, delay, &config),
            ready: false,
        }
    }

    /// Initialize the display. This must succeed before any other operation is accepted.
    pub fn init(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ready = false;
        self.device.init()?;
        self.ready = true;
        log::debug!("lcd at {:#04x} ready", self.device.address());
        Ok(self)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The shadow copy of the display state
    pub fn state(&self) -> &DeviceState {
        self.device.state()
    }

    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// Blanks the display, turns the backlight off and hands back the bus and delay.
    /// Teardown is best effort: failures are logged and never prevent the release.
    pub fn detach(mut self) -> (I2C, DELAY) {
        if self.ready {
            if !self.device.teardown() {
                log::warn!("lcd at {:#04x} detached uncleanly", self.device.address());
            }
            self.ready = false;
        }
        log::debug!("lcd at {:#04x} detached", self.device.address());
        self.device.release()
    }

    /// returns a reference to the I2C peripheral. mostly needed for testing
    #[cfg(test)]
    fn i2c(&mut self) -> &mut I2C {
        self.device.i2c()
    }

    fn ensure_ready(&self) -> Result<(), CharacterDisplayError<I2C>> {
        if self.ready {
            Ok(())
        } else {
            Err(CharacterDisplayError::NotInitialized)
        }
    }

    //--------------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //--------------------------------------------------------------------------------------------------

    /// Write up to two `\n` separated lines (at most 34 bytes) and return the cursor home.
    pub fn write_content(&mut self, text: &[u8]) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.write_content(text)?;
        Ok(self)
    }

    /// Write two full rows in one go.
    pub fn update_display(
        &mut self,
        rows: &[Row; LCD_ROWS],
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.update_display(rows)?;
        Ok(self)
    }

    /// Turn the backlight on or off
    pub fn set_backlight(&mut self, on: bool) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.set_backlight(on)?;
        Ok(self)
    }

    /// Set the cursor visibility.
    pub fn set_cursor_visible(
        &mut self,
        visible: bool,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.set_cursor_visible(visible)?;
        Ok(self)
    }

    /// Set the cursor blinking.
    pub fn set_cursor_blink(&mut self, blink: bool) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.set_cursor_blink(blink)?;
        Ok(self)
    }

    /// Set the display visibility.
    pub fn set_display_on(&mut self, on: bool) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.set_display_on(on)?;
        Ok(self)
    }

    /// Set cursor, blink, display and backlight together.
    pub fn update_state(
        &mut self,
        flags: DisplayFlags,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.update_state(flags)?;
        Ok(self)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.clear()?;
        Ok(self)
    }

    /// Set the cursor position. Out of range values saturate to the last column or row.
    pub fn goto_xy(&mut self, x: u8, y: u8) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.goto_xy(x, y)?;
        Ok(self)
    }

    /// Set the cursor to the home position.
    pub fn home(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.home()?;
        Ok(self)
    }

    /// Shift the display contents one position.
    pub fn shift(
        &mut self,
        direction: ShiftDirection,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.shift(direction)?;
        Ok(self)
    }

    /// Create a new custom character.
    pub fn set_custom_char(
        &mut self,
        address: u8,
        glyph: [u8; 8],
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.device.set_custom_char(address, glyph)?;
        Ok(self)
    }
}

//! Symbolic commands for control surfaces.
//!
//! A `Command` carries one request together with its payload. Payloads are checked by
//! [`Command::validate`] before any bus activity, so a rejected command never touches the
//! display. [`Attribute`] decodes the byte payloads of the legacy per-attribute control
//! files (`backlight`, `content`, `cursor_state`, ...) into commands.

use embedded_hal::{delay::DelayNs, i2c};

use crate::{
    driver::{
        hd44780::{compose_rows, ShiftDirection, CGRAM_SLOTS, MAX_CONTENT_LEN},
        state::{DisplayFlags, Row, LCD_ROWS},
    },
    CharacterDisplayError, DisplayHandle,
};

/// Payload rejected before reaching the display
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum PayloadError {
    TooLong,
    InvalidAddress,
    Empty,
}

impl From<&PayloadError> for &'static str {
    fn from(err: &PayloadError) -> Self {
        match err {
            PayloadError::TooLong => "Content too long",
            PayloadError::InvalidAddress => "Invalid CGRAM address",
            PayloadError::Empty => "Empty payload",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PayloadError {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for PayloadError {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl core::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

/// Full display snapshot used by [`Command::UpdateDisplay`]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LcdState {
    pub rows: [Row; LCD_ROWS],
    pub flags: DisplayFlags,
}

impl LcdState {
    /// Lays out `text` the same way `write_content` does.
    pub fn from_text(text: &[u8], flags: DisplayFlags) -> Result<Self, PayloadError> {
        if text.len() > MAX_CONTENT_LEN {
            return Err(PayloadError::TooLong);
        }
        Ok(Self {
            rows: compose_rows(text),
            flags,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command<'a> {
    SetBacklight(bool),
    WriteContent(&'a [u8]),
    SetCursorVisible(bool),
    SetCursorBlink(bool),
    SetDisplayOn(bool),
    Clear,
    UpdateDisplay(LcdState),
    Home,
    Shift(ShiftDirection),
    SetCustomChar { address: u8, glyph: [u8; 8] },
}

impl Command<'_> {
    pub fn validate(&self) -> Result<(), PayloadError> {
        match self {
            Command::WriteContent(text) if text.len() > MAX_CONTENT_LEN => {
                Err(PayloadError::TooLong)
            }
            Command::SetCustomChar { address, .. } if *address >= CGRAM_SLOTS => {
                Err(PayloadError::InvalidAddress)
            }
            _ => Ok(()),
        }
    }
}

/// The named control attributes of the legacy attribute-file surface
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    Backlight,
    Content,
    CursorState,
    CursorBlink,
    DisplayState,
    DisplayClear,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Backlight,
        Attribute::Content,
        Attribute::CursorState,
        Attribute::CursorBlink,
        Attribute::DisplayState,
        Attribute::DisplayClear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Backlight => "backlight",
            Attribute::Content => "content",
            Attribute::CursorState => "cursor_state",
            Attribute::CursorBlink => "cursor_blink",
            Attribute::DisplayState => "display_state",
            Attribute::DisplayClear => "display_clear",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attribute| attribute.name() == name)
    }

    /// Decodes a payload written to this attribute. Flag attributes read only the first
    /// byte: `0` or `'0'` means off, anything else on. `display_clear` with an off value
    /// is accepted and does nothing, hence `Ok(None)`.
    pub fn parse(self, buf: &[u8]) -> Result<Option<Command<'_>>, PayloadError> {
        let command = match self {
            Attribute::Content => {
                if buf.is_empty() {
                    return Err(PayloadError::Empty);
                }
                let command = Command::WriteContent(buf);
                command.validate()?;
                command
            }
            Attribute::Backlight => Command::SetBacklight(parse_flag(buf)?),
            Attribute::CursorState => Command::SetCursorVisible(parse_flag(buf)?),
            Attribute::CursorBlink => Command::SetCursorBlink(parse_flag(buf)?),
            Attribute::DisplayState => Command::SetDisplayOn(parse_flag(buf)?),
            Attribute::DisplayClear => {
                if !parse_flag(buf)? {
                    return Ok(None);
                }
                Command::Clear
            }
        };
        Ok(Some(command))
    }
}

fn parse_flag(buf: &[u8]) -> Result<bool, PayloadError> {
    match buf.first() {
        None => Err(PayloadError::Empty),
        Some(0) | Some(b'0') => Ok(false),
        Some(_) => Ok(true),
    }
}

impl<I2C, DELAY> DisplayHandle<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Validates and runs one command. `UpdateDisplay` applies its flags before its rows.
    pub fn execute(&mut self, command: &Command<'_>) -> Result<(), CharacterDisplayError<I2C>> {
        command.validate()?;
        log::trace!("lcd at {:#04x}: {:?}", self.address(), command);
        match *command {
            Command::SetBacklight(on) => self.set_backlight(on),
            Command::WriteContent(text) => self.write_content(text),
            Command::SetCursorVisible(visible) => self.set_cursor_visible(visible),
            Command::SetCursorBlink(blink) => self.set_cursor_blink(blink),
            Command::SetDisplayOn(on) => self.set_display_on(on),
            Command::Clear => self.clear(),
            Command::UpdateDisplay(ref snapshot) => self
                .update_state(snapshot.flags)
                .and_then(|lcd| lcd.update_display(&snapshot.rows)),
            Command::Home => self.home(),
            Command::Shift(direction) => self.shift(direction),
            Command::SetCustomChar { address, glyph } => self.set_custom_char(address, glyph),
        }
        .map(|_| ())
    }
}

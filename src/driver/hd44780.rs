// HD44780 display operations
// `Hd44780` owns the expander bus, the delay provider and the shadow `DeviceState`.
// Every operation stages its state change, performs the bus transfers and commits the
// new state only once all of them succeeded. Physical writes that happened before a
// failure are not rolled back; the display may then differ from the shadow state.

use embedded_hal::{delay::DelayNs, i2c};

use crate::{
    bit_configurations::LineBits,
    config::DisplayConfig,
    driver::{
        sequencer,
        state::{DeviceState, DisplayFlags, Row, LCD_COLS, LCD_ROWS},
        TransferMode, Transmitter, LCD_CMD_CLEARDISPLAY, LCD_CMD_CURSORSHIFT,
        LCD_CMD_SETCGRAMADDR, LCD_CMD_SETDDRAMADDR, LCD_FLAG_DISPLAYMOVE, LCD_FLAG_MOVELEFT,
        LCD_FLAG_MOVERIGHT, LCD_ROW_OFFSET,
    },
    CharacterDisplayError,
};

/// Longest accepted content: two full rows and two line breaks
pub const MAX_CONTENT_LEN: usize = 2 * LCD_COLS + 2;
/// Number of user definable glyphs in CGRAM
pub const CGRAM_SLOTS: u8 = 8;
/// Settle time after a clear display command
pub const CLEAR_SETTLE_MS: u32 = 2;

/// Direction for [`Hd44780::shift`]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftDirection {
    Left,
    Right,
}

pub struct Hd44780<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    bus: Transmitter<I2C>,
    delay: DELAY,
    state: DeviceState,
}

impl<I2C, DELAY> Hd44780<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    pub fn new(i2c: I2C, delay: DELAY, config: &DisplayConfig) -> Self {
        Self {
            bus: Transmitter::new(i2c, config.address),
            delay,
            state: DeviceState::new(config),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn address(&self) -> u8 {
        self.bus.address()
    }

    /// returns the i2c object. mostly used for testing
    #[cfg(test)]
    pub fn i2c(&mut self) -> &mut I2C {
        self.bus.i2c()
    }

    pub fn release(self) -> (I2C, DELAY) {
        (self.bus.release(), self.delay)
    }

    /// Runs the power-on sequence. The controller clears itself as part of it, so the
    /// shadow content is reset on success.
    pub fn init(&mut self) -> Result<(), CharacterDisplayError<I2C>> {
        sequencer::initialize(&mut self.bus, &mut self.delay, &self.state)?;
        self.state.reset_content();
        Ok(())
    }

    /// Best-effort shutdown, see [`sequencer::teardown`].
    pub fn teardown(&mut self) -> bool {
        sequencer::teardown(&mut self.bus, &mut self.delay, &mut self.state)
    }

    fn send(
        &mut self,
        mode: TransferMode,
        byte: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.bus
            .send_byte(mode, byte, &self.state)
            .map_err(CharacterDisplayError::BusError)
    }

    fn command(&mut self, command: u8) -> Result<(), CharacterDisplayError<I2C>> {
        self.send(TransferMode::Command, command)
    }

    fn write_row(&mut self, row: &Row) -> Result<(), CharacterDisplayError<I2C>> {
        for &byte in row.iter() {
            self.send(TransferMode::Data, byte)?;
        }
        Ok(())
    }

    /// Writes up to two `\n` separated lines. Every line is padded with spaces to the
    /// full width so stale characters are overwritten without the flicker of a clear
    /// command; characters past the 16th of a line and anything after the second line
    /// are dropped. The cursor is returned to (0, 0) afterwards.
    pub fn write_content(&mut self, text: &[u8]) -> Result<(), CharacterDisplayError<I2C>> {
        if text.len() > MAX_CONTENT_LEN {
            return Err(CharacterDisplayError::TooLong);
        }
        let rows = compose_rows(text);
        self.write_row(&rows[0])?;
        self.command(LCD_CMD_SETDDRAMADDR | LCD_ROW_OFFSET)?;
        self.write_row(&rows[1])?;
        self.goto_xy(0, 0)?;
        self.state.display_buffer = rows;
        Ok(())
    }

    /// Writes both rows in full starting at the current address, jumping to the second
    /// line in between. The cursor position is not re-established afterwards.
    /// The shadow buffer records `rows` as if the cursor was home; call `home` first
    /// if it may have moved, otherwise the first row lands shifted on the display.
    pub fn update_display(
        &mut self,
        rows: &[Row; LCD_ROWS],
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.write_row(&rows[0])?;
        self.command(LCD_CMD_SETDDRAMADDR | LCD_ROW_OFFSET)?;
        self.write_row(&rows[1])?;
        self.state.display_buffer = *rows;
        Ok(())
    }

    /// The expander has no per-pin update, so the backlight is switched by writing a
    /// whole resting byte with enable low.
    pub fn set_backlight(&mut self, on: bool) -> Result<(), CharacterDisplayError<I2C>> {
        self.bus
            .write_raw(LineBits::idle(on))
            .map_err(CharacterDisplayError::BusError)?;
        self.state.backlight = on;
        Ok(())
    }

    fn apply_display_control(
        &mut self,
        next: DeviceState,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.bus
            .send_byte(TransferMode::Command, next.display_control(), &next)
            .map_err(CharacterDisplayError::BusError)?;
        self.state = next;
        Ok(())
    }

    pub fn set_cursor_visible(&mut self, visible: bool) -> Result<(), CharacterDisplayError<I2C>> {
        let next = DeviceState {
            cursor_visible: visible,
            ..self.state.clone()
        };
        self.apply_display_control(next)
    }

    pub fn set_cursor_blink(&mut self, blink: bool) -> Result<(), CharacterDisplayError<I2C>> {
        let next = DeviceState {
            cursor_blink: blink,
            ..self.state.clone()
        };
        self.apply_display_control(next)
    }

    pub fn set_display_on(&mut self, on: bool) -> Result<(), CharacterDisplayError<I2C>> {
        let next = DeviceState {
            display_on: on,
            ..self.state.clone()
        };
        self.apply_display_control(next)
    }

    /// Applies all four flags at once: the display control command, then a resting
    /// byte carrying the backlight bit.
    pub fn update_state(&mut self, flags: DisplayFlags) -> Result<(), CharacterDisplayError<I2C>> {
        let next = self.state.with_flags(flags);
        self.bus
            .send_byte(TransferMode::Command, next.display_control(), &next)
            .and_then(|_| self.bus.write_raw(LineBits::idle(next.backlight)))
            .map_err(CharacterDisplayError::BusError)?;
        self.state = next;
        Ok(())
    }

    /// Clears the display. The controller blanks the screen visibly while doing so;
    /// use `write_content` for flicker free updates.
    pub fn clear(&mut self) -> Result<(), CharacterDisplayError<I2C>> {
        self.command(LCD_CMD_CLEARDISPLAY)?;
        // wait for command to complete
        self.delay.delay_ms(CLEAR_SETTLE_MS);
        self.state.reset_content();
        Ok(())
    }

    /// Moves the cursor, saturating out of range coordinates to the last column/row.
    pub fn goto_xy(&mut self, x: u8, y: u8) -> Result<(), CharacterDisplayError<I2C>> {
        let x = x.min(LCD_COLS as u8 - 1);
        let y = y.min(LCD_ROWS as u8 - 1);
        self.command(LCD_CMD_SETDDRAMADDR + LCD_ROW_OFFSET * y + x)?;
        self.state.cursor_x = x;
        self.state.cursor_y = y;
        Ok(())
    }

    pub fn home(&mut self) -> Result<(), CharacterDisplayError<I2C>> {
        self.goto_xy(0, 0)
    }

    /// Shifts the whole display one position. The shadow cursor position is left as is,
    /// it no longer matches what is shown after a shift.
    pub fn shift(&mut self, direction: ShiftDirection) -> Result<(), CharacterDisplayError<I2C>> {
        let move_flag = match direction {
            ShiftDirection::Left => LCD_FLAG_MOVELEFT,
            ShiftDirection::Right => LCD_FLAG_MOVERIGHT,
        };
        self.command(LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | move_flag)
    }

    /// Uploads one 5x8 glyph, one byte per pixel row. The CGRAM address is set to
    /// `0x40 + address`, matching the legacy driver's addressing.
    pub fn set_custom_char(
        &mut self,
        address: u8,
        glyph: [u8; 8],
    ) -> Result<(), CharacterDisplayError<I2C>> {
        if address >= CGRAM_SLOTS {
            return Err(CharacterDisplayError::InvalidAddress);
        }
        self.command(LCD_CMD_SETCGRAMADDR + address)?;
        for &glyph_row in glyph.iter() {
            self.send(TransferMode::Data, glyph_row)?;
        }
        Ok(())
    }
}

/// Lays `text` out on the display grid, space padded.
pub fn compose_rows(text: &[u8]) -> [Row; LCD_ROWS] {
    let mut rows = crate::driver::state::blank_rows();
    for (row, line) in rows.iter_mut().zip(text.split(|&byte| byte == b'\n')) {
        for (cell, &byte) in row.iter_mut().zip(line.iter()) {
            *cell = byte;
        }
    }
    rows
}

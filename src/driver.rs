pub mod hd44780;
pub mod sequencer;
pub mod state;

use embedded_hal::i2c;

use crate::{bit_configurations::LineBits, driver::state::DeviceState};

// commands
pub const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
pub const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
pub const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Controls the display; does stuff like turning it off and on
pub const LCD_CMD_CURSORSHIFT: u8 = 0x10; //  Moves the cursor or shifts the display
pub const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Used to send the function to set to the display
pub const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Used to set the CGRAM (character generator RAM) with characters
pub const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Used to set the DDRAM (Display Data RAM)

// flags for display entry mode
pub const LCD_FLAG_ENTRYLEFT: u8 = 0x02; //  Text flows from left to right

// flags for display on/off control
pub const LCD_FLAG_DISPLAYON: u8 = 0x04; //  Turns the display on
pub const LCD_FLAG_CURSORON: u8 = 0x02; //  Turns the cursor on
pub const LCD_FLAG_BLINKON: u8 = 0x01; //  Turns on the blinking cursor

// flags for display/cursor shift
pub const LCD_FLAG_DISPLAYMOVE: u8 = 0x08; //  Flag for moving the display
pub const LCD_FLAG_MOVERIGHT: u8 = 0x04; //  Flag for moving right
pub const LCD_FLAG_MOVELEFT: u8 = 0x00; //  Flag for moving left

// flags for function set
pub const LCD_FLAG_4BITMODE: u8 = 0x00; //  LCD 4 bit mode
pub const LCD_FLAG_2LINE: u8 = 0x08; //  LCD 2 line mode
pub const LCD_FLAG_5x8_DOTS: u8 = 0x00; //  8 pixel high font mode

/// DDRAM offset of the second display line
pub const LCD_ROW_OFFSET: u8 = 0x40;

/// Selects the HD44780 register a transfer lands in.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    /// Instruction register, RS low
    Command,
    /// Data register (DDRAM or CGRAM, depending on the last address set), RS high
    Data,
}

impl TransferMode {
    pub const fn rs(self) -> bool {
        matches!(self, TransferMode::Data)
    }
}

/// Owns the I2C bus handle for one PCF8574 expander. Every bus write of the driver
/// goes through here.
pub struct Transmitter<I2C>
where
    I2C: i2c::I2c,
{
    i2c: I2C,
    address: u8,
}

impl<I2C> Transmitter<I2C>
where
    I2C: i2c::I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// returns the i2c object. mostly used for testing
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Latch one byte onto the expander outputs.
    pub fn write_raw(&mut self, bits: LineBits) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[bits.bits()])
    }

    /// Clocks the low 4 bits of `nibble` into the controller: data, RS and backlight
    /// are held stable while enable goes high, then low. Exactly two bus writes, no
    /// retry on failure.
    pub fn send_nibble(
        &mut self,
        mode: TransferMode,
        nibble: u8,
        state: &DeviceState,
    ) -> Result<(), I2C::Error> {
        self.write_raw(LineBits::transfer(mode, nibble, true, state.backlight))?;
        self.write_raw(LineBits::transfer(mode, nibble, false, state.backlight))
    }

    /// Sends a full byte as two nibble transfers, most significant nibble first.
    pub fn send_byte(
        &mut self,
        mode: TransferMode,
        byte: u8,
        state: &DeviceState,
    ) -> Result<(), I2C::Error> {
        self.send_nibble(mode, byte >> 4, state)?;
        self.send_nibble(mode, byte & 0x0F, state)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::{config::DisplayConfig, test_support::RecordingBus};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn test_send_byte() {
        let expected_transactions = [
            // write byte 0xDE with RS = 1, backlight on
            // write high nibble
            I2cTransaction::write(0x27, std::vec![0b1101_1101]), // enable = 1, rs = 1
            I2cTransaction::write(0x27, std::vec![0b1101_1001]), // enable = 0, rs = 1
            // write low nibble
            I2cTransaction::write(0x27, std::vec![0b1110_1101]), // enable = 1, rs = 1
            I2cTransaction::write(0x27, std::vec![0b1110_1001]), // enable = 0, rs = 1
            // write byte 0xAD with RS = 0, backlight on
            I2cTransaction::write(0x27, std::vec![0b1010_1100]), // enable = 1, rs = 0
            I2cTransaction::write(0x27, std::vec![0b1010_1000]), // enable = 0, rs = 0
            I2cTransaction::write(0x27, std::vec![0b1101_1100]), // enable = 1, rs = 0
            I2cTransaction::write(0x27, std::vec![0b1101_1000]), // enable = 0, rs = 0
        ];
        let state = DeviceState::new(&DisplayConfig::default());
        let mut bus = Transmitter::new(I2cMock::new(&expected_transactions), 0x27);

        assert!(bus.send_byte(TransferMode::Data, 0xDE, &state).is_ok());
        assert!(bus.send_byte(TransferMode::Command, 0xAD, &state).is_ok());
        bus.i2c().done();
    }

    #[test]
    fn test_send_nibble_without_backlight() {
        let expected_transactions = [
            I2cTransaction::write(0x3F, std::vec![0b0101_0101]), // enable = 1, rs = 1
            I2cTransaction::write(0x3F, std::vec![0b0101_0001]), // enable = 0, rs = 1
        ];
        let mut state = DeviceState::new(&DisplayConfig::default());
        state.backlight = false;
        let mut bus = Transmitter::new(I2cMock::new(&expected_transactions), 0x3F);

        assert!(bus.send_nibble(TransferMode::Data, 0x5, &state).is_ok());
        assert_eq!(bus.address(), 0x3F);
        bus.i2c().done();
    }

    #[test]
    fn test_every_byte_is_four_enable_pulsed_writes() {
        let state = DeviceState::new(&DisplayConfig::default());
        let mut bus = Transmitter::new(RecordingBus::new(), 0x27);
        for byte in [0x00, 0x5A, 0xFF, b'x'] {
            bus.send_byte(TransferMode::Data, byte, &state).unwrap();
        }
        let writes = bus.i2c().writes();
        assert_eq!(writes.len(), 16);
        for pair in writes.chunks(2) {
            let high = LineBits(pair[0]);
            let low = LineBits(pair[1]);
            assert_eq!(high.enable(), 1);
            assert_eq!(low.enable(), 0);
            assert_eq!(high.data(), low.data());
            assert_eq!(high.rw(), 0);
            assert_eq!(low.rw(), 0);
        }
        // high nibble first
        assert_eq!(LineBits(writes[4]).data(), 0x5);
        assert_eq!(LineBits(writes[6]).data(), 0xA);
    }

    #[test]
    fn test_send_byte_stops_on_first_failure() {
        let state = DeviceState::new(&DisplayConfig::default());
        let mut bus = Transmitter::new(RecordingBus::failing_at(1), 0x27);
        assert_eq!(
            bus.send_byte(TransferMode::Command, 0x28, &state),
            Err(ErrorKind::Other)
        );
        assert_eq!(bus.i2c().attempts(), 2);
    }
}

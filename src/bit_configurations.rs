use bitfield::bitfield;

use crate::driver::TransferMode;

// Wiring of the common PCF8574T backpack: control lines on P0-P3, the HD44780
// 4-bit data bus on P4-P7.
bitfield! {
    /// One byte as latched onto the PCF8574 output port.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct LineBits(u8);
    impl Debug;
    pub rs, set_rs: 0, 0;
    pub rw, set_rw: 1, 1;
    pub enable, set_enable: 2, 2;
    pub backlight, set_backlight: 3, 3;
    pub data, set_data: 7, 4;
}

impl LineBits {
    /// Compose the byte for one half of a nibble transfer. RW is always low, this
    /// driver never reads the controller.
    pub fn transfer(mode: TransferMode, nibble: u8, enable: bool, backlight: bool) -> Self {
        let mut bits = LineBits(0);
        bits.set_data(nibble & 0x0F);
        bits.set_rs(mode.rs() as u8);
        bits.set_rw(0);
        bits.set_enable(enable as u8);
        bits.set_backlight(backlight as u8);
        bits
    }

    /// The resting byte: data lines high, enable and RS low. Writing it changes only
    /// the backlight line as far as the controller is concerned.
    pub fn idle(backlight: bool) -> Self {
        let mut bits = LineBits(0);
        bits.set_data(0b1111);
        bits.set_backlight(backlight as u8);
        bits
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bits_layout() {
        let mut bits = LineBits(0);
        bits.set_rs(1);
        bits.set_rw(0);
        bits.set_enable(1);
        bits.set_backlight(1);
        bits.set_data(0b1010);
        assert_eq!(bits.bits(), 0b1010_1101);

        bits.set_rs(0);
        bits.set_rw(1);
        bits.set_enable(0);
        bits.set_backlight(0);
        bits.set_data(0b0101);
        assert_eq!(bits.bits(), 0b0101_0010);
    }

    #[test]
    fn test_transfer_bits() {
        assert_eq!(
            LineBits::transfer(TransferMode::Command, 0x3, true, true).bits(),
            0b0011_1100
        );
        assert_eq!(
            LineBits::transfer(TransferMode::Command, 0x3, false, true).bits(),
            0b0011_1000
        );
        assert_eq!(
            LineBits::transfer(TransferMode::Data, 0xA, true, false).bits(),
            0b1010_0101
        );
        // only the low nibble of the argument lands on the data lines
        assert_eq!(
            LineBits::transfer(TransferMode::Data, 0xF6, false, false).bits(),
            0b0110_0001
        );
    }

    #[test]
    fn test_idle_bits() {
        assert_eq!(LineBits::idle(true).bits(), 0xF8);
        assert_eq!(LineBits::idle(false).bits(), 0xF0);
        assert_eq!(LineBits::idle(true).enable(), 0);
        assert_eq!(LineBits::idle(true).rs(), 0);
    }
}

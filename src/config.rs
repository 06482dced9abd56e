/// Address of a PCF8574T with A0, A1 and A2 pulled high, the usual factory setting on
/// LCD backpacks.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x27;

/// Attach-time settings for one display. The flag fields become the initial
/// `DeviceState` and decide the display control command sent at the end of
/// initialization.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    pub address: u8,
    pub backlight: bool,
    pub cursor_visible: bool,
    pub cursor_blink: bool,
    pub display_on: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_I2C_ADDRESS,
            backlight: true,
            cursor_visible: true,
            cursor_blink: false,
            display_on: true,
        }
    }
}

impl DisplayConfig {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_backlight(mut self, on: bool) -> Self {
        self.backlight = on;
        self
    }

    pub fn with_cursor(mut self, visible: bool, blink: bool) -> Self {
        self.cursor_visible = visible;
        self.cursor_blink = blink;
        self
    }

    pub fn with_display_on(mut self, on: bool) -> Self {
        self.display_on = on;
        self
    }
}

use crate::{
    config::DisplayConfig,
    driver::{LCD_CMD_DISPLAYCONTROL, LCD_FLAG_BLINKON, LCD_FLAG_CURSORON, LCD_FLAG_DISPLAYON},
};

/// Number of character columns on the supported display
pub const LCD_COLS: usize = 16;
/// Number of character rows on the supported display
pub const LCD_ROWS: usize = 2;

/// A display line as held in the shadow buffer
pub type Row = [u8; LCD_COLS];

/// The expander's outputs cannot be read back, so this value is the only record of
/// what the display is currently showing and how it is configured.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DeviceState {
    pub backlight: bool,
    pub cursor_visible: bool,
    pub cursor_blink: bool,
    pub display_on: bool,
    pub cursor_x: u8,
    pub cursor_y: u8,
    pub display_buffer: [Row; LCD_ROWS],
}

/// The four on/off settings of the display as one value.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayFlags {
    pub cursor_visible: bool,
    pub cursor_blink: bool,
    pub display_on: bool,
    pub backlight: bool,
}

impl DeviceState {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            backlight: config.backlight,
            cursor_visible: config.cursor_visible,
            cursor_blink: config.cursor_blink,
            display_on: config.display_on,
            cursor_x: 0,
            cursor_y: 0,
            display_buffer: blank_rows(),
        }
    }

    /// The display control command matching the current cursor, blink and display
    /// settings. Blink does not mask the cursor bit.
    pub fn display_control(&self) -> u8 {
        let mut command = LCD_CMD_DISPLAYCONTROL;
        if self.display_on {
            command |= LCD_FLAG_DISPLAYON;
        }
        if self.cursor_visible {
            command |= LCD_FLAG_CURSORON;
        }
        if self.cursor_blink {
            command |= LCD_FLAG_BLINKON;
        }
        command
    }

    pub fn flags(&self) -> DisplayFlags {
        DisplayFlags {
            cursor_visible: self.cursor_visible,
            cursor_blink: self.cursor_blink,
            display_on: self.display_on,
            backlight: self.backlight,
        }
    }

    pub fn with_flags(&self, flags: DisplayFlags) -> Self {
        Self {
            cursor_visible: flags.cursor_visible,
            cursor_blink: flags.cursor_blink,
            display_on: flags.display_on,
            backlight: flags.backlight,
            ..self.clone()
        }
    }

    pub(crate) fn reset_content(&mut self) {
        self.display_buffer = blank_rows();
        self.cursor_x = 0;
        self.cursor_y = 0;
    }
}

pub fn blank_rows() -> [Row; LCD_ROWS] {
    [[b' '; LCD_COLS]; LCD_ROWS]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = DeviceState::new(&DisplayConfig::default());
        assert!(state.backlight);
        assert!(state.cursor_visible);
        assert!(!state.cursor_blink);
        assert!(state.display_on);
        assert_eq!((state.cursor_x, state.cursor_y), (0, 0));
        assert_eq!(state.display_buffer, blank_rows());
        assert_eq!(state.display_control(), 0x0E);
    }

    #[test]
    fn test_display_control_bits_are_independent() {
        let mut state = DeviceState::new(&DisplayConfig::default());
        state.cursor_visible = false;
        state.cursor_blink = false;
        state.display_on = false;
        assert_eq!(state.display_control(), 0x08);
        state.cursor_blink = true;
        assert_eq!(state.display_control(), 0x09);
        state.cursor_visible = true;
        assert_eq!(state.display_control(), 0x0B);
        state.display_on = true;
        assert_eq!(state.display_control(), 0x0F);
    }

    #[test]
    fn test_with_flags_keeps_content() {
        let mut state = DeviceState::new(&DisplayConfig::default());
        state.display_buffer[0][0] = b'A';
        state.cursor_x = 4;
        let flags = DisplayFlags {
            cursor_visible: false,
            cursor_blink: true,
            display_on: false,
            backlight: false,
        };
        let next = state.with_flags(flags);
        assert_eq!(next.flags(), flags);
        assert_eq!(next.display_buffer[0][0], b'A');
        assert_eq!(next.cursor_x, 4);
    }
}

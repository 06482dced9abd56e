use core::fmt::Display;

use embedded_hal::{delay::DelayNs, i2c};

use crate::{
    bit_configurations::LineBits,
    driver::{
        state::DeviceState, TransferMode, Transmitter, LCD_CMD_CLEARDISPLAY,
        LCD_CMD_DISPLAYCONTROL, LCD_CMD_ENTRYMODESET, LCD_CMD_FUNCTIONSET, LCD_FLAG_2LINE,
        LCD_FLAG_4BITMODE, LCD_FLAG_5x8_DOTS, LCD_FLAG_ENTRYLEFT,
    },
    CharacterDisplayError,
};

/// Settle time after each teardown command
pub const TEARDOWN_SETTLE_MS: u32 = 1;

/// Stages of the HD44780 power-on sequence. A failed initialization reports the stage
/// whose bus transfer failed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InitStep {
    PowerOn,
    Reset1,
    Reset2,
    Reset3,
    Set4BitMode,
    FunctionSet,
    DisplayOff,
    Clear,
    EntryModeSet,
    DisplayOn,
    Ready,
}

impl From<&InitStep> for &'static str {
    fn from(step: &InitStep) -> Self {
        match step {
            InitStep::PowerOn => "power on",
            InitStep::Reset1 => "reset 1",
            InitStep::Reset2 => "reset 2",
            InitStep::Reset3 => "reset 3",
            InitStep::Set4BitMode => "set 4-bit mode",
            InitStep::FunctionSet => "function set",
            InitStep::DisplayOff => "display off",
            InitStep::Clear => "clear",
            InitStep::EntryModeSet => "entry mode set",
            InitStep::DisplayOn => "display on",
            InitStep::Ready => "ready",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InitStep {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for InitStep {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for InitStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Clone, Copy)]
enum Transfer {
    /// A single nibble clocked in while the controller may still be in 8-bit mode
    Nibble(u8),
    Command(u8),
    /// The display control command built from the configured state
    DisplayControl,
}

struct SequenceStep {
    step: InitStep,
    transfer: Transfer,
    settle_us: u32,
}

// HD44780 datasheet, figure 24: initializing by instruction for the 4-bit interface.
const INIT_SEQUENCE: [SequenceStep; 9] = [
    SequenceStep {
        step: InitStep::Reset1,
        transfer: Transfer::Nibble(0x3),
        settle_us: 5_000,
    },
    SequenceStep {
        step: InitStep::Reset2,
        transfer: Transfer::Nibble(0x3),
        settle_us: 200,
    },
    SequenceStep {
        step: InitStep::Reset3,
        transfer: Transfer::Nibble(0x3),
        settle_us: 200,
    },
    SequenceStep {
        step: InitStep::Set4BitMode,
        transfer: Transfer::Nibble(0x2),
        settle_us: 700,
    },
    SequenceStep {
        step: InitStep::FunctionSet,
        transfer: Transfer::Command(
            LCD_CMD_FUNCTIONSET | LCD_FLAG_4BITMODE | LCD_FLAG_2LINE | LCD_FLAG_5x8_DOTS,
        ),
        settle_us: 700,
    },
    SequenceStep {
        step: InitStep::DisplayOff,
        transfer: Transfer::Command(LCD_CMD_DISPLAYCONTROL),
        settle_us: 700,
    },
    SequenceStep {
        step: InitStep::Clear,
        transfer: Transfer::Command(LCD_CMD_CLEARDISPLAY),
        settle_us: 700,
    },
    SequenceStep {
        step: InitStep::EntryModeSet,
        transfer: Transfer::Command(LCD_CMD_ENTRYMODESET | LCD_FLAG_ENTRYLEFT),
        settle_us: 700,
    },
    SequenceStep {
        step: InitStep::DisplayOn,
        transfer: Transfer::DisplayControl,
        settle_us: 700,
    },
];

/// Forces the controller into 4-bit mode and brings it up with the settings held in
/// `state`. The settle delays must not be shortened; a controller that is clocked too
/// early silently garbles characters instead of failing.
pub fn initialize<I2C, DELAY>(
    bus: &mut Transmitter<I2C>,
    delay: &mut DELAY,
    state: &DeviceState,
) -> Result<(), CharacterDisplayError<I2C>>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    let mut current = InitStep::PowerOn;
    for entry in INIT_SEQUENCE.iter() {
        log::trace!("lcd init: {} -> {}", current, entry.step);
        let result = match entry.transfer {
            Transfer::Nibble(nibble) => bus.send_nibble(TransferMode::Command, nibble, state),
            Transfer::Command(command) => bus.send_byte(TransferMode::Command, command, state),
            Transfer::DisplayControl => {
                bus.send_byte(TransferMode::Command, state.display_control(), state)
            }
        };
        if let Err(cause) = result {
            log::error!(
                "lcd init failed at {} (address {:#04x}): {:?}",
                entry.step,
                bus.address(),
                cause
            );
            return Err(CharacterDisplayError::InitFailed {
                step: entry.step,
                cause,
            });
        }
        delay.delay_us(entry.settle_us);
        current = entry.step;
    }
    log::trace!("lcd init: {} -> {}", current, InitStep::Ready);
    Ok(())
}

/// Blanks the display and switches the backlight off. Every step is attempted even if
/// an earlier one failed; failures are logged only. Returns `true` if every write
/// reached the bus.
pub fn teardown<I2C, DELAY>(
    bus: &mut Transmitter<I2C>,
    delay: &mut DELAY,
    state: &mut DeviceState,
) -> bool
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    let mut clean = true;

    if let Err(e) = bus.send_byte(TransferMode::Command, LCD_CMD_CLEARDISPLAY, state) {
        log::warn!("lcd teardown: clear failed: {:?}", e);
        clean = false;
    }
    delay.delay_ms(TEARDOWN_SETTLE_MS);

    // display, cursor and blink off
    if let Err(e) = bus.send_byte(TransferMode::Command, LCD_CMD_DISPLAYCONTROL, state) {
        log::warn!("lcd teardown: display off failed: {:?}", e);
        clean = false;
    }
    delay.delay_ms(TEARDOWN_SETTLE_MS);

    if let Err(e) = bus.write_raw(LineBits::idle(false)) {
        log::warn!("lcd teardown: backlight off failed: {:?}", e);
        clean = false;
    }

    state.backlight = false;
    state.cursor_visible = false;
    state.cursor_blink = false;
    state.display_on = false;
    state.reset_content();
    clean
}

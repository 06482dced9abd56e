//! Bus and delay doubles shared by the unit tests.
extern crate std;

use std::vec::Vec;

use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, Operation, SevenBitAddress},
};
use embedded_hal_mock::eh1::i2c::Transaction as I2cTransaction;

/// Records every byte written and can fail exactly one write, counted from zero.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingBus {
    writes: Vec<u8>,
    attempts: usize,
    fail_at: Option<usize>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// bytes that reached the bus
    pub fn writes(&self) -> Vec<u8> {
        self.writes.clone()
    }

    /// number of writes tried, including the failed one
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl ErrorType for RecordingBus {
    type Error = ErrorKind;
}

impl I2c for RecordingBus {
    fn transaction(
        &mut self,
        _address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations.iter() {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        let index = self.attempts;
                        self.attempts += 1;
                        if self.fail_at == Some(index) {
                            return Err(ErrorKind::Other);
                        }
                        self.writes.push(byte);
                    }
                }
                Operation::Read(_) => return Err(ErrorKind::Other),
            }
        }
        Ok(())
    }
}

/// Records each requested delay in microseconds.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    delays_us: Vec<u32>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays_us(&self) -> Vec<u32> {
        self.delays_us.clone()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_us.push(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delays_us.push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_us.push(ms * 1_000);
    }
}

fn byte_writes(address: u8, rs: u8, byte: u8, backlight: bool) -> Vec<I2cTransaction> {
    let backlight = if backlight { 0b0000_1000 } else { 0 };
    let mut transactions = Vec::new();
    for data in [byte & 0xF0, (byte & 0x0F) << 4] {
        transactions.push(I2cTransaction::write(
            address,
            std::vec![data | backlight | 0b0000_0100 | rs],
        ));
        transactions.push(I2cTransaction::write(
            address,
            std::vec![data | backlight | rs],
        ));
    }
    transactions
}

/// The four expander writes of one command byte
pub fn command_writes(address: u8, command: u8, backlight: bool) -> Vec<I2cTransaction> {
    byte_writes(address, 0, command, backlight)
}

/// The four expander writes of one data byte
pub fn data_writes(address: u8, data: u8, backlight: bool) -> Vec<I2cTransaction> {
    byte_writes(address, 1, data, backlight)
}

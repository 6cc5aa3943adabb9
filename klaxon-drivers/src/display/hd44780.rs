//! HD44780 character LCD via PCF8574 I2C backpack
//!
//! The ubiquitous "LCD1602 + I2C" module: an HD44780-compatible controller
//! driven in 4-bit mode through an 8-bit port expander.
//!
//! # Expander wiring
//!
//! | Bit | Signal |
//! |-----|--------|
//! | P0  | RS     |
//! | P1  | RW (held low) |
//! | P2  | EN     |
//! | P3  | Backlight |
//! | P4-P7 | D4-D7 |
//!
//! Each byte to the controller is sent as two nibbles, each latched by an
//! EN pulse, so one character costs four I2C writes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use klaxon_display::{CharDisplay, DisplayError};

/// Default PCF8574 address (A0-A2 pulled high)
pub const PCF8574_ADDR: u8 = 0x27;

/// Display geometry
const COLS: u8 = 16;
const ROWS: u8 = 2;

/// DDRAM address of the first column of each row
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Expander bits
const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

/// HD44780 commands
#[allow(dead_code)]
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const HOME: u8 = 0x02;
    /// Increment, no shift
    pub const ENTRY_MODE: u8 = 0x06;
    /// Display on, cursor off, blink off
    pub const DISPLAY_ON: u8 = 0x0C;
    /// 4-bit bus, 2 lines, 5x8 font
    pub const FUNCTION_SET: u8 = 0x28;
    pub const SET_DDRAM: u8 = 0x80;
}

/// HD44780 driver
pub struct Hd44780<I2C, DELAY> {
    i2c: I2C,
    delay: DELAY,
    address: u8,
    backlight: bool,
    initialized: bool,
}

impl<I2C, DELAY> Hd44780<I2C, DELAY>
where
    I2C: I2c,
    DELAY: DelayNs,
{
    /// Create a new driver
    pub fn new(i2c: I2C, delay: DELAY, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            backlight: true,
            initialized: false,
        }
    }

    /// Initialize the controller into 4-bit, two-line mode
    ///
    /// Runs the power-on "function set" sequence from the datasheet, which
    /// works regardless of the state the controller was left in.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.delay.delay_ms(50);
        self.expander_write(0)?;
        self.delay.delay_ms(1);

        // Three times 8-bit mode, then switch to 4-bit
        self.write_nibble(0x30, 0)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x30, 0)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x30, 0)?;
        self.delay.delay_us(150);
        self.write_nibble(0x20, 0)?;

        self.command(cmd::FUNCTION_SET)?;
        self.command(cmd::DISPLAY_ON)?;
        self.command(cmd::CLEAR)?;
        self.delay.delay_ms(2);
        self.command(cmd::ENTRY_MODE)?;

        self.initialized = true;
        Ok(())
    }

    /// Switch the backlight on or off
    pub fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        self.backlight = on;
        self.expander_write(0)
    }

    /// Release the bus
    pub fn release(self) -> (I2C, DELAY) {
        (self.i2c, self.delay)
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight {
            BACKLIGHT
        } else {
            0
        }
    }

    fn expander_write(&mut self, data: u8) -> Result<(), DisplayError> {
        let byte = data | self.backlight_bit();
        self.i2c
            .write(self.address, &[byte])
            .map_err(|_| DisplayError::Bus)
    }

    /// Latch the high nibble of `value` with the given RS
    fn write_nibble(&mut self, value: u8, rs: u8) -> Result<(), DisplayError> {
        let data = (value & 0xF0) | rs;
        self.expander_write(data | EN)?;
        self.delay.delay_us(1);
        self.expander_write(data)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn send(&mut self, value: u8, rs: u8) -> Result<(), DisplayError> {
        self.write_nibble(value, rs)?;
        self.write_nibble(value << 4, rs)
    }

    fn command(&mut self, value: u8) -> Result<(), DisplayError> {
        self.send(value, 0)
    }

    fn ensure_initialized(&self) -> Result<(), DisplayError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DisplayError::NotInitialized)
        }
    }
}

impl<I2C, DELAY> CharDisplay for Hd44780<I2C, DELAY>
where
    I2C: I2c,
    DELAY: DelayNs,
{
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        self.command(cmd::CLEAR)?;
        // Clear is the one slow instruction
        self.delay.delay_ms(2);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        if col >= COLS || row >= ROWS {
            return Err(DisplayError::OutOfBounds);
        }
        self.command(cmd::SET_DDRAM | (ROW_OFFSETS[usize::from(row)] + col))
    }

    fn print(&mut self, text: &str) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        for byte in text.bytes() {
            let ch = if (0x20..=0x7E).contains(&byte) { byte } else { b' ' };
            self.send(ch, RS)?;
        }
        Ok(())
    }

    fn dimensions(&self) -> (u8, u8) {
        (COLS, ROWS)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::convert::Infallible;
    use std::vec::Vec;

    use embedded_hal::i2c::{ErrorType, Operation};

    use super::*;

    /// Records every byte written to the expander
    #[derive(Default)]
    struct MockExpander {
        writes: Vec<(u8, u8)>,
    }

    impl MockExpander {
        /// Reassemble (rs, byte) pairs from latched nibbles
        ///
        /// Only the falling edge of EN latches, so each nibble is taken from
        /// the write that drops EN after one that raised it.
        fn decode(&self) -> Vec<(bool, u8)> {
            let mut nibbles = Vec::new();
            let mut prev = 0u8;
            for &(_, byte) in &self.writes {
                if prev & EN != 0 && byte & EN == 0 {
                    nibbles.push((byte & RS != 0, byte >> 4));
                }
                prev = byte;
            }
            // Skip the four init nibbles sent before 4-bit mode
            nibbles[4..]
                .chunks(2)
                .map(|pair| (pair[0].0, (pair[0].1 << 4) | pair[1].1))
                .collect()
        }

        fn text(&self) -> Vec<u8> {
            self.decode()
                .into_iter()
                .filter(|&(rs, _)| rs)
                .map(|(_, byte)| byte)
                .collect()
        }

        fn commands(&self) -> Vec<u8> {
            self.decode()
                .into_iter()
                .filter(|&(rs, _)| !rs)
                .map(|(_, byte)| byte)
                .collect()
        }
    }

    impl ErrorType for MockExpander {
        type Error = Infallible;
    }

    impl I2c for MockExpander {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Infallible> {
            for op in operations.iter_mut() {
                if let Operation::Write(bytes) = op {
                    for &byte in bytes.iter() {
                        self.writes.push((address, byte));
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn lcd() -> Hd44780<MockExpander, NoDelay> {
        let mut lcd = Hd44780::new(MockExpander::default(), NoDelay, PCF8574_ADDR);
        lcd.init().unwrap();
        lcd
    }

    #[test]
    fn test_init_sequence() {
        let lcd = lcd();
        let (bus, _) = lcd.release();

        assert!(bus.writes.iter().all(|&(addr, _)| addr == PCF8574_ADDR));
        assert!(bus.writes.iter().all(|&(_, byte)| byte & BACKLIGHT != 0));
        assert_eq!(
            bus.commands(),
            [cmd::FUNCTION_SET, cmd::DISPLAY_ON, cmd::CLEAR, cmd::ENTRY_MODE]
        );
    }

    #[test]
    fn test_uninitialized() {
        let mut lcd = Hd44780::new(MockExpander::default(), NoDelay, PCF8574_ADDR);
        assert_eq!(lcd.print("x"), Err(DisplayError::NotInitialized));
        assert_eq!(lcd.clear(), Err(DisplayError::NotInitialized));
    }

    #[test]
    fn test_set_cursor_rows() {
        let mut lcd = lcd();
        lcd.set_cursor(0, 0).unwrap();
        lcd.set_cursor(5, 1).unwrap();
        lcd.set_cursor(15, 1).unwrap();
        let (bus, _) = lcd.release();
        assert_eq!(bus.commands()[4..], [0x80, 0xC5, 0xCF]);
    }

    #[test]
    fn test_set_cursor_out_of_bounds() {
        let mut lcd = lcd();
        assert_eq!(lcd.set_cursor(16, 0), Err(DisplayError::OutOfBounds));
        assert_eq!(lcd.set_cursor(0, 2), Err(DisplayError::OutOfBounds));
    }

    #[test]
    fn test_print_text() {
        let mut lcd = lcd();
        lcd.print("UNIT-A 50%").unwrap();
        let (bus, _) = lcd.release();
        assert_eq!(bus.text(), b"UNIT-A 50%");
    }

    #[test]
    fn test_print_replaces_non_ascii() {
        let mut lcd = lcd();
        lcd.print("a\u{e9}\tb").unwrap();
        let (bus, _) = lcd.release();
        // 'é' is two UTF-8 bytes
        assert_eq!(bus.text(), b"a   b");
    }

    #[test]
    fn test_backlight_off() {
        let mut lcd = lcd();
        lcd.set_backlight(false).unwrap();
        lcd.print("x").unwrap();
        let (bus, _) = lcd.release();
        let last = bus.writes.last().unwrap().1;
        assert_eq!(last & BACKLIGHT, 0);
    }

    #[test]
    fn test_dimensions() {
        let lcd = lcd();
        assert_eq!(lcd.dimensions(), (16, 2));
    }
}

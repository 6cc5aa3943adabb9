//! Screen buffer types
//!
//! Provides a shadow character grid for the 16x2 panel.

use heapless::String;

use crate::backend::{CharDisplay, DisplayError};

/// Number of character rows on the panel
pub const SCREEN_ROWS: usize = 2;

/// Number of character columns on the panel
pub const SCREEN_COLS: usize = 16;

/// One row of composed text
pub type Line = String<SCREEN_COLS>;

type Row = [u8; SCREEN_COLS];

const BLANK_ROW: Row = [b' '; SCREEN_COLS];

/// Shadow buffer for a character display
///
/// Holds the wanted content of every row plus a copy of what was last sent
/// to the panel. Rows are always stored at full width, padded with spaces.
#[derive(Clone)]
pub struct Screen {
    /// Wanted content
    rows: [Row; SCREEN_ROWS],
    /// Content last written to the panel
    shown: [Row; SCREEN_ROWS],
    /// Clear the panel and repaint every row on next flush
    full_redraw: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

fn to_cell(byte: u8) -> u8 {
    if (0x20..=0x7E).contains(&byte) {
        byte
    } else {
        b' '
    }
}

fn row_str(row: &Row) -> &str {
    // Cells are printable ASCII by construction
    core::str::from_utf8(row).unwrap_or("")
}

impl Screen {
    /// Create a blank screen that repaints fully on first flush
    pub fn new() -> Self {
        Self {
            rows: [BLANK_ROW; SCREEN_ROWS],
            shown: [BLANK_ROW; SCREEN_ROWS],
            full_redraw: true,
        }
    }

    /// Blank every row and schedule a full redraw
    pub fn clear(&mut self) {
        self.rows = [BLANK_ROW; SCREEN_ROWS];
        self.full_redraw = true;
    }

    /// Schedule a full redraw without changing content
    pub fn invalidate(&mut self) {
        self.full_redraw = true;
    }

    /// Replace a row, padding with spaces to full width
    ///
    /// Text past the last column is dropped; non-printable bytes become
    /// spaces.
    pub fn set_line(&mut self, row: usize, text: &str) {
        if let Some(dst) = self.rows.get_mut(row) {
            *dst = BLANK_ROW;
            for (cell, byte) in dst.iter_mut().zip(text.bytes()) {
                *cell = to_cell(byte);
            }
        }
    }

    /// Overwrite part of a row starting at `col`
    pub fn write_at(&mut self, row: usize, col: usize, text: &str) {
        if let Some(dst) = self.rows.get_mut(row) {
            if col < SCREEN_COLS {
                for (cell, byte) in dst[col..].iter_mut().zip(text.bytes()) {
                    *cell = to_cell(byte);
                }
            }
        }
    }

    /// Get the wanted content of a row
    pub fn line(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(row_str)
    }

    /// Whether the next flush would touch the panel
    pub fn is_dirty(&self) -> bool {
        self.full_redraw || self.rows != self.shown
    }

    /// Whether the next flush clears the panel first
    pub fn needs_full_redraw(&self) -> bool {
        self.full_redraw
    }

    /// Push changes to a display
    ///
    /// On a full redraw the panel is cleared and every row is printed.
    /// Otherwise only rows that differ from the last flush are printed,
    /// each at full width. Returns the number of rows written.
    pub fn flush_to<D: CharDisplay + ?Sized>(
        &mut self,
        display: &mut D,
    ) -> Result<usize, DisplayError> {
        let full = self.full_redraw;
        if full {
            display.clear()?;
        }

        let mut written = 0;
        for (index, (row, shown)) in self.rows.iter().zip(self.shown.iter_mut()).enumerate() {
            if full || row != shown {
                display.set_cursor(0, index as u8)?;
                display.print(row_str(row))?;
                *shown = *row;
                written += 1;
            }
        }

        self.full_redraw = false;
        Ok(written)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Screen {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Screen[");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                defmt::write!(f, ", ");
            }
            defmt::write!(f, "{}", row_str(row));
        }
        defmt::write!(f, "]");
    }
}

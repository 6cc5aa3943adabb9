//! Display backend trait
//!
//! Defines the interface for cursor-addressed character displays.

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transfer to the display failed
    Bus,
    /// Cursor position outside the grid
    OutOfBounds,
    /// Display not initialized
    NotInitialized,
}

/// Character display
///
/// The grid is addressed as (column, row), both 0-based. Printing advances
/// the cursor one column per character; text past the last column is the
/// caller's problem.
pub trait CharDisplay {
    /// Clear the entire display and home the cursor
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Move the cursor
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DisplayError>;

    /// Print ASCII text at the cursor
    fn print(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Get the display dimensions
    ///
    /// Returns (columns, rows)
    fn dimensions(&self) -> (u8, u8);
}

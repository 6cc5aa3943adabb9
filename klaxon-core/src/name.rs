//! Device name buffer and editor
//!
//! The name is a fixed-width, space-padded ASCII buffer stored as raw
//! bytes at a fixed store address. Trailing spaces are kept in storage and
//! only trimmed when the name is sent over the air.

use klaxon_hal::{ByteStore, StoreError};
use klaxon_protocol::{label_from_name, Label};

/// Name length in characters
pub const NAME_LEN: usize = 12;

/// Store address of the first name byte
pub const NAME_ADDR: usize = 0;

/// Characters the editor cycles through, in order
pub const ALPHABET: &[u8; 38] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789- ";

/// Character used for erased or invalid cells
pub const FILL: u8 = b' ';

/// Editable device name with cursor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NameBuffer {
    chars: [u8; NAME_LEN],
    cursor: usize,
}

impl Default for NameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn alphabet_index(ch: u8) -> usize {
    ALPHABET
        .iter()
        .position(|&c| c == ch)
        .unwrap_or(ALPHABET.len() - 1)
}

fn sanitize(byte: u8) -> u8 {
    match byte {
        0x21..=0x7E => byte,
        _ => FILL,
    }
}

impl NameBuffer {
    /// Blank name, cursor at 0
    pub const fn new() -> Self {
        Self {
            chars: [FILL; NAME_LEN],
            cursor: 0,
        }
    }

    /// Build from bytes, padding or truncating to [`NAME_LEN`]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut name = Self::new();
        for (cell, &byte) in name.chars.iter_mut().zip(bytes) {
            *cell = sanitize(byte);
        }
        name
    }

    /// Load the name from the store
    ///
    /// Erased (0xFF), zero and non-printable cells read as spaces, as do
    /// cells the store fails to read. Never fails.
    pub fn load<S: ByteStore + ?Sized>(store: &mut S) -> Self {
        let mut bytes = [FILL; NAME_LEN];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = store.read(NAME_ADDR + offset).unwrap_or(FILL);
        }
        Self::from_bytes(&bytes)
    }

    /// Write the name to the store and make it durable
    pub fn commit<S: ByteStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        for (offset, &byte) in self.chars.iter().enumerate() {
            store.update(NAME_ADDR + offset, byte)?;
        }
        store.commit()
    }

    /// Step the character under the cursor backwards through the alphabet
    pub fn decrease(&mut self) {
        let cell = &mut self.chars[self.cursor];
        let index = alphabet_index(*cell);
        *cell = ALPHABET[(index + ALPHABET.len() - 1) % ALPHABET.len()];
    }

    /// Step the character under the cursor forwards through the alphabet
    pub fn increase(&mut self) {
        let cell = &mut self.chars[self.cursor];
        let index = alphabet_index(*cell);
        *cell = ALPHABET[(index + 1) % ALPHABET.len()];
    }

    /// Move the cursor right, wrapping to the first cell
    pub fn cursor_forward(&mut self) {
        self.cursor = (self.cursor + 1) % NAME_LEN;
    }

    /// Move the cursor left, wrapping to the last cell
    pub fn cursor_back(&mut self) {
        self.cursor = (self.cursor + NAME_LEN - 1) % NAME_LEN;
    }

    /// Blank every cell and home the cursor
    pub fn clear_all(&mut self) {
        self.chars = [FILL; NAME_LEN];
        self.cursor = 0;
    }

    /// Home the cursor
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Cursor position (0-based)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Raw padded bytes
    pub fn as_bytes(&self) -> &[u8; NAME_LEN] {
        &self.chars
    }

    /// Padded name as text
    pub fn as_str(&self) -> &str {
        // Cells are printable ASCII by construction
        core::str::from_utf8(&self.chars).unwrap_or("")
    }

    /// Name as sent over the air (trailing spaces trimmed)
    pub fn label(&self) -> Label {
        label_from_name(&self.chars)
    }
}

//! Frame encoding and decoding for the Klaxon radio link.
//!
//! Frames are dispatched by their first byte, then checked for length, then
//! for the `|` delimiter, in that order. Anything that does not match one of
//! the defined shapes is rejected as a whole; a frame is never half-applied.

use heapless::{String, Vec};

/// Maximum label length in bytes (same as the device name buffer)
pub const MAX_LABEL_LEN: usize = 12;

/// Maximum encoded frame size (TYPE + SLOT + DELIMITER + LABEL)
pub const MAX_FRAME_LEN: usize = 1 + 1 + 1 + MAX_LABEL_LEN;

/// Label delimiter
const DELIMITER: u8 = b'|';

/// A sender name carried in a frame
pub type Label = String<MAX_LABEL_LEN>;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Zero-length packet
    Empty,
    /// Packet longer than any valid frame
    TooLong,
    /// First byte is not a known frame type
    UnknownType,
    /// Slot digit outside `1`..`4`
    InvalidSlot,
    /// Label present without a `|` delimiter
    MissingDelimiter,
    /// Wrong length for the frame type
    BadLength,
    /// Label exceeds [`MAX_LABEL_LEN`]
    LabelTooLong,
    /// Label contains non-printable bytes
    InvalidLabel,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Index of a remote button that can be reported over the air (0-3)
///
/// On the wire a slot is the ASCII digit `1`..`4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteSlot(u8);

impl RemoteSlot {
    /// Number of remote slots
    pub const COUNT: usize = 4;

    /// Highest slot (`4` on the wire)
    pub const MAX: RemoteSlot = RemoteSlot(3);

    /// Create a slot from a zero-based index
    pub fn new(index: u8) -> Option<Self> {
        if (index as usize) < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Parse the wire digit (`b'1'`..`b'4'`)
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'1'..=b'4' => Some(Self(digit - b'1')),
            _ => None,
        }
    }

    /// Wire digit for this slot
    pub fn digit(self) -> u8 {
        b'1' + self.0
    }

    /// Zero-based index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A decoded or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    /// Remote button pressed or still held (`P<slot>[|label]`)
    Press {
        slot: RemoteSlot,
        label: Option<Label>,
    },
    /// Remote button released (`R<slot>`)
    Release { slot: RemoteSlot },
    /// Beep request (`B`)
    Beep,
    /// Panic alert (`X|label`)
    Panic { label: Label },
    /// Link keepalive (`TX`)
    Keepalive,
    /// Legacy single-digit press (`<slot>`)
    LegacyPress { slot: RemoteSlot },
}

/// Build a label from a fixed-width name buffer
///
/// Trailing spaces are trimmed, the result is truncated to
/// [`MAX_LABEL_LEN`], and non-printable bytes become spaces.
pub fn label_from_name(name: &[u8]) -> Label {
    let mut end = name.len().min(MAX_LABEL_LEN);
    while end > 0 && name[end - 1] == b' ' {
        end -= 1;
    }

    let mut label = Label::new();
    for &byte in &name[..end] {
        let ch = if is_printable(byte) { byte as char } else { ' ' };
        // Cannot overflow: end <= MAX_LABEL_LEN
        let _ = label.push(ch);
    }
    label
}

fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Validate and copy a received label, trimming trailing spaces
fn parse_label(bytes: &[u8]) -> Result<Label, FrameError> {
    if bytes.len() > MAX_LABEL_LEN {
        return Err(FrameError::LabelTooLong);
    }
    if !bytes.iter().all(|&b| is_printable(b)) {
        return Err(FrameError::InvalidLabel);
    }
    Ok(label_from_name(bytes))
}

/// Parse the slot digit at the start of `rest`
fn parse_slot(rest: &[u8]) -> Result<RemoteSlot, FrameError> {
    let digit = rest.first().ok_or(FrameError::BadLength)?;
    RemoteSlot::from_digit(*digit).ok_or(FrameError::InvalidSlot)
}

impl Frame {
    /// Decode a received packet
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let (&kind, rest) = bytes.split_first().ok_or(FrameError::Empty)?;
        if bytes.len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLong);
        }

        match kind {
            b'P' => {
                let slot = parse_slot(rest)?;
                match &rest[1..] {
                    [] => Ok(Frame::Press { slot, label: None }),
                    [DELIMITER, label @ ..] => {
                        let label = parse_label(label)?;
                        let label = if label.is_empty() { None } else { Some(label) };
                        Ok(Frame::Press { slot, label })
                    }
                    _ => Err(FrameError::MissingDelimiter),
                }
            }
            b'R' => {
                if rest.len() != 1 {
                    return Err(FrameError::BadLength);
                }
                let slot = parse_slot(rest)?;
                Ok(Frame::Release { slot })
            }
            b'B' => {
                if !rest.is_empty() {
                    return Err(FrameError::BadLength);
                }
                Ok(Frame::Beep)
            }
            b'X' => match rest {
                [] => Ok(Frame::Panic { label: Label::new() }),
                [DELIMITER, label @ ..] => Ok(Frame::Panic {
                    label: parse_label(label)?,
                }),
                _ => Err(FrameError::MissingDelimiter),
            },
            b'T' => match rest {
                [b'X'] => Ok(Frame::Keepalive),
                [_] => Err(FrameError::UnknownType),
                _ => Err(FrameError::BadLength),
            },
            b'1'..=b'4' => {
                if !rest.is_empty() {
                    return Err(FrameError::BadLength);
                }
                let slot = parse_slot(&bytes[..1])?;
                Ok(Frame::LegacyPress { slot })
            }
            _ => Err(FrameError::UnknownType),
        }
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let vec = self.encode_to_vec()?;
        if buffer.len() < vec.len() {
            return Err(FrameError::BufferTooSmall);
        }
        buffer[..vec.len()].copy_from_slice(&vec);
        Ok(vec.len())
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
        let mut out = Vec::new();
        match self {
            Frame::Press { slot, label } => {
                push_all(&mut out, &[b'P', slot.digit()])?;
                if let Some(label) = label {
                    let label = label_from_name(label.as_bytes());
                    if !label.is_empty() {
                        push_all(&mut out, &[DELIMITER])?;
                        push_all(&mut out, label.as_bytes())?;
                    }
                }
            }
            Frame::Release { slot } => push_all(&mut out, &[b'R', slot.digit()])?,
            Frame::Beep => push_all(&mut out, b"B")?,
            Frame::Panic { label } => {
                let label = label_from_name(label.as_bytes());
                push_all(&mut out, &[b'X', DELIMITER])?;
                push_all(&mut out, label.as_bytes())?;
            }
            Frame::Keepalive => push_all(&mut out, b"TX")?,
            Frame::LegacyPress { slot } => push_all(&mut out, &[slot.digit()])?,
        }
        Ok(out)
    }
}

fn push_all(out: &mut Vec<u8, MAX_FRAME_LEN>, bytes: &[u8]) -> Result<(), FrameError> {
    out.extend_from_slice(bytes)
        .map_err(|_| FrameError::BufferTooSmall)
}

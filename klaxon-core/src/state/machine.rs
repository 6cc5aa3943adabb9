//! Mode definition
//!
//! All button semantics and display content are a function of the current
//! mode and an event.

use super::events::Event;

/// Who raised the panic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanicOrigin {
    /// This unit's panic button
    Local,
    /// A panic frame from the peer
    Remote,
}

/// Device modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Idle view, buttons send and indicate
    #[default]
    Normal,
    /// Buttons edit the device name
    Naming,
    /// Alarm active until dismissed locally
    Panic(PanicOrigin),
}

impl Mode {
    /// Check if this unit should re-announce the panic over the air
    ///
    /// Only a locally raised panic is re-announced; echoing a remote one
    /// would keep both units alarming each other.
    pub fn announces_panic(&self) -> bool {
        matches!(self, Mode::Panic(PanicOrigin::Local))
    }

    /// Process an event and return the next mode
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Mode::*;

        match (self, event) {
            // Normal transitions
            (Normal, EditName) => Naming,
            (Normal, LocalPanic) => Panic(PanicOrigin::Local),
            (Normal, RemotePanic) => Panic(PanicOrigin::Remote),

            // Naming transitions; a remote panic drops the unsaved edit
            (Naming, CommitName) => Normal,
            (Naming, RemotePanic) => Panic(PanicOrigin::Remote),

            // Panic transitions; a remote panic never replaces a local one
            (Panic(_), DismissPanic) => Normal,

            // Default: stay in current mode
            _ => self,
        }
    }
}

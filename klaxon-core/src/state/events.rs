//! Events that trigger mode transitions

/// Events that can trigger mode transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Naming button held from Normal
    EditName,
    /// Naming button held again while editing
    CommitName,
    /// Local panic button pressed
    LocalPanic,
    /// Panic frame received from the peer
    RemotePanic,
    /// One of the dismiss buttons pressed during panic
    DismissPanic,
}

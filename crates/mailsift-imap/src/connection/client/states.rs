//! Type-state markers for IMAP client connection states.

/// Marker type for the not-authenticated state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// State for a selected mailbox.
#[derive(Debug, Clone)]
pub struct Selected {
    /// The selected mailbox name.
    pub(crate) mailbox: String,
    /// Message count reported by SELECT.
    pub(crate) exists: u32,
}

//! Status codes shared across the attribute server.
//!
//! Guard and validation failures are resolved locally by the module that
//! detects them; callers get one of these codes plus a diagnostic log line.
//! Nothing here ever escalates to a reset — the sole fatal path is a
//! registration failure during startup, which the caller treats as fatal
//! for the boot cycle.

use defmt::Format;

/// Error taxonomy of the attribute server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Error {
    /// Malformed or out-of-range input.
    InvalidParameter,
    /// A required payload or parameter is missing.
    NullParameter,
    /// Operation requires an active connection.
    NotConnected,
    /// Operation requires the peer to have enabled notifications.
    NotificationsDisabled,
    /// Attribute handle not recognized by this server.
    UnknownAttribute,
    /// Declared minimum encryption key size is below the allowed bound.
    InsufficientEncryptionKeySize,
    /// The underlying stack rejected a service or characteristic
    /// registration, or the catalog ran out of room for one.
    RegistrationFailed,
}

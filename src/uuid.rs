//! BLE UUID representation.
//!
//! The two encodings the controller accepts. 128-bit UUIDs are stored in
//! little-endian byte order, which is what the BlueNRG-2 expects on the
//! wire and in every ACI call.

use defmt::Format;

/// A 16-bit or 128-bit attribute UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Uuid {
    Uuid16(u16),
    Uuid128([u8; 16]),
}

impl Uuid {
    /// Derive a characteristic UUID from its owning service's 128-bit UUID.
    ///
    /// The application convention is to offset byte 12 of the service UUID
    /// by the characteristic's position within the service.
    pub const fn derived(base: [u8; 16], offset: u8) -> Self {
        let mut uuid = base;
        uuid[12] = uuid[12].wrapping_add(offset);
        Uuid::Uuid128(uuid)
    }
}

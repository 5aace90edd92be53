//! Boundary to the radio-stack collaborator.
//!
//! The controller firmware owns the attribute protocol, advertising and the
//! link layer; the application core only issues these five primitives and
//! receives raw event packets back (see [`crate::events`]). Keeping the
//! boundary a trait lets tests drive the whole server with a recording
//! stack instead of a radio.

use crate::descriptors::{CharacteristicDescriptor, ServiceKind};
use crate::error::Error;
use crate::uuid::Uuid;

/// Largest single value update the stack accepts: its length parameter is
/// one byte. The payload actually transmittable over the air is further
/// limited by the negotiated ATT MTU, which this bound does not model.
pub const MAX_VALUE_UPDATE_LENGTH: usize = 255;

/// Operations the attribute server consumes from the stack.
pub trait GattStack {
    /// Register a service; returns its service handle.
    fn add_service(
        &mut self,
        uuid: &Uuid,
        kind: ServiceKind,
        max_attribute_records: u8,
    ) -> Result<u16, Error>;

    /// Register a characteristic under a service; returns the declaration
    /// handle. The value attribute lives at declaration + 1 and, for
    /// notify/indicate characteristics, the auto-allocated CCCD at
    /// declaration + 2.
    fn add_characteristic(
        &mut self,
        service_handle: u16,
        characteristic: &CharacteristicDescriptor,
    ) -> Result<u16, Error>;

    /// Write a characteristic's backing value in the attribute database.
    fn update_value(
        &mut self,
        service_handle: u16,
        characteristic_handle: u16,
        offset: u8,
        value: &[u8],
    ) -> Result<(), Error>;

    /// Let a held read request proceed on the given connection.
    fn allow_read(&mut self, conn_handle: u16) -> Result<(), Error>;

    /// Reject a held read request with a protocol-level error.
    fn deny_read(&mut self, conn_handle: u16, reason: Error) -> Result<(), Error>;
}

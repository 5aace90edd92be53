//! Read/write gateway and outbound notification path.
//!
//! [`GattServer`] ties the catalog, the connection tracker and the stack
//! together. Every handler here is a bounded, synchronous computation run
//! from the single event-delivery context; nothing blocks, suspends or
//! retries. Read outcomes are communicated to the stack via allow/deny
//! calls, write outcomes via the returned status.

use defmt::{debug, warn};

use crate::connection::ConnectionTracker;
use crate::descriptors::ServiceDescriptor;
use crate::error::Error;
use crate::registry::{AttributeCatalog, RegisteredCharacteristic};
use crate::stack::{GattStack, MAX_VALUE_UPDATE_LENGTH};

/// A CCCD value is two bytes, little-endian.
const CCCD_VALUE_LENGTH: usize = 2;

/// CCCD bit 0: notifications. The only configuration bit this server
/// supports; indications are not offered by any characteristic.
const CCCD_NOTIFICATIONS_BIT: u8 = 0x01;

/// The application-level attribute server.
pub struct GattServer<S: GattStack> {
    pub(crate) stack: S,
    pub(crate) catalog: AttributeCatalog,
    pub(crate) tracker: ConnectionTracker,
}

impl<S: GattStack> GattServer<S> {
    pub const fn new(stack: S, services: &'static [ServiceDescriptor]) -> Self {
        Self {
            stack,
            catalog: AttributeCatalog::new(services),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Validate and register the whole attribute table. A failure here is
    /// fatal for the boot cycle; no degraded service set is offered.
    pub fn register_all(&mut self) -> Result<(), Error> {
        self.catalog.register_all(&mut self.stack)
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn connection(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Observe-and-clear the restart-advertising request, for the
    /// advertising collaborator.
    pub fn take_advertising_restart(&mut self) -> bool {
        self.tracker.take_advertising_restart()
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Serve a held read request.
    ///
    /// Only offset 0 is supported — long-read fragmentation is not
    /// implemented, so a non-zero offset is denied as an invalid parameter.
    /// A handle matching a refreshable characteristic's value attribute has
    /// its backing value re-sampled before the read is allowed; a handle we
    /// do not recognize is logged and left unanswered, matching the
    /// original firmware's behavior.
    pub fn handle_read_request(&mut self, conn_handle: u16, attr_handle: u16, offset: u16) {
        if offset != 0 {
            warn!(
                "read request: non-zero offset ({}) handle={}",
                offset, attr_handle
            );
            if self.stack.deny_read(conn_handle, Error::InvalidParameter).is_err() {
                warn!("deny_read failed, conn={}", conn_handle);
            }
            return;
        }

        let Some(entry) = self
            .catalog
            .find_by_value_handle(attr_handle)
            .filter(|entry| entry.descriptor.refresh.is_some())
            .copied()
        else {
            warn!("read request: unknown attribute handle={}", attr_handle);
            return;
        };

        if let Err(e) = self.refresh_value(&entry) {
            warn!("value refresh failed: {} handle={}", e, attr_handle);
            if self.stack.deny_read(conn_handle, Error::InvalidParameter).is_err() {
                warn!("deny_read failed, conn={}", conn_handle);
            }
            return;
        }

        // Allow the read for this connection only.
        if conn_handle != crate::connection::INVALID_CONNECTION_HANDLE {
            if let Err(e) = self.stack.allow_read(conn_handle) {
                warn!("allow_read failed: {} conn={}", e, conn_handle);
            }
        }
    }

    /// Re-sample a characteristic's backing value and push it into the
    /// attribute database.
    fn refresh_value(&mut self, entry: &RegisteredCharacteristic) -> Result<(), Error> {
        let Some(refresh) = entry.descriptor.refresh else {
            return Err(Error::UnknownAttribute);
        };
        let value = refresh();
        self.stack.update_value(
            entry.service_handle,
            entry.handles.declaration,
            0,
            &value.to_le_bytes(),
        )
    }

    /// Accept or reject an attribute-modified report from the stack.
    ///
    /// Guards run in order: zero offset, an active connection, then the
    /// handle must match a writable target — the control characteristic's
    /// value attribute or a registered CCCD. Anything else is an unknown
    /// attribute.
    pub fn handle_attribute_modified(
        &mut self,
        attr_handle: u16,
        offset: u16,
        data: &[u8],
    ) -> Result<(), Error> {
        if offset != 0 {
            warn!("attribute modified: non-zero offset ({})", offset);
            return Err(Error::InvalidParameter);
        }

        if !self.tracker.is_connected() {
            warn!("attribute modified while disconnected");
            return Err(Error::NotConnected);
        }

        if Some(attr_handle) == self.catalog.control_write_value_handle() {
            self.tracker.accept_control_write(data)
        } else if self.catalog.find_by_cccd_handle(attr_handle).is_some() {
            self.handle_cccd_write(data)
        } else {
            warn!("attribute modified: unknown handle={}", attr_handle);
            Err(Error::UnknownAttribute)
        }
    }

    /// Interpret a CCCD write: exactly two bytes, LSB first, with only the
    /// notifications bit allowed. `{0x01, 0x00}` enables, `{0x00, 0x00}`
    /// disables; anything else is rejected and leaves the flag unchanged.
    fn handle_cccd_write(&mut self, data: &[u8]) -> Result<(), Error> {
        if data.len() != CCCD_VALUE_LENGTH {
            warn!("CCCD write with invalid length {}", data.len());
            return Err(Error::InvalidParameter);
        }
        if data[1] != 0 {
            warn!("CCCD write with invalid MSB {}", data[1]);
            return Err(Error::InvalidParameter);
        }
        if data[0] & !CCCD_NOTIFICATIONS_BIT != 0 {
            warn!("CCCD write with unsupported bits {}", data[0]);
            return Err(Error::InvalidParameter);
        }

        self.tracker
            .enable_notifications(data[0] & CCCD_NOTIFICATIONS_BIT != 0);
        Ok(())
    }

    /// Push the current value of the notify characteristic to the peer.
    ///
    /// Guards, in order: non-empty payload, payload within the declared
    /// value length, an active connection, notifications enabled by the
    /// peer, and payload within the stack's single-update byte limit. The
    /// last bound is the fixed API ceiling only — the negotiated ATT MTU is
    /// not consulted, a known limitation of this path.
    pub fn send_notification(&mut self, data: &[u8]) -> Result<(), Error> {
        let Some(entry) = self.catalog.notify_characteristic().copied() else {
            warn!("send_notification: no notify characteristic registered");
            return Err(Error::UnknownAttribute);
        };

        if data.is_empty() {
            warn!("send_notification: zero-length payload");
            return Err(Error::InvalidParameter);
        }

        if data.len() > entry.descriptor.value_len as usize {
            warn!(
                "send_notification: max allowed length {}, payload length {}",
                entry.descriptor.value_len,
                data.len()
            );
            return Err(Error::InvalidParameter);
        }

        if !self.tracker.is_connected() {
            warn!("send_notification: not connected");
            return Err(Error::NotConnected);
        }

        if !self.tracker.notifications_enabled() {
            warn!("send_notification: notifications not enabled");
            return Err(Error::NotificationsDisabled);
        }

        if data.len() > MAX_VALUE_UPDATE_LENGTH {
            warn!(
                "send_notification: payload length {} exceeds the update limit",
                data.len()
            );
            return Err(Error::InvalidParameter);
        }

        // Full value update at offset 0.
        self.stack
            .update_value(entry.service_handle, entry.handles.declaration, 0, data)?;
        debug!("notification: transmitted {} bytes", data.len());
        Ok(())
    }
}

//! Single-link connection and notification state.
//!
//! The BlueNRG-2 supports exactly one active connection, so the tracker is
//! a capacity-one registry keyed by connection handle — a multi-link port
//! changes `MAX_CONNECTIONS`, not the logic. All mutation goes through the
//! transition methods here; the gateway only reads.
//!
//! Invariant: notifications are disabled immediately after every connect
//! and disconnect transition. The enablement never persists across links.

use defmt::{debug, warn};
use heapless::Vec;

use crate::error::Error;

/// Number of simultaneous links the target controller supports.
pub const MAX_CONNECTIONS: usize = 1;

/// Sentinel for "no connection".
pub const INVALID_CONNECTION_HANDLE: u16 = 0xFFFF;

/// Capacity of the control-write buffer, matching the control
/// characteristic's declared value length.
pub const CONTROL_BUFFER_CAPACITY: usize = 20;

/// Per-link state, created on connect and destroyed on disconnect.
struct Link {
    handle: u16,
    notifications_enabled: bool,
    /// Last accepted control write. Explicitly zeroed on every rejection
    /// so stale or partial data is never served to higher-level logic.
    control_buf: [u8; CONTROL_BUFFER_CAPACITY],
    control_len: usize,
}

impl Link {
    fn new(handle: u16) -> Self {
        Self {
            handle,
            notifications_enabled: false,
            control_buf: [0; CONTROL_BUFFER_CAPACITY],
            control_len: 0,
        }
    }

    fn clear_control(&mut self) {
        self.control_buf = [0; CONTROL_BUFFER_CAPACITY];
        self.control_len = 0;
    }
}

/// Connection state tracker. Two states: disconnected (no link stored) and
/// connected (one link stored).
pub struct ConnectionTracker {
    links: Vec<Link, MAX_CONNECTIONS>,
    restart_advertising: bool,
}

impl ConnectionTracker {
    pub const fn new() -> Self {
        Self {
            links: Vec::new(),
            restart_advertising: false,
        }
    }

    /// Connection-complete transition: store the new handle with
    /// notifications disabled and the control buffer cleared.
    pub fn on_connected(&mut self, handle: u16) {
        // Sole-connection controller: a new link replaces any stale one.
        self.links.clear();
        let _ = self.links.push(Link::new(handle));
        debug!("connected, handle={}", handle);
    }

    /// Disconnection transition: drop the link's state and ask the
    /// advertising collaborator to restart. Idempotent — a disconnect while
    /// already disconnected leaves the (absent) link state unchanged.
    pub fn on_disconnected(&mut self, handle: u16, reason: u8) {
        self.links.retain(|link| link.handle != handle);
        self.restart_advertising = true;
        debug!("disconnected, handle={} reason={}", handle, reason);
    }

    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// Handle of the active connection, or the invalid sentinel.
    pub fn current_handle(&self) -> u16 {
        self.links
            .first()
            .map_or(INVALID_CONNECTION_HANDLE, |link| link.handle)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.links
            .first()
            .is_some_and(|link| link.notifications_enabled)
    }

    /// Record the peer's notification enablement. No effect while
    /// disconnected.
    pub fn enable_notifications(&mut self, enabled: bool) {
        if let Some(link) = self.links.first_mut() {
            link.notifications_enabled = enabled;
            debug!("notifications enabled={}", enabled);
        }
    }

    /// Bounded-copy accept of a control write. Rejects empty payloads and
    /// payloads exceeding the buffer; any rejection zeroes the buffer and
    /// resets the recorded length.
    pub fn accept_control_write(&mut self, data: &[u8]) -> Result<(), Error> {
        let Some(link) = self.links.first_mut() else {
            warn!("control write while disconnected");
            return Err(Error::NotConnected);
        };

        let result = if data.is_empty() {
            warn!("control write: zero-length payload");
            Err(Error::InvalidParameter)
        } else if data.len() > CONTROL_BUFFER_CAPACITY {
            warn!(
                "control write: buffer too small ({} < {})",
                CONTROL_BUFFER_CAPACITY,
                data.len()
            );
            Err(Error::InvalidParameter)
        } else {
            link.control_buf[..data.len()].copy_from_slice(data);
            link.control_len = data.len();
            debug!("control write: received {} bytes", data.len());
            Ok(())
        };

        if result.is_err() {
            link.clear_control();
        }
        result
    }

    /// Last accepted control payload; empty when none has arrived on the
    /// current link.
    pub fn control_payload(&self) -> &[u8] {
        self.links
            .first()
            .map_or(&[], |link| &link.control_buf[..link.control_len])
    }

    /// Observe-and-clear the restart-advertising request raised on
    /// disconnect, for the advertising collaborator to act on.
    pub fn take_advertising_restart(&mut self) -> bool {
        core::mem::replace(&mut self.restart_advertising, false)
    }

    /// Whether a restart request is pending, without consuming it.
    pub fn advertising_restart_requested(&self) -> bool {
        self.restart_advertising
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

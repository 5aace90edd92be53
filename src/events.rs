//! Table-driven dispatch of raw controller events.
//!
//! The stack delivers opaque event packets through a single pump callback.
//! Classification is strictly hierarchical: the outer event code picks one
//! of three independent tables (LE meta sub-events, vendor events, generic
//! HCI events), and a linear lookup inside that table picks the handler.
//! Adding a handled event means adding one table row. A miss at any tier
//! logs an "unhandled" warning and invokes nothing — never a crash.

use defmt::warn;

use crate::error::Error;
use crate::server::GattServer;
use crate::stack::GattStack;

/// HCI packet type carrying an event.
pub const HCI_EVENT_PKT: u8 = 0x04;

/// HCI Disconnection Complete event code.
pub const EVT_DISCONN_COMPLETE: u8 = 0x05;

/// HCI LE Meta event code; the sub-event code is the first payload byte.
pub const EVT_LE_META_EVENT: u8 = 0x3E;

/// Vendor-specific event code; the ecode is the first two payload bytes.
pub const EVT_VENDOR: u8 = 0xFF;

/// LE Connection Complete sub-event code.
pub const EVT_LE_CONN_COMPLETE: u8 = 0x01;

/// Vendor ecode: GATT attribute modified.
pub const EVT_BLUE_GATT_ATTRIBUTE_MODIFIED: u16 = 0x0C01;

/// Vendor ecode: GATT read permit request.
pub const EVT_BLUE_GATT_READ_PERMIT_REQ: u16 = 0x0C13;

/// LE Connection Complete payload: status, handle, role, peer address
/// type, peer address, interval, latency, supervision timeout, clock
/// accuracy.
const LE_CONN_COMPLETE_LENGTH: usize = 18;

/// Disconnection Complete payload: status, handle, reason.
const DISCONN_COMPLETE_LENGTH: usize = 4;

/// One dispatch-table row: an event code paired with its handler.
///
/// Tables are ordered sequences searched linearly by code equality,
/// constructed once at compile time.
pub struct EventEntry<T, C> {
    pub code: C,
    pub handler: fn(&mut T, &[u8]),
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

/// Split an attribute-modified payload into (attribute handle, offset,
/// data). The connection handle in front is ignored — connection state is
/// tracked from the connection events, not per report.
fn parse_attribute_modified(payload: &[u8]) -> Result<(u16, u16, &[u8]), Error> {
    if payload.len() < 8 {
        return Err(Error::InvalidParameter);
    }
    let attr_handle = read_u16(payload, 2);
    let offset = read_u16(payload, 4);
    let data_length = read_u16(payload, 6) as usize;
    let data = &payload[8..];
    if data.len() < data_length {
        // The event declares more data than it carries.
        return Err(Error::NullParameter);
    }
    Ok((attr_handle, offset, &data[..data_length]))
}

// The `'static` bound lets the dispatch tables borrow `Self` for 'static;
// stack implementations hold no borrowed state.
impl<S: GattStack + 'static> GattServer<S> {
    const LE_META_EVENTS: &'static [EventEntry<Self, u8>] = &[EventEntry {
        code: EVT_LE_CONN_COMPLETE,
        handler: Self::on_le_connection_complete,
    }];

    const VENDOR_EVENTS: &'static [EventEntry<Self, u16>] = &[
        EventEntry {
            code: EVT_BLUE_GATT_ATTRIBUTE_MODIFIED,
            handler: Self::on_attribute_modified_event,
        },
        EventEntry {
            code: EVT_BLUE_GATT_READ_PERMIT_REQ,
            handler: Self::on_read_permit_request_event,
        },
    ];

    const HCI_EVENTS: &'static [EventEntry<Self, u8>] = &[EventEntry {
        code: EVT_DISCONN_COMPLETE,
        handler: Self::on_disconnection_complete,
    }];

    /// Single entry point for the stack's event pump.
    ///
    /// `raw` is a whole controller packet: packet type, event code,
    /// parameter length, payload. Non-event packets and truncated packets
    /// are dropped with a diagnostic.
    pub fn dispatch(&mut self, raw: &[u8]) {
        let Some((&packet_type, event)) = raw.split_first() else {
            return;
        };
        if packet_type != HCI_EVENT_PKT {
            return;
        }
        if event.len() < 2 {
            warn!("event packet too short ({} bytes)", event.len());
            return;
        }
        let event_code = event[0];
        let declared_len = event[1] as usize;
        let payload = &event[2..];
        if payload.len() < declared_len {
            warn!(
                "event {} truncated ({} < {})",
                event_code,
                payload.len(),
                declared_len
            );
            return;
        }
        let payload = &payload[..declared_len];

        match event_code {
            EVT_LE_META_EVENT => {
                // Need at least one byte for the sub-event code.
                let Some((&subevent, data)) = payload.split_first() else {
                    warn!("LE meta event with invalid length {}", payload.len());
                    return;
                };
                if !Self::lookup(Self::LE_META_EVENTS, subevent, self, data) {
                    warn!("unhandled LE meta subevent={}", subevent);
                }
            }
            EVT_VENDOR => {
                if payload.len() < 2 {
                    warn!("vendor event with invalid length {}", payload.len());
                    return;
                }
                let ecode = read_u16(payload, 0);
                if !Self::lookup(Self::VENDOR_EVENTS, ecode, self, &payload[2..]) {
                    warn!("unhandled vendor event ecode={}", ecode);
                }
            }
            _ => {
                if !Self::lookup(Self::HCI_EVENTS, event_code, self, payload) {
                    warn!("unhandled HCI event evt={}", event_code);
                }
            }
        }
    }

    /// Linear search of one dispatch table; returns whether a row matched.
    fn lookup<C: PartialEq + Copy>(
        table: &[EventEntry<Self, C>],
        code: C,
        server: &mut Self,
        data: &[u8],
    ) -> bool {
        for entry in table {
            if entry.code == code {
                (entry.handler)(server, data);
                return true;
            }
        }
        false
    }

    fn on_le_connection_complete(&mut self, data: &[u8]) {
        if data.len() < LE_CONN_COMPLETE_LENGTH {
            warn!("LE connection complete with invalid length {}", data.len());
            return;
        }
        let handle = read_u16(data, 1);
        self.tracker.on_connected(handle);
    }

    fn on_disconnection_complete(&mut self, data: &[u8]) {
        if data.len() < DISCONN_COMPLETE_LENGTH {
            warn!("disconnection complete with invalid length {}", data.len());
            return;
        }
        let handle = read_u16(data, 1);
        let reason = data[3];
        self.tracker.on_disconnected(handle, reason);
    }

    fn on_attribute_modified_event(&mut self, payload: &[u8]) {
        let (attr_handle, offset, data) = match parse_attribute_modified(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("malformed attribute modified event: {}", e);
                return;
            }
        };
        if let Err(e) = self.handle_attribute_modified(attr_handle, offset, data) {
            warn!("attribute modified failed: {} handle={}", e, attr_handle);
        }
    }

    fn on_read_permit_request_event(&mut self, payload: &[u8]) {
        if payload.len() < 6 {
            warn!("read permit request with invalid length {}", payload.len());
            return;
        }
        let conn_handle = read_u16(payload, 0);
        let attr_handle = read_u16(payload, 2);
        let offset = read_u16(payload, 4);
        self.handle_read_request(conn_handle, attr_handle, offset);
    }
}

//! Shared test fixtures: a recording mock stack and raw event builders.
#![allow(dead_code)]

use bluenrg2_gatt_peripheral::descriptors::{CharacteristicDescriptor, ServiceKind};
use bluenrg2_gatt_peripheral::error::Error;
use bluenrg2_gatt_peripheral::events::{
    EVT_BLUE_GATT_ATTRIBUTE_MODIFIED, EVT_BLUE_GATT_READ_PERMIT_REQ, EVT_DISCONN_COMPLETE,
    EVT_LE_CONN_COMPLETE, EVT_LE_META_EVENT, EVT_VENDOR, HCI_EVENT_PKT,
};
use bluenrg2_gatt_peripheral::server::GattServer;
use bluenrg2_gatt_peripheral::services::app_services;
use bluenrg2_gatt_peripheral::stack::GattStack;
use bluenrg2_gatt_peripheral::uuid::Uuid;

/// Every call the server makes into the stack, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum StackCall {
    AddService {
        handle: u16,
    },
    AddCharacteristic {
        service_handle: u16,
        declaration: u16,
    },
    UpdateValue {
        service_handle: u16,
        characteristic_handle: u16,
        offset: u8,
        value: Vec<u8>,
    },
    AllowRead {
        conn_handle: u16,
    },
    DenyRead {
        conn_handle: u16,
        reason: Error,
    },
}

/// Recording stack double. Assigns handles the way the controller does:
/// one per service declaration, then one per attribute record of each
/// characteristic.
pub struct MockStack {
    pub calls: Vec<StackCall>,
    next_handle: u16,
    characteristics_added: usize,
    /// Fail the nth (0-based) add_characteristic call.
    pub fail_characteristic_at: Option<usize>,
    pub fail_update_value: bool,
}

impl MockStack {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_handle: 0x0010,
            characteristics_added: 0,
            fail_characteristic_at: None,
            fail_update_value: false,
        }
    }

    pub fn update_values(&self) -> Vec<&StackCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, StackCall::UpdateValue { .. }))
            .collect()
    }
}

impl GattStack for MockStack {
    fn add_service(
        &mut self,
        _uuid: &Uuid,
        _kind: ServiceKind,
        _max_attribute_records: u8,
    ) -> Result<u16, Error> {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.calls.push(StackCall::AddService { handle });
        Ok(handle)
    }

    fn add_characteristic(
        &mut self,
        service_handle: u16,
        characteristic: &CharacteristicDescriptor,
    ) -> Result<u16, Error> {
        if self.fail_characteristic_at == Some(self.characteristics_added) {
            return Err(Error::RegistrationFailed);
        }
        self.characteristics_added += 1;
        let declaration = self.next_handle;
        self.next_handle += characteristic.required_records() as u16;
        self.calls.push(StackCall::AddCharacteristic {
            service_handle,
            declaration,
        });
        Ok(declaration)
    }

    fn update_value(
        &mut self,
        service_handle: u16,
        characteristic_handle: u16,
        offset: u8,
        value: &[u8],
    ) -> Result<(), Error> {
        if self.fail_update_value {
            return Err(Error::InvalidParameter);
        }
        self.calls.push(StackCall::UpdateValue {
            service_handle,
            characteristic_handle,
            offset,
            value: value.to_vec(),
        });
        Ok(())
    }

    fn allow_read(&mut self, conn_handle: u16) -> Result<(), Error> {
        self.calls.push(StackCall::AllowRead { conn_handle });
        Ok(())
    }

    fn deny_read(&mut self, conn_handle: u16, reason: Error) -> Result<(), Error> {
        self.calls.push(StackCall::DenyRead { conn_handle, reason });
        Ok(())
    }
}

/// Connection handle used by the builders below.
pub const TEST_CONN_HANDLE: u16 = 0x0801;

/// A server over the application catalog, registered.
pub fn registered_server() -> GattServer<MockStack> {
    let mut server = GattServer::new(MockStack::new(), app_services());
    server.register_all().expect("registration must succeed");
    server
}

/// A registered server with an active connection.
pub fn connected_server() -> GattServer<MockStack> {
    let mut server = registered_server();
    server.dispatch(&le_connection_complete(TEST_CONN_HANDLE));
    assert!(server.connection().is_connected());
    server
}

/// Wrap an event payload into a full controller packet.
pub fn event_packet(event_code: u8, payload: &[u8]) -> Vec<u8> {
    let mut raw = vec![HCI_EVENT_PKT, event_code, payload.len() as u8];
    raw.extend_from_slice(payload);
    raw
}

pub fn meta_event(subevent: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = vec![subevent];
    payload.extend_from_slice(data);
    event_packet(EVT_LE_META_EVENT, &payload)
}

pub fn vendor_event(ecode: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = ecode.to_le_bytes().to_vec();
    payload.extend_from_slice(data);
    event_packet(EVT_VENDOR, &payload)
}

/// LE Connection Complete for `handle`, peripheral role.
pub fn le_connection_complete(handle: u16) -> Vec<u8> {
    let mut data = vec![0x00]; // status
    data.extend_from_slice(&handle.to_le_bytes());
    data.push(0x01); // role: peripheral
    data.push(0x00); // peer address type: public
    data.extend_from_slice(&[0xC0, 0xFF, 0xEE, 0xC0, 0xFF, 0xEE]);
    data.extend_from_slice(&24u16.to_le_bytes()); // interval
    data.extend_from_slice(&0u16.to_le_bytes()); // latency
    data.extend_from_slice(&400u16.to_le_bytes()); // supervision timeout
    data.push(0x00); // master clock accuracy
    meta_event(EVT_LE_CONN_COMPLETE, &data)
}

pub fn disconnection_complete(handle: u16, reason: u8) -> Vec<u8> {
    let mut data = vec![0x00]; // status
    data.extend_from_slice(&handle.to_le_bytes());
    data.push(reason);
    event_packet(EVT_DISCONN_COMPLETE, &data)
}

pub fn attribute_modified(attr_handle: u16, offset: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = TEST_CONN_HANDLE.to_le_bytes().to_vec();
    payload.extend_from_slice(&attr_handle.to_le_bytes());
    payload.extend_from_slice(&offset.to_le_bytes());
    payload.extend_from_slice(&(data.len() as u16).to_le_bytes());
    payload.extend_from_slice(data);
    vendor_event(EVT_BLUE_GATT_ATTRIBUTE_MODIFIED, &payload)
}

pub fn read_permit_request(conn_handle: u16, attr_handle: u16, offset: u16) -> Vec<u8> {
    let mut payload = conn_handle.to_le_bytes().to_vec();
    payload.extend_from_slice(&attr_handle.to_le_bytes());
    payload.extend_from_slice(&offset.to_le_bytes());
    vendor_event(EVT_BLUE_GATT_READ_PERMIT_REQ, &payload)
}

/// Value handle of the control-write characteristic.
pub fn control_value_handle(server: &GattServer<MockStack>) -> u16 {
    server
        .catalog()
        .control_write_value_handle()
        .expect("control characteristic registered")
}

/// CCCD handle of the notify characteristic.
pub fn notify_cccd_handle(server: &GattServer<MockStack>) -> u16 {
    server
        .catalog()
        .notify_cccd_handle()
        .expect("notify characteristic registered")
}

//! Attribute catalog: the canonical descriptor set and its runtime handles.
//!
//! Registration walks services and characteristics in declaration order —
//! the order matters, because each service's attribute-record budget is
//! computed from its fixed declaration-order layout. The first failure
//! aborts the whole sequence: a partially registered attribute table is not
//! considered safe to run with, so the error is surfaced to the caller as
//! fatal for this boot cycle. There is no rollback.

use defmt::{debug, warn};
use heapless::Vec;

use crate::descriptors::{
    validate_characteristic, validate_service, CharProperty, CharacteristicDescriptor,
    ServiceDescriptor, WRITE_PROPERTIES,
};
use crate::error::Error;
use crate::stack::GattStack;

/// Maximum number of services the catalog can hold.
pub const MAX_SERVICES: usize = 8;

/// Maximum number of characteristics across all services.
pub const MAX_CHARACTERISTICS: usize = 32;

/// Handle triple assigned to a characteristic at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct HandleTriple {
    /// Characteristic declaration attribute.
    pub declaration: u16,
    /// Value attribute, always declaration + 1.
    pub value: u16,
    /// Client configuration attribute, declaration + 2, auto-allocated by
    /// the stack for notify/indicate characteristics only.
    pub cccd: Option<u16>,
}

/// A characteristic with its runtime handles and owning service handle.
#[derive(Clone, Copy)]
pub struct RegisteredCharacteristic {
    pub service_handle: u16,
    pub descriptor: &'static CharacteristicDescriptor,
    pub handles: HandleTriple,
}

/// Registry mapping the static descriptor set to runtime handles.
pub struct AttributeCatalog {
    services: &'static [ServiceDescriptor],
    service_handles: Vec<u16, MAX_SERVICES>,
    characteristics: Vec<RegisteredCharacteristic, MAX_CHARACTERISTICS>,
}

impl AttributeCatalog {
    pub const fn new(services: &'static [ServiceDescriptor]) -> Self {
        Self {
            services,
            service_handles: Vec::new(),
            characteristics: Vec::new(),
        }
    }

    /// Whether `register_all` has completed successfully.
    pub fn is_registered(&self) -> bool {
        self.service_handles.len() == self.services.len() && !self.services.is_empty()
    }

    /// Validate and register every service and characteristic, in
    /// declaration order, storing the handles the stack assigns.
    pub fn register_all<S: GattStack>(&mut self, stack: &mut S) -> Result<(), Error> {
        if !self.service_handles.is_empty() {
            warn!("register_all: catalog already registered");
            return Err(Error::InvalidParameter);
        }

        for service in self.services {
            validate_service(service)?;

            let service_handle = stack
                .add_service(&service.uuid, service.kind, service.max_attribute_records)
                .inspect_err(|e| warn!("add_service failed: {}", e))?;
            if self.service_handles.push(service_handle).is_err() {
                warn!("register_all: service storage full");
                return Err(Error::RegistrationFailed);
            }

            for characteristic in service.characteristics {
                validate_characteristic(characteristic)?;

                let declaration = stack
                    .add_characteristic(service_handle, characteristic)
                    .inspect_err(|e| warn!("add_characteristic failed: {}", e))?;
                let handles = HandleTriple {
                    declaration,
                    value: declaration + 1,
                    cccd: characteristic.has_cccd().then_some(declaration + 2),
                };
                let entry = RegisteredCharacteristic {
                    service_handle,
                    descriptor: characteristic,
                    handles,
                };
                if self.characteristics.push(entry).is_err() {
                    warn!("register_all: characteristic storage full");
                    return Err(Error::RegistrationFailed);
                }
                debug!(
                    "registered characteristic: declaration={} value={}",
                    handles.declaration, handles.value
                );
            }
        }

        debug!(
            "catalog registered: {} services, {} characteristics",
            self.service_handles.len(),
            self.characteristics.len()
        );
        Ok(())
    }

    /// All registered characteristics in declaration order.
    pub fn characteristics(&self) -> &[RegisteredCharacteristic] {
        &self.characteristics
    }

    /// Runtime handles of all registered services, in declaration order.
    pub fn service_handles(&self) -> &[u16] {
        &self.service_handles
    }

    /// Find a characteristic by its value attribute handle.
    pub fn find_by_value_handle(&self, handle: u16) -> Option<&RegisteredCharacteristic> {
        self.characteristics.iter().find(|c| c.handles.value == handle)
    }

    /// Find a characteristic by its client configuration handle.
    pub fn find_by_cccd_handle(&self, handle: u16) -> Option<&RegisteredCharacteristic> {
        self.characteristics
            .iter()
            .find(|c| c.handles.cccd == Some(handle))
    }

    /// Value handle of the control-write characteristic, if registered.
    pub fn control_write_value_handle(&self) -> Option<u16> {
        self.characteristics
            .iter()
            .find(|c| !c.descriptor.properties.is_disjoint(WRITE_PROPERTIES))
            .map(|c| c.handles.value)
    }

    /// The notify characteristic, if registered.
    pub fn notify_characteristic(&self) -> Option<&RegisteredCharacteristic> {
        self.characteristics
            .iter()
            .find(|c| c.descriptor.properties.contains(CharProperty::Notify))
    }

    /// CCCD handle of the notify characteristic, if registered.
    pub fn notify_cccd_handle(&self) -> Option<u16> {
        self.notify_characteristic().and_then(|c| c.handles.cccd)
    }
}

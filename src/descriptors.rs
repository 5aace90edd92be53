//! Service and characteristic descriptors, and their validation.
//!
//! Descriptors are design-time constants; they pass through the validators
//! here exactly once, before the corresponding registration call reaches
//! the stack. The stack itself only returns generic error codes, so
//! caller-side validation is what identifies the faulty parameter.

use defmt::warn;
use enumset::{enum_set, EnumSet, EnumSetType};

use crate::error::Error;
use crate::uuid::Uuid;

/// Char_Value_Length valid range per the controller documentation: 1..=512.
pub const MAX_CHAR_VALUE_LENGTH: u16 = 512;

/// Maximum reasonable attribute records per single service.
/// A sanity limit to catch configuration bugs, not a stack limit.
pub const MAX_SERVICE_ATTRIBUTE_RECORDS: u8 = 20;

/// Minimum acceptable encryption key size (bytes) when encryption is required.
pub const MIN_ENCRYPTION_KEY_SIZE: u8 = 7;

/// Maximum encryption key size (bytes), fixed by the BLE specification.
pub const MAX_ENCRYPTION_KEY_SIZE: u8 = 16;

/// Service type as declared in the attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ServiceKind {
    Primary,
    Secondary,
}

/// Characteristic properties (matches the BLE specification bit order).
#[derive(Debug, EnumSetType)]
pub enum CharProperty {
    Broadcast,
    Read,
    WriteWithoutResponse,
    Write,
    Notify,
    Indicate,
    SignedWrite,
    ExtendedProperties,
}

/// Properties that make a characteristic writable by the peer.
pub const WRITE_PROPERTIES: EnumSet<CharProperty> =
    enum_set!(CharProperty::Write | CharProperty::WriteWithoutResponse);

/// Properties for which the stack auto-allocates a CCCD attribute.
pub const CCCD_PROPERTIES: EnumSet<CharProperty> =
    enum_set!(CharProperty::Notify | CharProperty::Indicate);

/// Access permission on a characteristic value.
///
/// `None` is valid and normal; read/write characteristics are not rejected
/// because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Permission {
    None,
    Encrypted,
}

/// Which application events the stack should raise for a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum GattEventMask {
    DontNotify,
    NotifyAttributeWrite,
    NotifyReadRequestAndWait,
}

/// Re-sample operation for a readable value, invoked before a read is
/// allowed. Returns the fresh 16-bit sensor or test value.
pub type RefreshFn = fn() -> i16;

/// A characteristic as declared in the application catalog.
#[derive(Clone, Copy)]
pub struct CharacteristicDescriptor {
    pub uuid: Uuid,
    /// Maximum size (bytes) of the value attribute stored in the GATT
    /// database; the fixed size when `is_variable` is false.
    pub value_len: u16,
    pub properties: EnumSet<CharProperty>,
    pub permission: Permission,
    /// Minimum required LTK size (bytes) for encrypted access. 0 when no
    /// encryption is required; 7..=16 otherwise.
    pub min_key_size: u8,
    pub is_variable: bool,
    /// Backing-value refresh, present on sensor-style readable values.
    pub refresh: Option<RefreshFn>,
}

impl CharacteristicDescriptor {
    /// Whether registration allocates a client configuration descriptor.
    pub fn has_cccd(&self) -> bool {
        !self.properties.is_disjoint(CCCD_PROPERTIES)
    }

    /// Attribute records consumed by this characteristic: declaration and
    /// value always, plus the auto-allocated CCCD for notify/indicate.
    pub fn required_records(&self) -> u8 {
        if self.has_cccd() {
            3
        } else {
            2
        }
    }

    /// Event mask handed to the stack at registration time. Writable
    /// characteristics report writes, plain readable ones hold reads for
    /// application approval, notify-only ones need no events at all.
    pub fn event_mask(&self) -> GattEventMask {
        if !self.properties.is_disjoint(WRITE_PROPERTIES) {
            GattEventMask::NotifyAttributeWrite
        } else if self.properties.contains(CharProperty::Read) {
            GattEventMask::NotifyReadRequestAndWait
        } else {
            GattEventMask::DontNotify
        }
    }
}

/// A service and its characteristics, in declaration order.
#[derive(Clone, Copy)]
pub struct ServiceDescriptor {
    pub uuid: Uuid,
    pub kind: ServiceKind,
    /// Attribute records reserved for this service. Per-service, not a
    /// global pool: it must cover the service declaration and every
    /// attribute of every characteristic belonging to this service.
    pub max_attribute_records: u8,
    pub characteristics: &'static [CharacteristicDescriptor],
}

impl ServiceDescriptor {
    /// Attribute records the declared layout actually needs.
    pub fn required_records(&self) -> u8 {
        let mut records = 1; // service declaration
        for characteristic in self.characteristics {
            records += characteristic.required_records();
        }
        records
    }
}

/// Validate service parameters before the registration call.
///
/// Checks run in a fixed order and the first failure wins, so a given
/// misconfiguration always produces the same diagnostic. UUID encoding and
/// presence need no check here: the [`Uuid`] type admits exactly the two
/// supported encodings and cannot be absent.
pub fn validate_service(service: &ServiceDescriptor) -> Result<(), Error> {
    if service.max_attribute_records == 0 {
        warn!("add_service: max_attribute_records is zero");
        return Err(Error::InvalidParameter);
    }

    if service.kind == ServiceKind::Primary && service.max_attribute_records < 2 {
        warn!("add_service: a primary service requires at least 2 attribute records");
        return Err(Error::InvalidParameter);
    }

    if service.max_attribute_records > MAX_SERVICE_ATTRIBUTE_RECORDS {
        warn!(
            "add_service: max_attribute_records too large ({} > {})",
            service.max_attribute_records, MAX_SERVICE_ATTRIBUTE_RECORDS
        );
        return Err(Error::InvalidParameter);
    }

    Ok(())
}

/// Validate characteristic parameters before the registration call.
///
/// `value_len` bounds apply to fixed and variable characteristics alike:
/// for a variable-length value it is the maximum allowed length. Inputs are
/// never silently coerced into range.
pub fn validate_characteristic(characteristic: &CharacteristicDescriptor) -> Result<(), Error> {
    if characteristic.properties.is_empty() {
        warn!("add_char: properties is empty");
        return Err(Error::InvalidParameter);
    }

    if characteristic.value_len == 0 {
        if characteristic.is_variable {
            warn!("add_char: variable-length characteristic with zero length");
        } else {
            warn!("add_char: fixed-length characteristic with zero length");
        }
        return Err(Error::InvalidParameter);
    }

    if characteristic.value_len > MAX_CHAR_VALUE_LENGTH {
        warn!(
            "add_char: value length too large ({} > {})",
            characteristic.value_len, MAX_CHAR_VALUE_LENGTH
        );
        return Err(Error::InvalidParameter);
    }

    match characteristic.permission {
        Permission::Encrypted => {
            if characteristic.min_key_size < MIN_ENCRYPTION_KEY_SIZE {
                warn!(
                    "add_char: min_key_size too small ({} < {})",
                    characteristic.min_key_size, MIN_ENCRYPTION_KEY_SIZE
                );
                return Err(Error::InsufficientEncryptionKeySize);
            }
            if characteristic.min_key_size > MAX_ENCRYPTION_KEY_SIZE {
                warn!(
                    "add_char: min_key_size too large ({} > {})",
                    characteristic.min_key_size, MAX_ENCRYPTION_KEY_SIZE
                );
                return Err(Error::InvalidParameter);
            }
        }
        Permission::None => {
            // The stack ignores the key size without encryption; flag the
            // leftover value but do not reject the characteristic.
            if characteristic.min_key_size != 0 {
                warn!(
                    "add_char: min_key_size ignored with Permission::None ({})",
                    characteristic.min_key_size
                );
            }
        }
    }

    Ok(())
}

//! The application's attribute catalog: a health service and a weather
//! service, as exposed by the digital-watch peripheral.
//!
//! All UUIDs are 128-bit, little-endian. Characteristic UUIDs are derived
//! from their service UUID by offsetting byte 12 (see [`Uuid::derived`]).

use enumset::enum_set;

use crate::connection::CONTROL_BUFFER_CAPACITY;
use crate::descriptors::{
    CharProperty, CharacteristicDescriptor, Permission, ServiceDescriptor, ServiceKind,
};
use crate::uuid::Uuid;

/// Test readings served until real sensors are wired in.
pub const TEST_BPM_SENSOR_DATA: i16 = 80;
pub const TEST_WEIGHT_SENSOR_DATA: i16 = 75;
pub const TEST_TEMPERATURE_SENSOR_DATA: i16 = 17;
pub const TEST_HUMIDITY_SENSOR_DATA: i16 = 48;

/// Maximum value length of the notify (data TX) characteristic.
pub const DATA_TX_VALUE_LENGTH: u16 = 20;

/// Maximum value length of the control (RX) characteristic; must match the
/// tracker's control buffer.
pub const CONTROL_RX_VALUE_LENGTH: u16 = CONTROL_BUFFER_CAPACITY as u16;

/// 128-bit health service UUID, little-endian.
pub const HEALTH_SERVICE_UUID: [u8; 16] = [
    0x39, 0xea, 0x83, 0x31, 0xa4, 0x1e, 0x4c, 0xbf, 0xa5, 0x99, 0x5a, 0xfc, 0x3e, 0xd2, 0x68,
    0x51,
];

/// 128-bit weather service UUID, little-endian.
pub const WEATHER_SERVICE_UUID: [u8; 16] = [
    0x8a, 0x7e, 0x84, 0xfd, 0x78, 0x6f, 0x43, 0x48, 0xa8, 0xc4, 0x46, 0x70, 0xf3, 0x39, 0xfb,
    0x72,
];

fn sample_bpm() -> i16 {
    TEST_BPM_SENSOR_DATA
}

fn sample_weight() -> i16 {
    TEST_WEIGHT_SENSOR_DATA
}

fn sample_temperature() -> i16 {
    TEST_TEMPERATURE_SENSOR_DATA
}

fn sample_humidity() -> i16 {
    TEST_HUMIDITY_SENSOR_DATA
}

/// Health service characteristics, in declaration order.
static HEALTH_CHARACTERISTICS: [CharacteristicDescriptor; 4] = [
    // Heart rate in beats per minute (READ)
    CharacteristicDescriptor {
        uuid: Uuid::derived(HEALTH_SERVICE_UUID, 1),
        value_len: 2,
        properties: enum_set!(CharProperty::Read),
        permission: Permission::None,
        min_key_size: 0,
        is_variable: false,
        refresh: Some(sample_bpm),
    },
    // Weight in kilograms (READ)
    CharacteristicDescriptor {
        uuid: Uuid::derived(HEALTH_SERVICE_UUID, 2),
        value_len: 2,
        properties: enum_set!(CharProperty::Read),
        permission: Permission::None,
        min_key_size: 0,
        is_variable: false,
        refresh: Some(sample_weight),
    },
    // Data TX stream (NOTIFY, CCCD auto-allocated by the stack)
    CharacteristicDescriptor {
        uuid: Uuid::derived(HEALTH_SERVICE_UUID, 3),
        value_len: DATA_TX_VALUE_LENGTH,
        properties: enum_set!(CharProperty::Notify),
        permission: Permission::None,
        min_key_size: 0,
        is_variable: true,
        refresh: None,
    },
    // Control RX commands (WRITE / WRITE_NO_RESP)
    CharacteristicDescriptor {
        uuid: Uuid::derived(HEALTH_SERVICE_UUID, 4),
        value_len: CONTROL_RX_VALUE_LENGTH,
        properties: enum_set!(CharProperty::Write | CharProperty::WriteWithoutResponse),
        permission: Permission::None,
        min_key_size: 0,
        is_variable: true,
        refresh: None,
    },
];

/// Weather service characteristics, in declaration order.
static WEATHER_CHARACTERISTICS: [CharacteristicDescriptor; 2] = [
    // Temperature (READ)
    CharacteristicDescriptor {
        uuid: Uuid::derived(WEATHER_SERVICE_UUID, 1),
        value_len: 2,
        properties: enum_set!(CharProperty::Read),
        permission: Permission::None,
        min_key_size: 0,
        is_variable: false,
        refresh: Some(sample_temperature),
    },
    // Humidity (READ)
    CharacteristicDescriptor {
        uuid: Uuid::derived(WEATHER_SERVICE_UUID, 2),
        value_len: 2,
        properties: enum_set!(CharProperty::Read),
        permission: Permission::None,
        min_key_size: 0,
        is_variable: false,
        refresh: Some(sample_humidity),
    },
];

/// Health service attribute records: 1 service declaration, 2 each for the
/// BPM and weight characteristics, 3 for data TX (CCCD), 2 for control RX,
/// plus two spare records of headroom.
pub const HEALTH_SERVICE_ATTR_RECORDS: u8 = 12;

/// Weather service attribute records: 1 service declaration, 2 each for
/// temperature and humidity.
pub const WEATHER_SERVICE_ATTR_RECORDS: u8 = 5;

/// The full service set, in registration order.
static APP_SERVICES: [ServiceDescriptor; 2] = [
    ServiceDescriptor {
        uuid: Uuid::Uuid128(HEALTH_SERVICE_UUID),
        kind: ServiceKind::Primary,
        max_attribute_records: HEALTH_SERVICE_ATTR_RECORDS,
        characteristics: &HEALTH_CHARACTERISTICS,
    },
    ServiceDescriptor {
        uuid: Uuid::Uuid128(WEATHER_SERVICE_UUID),
        kind: ServiceKind::Primary,
        max_attribute_records: WEATHER_SERVICE_ATTR_RECORDS,
        characteristics: &WEATHER_CHARACTERISTICS,
    },
];

/// Descriptor set handed to [`crate::registry::AttributeCatalog`].
pub fn app_services() -> &'static [ServiceDescriptor] {
    &APP_SERVICES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{validate_characteristic, validate_service};

    #[test]
    fn declared_budgets_cover_the_layout() {
        // Over-reservation is harmless; a budget below the layout would make
        // registration fail at runtime.
        for service in app_services() {
            assert!(service.max_attribute_records >= service.required_records());
        }
    }

    #[test]
    fn every_descriptor_passes_validation() {
        for service in app_services() {
            validate_service(service).unwrap();
            for characteristic in service.characteristics {
                validate_characteristic(characteristic).unwrap();
            }
        }
    }

    #[test]
    fn characteristic_uuids_stay_within_their_service_base() {
        let Uuid::Uuid128(base) = app_services()[0].uuid else {
            panic!("expected a 128-bit service UUID");
        };
        for (i, characteristic) in HEALTH_CHARACTERISTICS.iter().enumerate() {
            let Uuid::Uuid128(uuid) = characteristic.uuid else {
                panic!("expected a 128-bit characteristic UUID");
            };
            assert_eq!(uuid[12], base[12] + 1 + i as u8);
            assert_eq!(uuid[..12], base[..12]);
            assert_eq!(uuid[13..], base[13..]);
        }
    }
}

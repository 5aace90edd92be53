#![no_std]

//! BlueNRG-2 GATT Peripheral Application Core
//!
//! Application-level attribute server for a single-link BLE peripheral,
//! organized into clear architectural layers:
//!
//! - `descriptors`: service/characteristic descriptors and their validation
//! - `registry`: the attribute catalog and runtime handle assignments
//! - `connection`: single-link connection and notification state
//! - `server`: the read/write gateway and outbound notifications
//! - `events`: table-driven dispatch of raw controller events
//!
//! The radio stack itself (ACI/HCI transport, advertising timing, pairing)
//! is an external collaborator reached through the [`stack::GattStack`]
//! trait; this crate never talks to the wire directly.

pub mod connection;
pub mod descriptors;
pub mod error;
pub mod events;
pub mod registry;
pub mod server;
pub mod services;
pub mod stack;
pub mod uuid;

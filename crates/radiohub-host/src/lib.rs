//! Host-side service layer for a LoRa mesh radio module.
//!
//! This crate sits on top of [`radiohub_protocol`] and gives each protocol
//! service (a *service access point*, SAP) its message tables: request
//! encoders looked up by name, response and event decoders looked up by
//! message id, and the status-code table used by every response.
//!
//! The [`RadioHub`] dispatcher owns the registered SAPs, reassembles frames
//! from transport bytes, and routes each decoded frame to its owning SAP.
//! Every processed frame produces exactly one [`Outcome`] on the caller's
//! notification sink: a structured [`Report`] on success, a typed
//! [`ProtocolError`](radiohub_protocol::ProtocolError) otherwise. A bad
//! frame never stops the stream.
//!
//! Standard services:
//!
//! - [`DeviceManagement`] (SAP 0x01): ping, device/firmware info, restart,
//!   date and time, system options, startup indication.
//! - [`LoRaMeshRouter`] (SAP 0x0A): network address, router mode, link
//!   status, routing table, packet transmission and reception.
//! - [`Trace`] (SAP 0xA0): firmware trace events.

pub mod device_management;
pub mod mesh_router;
pub mod trace;

mod hub;
mod report;
mod sap;
mod transport;

pub use device_management::DeviceManagement;
pub use hub::*;
pub use mesh_router::LoRaMeshRouter;
pub use report::*;
pub use sap::*;
pub use trace::Trace;
pub use transport::*;

//! # Repository Layer
//!
//! Thin query layer over the SeaORM entities for the HTTP handlers. The
//! core engines (lifecycle, retention, geofence) work the entities directly;
//! these repositories only cover intake and roster reads.

pub mod dispatch_call;
pub mod unit;

pub use dispatch_call::{CreateCallRequest, DispatchCallRepository};
pub use unit::UnitRepository;

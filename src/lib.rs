//! # Dispatch Coordination Library
//!
//! Core functionality for the emergency-dispatch coordination service:
//! call intake and lifecycle, geospatial unit ranking, retention sweeps,
//! geofence monitoring, and the external feed client.

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod geo;
pub mod geofence;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod priority;
pub mod ranking;
pub mod repositories;
pub mod retention;
pub mod server;
pub mod telemetry;
pub use migration;

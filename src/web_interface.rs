//! HTTP API layer.
//!
//! A thin warp server translating [`crate::lab_management::LabManager`]
//! results into the platform's JSON contract. Authentication happens in
//! front of this service; the user identity arrives as a trusted header.

pub mod types;
pub mod web_server;

pub use web_server::WebServer;

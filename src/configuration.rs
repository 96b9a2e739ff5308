//! Configuration subsystem.
//!
//! Runtime parameters arrive through `clap` (command line or environment);
//! the lab-type catalog derived from them is the only source of container
//! image names.

pub mod config;
pub mod types;

pub use config::Config;
pub use types::{LabCatalog, LabType, UnknownLabType};

//! Roti Planta core: configuration and the shared error type.

pub mod config;
pub mod error;

pub use config::{DataPaths, RotiPlantaConfig, StoreConfig, TableServiceConfig};
pub use error::{Error, Result};

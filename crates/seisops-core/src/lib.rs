//! `seisops-core`: configuration and shared error type for the seismic
//! operations tools.

pub mod config;
pub mod error;

pub use config::{CommandConfig, DispatchConfig, KeyfilesConfig, SeisopsConfig};
pub use error::{CoreError, Result};

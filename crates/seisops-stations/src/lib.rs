//! `seisops-stations`: pick the channels within a radius of an epicentre.
//!
//! Reads a SeisComP or FDSN station inventory, keeps stations inside the
//! radius (optionally active at a given time) and emits `NET.STA.LOC.CHA`
//! identifiers for their channels.

pub mod error;
pub mod inventory;
pub mod select;
pub mod types;

pub use error::{Result, StationError};
pub use inventory::{parse_inventory, parse_time, read_inventory};
pub use select::{haversine_km, in_time_window, select, write_sncls, Criteria, Selection};
pub use types::{Channel, Inventory, Network, Station};

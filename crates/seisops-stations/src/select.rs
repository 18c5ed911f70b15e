use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::error::{Result, StationError};
use crate::types::Inventory;

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = phi2 - phi1;
    let dl = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// `start <= when <= end`, each bound open when absent. No `when` always passes.
pub fn in_time_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    when: Option<DateTime<Utc>>,
) -> bool {
    let Some(when) = when else {
        return true;
    };
    if start.is_some_and(|s| when < s) {
        return false;
    }
    if end.is_some_and(|e| when > e) {
        return false;
    }
    true
}

/// What to keep.
#[derive(Debug, Clone)]
pub struct Criteria {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    /// Anchored at the start of the channel code only.
    pub channel: Option<Regex>,
    pub active_at: Option<DateTime<Utc>>,
}

impl Criteria {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
            channel: None,
            active_at: None,
        }
    }

    /// Restrict channels to codes that begin with a match of `pattern`.
    pub fn with_channel_pattern(mut self, pattern: &str) -> Result<Self> {
        self.channel = Some(Regex::new(&format!("^(?:{pattern})"))?);
        Ok(self)
    }

    pub fn with_active_at(mut self, when: DateTime<Utc>) -> Self {
        self.active_at = Some(when);
        self
    }

    fn channel_matches(&self, code: &str) -> bool {
        self.channel.as_ref().map_or(true, |re| re.is_match(code))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// `NET.STA.LOC.CHA`, sorted and unique.
    pub sncls: BTreeSet<String>,
    /// `(network, station)` pairs that passed the distance and activity checks.
    pub stations: BTreeSet<(String, String)>,
}

pub fn select(inventory: &Inventory, criteria: &Criteria) -> Selection {
    let mut selection = Selection::default();

    for network in &inventory.networks {
        for station in &network.stations {
            let (Some(lat), Some(lon)) = (station.latitude, station.longitude) else {
                debug!(network = %network.code, station = %station.code, "no coordinates");
                continue;
            };
            let distance = haversine_km(criteria.latitude, criteria.longitude, lat, lon);
            if distance > criteria.radius_km {
                continue;
            }
            if !in_time_window(station.start, station.end, criteria.active_at) {
                continue;
            }

            selection
                .stations
                .insert((network.code.clone(), station.code.clone()));

            for channel in &station.channels {
                if !criteria.channel_matches(&channel.code) {
                    continue;
                }
                if !in_time_window(channel.start, channel.end, criteria.active_at) {
                    continue;
                }
                selection.sncls.insert(format!(
                    "{}.{}.{}.{}",
                    network.code, station.code, channel.location, channel.code
                ));
            }
        }
    }

    selection
}

/// One SNCL per line.
pub fn write_sncls(path: &Path, selection: &Selection) -> Result<()> {
    let mut body = String::new();
    for sncl in &selection.sncls {
        body.push_str(sncl);
        body.push('\n');
    }
    std::fs::write(path, body).map_err(|source| StationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

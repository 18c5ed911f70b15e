use chrono::{DateTime, Utc};

/// Station inventory reduced to what channel selection needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub code: String,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Station {
    pub code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start: Option<DateTime<Utc>>,
    /// `None` means still open.
    pub end: Option<DateTime<Utc>>,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// Location code; empty when the channel has none.
    pub location: String,
    pub code: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Inventory {
    pub fn station_count(&self) -> usize {
        self.networks.iter().map(|n| n.stations.len()).sum()
    }
}

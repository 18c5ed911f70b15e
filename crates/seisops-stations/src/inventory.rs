//! Inventory XML reader.
//!
//! Understands both SeisComP SC3ML (`network/station/sensorLocation/stream`
//! with `start`/`end` child elements) and FDSN StationXML
//! (`Network/Station/Channel` with `startDate`/`endDate` attributes).
//! Element and attribute names are compared on their lower-cased local name,
//! so namespaces and schema versions do not matter. Anything else in the
//! document (dataloggers, sensors, responses) is skipped.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::{Result, StationError};
use crate::types::{Channel, Inventory, Network, Station};

pub fn read_inventory(path: &Path) -> Result<Inventory> {
    let xml = std::fs::read_to_string(path).map_err(|source| StationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_inventory(&xml)
}

pub fn parse_inventory(xml: &str) -> Result<Inventory> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = Builder::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                builder.open(&name, &e)?;
                builder.stack.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                builder.open(&name, &e)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| StationError::Xml(e.to_string()))?;
                builder.text(text.trim())?;
            }
            Ok(Event::End(_)) => {
                builder.stack.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(StationError::Xml(e.to_string())),
        }
    }

    debug!(
        networks = builder.inventory.networks.len(),
        stations = builder.inventory.station_count(),
        "inventory parsed"
    );
    Ok(builder.inventory)
}

/// Parse an inventory or command-line timestamp. Values without an offset
/// are taken as UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(StationError::InvalidTime(value.to_string()))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

/// Lower-cased local attribute name -> unescaped value.
fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| StationError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
        let value = attr
            .unescape_value()
            .map_err(|e| StationError::Xml(e.to_string()))?;
        out.push((key, value.into_owned()));
    }
    Ok(out)
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn optional_time(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_time(v).map(Some),
        _ => Ok(None),
    }
}

#[derive(Default)]
struct Builder {
    inventory: Inventory,
    /// Names of the currently open elements.
    stack: Vec<String>,
    /// Code of the enclosing SC3ML `sensorLocation`.
    location: String,
}

impl Builder {
    fn parent(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    fn station_mut(&mut self) -> Option<&mut Station> {
        self.inventory.networks.last_mut()?.stations.last_mut()
    }

    fn channel_mut(&mut self) -> Option<&mut Channel> {
        self.station_mut()?.channels.last_mut()
    }

    fn open(&mut self, name: &str, e: &BytesStart<'_>) -> Result<()> {
        match (name, self.parent()) {
            ("network", _) => {
                let attrs = attributes(e)?;
                self.inventory.networks.push(Network {
                    code: attr(&attrs, "code").unwrap_or_default().to_string(),
                    stations: Vec::new(),
                });
            }
            ("station", Some("network")) => {
                let attrs = attributes(e)?;
                let station = Station {
                    code: attr(&attrs, "code").unwrap_or_default().to_string(),
                    start: optional_time(attr(&attrs, "startdate"))?,
                    end: optional_time(attr(&attrs, "enddate"))?,
                    ..Station::default()
                };
                if let Some(network) = self.inventory.networks.last_mut() {
                    network.stations.push(station);
                }
            }
            ("sensorlocation", Some("station")) => {
                let attrs = attributes(e)?;
                self.location = attr(&attrs, "code").unwrap_or_default().to_string();
            }
            ("stream", Some("sensorlocation")) | ("channel", Some("station")) => {
                let attrs = attributes(e)?;
                let location = match attr(&attrs, "locationcode") {
                    Some(code) => code.to_string(),
                    None if name == "stream" => self.location.clone(),
                    None => String::new(),
                };
                let channel = Channel {
                    location,
                    code: attr(&attrs, "code").unwrap_or_default().to_string(),
                    start: optional_time(attr(&attrs, "startdate"))?,
                    end: optional_time(attr(&attrs, "enddate"))?,
                };
                if let Some(station) = self.station_mut() {
                    station.channels.push(channel);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        let depth = self.stack.len();
        if depth < 2 || text.is_empty() {
            return Ok(());
        }
        let field = self.stack[depth - 1].clone();
        let parent = self.stack[depth - 2].clone();

        match (parent.as_str(), field.as_str()) {
            ("station", "latitude") => {
                let lat = self.coordinate("latitude", text)?;
                if let Some(s) = self.station_mut() {
                    s.latitude = Some(lat);
                }
            }
            ("station", "longitude") => {
                let lon = self.coordinate("longitude", text)?;
                if let Some(s) = self.station_mut() {
                    s.longitude = Some(lon);
                }
            }
            ("station", "start") => {
                let t = parse_time(text)?;
                if let Some(s) = self.station_mut() {
                    s.start = Some(t);
                }
            }
            ("station", "end") => {
                let t = parse_time(text)?;
                if let Some(s) = self.station_mut() {
                    s.end = Some(t);
                }
            }
            ("stream", "start") => {
                let t = parse_time(text)?;
                if let Some(c) = self.channel_mut() {
                    c.start = Some(t);
                }
            }
            ("stream", "end") => {
                let t = parse_time(text)?;
                if let Some(c) = self.channel_mut() {
                    c.end = Some(t);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn coordinate(&mut self, field: &'static str, text: &str) -> Result<f64> {
        text.parse::<f64>()
            .map_err(|_| StationError::InvalidCoordinate {
                station: self
                    .station_mut()
                    .map(|s| s.code.clone())
                    .unwrap_or_default(),
                field,
                value: text.to_string(),
            })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{BeaconError, Result};
use crate::position::Position;

/// One JSON object from the gpsd report stream
///
/// Only the fields needed to pick out a position are decoded; everything else
/// in the object is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Report {
    /// Report type: `VERSION`, `DEVICES`, `WATCH`, `TPV`, `SKY`, ...
    #[serde(default)]
    pub class: String,
    pub device: Option<String>,
    /// NMEA fix mode: 0/1 none, 2 = 2D, 3 = 3D
    pub mode: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_time")]
    pub time: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Report {
    pub fn parse(line: &str) -> Result<Self> {
        Self::parse_bytes(line.as_bytes())
    }

    /// Parse one raw line; invalid UTF-8 is reported like any other bad JSON
    pub fn parse_bytes(line: &[u8]) -> Result<Self> {
        serde_json::from_slice(line).map_err(|source| BeaconError::Protocol {
            line: String::from_utf8_lossy(line).into_owned(),
            source,
        })
    }

    /// The fix carried by this report, if it has both coordinates
    pub fn fix(&self) -> Result<Option<Fix>> {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Ok(None);
        };
        Ok(Some(Fix {
            position: Position::new(lat, lon)?,
            time: self.time,
            mode: self.mode,
            device: self.device.clone(),
        }))
    }
}

/// A position observation reported by gpsd
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub position: Position,
    pub time: Option<DateTime<Utc>>,
    pub mode: Option<u8>,
    pub device: Option<String>,
}

// gpsd before protocol 3.x sent `time` as float seconds; keep those reports
// usable by treating anything but an RFC 3339 string as absent.
fn deserialize_time<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

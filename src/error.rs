use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("Cannot reach gpsd at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gpsd session error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed gpsd report {line:?}: {source}")]
    Protocol {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("gpsd closed the session before reporting a position")]
    StreamClosed,

    #[error("No position fix within {:.1}s", .0.as_secs_f64())]
    NoFix(Duration),

    #[error("Position out of range: lat {lat}, lon {lon}")]
    InvalidPosition { lat: f64, lon: f64 },

    #[error("Invalid beacon: {0}")]
    InvalidBeacon(String),

    #[error("Invalid AX.25 address: {0}")]
    InvalidCallsign(String),

    #[error("AX.25 output needs a source callsign")]
    MissingCallsign,
}

pub type Result<T> = std::result::Result<T, BeaconError>;

mod aprs;
mod ax25;
mod json;

use chrono::{DateTime, SecondsFormat, Utc};

pub use self::aprs::AprsFormatter;
pub use self::ax25::{Ax25Formatter, LineBitsFormatter};
pub use self::json::JsonFormatter;

use crate::ax25::Station;
use crate::error::{BeaconError, Result};
use crate::gpsd::Fix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// APRS position beacon, e.g. `!4903.50N/07201.75W>`
    #[default]
    Aprs,
    /// One-line JSON record of the fix
    Json,
    /// AX.25 UI frame carrying the beacon, as hex (needs a callsign)
    Ax25,
    /// NRZI line bits of the framed beacon as 0/1 (needs a callsign)
    Bits,
}

pub trait Formatter: Send {
    fn format(&self, fix: &Fix) -> String;
}

pub fn create_formatter(format: OutputFormat, station: Option<Station>) -> Result<Box<dyn Formatter>> {
    let formatter: Box<dyn Formatter> = match format {
        OutputFormat::Aprs => Box::new(AprsFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Ax25 => Box::new(Ax25Formatter::new(
            station.ok_or(BeaconError::MissingCallsign)?,
        )),
        OutputFormat::Bits => Box::new(LineBitsFormatter::new(
            station.ok_or(BeaconError::MissingCallsign)?,
        )),
    };
    Ok(formatter)
}

pub fn iso8601_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

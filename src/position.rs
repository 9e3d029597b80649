//! Geographic position and its degrees/decimal-minutes breakdown.

use std::fmt;

use crate::error::{BeaconError, Result};

/// Hundredths of an arc minute per degree
const HUNDREDTHS_PER_DEGREE: f64 = 60.0 * 100.0;

/// Latitude/longitude pair in signed decimal degrees
///
/// Always finite and within [-90, 90] × [-180, 180].
///
/// # Example
/// ```
/// use aprs_loc::position::{Hemisphere, Position};
///
/// let pos = Position::new(-33.8688, 151.2093).unwrap();
/// assert_eq!(pos.lat_hemisphere(), Hemisphere::South);
/// assert_eq!(pos.lon_hemisphere(), Hemisphere::East);
/// assert!(Position::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    lat: f64,
    lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
        if !(lat_ok && lon_ok) {
            return Err(BeaconError::InvalidPosition { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat_hemisphere(&self) -> Hemisphere {
        if self.lat >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    pub fn lon_hemisphere(&self) -> Hemisphere {
        if self.lon >= 0.0 {
            Hemisphere::East
        } else {
            Hemisphere::West
        }
    }

    pub fn lat_dm(&self) -> DegreesMinutes {
        DegreesMinutes::from_degrees(self.lat)
    }

    pub fn lon_dm(&self) -> DegreesMinutes {
        DegreesMinutes::from_degrees(self.lon)
    }

    /// This position snapped to the nearest hundredth of an arc minute
    pub fn quantized(&self) -> Position {
        Position {
            lat: self.lat_hemisphere().sign() * self.lat_dm().to_degrees(),
            lon: self.lon_hemisphere().sign() * self.lon_dm().to_degrees(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Single-letter form used in APRS position reports
    pub fn letter(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'N' => Some(Hemisphere::North),
            'S' => Some(Hemisphere::South),
            'E' => Some(Hemisphere::East),
            'W' => Some(Hemisphere::West),
            _ => None,
        }
    }

    /// Sign applied to a magnitude lying in this hemisphere
    pub fn sign(&self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::East => 1.0,
            Hemisphere::South | Hemisphere::West => -1.0,
        }
    }
}

/// Unsigned degrees plus minutes, to hundredths of a minute
///
/// Degrees are the truncated magnitude and minutes are the fractional part
/// times 60, rounded to two decimals the way `{:.2}` prints them. A minute
/// value that prints as 60.00 carries into the degrees, so minutes always lie
/// in [0.00, 59.99].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreesMinutes {
    pub degrees: u16,
    /// Minutes × 100 (0..6000)
    pub centiminutes: u16,
}

impl DegreesMinutes {
    /// Split the magnitude of a signed decimal-degree value
    pub fn from_degrees(value: f64) -> Self {
        let magnitude = value.abs();
        let mut degrees = magnitude.trunc() as u16;

        // Round through the formatter so the digits match a plain `{:05.2}`
        let minutes = format!("{:.2}", magnitude.fract() * 60.0);
        let mut centiminutes = minutes
            .bytes()
            .filter(u8::is_ascii_digit)
            .fold(0u16, |acc, b| acc * 10 + (b - b'0') as u16);

        if centiminutes >= 6000 {
            degrees += 1;
            centiminutes -= 6000;
        }

        Self {
            degrees,
            centiminutes,
        }
    }

    pub fn minutes(&self) -> f64 {
        self.centiminutes as f64 / 100.0
    }

    /// Unsigned decimal degrees
    pub fn to_degrees(&self) -> f64 {
        self.degrees as f64 + self.centiminutes as f64 / HUNDREDTHS_PER_DEGREE
    }
}

//! APRS uncompressed position beacon.
//!
//! Fixed-width 20-character format:
//! - Position 0: `!` (position report without timestamp, no messaging)
//! - Positions 1-2: latitude degrees, zero-padded
//! - Positions 3-7: latitude minutes `MM.mm`, zero-padded
//! - Position 8: `N` or `S`
//! - Position 9: `/` symbol table identifier (primary table)
//! - Positions 10-12: longitude degrees, zero-padded
//! - Positions 13-17: longitude minutes `MM.mm`, zero-padded
//! - Position 18: `E` or `W`
//! - Position 19: `>` symbol code (car)
//!
//! Example: `!4903.50N/07201.75W>` = 49°03.50'N 72°01.75'W
//!
//! Reference: APRS Protocol Reference 1.0.1, chapter 8 (Position Reports)

use std::fmt;
use std::str::FromStr;

use crate::error::{BeaconError, Result};
use crate::position::{DegreesMinutes, Hemisphere, Position};

/// Length of every beacon string
pub const BEACON_LEN: usize = 20;

const DATA_TYPE: char = '!';
const SYMBOL_TABLE: char = '/';
const SYMBOL_CODE: char = '>';

/// Formatted position beacon
///
/// # Example
/// ```
/// use aprs_loc::beacon::Beacon;
/// use aprs_loc::position::Position;
///
/// let pos = Position::new(-33.8688, 151.2093).unwrap();
/// let beacon = Beacon::from_position(&pos);
/// assert_eq!(beacon.as_str(), "!3352.13S/15112.56E>");
///
/// let parsed: Beacon = "!3352.13S/15112.56E>".parse().unwrap();
/// assert_eq!(parsed, beacon);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Beacon {
    text: String,
    position: Position,
}

impl Beacon {
    pub fn from_position(position: &Position) -> Self {
        let lat = position.lat_dm();
        let lon = position.lon_dm();
        let text = format!(
            "{DATA_TYPE}{:02}{:02}.{:02}{}{SYMBOL_TABLE}{:03}{:02}.{:02}{}{SYMBOL_CODE}",
            lat.degrees,
            lat.centiminutes / 100,
            lat.centiminutes % 100,
            position.lat_hemisphere().letter(),
            lon.degrees,
            lon.centiminutes / 100,
            lon.centiminutes % 100,
            position.lon_hemisphere().letter(),
        );
        Self {
            text,
            position: position.quantized(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Position encoded in the beacon, at 0.01' resolution
    pub fn position(&self) -> Position {
        self.position
    }
}

/// Format a position as a beacon string
pub fn format_beacon(lat: f64, lon: f64) -> Result<String> {
    let position = Position::new(lat, lon)?;
    Ok(Beacon::from_position(&position).text)
}

impl fmt::Display for Beacon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Beacon {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| BeaconError::InvalidBeacon(format!("{}: {:?}", why, s));

        if !s.is_ascii() || s.len() != BEACON_LEN {
            return Err(invalid("expected 20 ASCII characters"));
        }
        let bytes = s.as_bytes();
        if bytes[0] as char != DATA_TYPE
            || bytes[9] as char != SYMBOL_TABLE
            || bytes[19] as char != SYMBOL_CODE
        {
            return Err(invalid("bad framing characters"));
        }

        let (lat_dm, lat_hemi) =
            parse_coordinate(&s[1..9], 2).ok_or_else(|| invalid("bad latitude"))?;
        let (lon_dm, lon_hemi) =
            parse_coordinate(&s[10..19], 3).ok_or_else(|| invalid("bad longitude"))?;

        if !matches!(lat_hemi, Hemisphere::North | Hemisphere::South)
            || !matches!(lon_hemi, Hemisphere::East | Hemisphere::West)
        {
            return Err(invalid("hemisphere letters swapped"));
        }

        let position = Position::new(
            lat_hemi.sign() * lat_dm.to_degrees(),
            lon_hemi.sign() * lon_dm.to_degrees(),
        )?;

        Ok(Self {
            text: s.to_string(),
            position,
        })
    }
}

/// Parse `D..DMM.mmH` where the degree field is `degree_digits` wide
fn parse_coordinate(field: &str, degree_digits: usize) -> Option<(DegreesMinutes, Hemisphere)> {
    let (digits, hemi) = field.split_at(field.len() - 1);
    let hemisphere = Hemisphere::from_letter(hemi.chars().next()?)?;

    let (degrees, minutes) = digits.split_at(degree_digits);
    let (whole, frac) = minutes.split_once('.')?;
    if whole.len() != 2 || frac.len() != 2 {
        return None;
    }

    let all_digits = degrees
        .bytes()
        .chain(whole.bytes())
        .chain(frac.bytes())
        .all(|b| b.is_ascii_digit());
    if !all_digits {
        return None;
    }

    let degrees: u16 = degrees.parse().ok()?;
    let whole: u16 = whole.parse().ok()?;
    let frac: u16 = frac.parse().ok()?;
    if whole >= 60 {
        return None;
    }

    Some((
        DegreesMinutes {
            degrees,
            centiminutes: whole * 100 + frac,
        },
        hemisphere,
    ))
}

use super::{Fix, Formatter};
use crate::ax25::Station;
use crate::beacon::Beacon;

/// Frame bytes in uppercase hex, no separators
pub struct Ax25Formatter {
    station: Station,
}

impl Ax25Formatter {
    pub fn new(station: Station) -> Self {
        Self { station }
    }
}

impl Formatter for Ax25Formatter {
    fn format(&self, fix: &Fix) -> String {
        let beacon = Beacon::from_position(&fix.position);
        self.station
            .frame(beacon.as_str().as_bytes())
            .to_bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect()
    }
}

/// NRZI-encoded bit stream as a string of `0` and `1`
pub struct LineBitsFormatter {
    station: Station,
}

impl LineBitsFormatter {
    pub fn new(station: Station) -> Self {
        Self { station }
    }
}

impl Formatter for LineBitsFormatter {
    fn format(&self, fix: &Fix) -> String {
        let beacon = Beacon::from_position(&fix.position);
        self.station
            .frame(beacon.as_str().as_bytes())
            .line_bits()
            .iter()
            .map(|&bit| if bit { '1' } else { '0' })
            .collect()
    }
}

//! AX.25 UI frames carrying an APRS information field.
//!
//! Frame layout (before bit stuffing):
//! - destination address, 7 bytes (`APRS` by default)
//! - source address, 7 bytes
//! - digipeater path, 0-8 addresses of 7 bytes each
//! - control `0x03` (UI frame), protocol id `0xF0` (no layer 3)
//! - information field (the beacon)
//! - FCS, CRC-16/X.25, low byte first
//!
//! Each address is the callsign padded to six characters with spaces, then
//! `'0' + ssid`, every byte shifted left one bit. The low bit of the last
//! address byte marks the end of the address field.
//!
//! On the air the frame is sent LSB first, bit stuffed, wrapped in `0x7E`
//! flags and NRZI encoded (see `UiFrame::line_bits`).
//!
//! Reference: AX.25 Link Access Protocol v2.2, sections 3 and 4

use std::fmt;
use std::str::FromStr;

use crate::error::{BeaconError, Result};

pub const DEFAULT_DEST: &str = "APRS";
pub const DEFAULT_PATH: &str = "WIDE1-1,WIDE2-1";

/// AX.25 allows at most eight digipeaters
pub const MAX_DIGIPEATERS: usize = 8;

const CONTROL_UI: u8 = 0x03;
const PID_NO_LAYER3: u8 = 0xF0;
const FLAG: u8 = 0x7E;

/// Zero bits sent ahead of the flags; NRZI turns them into alternating
/// tones that let the receiver recover its clock
const PREAMBLE_ZEROS: usize = 20;
const PREAMBLE_FLAGS: usize = 100;

/// Station address: up to six characters plus SSID 0-15
///
/// # Example
/// ```
/// use aprs_loc::ax25::Callsign;
///
/// let call: Callsign = "n0call-9".parse().unwrap();
/// assert_eq!(call.to_string(), "N0CALL-9");
/// assert!("TOOLONGCALL".parse::<Callsign>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callsign {
    call: String,
    ssid: u8,
}

impl Callsign {
    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Address bytes before the one-bit shift
    fn raw(&self) -> [u8; 7] {
        let mut out = [b' '; 7];
        out[..self.call.len()].copy_from_slice(self.call.as_bytes());
        out[6] = b'0' + self.ssid;
        out
    }
}

impl FromStr for Callsign {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BeaconError::InvalidCallsign(s.to_string());

        let upper = s.trim().to_ascii_uppercase();
        let (call, ssid) = match upper.split_once('-') {
            Some((call, ssid)) => {
                let ssid: u8 = ssid.parse().map_err(|_| invalid())?;
                (call, ssid)
            }
            None => (upper.as_str(), 0),
        };

        let call_ok = !call.is_empty()
            && call.len() <= 6
            && call.bytes().all(|b| b.is_ascii_alphanumeric());
        if !call_ok || ssid > 15 {
            return Err(invalid());
        }

        Ok(Self {
            call: call.to_string(),
            ssid,
        })
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid == 0 {
            write!(f, "{}", self.call)
        } else {
            write!(f, "{}-{}", self.call, self.ssid)
        }
    }
}

/// Parse a comma-separated digipeater path such as `WIDE1-1,WIDE2-1`
///
/// An empty string is an empty path.
pub fn parse_path(path: &str) -> Result<Vec<Callsign>> {
    let digis = path
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Callsign>>>()?;
    if digis.len() > MAX_DIGIPEATERS {
        return Err(BeaconError::InvalidCallsign(format!(
            "{} (more than {} digipeaters)",
            path, MAX_DIGIPEATERS
        )));
    }
    Ok(digis)
}

/// Addressing for frames sent by one station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub source: Callsign,
    pub dest: Callsign,
    pub path: Vec<Callsign>,
}

impl Station {
    /// `source` with the default `APRS` destination and `WIDE1-1,WIDE2-1` path
    pub fn new(source: Callsign) -> Result<Self> {
        Ok(Self {
            source,
            dest: DEFAULT_DEST.parse()?,
            path: parse_path(DEFAULT_PATH)?,
        })
    }

    pub fn frame(&self, info: &[u8]) -> UiFrame {
        UiFrame {
            station: self.clone(),
            info: info.to_vec(),
        }
    }
}

/// Unnumbered information frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiFrame {
    station: Station,
    info: Vec<u8>,
}

impl UiFrame {
    fn address_field(&self) -> Vec<u8> {
        let station = &self.station;
        let mut addr: Vec<u8> = std::iter::once(&station.dest)
            .chain(std::iter::once(&station.source))
            .chain(station.path.iter())
            .flat_map(|c| c.raw())
            .map(|b| b << 1)
            .collect();
        if let Some(last) = addr.last_mut() {
            *last |= 0x01;
        }
        addr
    }

    /// Frame bytes including the FCS, without flags
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = self.address_field();
        frame.push(CONTROL_UI);
        frame.push(PID_NO_LAYER3);
        frame.extend_from_slice(&self.info);

        let check = fcs(&frame);
        frame.extend_from_slice(&check.to_le_bytes());
        frame
    }

    /// Bit stream as transmitted: preamble, flags, stuffed frame, closing
    /// flag, all NRZI encoded
    pub fn line_bits(&self) -> Vec<bool> {
        let flag = byte_bits(FLAG);

        let mut bits = vec![false; PREAMBLE_ZEROS];
        for _ in 0..PREAMBLE_FLAGS {
            bits.extend_from_slice(&flag);
        }
        bits.extend(bit_stuff(&self.to_bytes()));
        bits.extend_from_slice(&flag);

        nrzi(&bits)
    }
}

/// CRC-16/X.25 frame check sequence
pub fn fcs(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (b ^ crc as u8) & 1;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8408;
            }
            b >>= 1;
        }
    }
    !crc
}

/// LSB-first bits with a 0 inserted after every run of five 1s
pub fn bit_stuff(data: &[u8]) -> Vec<bool> {
    let mut out = Vec::with_capacity(data.len() * 9);
    let mut ones = 0;
    for &byte in data {
        for bit in byte_bits(byte) {
            out.push(bit);
            if bit {
                ones += 1;
                if ones == 5 {
                    out.push(false);
                    ones = 0;
                }
            } else {
                ones = 0;
            }
        }
    }
    out
}

/// NRZI: a 0 toggles the line level, a 1 holds it
pub fn nrzi(bits: &[bool]) -> Vec<bool> {
    let mut level = true;
    bits.iter()
        .map(|&bit| {
            if !bit {
                level = !level;
            }
            level
        })
        .collect()
}

fn byte_bits(byte: u8) -> [bool; 8] {
    std::array::from_fn(|i| (byte >> i) & 1 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }

    #[test]
    fn test_fcs_check_value() {
        assert_eq!(fcs(b"123456789"), 0x906E);
    }

    #[test]
    fn test_callsign_parsing() {
        let call: Callsign = "wide2-1".parse().unwrap();
        assert_eq!(call.to_string(), "WIDE2-1");
        assert_eq!(call.ssid(), 1);
        assert_eq!("APRS".parse::<Callsign>().unwrap().ssid(), 0);

        for bad in ["", "-1", "N0CALL-16", "N0CALL-x", "N0CALL7", "N0/CAL", "N0CALL-"] {
            assert!(bad.parse::<Callsign>().is_err(), "{:?} should fail", bad);
        }
    }

    #[test]
    fn test_path_parsing() {
        let path = parse_path(DEFAULT_PATH).unwrap();
        assert_eq!(path.len(), 2);
        assert!(parse_path("").unwrap().is_empty());
        assert!(parse_path("A,B,C,D,E,F,G,H,I").is_err());
    }

    #[test]
    fn test_frame_bytes_with_default_path() {
        let station = Station::new("N0CALL-9".parse().unwrap()).unwrap();
        let frame = station.frame(b"!4903.50N/07201.75W>");
        assert_eq!(
            hex(&frame.to_bytes()),
            "82A0A4A64040609C608682989872AE92888A624062AE92888A64406303F0\
             21343930332E35304E2F30373230312E3735573EE838"
        );
    }

    #[test]
    fn test_frame_bytes_without_path() {
        let station = Station {
            source: "N0CALL".parse().unwrap(),
            dest: DEFAULT_DEST.parse().unwrap(),
            path: Vec::new(),
        };
        let frame = station.frame(b"!0000.00N/00000.00E>");
        assert_eq!(
            hex(&frame.to_bytes()),
            "82A0A4A64040609C60868298986103F0\
             21303030302E30304E2F30303030302E3030453E8DEE"
        );
    }

    #[test]
    fn test_bit_stuffing() {
        // 0xFF: five ones, stuffed zero, three ones
        assert_eq!(
            bit_stuff(&[0xFF]),
            [true, true, true, true, true, false, true, true, true]
        );
        // 0x7E sent LSB first: 0 111111 0 -> 0 11111 0 1 0
        assert_eq!(
            bit_stuff(&[FLAG]),
            [false, true, true, true, true, true, false, true, false]
        );
        assert_eq!(bit_stuff(&[0x00]), [false; 8]);
    }

    #[test]
    fn test_stuffed_frame_never_contains_six_ones() {
        let station = Station::new("N0CALL-9".parse().unwrap()).unwrap();
        let bytes = station.frame(&[0xFF; 32]).to_bytes();
        let stuffed = bit_stuff(&bytes);
        let mut run = 0;
        for bit in stuffed {
            run = if bit { run + 1 } else { 0 };
            assert!(run <= 5);
        }
    }

    #[test]
    fn test_nrzi() {
        assert_eq!(
            nrzi(&[false, false, true, false, true, true]),
            [false, true, true, false, false, false]
        );
    }

    #[test]
    fn test_line_bits_layout() {
        let station = Station::new("N0CALL".parse().unwrap()).unwrap();
        let frame = station.frame(b"!0000.00N/00000.00E>");
        let stuffed = bit_stuff(&frame.to_bytes());
        let bits = frame.line_bits();
        assert_eq!(
            bits.len(),
            PREAMBLE_ZEROS + 8 * PREAMBLE_FLAGS + stuffed.len() + 8
        );
        // Preamble zeros alternate the line level
        assert_eq!(&bits[..4], [false, true, false, true]);
    }
}

//! Configuration for the gpsd location source.
//!
//! The defaults match a stock gpsd install on the local machine:
//!
//! ```
//! use aprs_loc::config::{GpsdConfig, WaitPolicy};
//!
//! let config = GpsdConfig::default();
//! assert_eq!(config.host, "localhost");
//! assert_eq!(config.port, 2947);
//! assert_eq!(config.wait, WaitPolicy::Forever);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Host gpsd listens on by default
pub const DEFAULT_HOST: &str = "localhost";

/// gpsd's IANA-assigned TCP port
pub const DEFAULT_PORT: u16 = 2947;

/// How long to wait for the first position fix
///
/// # Parsing formats
/// - `forever` or `none` - block until a fix arrives or gpsd hangs up
/// - `30` or `2.5` - seconds (no suffix)
/// - `30s`, `500ms`, `2m` - explicit unit
///
/// # Example
/// ```
/// use std::time::Duration;
/// use aprs_loc::config::WaitPolicy;
///
/// let wait: WaitPolicy = "1500ms".parse().unwrap();
/// assert_eq!(wait.timeout(), Some(Duration::from_millis(1500)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    #[default]
    Forever,
    Timeout(Duration),
}

impl WaitPolicy {
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            WaitPolicy::Forever => None,
            WaitPolicy::Timeout(d) => Some(*d),
        }
    }
}

impl fmt::Display for WaitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitPolicy::Forever => write!(f, "forever"),
            WaitPolicy::Timeout(d) => write!(f, "{}s", d.as_secs_f64()),
        }
    }
}

impl FromStr for WaitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("forever") || s.eq_ignore_ascii_case("none") {
            return Ok(WaitPolicy::Forever);
        }

        // "ms" must be checked before "s"
        let (num, secs_per_unit) = if let Some(num) = s.strip_suffix("ms") {
            (num, 1.0 / 1000.0)
        } else if let Some(num) = s.strip_suffix('s') {
            (num, 1.0)
        } else if let Some(num) = s.strip_suffix('m') {
            (num, 60.0)
        } else {
            (s, 1.0)
        };

        let value: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid timeout: {}", s))?;
        if !value.is_finite() || value <= 0.0 {
            return Err("timeout must be positive".to_string());
        }
        Duration::try_from_secs_f64(value * secs_per_unit)
            .map(WaitPolicy::Timeout)
            .map_err(|_| format!("timeout out of range: {}", s))
    }
}

/// gpsd connection configuration
///
/// # Example
/// ```
/// use aprs_loc::config::GpsdConfig;
///
/// let mut config = GpsdConfig::default();
/// config.host = "gps.local".to_string();
/// assert_eq!(config.address(), "gps.local:2947");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsdConfig {
    /// Network address of the gpsd daemon
    pub host: String,
    /// TCP port of the gpsd daemon
    pub port: u16,
    /// Bound on the wait for the first fix
    pub wait: WaitPolicy,
}

impl GpsdConfig {
    /// `host:port` as used in log and error messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GpsdConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            wait: WaitPolicy::Forever,
        }
    }
}

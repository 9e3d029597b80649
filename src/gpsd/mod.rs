//! Location source backed by gpsd's JSON report stream.
//!
//! ```no_run
//! use aprs_loc::config::GpsdConfig;
//!
//! let fix = aprs_loc::gpsd::query_position(&GpsdConfig::default())?;
//! println!("{}", fix.position);
//! # Ok::<(), aprs_loc::BeaconError>(())
//! ```

mod report;
mod session;

pub use report::{Fix, Report};
pub use session::{Reports, Session, Transport, WATCH_ENABLE};

use crate::config::GpsdConfig;
use crate::error::Result;

/// Open a session, wait for the first fix and close the session again
pub fn query_position(config: &GpsdConfig) -> Result<Fix> {
    let mut session = Session::connect(config)?;
    session.first_fix()
}

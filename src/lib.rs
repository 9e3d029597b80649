pub mod ax25;
pub mod beacon;
pub mod config;
pub mod error;
pub mod gpsd;
pub mod output;
pub mod position;

pub use beacon::{Beacon, format_beacon};
pub use config::GpsdConfig;
pub use error::{BeaconError, Result};
pub use gpsd::{Fix, query_position};
pub use position::Position;

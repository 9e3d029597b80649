use serde_json::json;

use super::{Fix, Formatter, iso8601_timestamp};
use crate::beacon::Beacon;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, fix: &Fix) -> String {
        json!({
            "lat": fix.position.lat(),
            "lon": fix.position.lon(),
            "time": fix.time.as_ref().map(iso8601_timestamp),
            "mode": fix.mode,
            "device": fix.device,
            "beacon": Beacon::from_position(&fix.position).to_string(),
        })
        .to_string()
    }
}

use super::{Fix, Formatter};
use crate::beacon::Beacon;

pub struct AprsFormatter;

impl Formatter for AprsFormatter {
    fn format(&self, fix: &Fix) -> String {
        Beacon::from_position(&fix.position).to_string()
    }
}

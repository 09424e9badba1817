//! Numeric building blocks for turning raw sensor values into MIDI ranges
//!
//! Range mapping, median smoothing and key-to-pitch tables.

mod median;
mod range;
mod scale;

pub use median::MedianFilter;
pub use range::{clamp_to, map_range, RangeMapper};
pub use scale::{note_name, Scale};

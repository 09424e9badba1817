//! Sensor input for musicbox
//!
//! Sources deliver raw text lines from the sensor board and the frame parser
//! turns each line into a fixed-length frame of integer samples.

mod frame;
mod line;

pub use frame::{Frame, FrameParser};
pub use line::{LineSource, ReaderSource};

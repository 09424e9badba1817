//! Pressure strip to aftertouch

use crate::config::{AftertouchConfig, Span};
use crate::error::RangeError;
use crate::mapping::RangeMapper;
use crate::sources::Frame;

/// One calibrated strip segment
#[derive(Debug, Clone, Copy)]
struct Segment {
    index: usize,
    normalize: RangeMapper,
}

/// Pressure segments combined by RMS into one bounded control value
#[derive(Debug, Clone)]
pub struct AftertouchConverter {
    segments: Vec<Segment>,
    threshold: i64,
    output: RangeMapper,
}

impl AftertouchConverter {
    /// `segments` holds `(field, in_min, in_max)` for each segment
    pub fn new(
        segments: &[(usize, i64, i64)],
        normalized: Span,
        threshold: i64,
        rms_range: Span,
        output: Span,
    ) -> Result<Self, RangeError> {
        let segments = segments
            .iter()
            .map(|&(index, in_min, in_max)| {
                Ok(Segment {
                    index,
                    normalize: RangeMapper::new(in_min, in_max, normalized.min, normalized.max)?,
                })
            })
            .collect::<Result<Vec<_>, RangeError>>()?;

        Ok(Self {
            segments,
            threshold,
            output: RangeMapper::new(rms_range.min, rms_range.max, output.min, output.max)?,
        })
    }

    pub fn from_config(config: &AftertouchConfig) -> Result<Self, RangeError> {
        let segments: Vec<(usize, i64, i64)> = config
            .segments
            .iter()
            .map(|s| (s.index, s.in_min, s.in_max))
            .collect();
        Self::new(
            &segments,
            config.normalized,
            config.threshold,
            config.rms_range,
            config.output,
        )
    }

    /// Root mean square of the normalized segments, floored at each step
    pub fn rms(&self, raw: &[i64]) -> i64 {
        assert_eq!(raw.len(), self.segments.len(), "one reading per pressure segment");
        if raw.is_empty() {
            return 0;
        }

        let sum_sq: i64 = self
            .segments
            .iter()
            .zip(raw)
            .map(|(segment, &value)| segment.normalize.map_clamped(value).pow(2))
            .sum();
        let mean = sum_sq / raw.len() as i64;
        (mean as f64).sqrt() as i64
    }

    /// Convert one raw reading per segment, in segment order
    pub fn convert(&self, raw: &[i64]) -> u8 {
        let rms = self.rms(raw);
        if rms < self.threshold {
            return 0;
        }
        self.output.map_clamped(rms).clamp(0, 127) as u8
    }

    /// Pull this converter's fields out of a frame and convert them
    pub fn process(&self, frame: &Frame) -> u8 {
        let raw: Vec<i64> = self.segments.iter().map(|s| frame[s.index]).collect();
        self.convert(&raw)
    }
}

//! Rangefinders to a continuous control
//!
//! The closest object seen by any rangefinder sets the control value.

use crate::config::{DistanceConfig, Span};
use crate::error::RangeError;
use crate::mapping::{MedianFilter, RangeMapper};
use crate::sources::Frame;

/// One rangefinder channel
#[derive(Debug, Clone)]
struct Sensor {
    index: usize,
    filter: MedianFilter,
}

/// Median-filtered distances to one bounded control value
#[derive(Debug, Clone)]
pub struct DistanceConverter {
    sensors: Vec<Sensor>,
    clamp: Span,
    snap_above: Option<i64>,
    output: RangeMapper,
}

impl DistanceConverter {
    /// Create a converter for sensors at the given frame fields
    pub fn new(sensors: &[(usize, usize)], clamp: Span, output: Span) -> Result<Self, RangeError> {
        Ok(Self {
            sensors: sensors
                .iter()
                .map(|&(index, depth)| Sensor {
                    index,
                    filter: MedianFilter::new(depth),
                })
                .collect(),
            clamp,
            snap_above: None,
            output: RangeMapper::new(clamp.min, clamp.max, output.min, output.max)?,
        })
    }

    pub fn from_config(config: &DistanceConfig) -> Result<Self, RangeError> {
        let sensors: Vec<(usize, usize)> = config
            .sensors
            .iter()
            .map(|s| (s.index, s.median_depth))
            .collect();
        Ok(Self::new(&sensors, config.clamp, config.output)?.with_snap_above(config.snap_above))
    }

    /// Treat filtered readings above `limit` as out of range
    pub fn with_snap_above(mut self, limit: Option<i64>) -> Self {
        self.snap_above = limit;
        self
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Convert one raw reading per sensor, in sensor order
    pub fn convert(&mut self, raw: &[i64]) -> u8 {
        assert_eq!(raw.len(), self.sensors.len(), "one reading per distance sensor");

        let mut closest = i64::MAX;
        for (sensor, &value) in self.sensors.iter_mut().zip(raw) {
            let mut filtered = sensor.filter.push(value);
            if matches!(self.snap_above, Some(limit) if filtered > limit) {
                filtered = self.clamp.max;
            }
            closest = closest.min(filtered.clamp(self.clamp.min, self.clamp.max));
        }

        self.output.map_clamped(closest).clamp(0, 127) as u8
    }

    /// Pull this converter's fields out of a frame and convert them
    pub fn process(&mut self, frame: &Frame) -> u8 {
        let raw: Vec<i64> = self.sensors.iter().map(|s| frame[s.index]).collect();
        self.convert(&raw)
    }
}

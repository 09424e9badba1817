//! Frame parsing
//!
//! One line of sensor output is a comma separated list of numbers. The
//! firmware prints fixed-width lines, but serial noise can truncate them or
//! splice garbage in, so a line either parses completely or not at all.

use crate::error::ParseError;
use std::ops::Index;

/// One line of sensor samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    samples: Vec<i64>,
}

impl Frame {
    /// Build a frame from already-parsed samples
    pub fn new(samples: Vec<i64>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i64] {
        &self.samples
    }
}

impl Index<usize> for Frame {
    type Output = i64;

    fn index(&self, index: usize) -> &i64 {
        &self.samples[index]
    }
}

/// Splits lines into frames of a fixed length
#[derive(Debug, Clone, Copy)]
pub struct FrameParser {
    expected_len: usize,
}

impl FrameParser {
    pub fn new(expected_len: usize) -> Self {
        Self { expected_len }
    }

    /// Parse the first `expected_len` fields of a line
    ///
    /// Fields are read as floats and truncated toward zero. Extra fields are
    /// ignored.
    pub fn parse(&self, line: &str) -> Result<Frame, ParseError> {
        let mut samples = Vec::with_capacity(self.expected_len);

        for (index, field) in line.split(',').take(self.expected_len).enumerate() {
            let value = field
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::InvalidField {
                    index,
                    field: field.to_string(),
                })?;
            samples.push(value.trunc() as i64);
        }

        if samples.len() < self.expected_len {
            return Err(ParseError::TooShort {
                expected: self.expected_len,
                found: samples.len(),
            });
        }

        Ok(Frame::new(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_too_short() {
        let parser = FrameParser::new(5);
        assert_eq!(
            parser.parse("1,2,3"),
            Err(ParseError::TooShort { expected: 5, found: 3 })
        );
    }

    #[test]
    fn test_parse_non_numeric() {
        let parser = FrameParser::new(5);
        assert_eq!(
            parser.parse("1,a,3,4,5"),
            Err(ParseError::InvalidField {
                index: 1,
                field: "a".to_string()
            })
        );
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let parser = FrameParser::new(5);
        let frame = parser.parse("1,2,3,4,5,6").unwrap();
        assert_eq!(frame.samples(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_truncates_floats() {
        let parser = FrameParser::new(4);
        let frame = parser.parse("1.9,-1.9,300.0,7e2").unwrap();
        assert_eq!(frame.samples(), &[1, -1, 300, 700]);
    }

    #[test]
    fn test_parse_trims_line_endings() {
        let parser = FrameParser::new(3);
        let frame = parser.parse(" 10, 20 ,30\r\n").unwrap();
        assert_eq!(frame.samples(), &[10, 20, 30]);
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        let parser = FrameParser::new(2);
        assert!(parser.parse("nan,1").is_err());
        assert!(parser.parse("1,inf").is_err());
    }

    #[test]
    fn test_parse_error_in_ignored_field_is_fine() {
        let parser = FrameParser::new(2);
        let frame = parser.parse("1,2,garbage").unwrap();
        assert_eq!(frame.samples(), &[1, 2]);
    }

    #[test]
    fn test_parse_empty_line() {
        let parser = FrameParser::new(3);
        assert_eq!(
            parser.parse(""),
            Err(ParseError::InvalidField {
                index: 0,
                field: String::new()
            })
        );
    }

    #[test]
    fn test_frame_indexing() {
        let frame = Frame::new(vec![4, 5, 6]);
        assert_eq!(frame[1], 5);
        assert_eq!(frame.len(), 3);
        assert!(!frame.is_empty());
    }
}

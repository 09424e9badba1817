//! Key-to-pitch tables

/// Note names for pitch classes, C first
const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Musical scale definition (intervals in semitones from root)
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    name: String,
    intervals: Vec<u8>,
}

impl Scale {
    /// Create a new scale
    pub fn new(name: &str, intervals: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            intervals,
        }
    }

    /// Thirteen chromatic steps, root to octave inclusive
    pub fn chromatic() -> Self {
        Self::new("chromatic", (0..=12).collect())
    }

    /// Major scale with the octave on top
    pub fn major() -> Self {
        Self::new("major", vec![0, 2, 4, 5, 7, 9, 11, 12])
    }

    /// Natural minor scale with the octave on top
    pub fn minor() -> Self {
        Self::new("minor", vec![0, 2, 3, 5, 7, 8, 10, 12])
    }

    /// Minor pentatonic scale (root, m3, P4, P5, m7)
    pub fn minor_pentatonic() -> Self {
        Self::new("minor_pentatonic", vec![0, 3, 5, 7, 10])
    }

    /// Major pentatonic scale (root, M2, M3, P5, M6)
    pub fn major_pentatonic() -> Self {
        Self::new("major_pentatonic", vec![0, 2, 4, 7, 9])
    }

    /// Get scale by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "chromatic" => Some(Self::chromatic()),
            "major" => Some(Self::major()),
            "minor" | "natural_minor" => Some(Self::minor()),
            "pentatonic" | "minor_pentatonic" | "minorpentatonic" => Some(Self::minor_pentatonic()),
            "major_pentatonic" | "majorpentatonic" => Some(Self::major_pentatonic()),
            _ => None,
        }
    }

    /// Get the name of this scale
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the intervals
    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }

    /// Pitch for a key index; indices past the table wrap around to its start
    pub fn pitch(&self, root: u8, index: usize) -> u8 {
        let interval = self.intervals[index % self.intervals.len()];
        root.saturating_add(interval).min(127)
    }
}

/// Pitch class name of a MIDI note
pub fn note_name(pitch: u8) -> &'static str {
    NOTE_NAMES[pitch as usize % 12]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromatic_covers_an_octave() {
        let scale = Scale::chromatic();
        assert_eq!(scale.intervals().len(), 13);
        assert_eq!(scale.pitch(60, 0), 60);
        assert_eq!(scale.pitch(60, 12), 72);
    }

    #[test]
    fn test_pitch_wraps() {
        let scale = Scale::chromatic();
        assert_eq!(scale.pitch(60, 13), 60);
        assert_eq!(scale.pitch(60, 25), 72);
    }

    #[test]
    fn test_pitch_saturates() {
        let scale = Scale::major();
        assert_eq!(scale.pitch(125, 7), 127);
    }

    #[test]
    fn test_scale_from_name() {
        assert_eq!(Scale::from_name("Chromatic"), Some(Scale::chromatic()));
        assert!(Scale::from_name("minor_pentatonic").is_some());
        assert!(Scale::from_name("major").is_some());
        assert!(Scale::from_name("unknown").is_none());
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(60), "C");
        assert_eq!(note_name(61), "C#");
        assert_eq!(note_name(71), "B");
        assert_eq!(note_name(72), "C");
    }
}

//! Line sources
//!
//! The sensor board prints one frame per line. A source hands those lines to
//! the runner one at a time, blocking until the next one arrives.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Trait for blocking line producers
pub trait LineSource {
    /// Get the name of this source
    fn name(&self) -> &str;

    /// Read the next line without its terminator. `None` means end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Line source over any buffered reader
pub struct ReaderSource<R> {
    name: String,
    reader: R,
    buffer: String,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
            buffer: String::new(),
        }
    }
}

impl ReaderSource<Box<dyn BufRead>> {
    /// Open a device node or capture file, or stdin for `-`
    ///
    /// Serial line settings (baud rate and so on) are left to the operating
    /// system, e.g. `stty -F /dev/ttyACM0 115200 raw`.
    pub fn open(path: &Path) -> Result<Self> {
        if path == Path::new("-") {
            let reader: Box<dyn BufRead> = Box::new(io::stdin().lock());
            return Ok(Self::new("stdin", reader));
        }

        let file = File::open(path).with_context(|| format!("failed to open input {:?}", path))?;
        let reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
        Ok(Self::new(path.display().to_string(), reader))
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Ok(None);
        }
        let line = self.buffer.trim_end_matches(['\r', '\n']);
        Ok(Some(line.to_string()))
    }
}

//! Line record reader and writer.

use std::io;
use std::io::prelude::*;

/// Line terminator.
pub const TERMINATOR: u8 = b'\n';

/// A single line record without its terminator.
pub type Line = Vec<u8>;

/// Forward-only line decoder.
///
/// Lines are compared and stored as raw bytes, no UTF-8 validation is performed.
/// The reader does not own the source in any meaningful way: pass `&mut source`
/// to keep using it afterwards.
pub struct LineReader<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> LineReader<R> {
    /// Creates a line reader over a buffered byte source.
    pub fn new(reader: R) -> Self {
        LineReader { reader, finished: false }
    }

    /// Reads the next line.
    ///
    /// Returns `Ok(None)` when the source is exhausted. A trailing record without
    /// a terminator is returned as a regular line.
    pub fn read_line(&mut self) -> io::Result<Option<Line>> {
        if self.finished {
            return Ok(None);
        }

        let mut line = Vec::new();
        let read = match self.reader.read_until(TERMINATOR, &mut line) {
            Ok(read) => read,
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };

        if read == 0 {
            self.finished = true;
            return Ok(None);
        }

        if line.last() == Some(&TERMINATOR) {
            line.pop();
        }

        return Ok(Some(line));
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// Line encoder. Appends a terminator after every line.
pub struct LineWriter<W> {
    writer: W,
    lines_written: u64,
}

impl<W: Write> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        LineWriter {
            writer,
            lines_written: 0,
        }
    }

    /// Writes a line followed by a terminator.
    pub fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(&[TERMINATOR])?;
        self.lines_written += 1;

        return Ok(());
    }

    /// Flushes the underlying sink. No durability beyond what the sink provides.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

//! Sorted runs stored on file system.

use std::fs;
use std::io;
use std::io::prelude::*;

use log;
use tempfile;

use crate::buffer::{self, RunBuffer, RunBufferBuilder};
use crate::line::{Line, LineReader, LineWriter};
use crate::sort::SortError;

/// A sorted sequence of lines dumped to an anonymous temporary file.
///
/// The file is removed by the OS as soon as the run is dropped, so a run never outlives its owner
/// regardless of how the owner exits.
pub struct SortedRun {
    reader: LineReader<io::BufReader<fs::File>>,
    len: usize,
}

impl SortedRun {
    /// Dumps already sorted lines to a new temporary file in `dir` and rewinds it for reading.
    pub fn build(
        dir: &tempfile::TempDir,
        lines: impl IntoIterator<Item = Line>,
        buf_size: Option<usize>,
    ) -> Result<Self, SortError> {
        let tmp_file = tempfile::tempfile_in(dir).map_err(SortError::TempDir)?;

        let mut run_writer = LineWriter::new(match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, tmp_file),
            None => io::BufWriter::new(tmp_file),
        });

        for line in lines {
            run_writer.write_line(&line).map_err(SortError::Write)?;
        }
        run_writer.flush().map_err(SortError::Write)?;

        let len = run_writer.lines_written() as usize;
        let mut tmp_file = run_writer
            .into_inner()
            .into_inner()
            .map_err(|err| SortError::Write(err.into_error()))?;
        tmp_file.rewind().map_err(SortError::IO)?;

        let run_reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, tmp_file),
            None => io::BufReader::new(tmp_file),
        };

        return Ok(SortedRun {
            reader: LineReader::new(run_reader),
            len,
        });
    }

    /// Number of lines stored in the run.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for SortedRun {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next()
    }
}

/// Builds sorted runs out of a line source.
pub struct RunBuilder<'a, B: RunBufferBuilder> {
    dir: &'a tempfile::TempDir,
    buffer_builder: &'a B,
    rw_buf_size: Option<usize>,
}

impl<'a, B: RunBufferBuilder> RunBuilder<'a, B> {
    /// Creates a run builder storing runs in `dir`.
    ///
    /// # Arguments
    /// * `dir` - Temporary directory owned by the current sort invocation
    /// * `buffer_builder` - Run buffer factory, decides how many lines a single run holds
    /// * `rw_buf_size` - Run file read/write buffer size
    pub fn new(dir: &'a tempfile::TempDir, buffer_builder: &'a B, rw_buf_size: Option<usize>) -> Self {
        RunBuilder {
            dir,
            buffer_builder,
            rw_buf_size,
        }
    }

    /// Drains the source and returns its lines as sorted runs.
    ///
    /// With an unlimited buffer the whole source becomes a single run. An empty source produces no runs.
    /// Memory usage is bounded by the buffer limit only; an unlimited buffer holds the whole source.
    pub fn build<R: BufRead>(&self, source: &mut LineReader<R>) -> Result<Vec<SortedRun>, SortError> {
        let mut runs = Vec::new();
        let mut run_buf = self.buffer_builder.build();

        while let Some(line) = source.read_line().map_err(SortError::Read)? {
            run_buf.push(line);

            if run_buf.is_full() {
                let full_buf = buffer::take_buffer(self.buffer_builder, &mut run_buf);
                runs.push(self.create_run(full_buf)?);
            }
        }

        if run_buf.len() > 0 {
            runs.push(self.create_run(run_buf)?);
        }

        return Ok(runs);
    }

    fn create_run(&self, mut buffer: B::Buffer) -> Result<SortedRun, SortError> {
        log::debug!("sorting run data ({} lines) ...", buffer.len());
        buffer.sort();

        log::debug!("saving run data");
        let run = SortedRun::build(self.dir, buffer, self.rw_buf_size)?;

        return Ok(run);
    }
}

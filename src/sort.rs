//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::line::{LineReader, LineWriter};
use crate::merger;
use crate::run::{RunBuilder, SortedRun};
use crate::{LimitedBufferBuilder, RunBufferBuilder};

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Temporary directory or file creation error.
    TempDir(io::Error),
    /// Input file opening error.
    Open(PathBuf, io::Error),
    /// Source or run reading error.
    Read(io::Error),
    /// Run or output writing error.
    Write(io::Error),
    /// Common I/O error.
    IO(io::Error),
    /// Temporary directory removal error.
    Cleanup(io::Error),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            SortError::TempDir(err) => err,
            SortError::Open(_, err) => err,
            SortError::Read(err) => err,
            SortError::Write(err) => err,
            SortError::IO(err) => err,
            SortError::Cleanup(err) => err,
        })
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::Open(path, err) => write!(f, "input file {} not opened: {}", path.display(), err),
            SortError::Read(err) => write!(f, "data reading error: {}", err),
            SortError::Write(err) => write!(f, "data writing error: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::Cleanup(err) => write!(f, "temporary directory not removed: {}", err),
        }
    }
}

/// Sorting result summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of input sources.
    pub sources: usize,
    /// Number of sorted runs merged.
    pub runs: usize,
    /// Number of lines written to the output.
    pub lines: u64,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder<B = LimitedBufferBuilder>
where
    B: RunBufferBuilder,
{
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Source, run and output read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Run buffer builder.
    buffer_builder: B,
}

impl<B> ExternalSorterBuilder<B>
where
    B: RunBufferBuilder,
{
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> ExternalSorter<B> {
        ExternalSorter::new(self.tmp_dir.as_deref(), self.buffer_builder, self.rw_buf_size)
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder<B> {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets run buffer builder.
    pub fn with_buffer(mut self, buffer_builder: B) -> ExternalSorterBuilder<B> {
        self.buffer_builder = buffer_builder;
        return self;
    }

    /// Sets read/write buffer size. Zero means the default size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder<B> {
        self.rw_buf_size = Some(buf_size).filter(|size| *size > 0);
        return self;
    }
}

impl<B> Default for ExternalSorterBuilder<B>
where
    B: RunBufferBuilder,
{
    fn default() -> Self {
        ExternalSorterBuilder {
            tmp_dir: None,
            rw_buf_size: None,
            buffer_builder: B::default(),
        }
    }
}

/// External line sorter.
///
/// Every source is drained into memory, sorted and dumped to a temporary file as a run (several runs
/// if the run buffer is limited). All runs are then merged in a single pass into the output.
/// A source that does not fit in memory is not detected and fails as an allocation failure,
/// use a limited run buffer to bound memory usage.
///
/// The sorter holds configuration only, each [`ExternalSorter::sort`] call owns its own temporary
/// directory and runs.
pub struct ExternalSorter<B = LimitedBufferBuilder>
where
    B: RunBufferBuilder,
{
    /// Parent of the per-sort temporary directories.
    tmp_path: Option<PathBuf>,
    /// Run buffer builder.
    buffer_builder: B,
    /// Source, run and output read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl<B> ExternalSorter<B>
where
    B: RunBufferBuilder,
{
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `buffer_builder` - An instance of a buffer builder that will be used for run buffer creation.
    /// * `rw_buf_size` - Read/write buffer size. A zero-sized buffer reads nothing, so `Some(0)` falls back
    ///   to the default size.
    pub fn new(tmp_path: Option<&Path>, buffer_builder: B, rw_buf_size: Option<usize>) -> Self {
        ExternalSorter {
            tmp_path: tmp_path.map(Path::to_path_buf),
            buffer_builder,
            rw_buf_size: rw_buf_size.filter(|size| *size > 0),
        }
    }

    fn init_tmp_directory(&self) -> Result<tempfile::TempDir, SortError> {
        let tmp_dir = if let Some(tmp_path) = &self.tmp_path {
            tempfile::tempdir_in(tmp_path)
        } else {
            tempfile::tempdir()
        }
        .map_err(SortError::TempDir)?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        return Ok(tmp_dir);
    }

    /// Sorts lines of all the sources into the output.
    ///
    /// Sources are processed in the given order. The output is flushed on success; on failure
    /// its content is undefined. The temporary directory is removed on every exit path, a removal
    /// failure is reported as [`SortError::Cleanup`] unless another error has already occurred.
    ///
    /// # Arguments
    /// * `sources` - Byte sources to be sorted
    /// * `output` - Sorted data destination
    pub fn sort<I, R, W>(&self, sources: I, output: W) -> Result<SortSummary, SortError>
    where
        I: IntoIterator<Item = R>,
        R: Read,
        W: Write,
    {
        let tmp_dir = self.init_tmp_directory()?;
        let result = self.sort_in(&tmp_dir, sources, output);
        let tmp_path = tmp_dir.path().to_path_buf();

        return match (result, tmp_dir.close()) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(err)) => Err(SortError::Cleanup(err)),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                log::warn!(
                    "temporary directory {} not removed: {}",
                    tmp_path.display(),
                    cleanup_err
                );
                Err(err)
            }
        };
    }

    /// Opens the files and sorts their lines into the output.
    ///
    /// # Arguments
    /// * `paths` - Files to be sorted
    /// * `output` - Sorted data destination
    pub fn sort_files<P, W>(&self, paths: &[P], output: W) -> Result<SortSummary, SortError>
    where
        P: AsRef<Path>,
        W: Write,
    {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file = fs::File::open(path).map_err(|err| SortError::Open(path.to_path_buf(), err))?;
            log::debug!("opened {}", path.display());
            files.push(file);
        }

        return self.sort(files, output);
    }

    fn sort_in<I, R, W>(&self, tmp_dir: &tempfile::TempDir, sources: I, output: W) -> Result<SortSummary, SortError>
    where
        I: IntoIterator<Item = R>,
        R: Read,
        W: Write,
    {
        let run_builder = RunBuilder::new(tmp_dir, &self.buffer_builder, self.rw_buf_size);
        let mut runs: Vec<SortedRun> = Vec::new();
        let mut source_count = 0;

        for (idx, source) in sources.into_iter().enumerate() {
            let source = match self.rw_buf_size {
                Some(buf_size) => io::BufReader::with_capacity(buf_size, source),
                None => io::BufReader::new(source),
            };

            let source_runs = run_builder.build(&mut LineReader::new(source))?;
            log::debug!("source {} split into {} runs", idx, source_runs.len());

            runs.extend(source_runs);
            source_count += 1;
        }

        log::debug!("external sort preparation done");

        let run_count = runs.len();
        let mut writer = LineWriter::new(output);
        let lines = merger::merge(&mut writer, runs)?;
        writer.flush().map_err(SortError::Write)?;

        log::info!("sorted {} lines from {} sources ({} runs)", lines, source_count, run_count);

        return Ok(SortSummary {
            sources: source_count,
            runs: run_count,
            lines,
        });
    }
}

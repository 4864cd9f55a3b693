//! `ext-line-sort` is an external sort implementation for line-delimited data.
//!
//! External sorting is required when the data being sorted do not fit into the main memory (RAM) of a computer
//! and instead must be resided in slower external memory, usually a hard disk drive. Sorting is achieved in two
//! passes. During the first pass every input source is read into memory, sorted and stored in a temporary file
//! as a sorted run, during the second pass all the runs are merged together in a single k-way merge.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Byte-wise ordering:**
//!   lines are raw byte sequences compared lexicographically, no locale or UTF-8 handling is involved.
//! * **Bounded merge memory:**
//!   the merge keeps only the current line of each run in memory.
//! * **Deterministic output:**
//!   equal lines are emitted in source order.
//! * **Optional run splitting:**
//!   by default one source is one run; a limited run buffer splits large sources into several runs.
//!
//! # Example
//!
//! ```no_run
//! use std::fs;
//! use std::io;
//! use std::path;
//!
//! use env_logger;
//! use log;
//!
//! use ext_line_sort::{ExternalSorter, ExternalSorterBuilder};
//!
//! fn main() {
//!     env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();
//!
//!     let mut output_writer = io::BufWriter::new(fs::File::create("output.txt").unwrap());
//!
//!     let sorter: ExternalSorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(path::Path::new("./"))
//!         .build();
//!
//!     sorter.sort_files(&["first.txt", "second.txt"], &mut output_writer).unwrap();
//! }
//! ```

pub mod buffer;
pub mod line;
pub mod merger;
pub mod run;
pub mod sort;

pub use buffer::{LimitedBuffer, LimitedBufferBuilder, RunBuffer, RunBufferBuilder};
pub use line::{Line, LineReader, LineWriter};
pub use merger::{merge, BinaryHeapMerger};
pub use run::{RunBuilder, SortedRun};
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortError, SortSummary};

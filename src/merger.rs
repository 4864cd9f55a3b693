//! Binary heap merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io;
use std::io::prelude::*;

use log;

use crate::line::{Line, LineWriter};
use crate::sort::SortError;

/// Binary heap merger implementation.
/// Merges multiple sorted line sources into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of lines,
/// *n* is the number of sources.
///
/// The heap holds exactly one entry per source that still has unread lines. Equal lines are
/// emitted in source order. After the first error the merger yields nothing.
pub struct BinaryHeapMerger<E, C>
where
    C: IntoIterator<Item = Result<Line, E>>,
{
    // binary heap is max-heap by default so we reverse it to convert it to min-heap
    items: BinaryHeap<Reverse<(Line, usize)>>,
    sources: Vec<C::IntoIter>,
    initiated: bool,
    // error raised while refilling the heap, reported after the line already popped
    pending_error: Option<E>,
    failed: bool,
}

impl<E, C> BinaryHeapMerger<E, C>
where
    C: IntoIterator<Item = Result<Line, E>>,
{
    /// Creates an instance of a binary heap merger using sources as inputs.
    /// Source lines should be sorted in ascending order otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `sources` - Sources to be merged in a single sorted one
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let sources = Vec::from_iter(sources.into_iter().map(|c| c.into_iter()));
        let items = BinaryHeap::with_capacity(sources.len());

        return BinaryHeapMerger {
            sources,
            items,
            initiated: false,
            pending_error: None,
            failed: false,
        };
    }

    /// Number of sources that still have unread lines.
    pub fn active_sources(&self) -> usize {
        self.items.len()
    }

    fn init(&mut self) -> Result<(), E> {
        for (idx, source) in self.sources.iter_mut().enumerate() {
            if let Some(line) = source.next() {
                self.items.push(Reverse((line?, idx)));
            }
        }
        self.initiated = true;

        return Ok(());
    }
}

impl<E, C> Iterator for BinaryHeapMerger<E, C>
where
    C: IntoIterator<Item = Result<Line, E>>,
{
    type Item = Result<Line, E>;

    /// Returns the next line from the sources in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(err) = self.pending_error.take() {
            self.failed = true;
            return Some(Err(err));
        }

        if !self.initiated {
            if let Err(err) = self.init() {
                self.failed = true;
                return Some(Err(err));
            }
        }

        let Reverse((line, idx)) = self.items.pop()?;
        match self.sources[idx].next() {
            Some(Ok(next_line)) => self.items.push(Reverse((next_line, idx))),
            Some(Err(err)) => self.pending_error = Some(err),
            None => log::trace!("source {} exhausted", idx),
        }

        return Some(Ok(line));
    }
}

/// Merges sorted sources into the writer.
/// Returns the number of lines written. Stops at the first read or write error;
/// whatever has already been written is undefined in that case.
pub fn merge<W, I, C>(writer: &mut LineWriter<W>, sources: I) -> Result<u64, SortError>
where
    W: Write,
    I: IntoIterator<Item = C>,
    C: IntoIterator<Item = io::Result<Line>>,
{
    let merger = BinaryHeapMerger::new(sources);
    log::debug!("merging {} sources", merger.sources.len());

    let mut written = 0;
    for line in merger {
        let line = line.map_err(SortError::Read)?;
        writer.write_line(&line).map_err(SortError::Write)?;
        written += 1;
    }

    log::debug!("merge done ({} lines)", written);

    return Ok(written);
}

#[cfg(test)]
mod test {
    use rstest::*;
    use std::cell::RefCell;
    use std::error::Error;
    use std::rc::Rc;
    use std::io::{self, ErrorKind};

    use super::{merge, BinaryHeapMerger};
    use crate::line::{Line, LineWriter};
    use crate::sort::SortError;

    fn line(item: &str) -> Line {
        item.as_bytes().to_vec()
    }

    fn ok(items: &[&str]) -> Vec<Result<Line, io::Error>> {
        items.iter().map(|item| Ok(line(item))).collect()
    }

    fn test_error() -> io::Error {
        io::Error::new(ErrorKind::Other, "test error")
    }

    #[rstest]
    #[case(
        vec![],
        vec![],
    )]
    #[case(
        vec![
            vec![],
            vec![]
        ],
        vec![],
    )]
    #[case(
        vec![ok(&["a", "b", "c"])],
        ok(&["a", "b", "c"]),
    )]
    #[case(
        vec![
            ok(&["d", "e", "g"]),
            ok(&["a", "f"]),
            ok(&["c"]),
            vec![],
        ],
        ok(&["a", "c", "d", "e", "f", "g"]),
    )]
    #[case(
        vec![
            ok(&["apple", "cherry"]),
            ok(&["banana", "date"]),
        ],
        ok(&["apple", "banana", "cherry", "date"]),
    )]
    #[case(
        vec![
            ok(&["apple", "fig"]),
            ok(&["apple"]),
        ],
        ok(&["apple", "apple", "fig"]),
    )]
    #[case(
        vec![
            vec![Err(test_error())]
        ],
        vec![
            Err(test_error())
        ],
    )]
    #[case(
        vec![
            vec![Ok(line("c")), Err(test_error())],
            ok(&["a", "b"]),
        ],
        vec![
            Ok(line("a")),
            Ok(line("b")),
            Ok(line("c")),
            Err(test_error()),
        ],
    )]
    #[case(
        vec![
            ok(&["a"]),
            vec![Err(test_error()), Ok(line("b"))],
        ],
        vec![
            Err(test_error()),
        ],
    )]
    fn test_merger(
        #[case] sources: Vec<Vec<Result<Line, io::Error>>>,
        #[case] expected_result: Vec<Result<Line, io::Error>>,
    ) {
        let merger = BinaryHeapMerger::new(sources);
        let actual_result = merger.collect();
        assert!(
            compare_vectors_of_result::<_, io::Error>(&actual_result, &expected_result),
            "actual={:?}, expected={:?}",
            actual_result,
            expected_result
        );
    }

    #[test]
    fn test_merger_ties_follow_source_order() {
        struct Recording {
            idx: usize,
            lines: std::vec::IntoIter<Line>,
            pulls: Rc<RefCell<Vec<usize>>>,
        }

        impl Iterator for Recording {
            type Item = Result<Line, io::Error>;

            fn next(&mut self) -> Option<Self::Item> {
                self.pulls.borrow_mut().push(self.idx);
                self.lines.next().map(Ok)
            }
        }

        let pulls = Rc::new(RefCell::new(Vec::new()));
        let sources = vec![vec!["b", "c"], vec!["b", "d"], vec!["a"]]
            .into_iter()
            .enumerate()
            .map(|(idx, items)| Recording {
                idx,
                lines: items.into_iter().map(line).collect::<Vec<_>>().into_iter(),
                pulls: pulls.clone(),
            });

        let merged: Vec<Line> = BinaryHeapMerger::new(sources).map(Result::unwrap).collect();
        assert_eq!(merged, vec![line("a"), line("b"), line("b"), line("c"), line("d")]);

        // the "b" of source 0 is emitted first, so source 0 is refilled before source 1
        assert_eq!(pulls.borrow()[..6], [0, 1, 2, 2, 0, 1]);
    }

    #[test]
    fn test_merger_keeps_one_entry_per_source() {
        let sources = vec![ok(&["a", "d"]), ok(&["b"]), ok(&["c", "e", "f"])];
        let mut merger = BinaryHeapMerger::new(sources);

        let mut active = Vec::new();
        while let Some(item) = merger.next() {
            item.unwrap();
            active.push(merger.active_sources());
        }

        assert_eq!(active, vec![3, 2, 2, 1, 1, 0]);
    }

    #[test]
    fn test_merge_into_writer() {
        let mut writer = LineWriter::new(Vec::new());
        let sources = vec![ok(&["alpha", "delta"]), ok(&["bravo", "charlie"]), vec![]];

        let written = merge(&mut writer, sources).unwrap();

        assert_eq!(written, 4);
        assert_eq!(writer.into_inner(), b"alpha\nbravo\ncharlie\ndelta\n".to_vec());
    }

    #[test]
    fn test_merge_no_sources() {
        let mut writer = LineWriter::new(Vec::new());
        let sources: Vec<Vec<io::Result<Line>>> = vec![];

        assert_eq!(merge(&mut writer, sources).unwrap(), 0);
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_merge_read_error() {
        let mut writer = LineWriter::new(Vec::new());
        let sources = vec![vec![Ok(line("a")), Err(test_error())]];

        let result = merge(&mut writer, sources);
        assert!(matches!(result, Err(SortError::Read(_))));
    }

    #[test]
    fn test_merge_write_error() {
        let mut sink = [0u8; 3];
        let mut writer = LineWriter::new(&mut sink[..]);
        let sources = vec![ok(&["a", "b"])];

        let result = merge(&mut writer, sources);
        assert!(matches!(result, Err(SortError::Write(_))));
    }

    fn compare_vectors_of_result<T: PartialEq, E: Error + 'static>(
        actual: &Vec<Result<T, E>>,
        expected: &Vec<Result<T, E>>,
    ) -> bool {
        actual.len() == expected.len()
            && actual
                .into_iter()
                .zip(expected)
                .all(
                    |(actual_result, expected_result)| match (actual_result, expected_result) {
                        (Ok(actual_result), Ok(expected_result)) if actual_result == expected_result => true,
                        (Err(actual_err), Err(expected_err)) => actual_err.to_string() == expected_err.to_string(),
                        _ => false,
                    },
                )
    }
}

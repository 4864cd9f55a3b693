//! Run buffer implementations.
//!
//! A run buffer accumulates the lines of a single run in memory. By default a buffer is never full,
//! so every source becomes exactly one run. Limited buffers split a source into several runs.

use crate::line::Line;

/// Upper bound of lines preallocated by a limited buffer.
pub const MAX_PREALLOCATED_LINES: usize = 1 << 16;

/// Buffer builder.
pub trait RunBufferBuilder: Default {
    type Buffer: RunBuffer;

    /// Creates a new buffer.
    fn build(&self) -> Self::Buffer;
}

/// Base run buffer interface.
pub trait RunBuffer: IntoIterator<Item = Line> {
    /// Adds a new line to the buffer.
    fn push(&mut self, line: Line);

    /// Returns buffer length
    fn len(&self) -> usize;

    /// Checks if the buffer reached the limit.
    fn is_full(&self) -> bool;

    /// Sorts buffered lines in lexicographic byte order.
    fn sort(&mut self);
}

pub struct LimitedBufferBuilder {
    buffer_limit: usize,
    preallocate: bool,
}

impl LimitedBufferBuilder {
    pub fn new(buffer_limit: usize, preallocate: bool) -> Self {
        LimitedBufferBuilder {
            buffer_limit,
            preallocate,
        }
    }
}

impl RunBufferBuilder for LimitedBufferBuilder {
    type Buffer = LimitedBuffer;

    fn build(&self) -> Self::Buffer {
        if self.preallocate {
            LimitedBuffer::with_capacity(self.buffer_limit)
        } else {
            LimitedBuffer::new(self.buffer_limit)
        }
    }
}

impl Default for LimitedBufferBuilder {
    fn default() -> Self {
        LimitedBufferBuilder {
            buffer_limit: usize::MAX,
            preallocate: false,
        }
    }
}

/// Buffer limited by lines count.
pub struct LimitedBuffer {
    limit: usize,
    inner: Vec<Line>,
}

impl LimitedBuffer {
    pub fn new(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::new(),
        }
    }

    /// Preallocates up to [`MAX_PREALLOCATED_LINES`] lines, the limit itself is not capped.
    pub fn with_capacity(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::with_capacity(limit.min(MAX_PREALLOCATED_LINES)),
        }
    }
}

impl RunBuffer for LimitedBuffer {
    fn push(&mut self, line: Line) {
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    fn sort(&mut self) {
        self.inner.sort();
    }
}

impl IntoIterator for LimitedBuffer {
    type Item = Line;
    type IntoIter = <Vec<Line> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

pub mod mem {
    use super::{Line, RunBuffer, RunBufferBuilder};

    /// Accounted size of a line: its payload plus the vector header.
    pub fn line_size(line: &Line) -> u64 {
        (line.len() + std::mem::size_of::<Line>()) as u64
    }

    pub struct MemoryLimitedBufferBuilder {
        buffer_limit: u64,
    }

    impl MemoryLimitedBufferBuilder {
        pub fn new(buffer_limit: u64) -> Self {
            MemoryLimitedBufferBuilder { buffer_limit }
        }
    }

    impl RunBufferBuilder for MemoryLimitedBufferBuilder {
        type Buffer = MemoryLimitedBuffer;

        fn build(&self) -> Self::Buffer {
            MemoryLimitedBuffer::new(self.buffer_limit)
        }
    }

    impl Default for MemoryLimitedBufferBuilder {
        fn default() -> Self {
            MemoryLimitedBufferBuilder { buffer_limit: u64::MAX }
        }
    }

    /// Buffer limited by consumed memory.
    pub struct MemoryLimitedBuffer {
        limit: u64,
        current_size: u64,
        inner: Vec<Line>,
    }

    impl MemoryLimitedBuffer {
        pub fn new(limit: u64) -> Self {
            MemoryLimitedBuffer {
                limit,
                current_size: 0,
                inner: Vec::new(),
            }
        }

        pub fn mem_size(&self) -> u64 {
            self.current_size
        }
    }

    impl RunBuffer for MemoryLimitedBuffer {
        fn push(&mut self, line: Line) {
            self.current_size += line_size(&line);
            self.inner.push(line);
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn is_full(&self) -> bool {
            self.current_size >= self.limit
        }

        fn sort(&mut self) {
            self.inner.sort();
        }
    }

    impl IntoIterator for MemoryLimitedBuffer {
        type Item = Line;
        type IntoIter = <Vec<Line> as IntoIterator>::IntoIter;

        fn into_iter(self) -> Self::IntoIter {
            self.inner.into_iter()
        }
    }

}

/// Hands off a filled buffer, leaving a fresh one in its place.
pub(crate) fn take_buffer<B: RunBufferBuilder>(builder: &B, buffer: &mut B::Buffer) -> B::Buffer {
    std::mem::replace(buffer, builder.build())
}

#[cfg(test)]
mod test {
    use super::{take_buffer, LimitedBufferBuilder, RunBuffer, RunBufferBuilder, MAX_PREALLOCATED_LINES};

    #[test]
    fn test_limited_buffer() {
        let builder = LimitedBufferBuilder::new(2, true);
        let mut buffer = builder.build();

        buffer.push(b"b".to_vec());
        assert_eq!(buffer.is_full(), false);
        buffer.push(b"a".to_vec());
        assert_eq!(buffer.is_full(), true);

        buffer.sort();
        let data = Vec::from_iter(buffer);
        assert_eq!(data, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_default_buffer_is_unlimited() {
        let builder = LimitedBufferBuilder::default();
        let mut buffer = builder.build();

        for i in 0..1000 {
            buffer.push(format!("{}", i).into_bytes());
        }
        assert_eq!(buffer.is_full(), false);
        assert_eq!(buffer.len(), 1000);
    }

    #[test]
    fn test_preallocation_is_capped() {
        let builder = LimitedBufferBuilder::new(usize::MAX, true);
        let mut buffer = builder.build();

        assert!(buffer.inner.capacity() >= MAX_PREALLOCATED_LINES);
        assert!(buffer.inner.capacity() < usize::MAX / 2);
        buffer.push(b"a".to_vec());
        assert_eq!(buffer.is_full(), false);
    }

    #[test]
    fn test_take_buffer() {
        let builder = LimitedBufferBuilder::new(1, false);
        let mut buffer = builder.build();
        buffer.push(b"x".to_vec());

        let taken = take_buffer(&builder, &mut buffer);
        assert_eq!(taken.len(), 1);
        assert_eq!(buffer.len(), 0);
    }
}

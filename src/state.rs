//! Per-operation resumption state.
//!
//! Each nesting level that is in progress owns one frame. Level `d` always
//! lives at index `d` of the stack, so a converter that is called again after
//! a suspension finds its frame where it left it, and the frames of the nested
//! converters it was waiting on right above it.

use crate::convert::Converter;
use crate::drain::DrainState;
use crate::error::{Error, ErrorCode, Result};
use crate::graph::Graph;
use crate::options::JsonOptions;
use crate::read::JsonReader;
use crate::write::JsonWriter;
use core::any::Any;
use core::mem;

/// Where a reading converter left off at one nesting level.
#[derive(Debug, Default)]
pub struct ReadFrame {
    /// The container or accessor for this level has been created.
    pub has_created: bool,
    /// The current entry's name (or, in arrays, the entry itself) has started.
    pub has_read_property: bool,
    /// The `:` after the current entry's name has been read.
    pub has_read_separator: bool,
    /// The current entry's value has been read.
    pub has_read_value: bool,
    pub continuation: ReadContinuation,
}

impl ReadFrame {
    /// Clears the per-entry flags after a `,`.
    pub fn next_entry(&mut self) {
        self.has_read_property = false;
        self.has_read_separator = false;
        self.has_read_value = false;
    }
}

/// What a suspended reading converter needs to keep besides its flags.
#[derive(Default)]
pub enum ReadContinuation {
    #[default]
    None,
    /// A value under construction.
    Container(Box<dyn Any + Send>),
    /// A dictionary accessor with its pending key.
    Accessor(Box<dyn Any + Send>),
    /// Progress through a value that is being skipped.
    Drain(DrainState),
}

impl ReadContinuation {
    /// Takes the container stored by an earlier suspension of the same
    /// converter.
    pub fn take_container<T: Any>(&mut self) -> Result<T> {
        match mem::take(self) {
            ReadContinuation::Container(container) => downcast(container),
            _ => Err(Error::config(ErrorCode::ForeignState)),
        }
    }

    pub fn take_accessor<T: Any>(&mut self) -> Result<T> {
        match mem::take(self) {
            ReadContinuation::Accessor(accessor) => downcast(accessor),
            _ => Err(Error::config(ErrorCode::ForeignState)),
        }
    }
}

fn downcast<T: Any>(boxed: Box<dyn Any + Send>) -> Result<T> {
    match boxed.downcast::<T>() {
        Ok(value) => Ok(*value),
        Err(_) => Err(Error::config(ErrorCode::ForeignState)),
    }
}

impl core::fmt::Debug for ReadContinuation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            ReadContinuation::None => f.write_str("None"),
            ReadContinuation::Container(_) => f.write_str("Container"),
            ReadContinuation::Accessor(_) => f.write_str("Accessor"),
            ReadContinuation::Drain(drain) => f.debug_tuple("Drain").field(drain).finish(),
        }
    }
}

/// The state of one read operation.
///
/// The same state must be passed to every call until the value is complete.
/// After an error it must be dropped.
pub struct ReadState {
    frames: Vec<ReadFrame>,
    depth: usize,
    chars_needed: usize,
    error_on_type_mismatch: bool,
    include_return_graph: bool,
    max_depth: Option<usize>,
    completed_graph: Option<Graph>,
}

impl Default for ReadState {
    fn default() -> Self {
        ReadState::with_options(&JsonOptions::default())
    }
}

impl ReadState {
    pub fn new() -> Self {
        ReadState::default()
    }

    pub fn with_options(options: &JsonOptions) -> Self {
        ReadState {
            frames: Vec::new(),
            depth: 0,
            chars_needed: 0,
            error_on_type_mismatch: options.get_error_on_type_mismatch(),
            include_return_graph: options.get_include_return_graph(),
            max_depth: options.get_max_depth(),
            completed_graph: None,
        }
    }

    /// Minimum number of additional input bytes required to make progress
    /// after a read returned `None`.
    pub fn chars_needed(&self) -> usize {
        self.chars_needed
    }

    pub(crate) fn set_chars_needed(&mut self, chars_needed: usize) {
        self.chars_needed = chars_needed;
    }

    pub fn error_on_type_mismatch(&self) -> bool {
        self.error_on_type_mismatch
    }

    pub fn include_return_graph(&self) -> bool {
        self.include_return_graph
    }

    /// Number of nesting levels that are suspended.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Whether the converter at the current level suspended earlier and is
    /// being called again.
    pub fn is_resuming(&self) -> bool {
        self.frames.len() > self.depth
    }

    /// Takes the frame of the current level, creating it when the level is
    /// entered for the first time. Every call must be followed by either
    /// [`suspend`](Self::suspend) or [`end_frame`](Self::end_frame).
    pub fn take_frame(&mut self) -> ReadFrame {
        if self.is_resuming() {
            mem::take(&mut self.frames[self.depth])
        } else {
            self.frames.push(ReadFrame::default());
            ReadFrame::default()
        }
    }

    /// Stores the frame of the current level so the next call resumes it.
    pub fn suspend(&mut self, frame: ReadFrame) {
        debug_assert!(self.is_resuming());
        self.frames[self.depth] = frame;
    }

    /// Discards the frame of the current level and everything above it.
    pub fn end_frame(&mut self) {
        self.frames.truncate(self.depth);
        self.completed_graph = None;
    }

    /// Reads a value one level deeper.
    pub fn read_nested<T>(
        &mut self,
        reader: &mut JsonReader<'_>,
        converter: &dyn Converter<T>,
    ) -> Result<Option<T>> {
        self.nested(reader, |reader, state| {
            converter.try_read_value(reader, state)
        })
    }

    pub(crate) fn nested<'a, R>(
        &mut self,
        reader: &mut JsonReader<'a>,
        f: impl FnOnce(&mut JsonReader<'a>, &mut ReadState) -> Result<R>,
    ) -> Result<R> {
        if let Some(max_depth) = self.max_depth {
            if self.depth >= max_depth {
                return Err(reader.error(ErrorCode::RecursionLimitExceeded));
            }
        }
        self.depth += 1;
        self.completed_graph = None;
        let result = f(reader, self);
        self.depth -= 1;
        result
    }

    /// Records the member graph of an object that just completed, for its
    /// parent to pick up.
    pub fn set_completed_graph(&mut self, graph: Graph) {
        self.completed_graph = Some(graph);
    }

    /// The member graph of the object value that the last nested read
    /// completed, if any.
    pub fn take_completed_graph(&mut self) -> Option<Graph> {
        self.completed_graph.take()
    }
}

/// Where a writing converter left off at one nesting level.
#[derive(Debug, Default)]
pub struct WriteFrame {
    /// At least one entry has been written completely.
    pub has_written_first: bool,
    /// The `,` before the current entry has been written.
    pub has_written_separator: bool,
    /// The current entry's `"name":` has been written.
    pub has_written_property_name: bool,
    /// The opening bracket has been written and entries are being walked.
    pub enumerator_in_progress: bool,
    pub continuation: WriteContinuation,
}

impl WriteFrame {
    /// Clears the per-entry flags once an entry is complete.
    pub fn next_entry(&mut self) {
        self.has_written_first = true;
        self.has_written_separator = false;
        self.has_written_property_name = false;
    }

    /// Index of the entry being written.
    pub fn enumerator(&self) -> usize {
        match self.continuation {
            WriteContinuation::Enumerator(index) => index,
            WriteContinuation::None => 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteContinuation {
    #[default]
    None,
    /// Position in the source's entry sequence.
    Enumerator(usize),
}

/// The state of one write operation.
pub struct WriteState {
    frames: Vec<WriteFrame>,
    depth: usize,
    size_needed: usize,
    max_depth: Option<usize>,
}

impl Default for WriteState {
    fn default() -> Self {
        WriteState::with_options(&JsonOptions::default())
    }
}

impl WriteState {
    pub fn new() -> Self {
        WriteState::default()
    }

    pub fn with_options(options: &JsonOptions) -> Self {
        WriteState {
            frames: Vec::new(),
            depth: 0,
            size_needed: 0,
            max_depth: options.get_max_depth(),
        }
    }

    /// Size of the token that did not fit after a write returned false.
    pub fn size_needed(&self) -> usize {
        self.size_needed
    }

    pub(crate) fn set_size_needed(&mut self, size_needed: usize) {
        self.size_needed = size_needed;
    }

    /// Number of nesting levels that are suspended.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_resuming(&self) -> bool {
        self.frames.len() > self.depth
    }

    pub fn take_frame(&mut self) -> WriteFrame {
        if self.is_resuming() {
            mem::take(&mut self.frames[self.depth])
        } else {
            self.frames.push(WriteFrame::default());
            WriteFrame::default()
        }
    }

    pub fn suspend(&mut self, frame: WriteFrame) {
        debug_assert!(self.is_resuming());
        self.frames[self.depth] = frame;
    }

    pub fn end_frame(&mut self) {
        self.frames.truncate(self.depth);
    }

    /// Writes a value one level deeper.
    pub fn write_nested<T>(
        &mut self,
        writer: &mut JsonWriter<'_>,
        converter: &dyn Converter<T>,
        value: &T,
    ) -> Result<bool> {
        self.nested(writer, |writer, state| {
            converter.try_write_value(writer, state, value)
        })
    }

    pub(crate) fn nested<'a, R>(
        &mut self,
        writer: &mut JsonWriter<'a>,
        f: impl FnOnce(&mut JsonWriter<'a>, &mut WriteState) -> Result<R>,
    ) -> Result<R> {
        if let Some(max_depth) = self.max_depth {
            if self.depth >= max_depth {
                return Err(Error::unpositioned(ErrorCode::RecursionLimitExceeded));
            }
        }
        self.depth += 1;
        let result = f(writer, self);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_per_level() {
        let mut state = ReadState::new();
        let mut outer = state.take_frame();
        outer.has_created = true;
        let mut reader = JsonReader::new(b"", false);
        state
            .nested(&mut reader, |_, state| {
                let mut inner = state.take_frame();
                inner.has_read_property = true;
                state.suspend(inner);
                Ok(())
            })
            .unwrap();
        state.suspend(outer);
        assert_eq!(state.pending_frames(), 2);

        assert!(state.is_resuming());
        let outer = state.take_frame();
        assert!(outer.has_created);
        state
            .nested(&mut reader, |_, state| {
                assert!(state.is_resuming());
                let inner = state.take_frame();
                assert!(inner.has_read_property);
                state.end_frame();
                Ok(())
            })
            .unwrap();
        state.end_frame();
        assert_eq!(state.pending_frames(), 0);
    }

    #[test]
    fn test_foreign_continuation() {
        let mut continuation = ReadContinuation::Container(Box::new(1u8));
        let err = continuation.take_container::<String>().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_depth_limit() {
        let mut state = ReadState::with_options(&JsonOptions::new().max_depth(1));
        let mut reader = JsonReader::new(b"", false);
        let err = state
            .nested(&mut reader, |reader, state| {
                state.nested(reader, |_, _| Ok(()))
            })
            .unwrap_err();
        assert_eq!(*err.code(), ErrorCode::RecursionLimitExceeded);
    }
}

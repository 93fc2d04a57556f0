//! Entry points that run the converters.
//!
//! [`try_read`] and [`try_write`] make one step over one buffer and leave the
//! rest to the caller. [`ReadDriver`] and [`WriteDriver`] own the buffering for
//! the common cases, and the `from_*` / `to_*` functions run a value to
//! completion in one call.

use crate::convert::JsonType;
use crate::error::{Error, ErrorCode, Result};
use crate::graph::Graph;
use crate::options::JsonOptions;
use crate::read::JsonReader;
use crate::registry::ConverterRegistry;
use crate::state::{ReadState, WriteState};
use crate::write::JsonWriter;
use std::io;

/// Reads a `T` from the reader's block, resuming from `state`.
///
/// On `Ok(None)` the caller keeps the bytes after `reader.consumed()`, appends
/// at least `state.chars_needed()` more and calls again with the same state.
pub fn try_read<T: JsonType>(reader: &mut JsonReader<'_>, state: &mut ReadState) -> Result<Option<T>> {
    let converter = ConverterRegistry::global().converter::<(), T>();
    let value = tri!(converter.try_read_value(reader, state));
    if value.is_none() {
        state.set_chars_needed(reader.size_needed());
        tracing::trace!(
            consumed = reader.consumed(),
            needed = reader.size_needed(),
            "read suspended"
        );
    }
    Ok(value)
}

/// Writes `value` into the writer's block, resuming from `state`.
///
/// On `Ok(false)` the caller takes the bytes written so far and calls again
/// with a buffer of at least `state.size_needed()` bytes, the same value and
/// the same state.
pub fn try_write<T: JsonType>(writer: &mut JsonWriter<'_>, state: &mut WriteState, value: &T) -> Result<bool> {
    let converter = ConverterRegistry::global().converter::<(), T>();
    let finished = tri!(converter.try_write_value(writer, state, value));
    if !finished {
        state.set_size_needed(writer.size_needed());
        tracing::trace!(
            written = writer.written(),
            needed = writer.size_needed(),
            "write suspended"
        );
    }
    Ok(finished)
}

fn check_trailing(reader: &mut JsonReader<'_>) -> Result<()> {
    match reader.try_read_next_skip_whitespace() {
        Some(_) => Err(reader.error(ErrorCode::TrailingCharacters)),
        None => Ok(()),
    }
}

/// Reads one value from input that arrives in chunks of any size.
///
/// ```
/// use resumable_json::ReadDriver;
/// use std::collections::BTreeMap;
///
/// let mut driver = ReadDriver::<BTreeMap<u32, String>>::new();
/// for chunk in [&b"{\"1\":\"a\",\"2"[..], b"\":\"b\"}"] {
///     driver.feed(chunk)?;
/// }
/// let map = driver.finish()?;
/// assert_eq!(map[&2], "b");
/// # Ok::<(), resumable_json::Error>(())
/// ```
pub struct ReadDriver<T> {
    state: ReadState,
    pending: Vec<u8>,
    value: Option<T>,
    graph: Option<Graph>,
}

impl<T: JsonType> ReadDriver<T> {
    pub fn new() -> Self {
        ReadDriver::with_options(&JsonOptions::default())
    }

    pub fn with_options(options: &JsonOptions) -> Self {
        ReadDriver {
            state: ReadState::with_options(options),
            pending: Vec::new(),
            value: None,
            graph: None,
        }
    }

    /// Processes as much of the input as possible. Bytes that end in the
    /// middle of a token are kept for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(chunk);
        self.step(false)
    }

    /// Whether the value has been read completely.
    pub fn is_complete(&self) -> bool {
        self.value.is_some()
    }

    /// Minimum number of bytes the next chunk must bring before the value can
    /// make progress.
    pub fn chars_needed(&self) -> usize {
        self.state.chars_needed()
    }

    fn step(&mut self, is_final_block: bool) -> Result<()> {
        let mut reader = JsonReader::new(&self.pending, is_final_block);
        if self.value.is_none() {
            if let Some(value) = tri!(try_read::<T>(&mut reader, &mut self.state)) {
                self.graph = self.state.take_completed_graph();
                self.value = Some(value);
            }
        }
        if self.value.is_some() {
            tri!(check_trailing(&mut reader));
        }
        let consumed = reader.consumed();
        self.pending.drain(..consumed);
        Ok(())
    }

    /// Ends the input and returns the value.
    pub fn finish(self) -> Result<T> {
        self.finish_with_graph().map(|(value, _)| value)
    }

    /// Ends the input and returns the value together with the members that
    /// were present, when the return graph was requested.
    pub fn finish_with_graph(mut self) -> Result<(T, Option<Graph>)> {
        tri!(self.step(true));
        match self.value {
            Some(value) => Ok((value, self.graph)),
            None => {
                let reader = JsonReader::new(&self.pending, true);
                Err(reader.error(ErrorCode::EofWhileParsingValue))
            }
        }
    }
}

impl<T: JsonType> Default for ReadDriver<T> {
    fn default() -> Self {
        ReadDriver::new()
    }
}

/// Writes one value as a sequence of chunks of a fixed size.
///
/// A chunk is only made larger than requested when a single token does not
/// fit in it.
pub struct WriteDriver<'v, T> {
    value: &'v T,
    state: WriteState,
    buffer: Vec<u8>,
    done: bool,
}

impl<'v, T: JsonType> WriteDriver<'v, T> {
    pub fn new(value: &'v T, chunk_size: usize) -> Self {
        WriteDriver::with_options(value, chunk_size, &JsonOptions::default())
    }

    pub fn with_options(value: &'v T, chunk_size: usize, options: &JsonOptions) -> Self {
        WriteDriver {
            value,
            state: WriteState::with_options(options),
            buffer: vec![0; chunk_size.max(1)],
            done: false,
        }
    }

    /// The next chunk of output, or `None` once the value has been written.
    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let mut writer = JsonWriter::new(&mut self.buffer);
            let finished = tri!(try_write(&mut writer, &mut self.state, self.value));
            let written = writer.written();
            if finished {
                self.done = true;
            }
            if finished || written > 0 {
                return Ok(Some(&self.buffer[..written]));
            }
            let needed = self.state.size_needed();
            tracing::trace!(needed, "growing output chunk");
            self.buffer.resize(needed, 0);
        }
    }
}

fn write_chunks<T, F>(value: &T, options: &JsonOptions, mut sink: F) -> Result<()>
where
    T: JsonType,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut driver = WriteDriver::with_options(value, options.get_buffer_size(), options);
    while let Some(chunk) = tri!(driver.next_chunk()) {
        tri!(sink(chunk));
    }
    Ok(())
}

/// Deserialize an instance of type `T` from bytes of JSON text.
pub fn from_slice<T: JsonType>(v: &[u8]) -> Result<T> {
    from_slice_with(v, &JsonOptions::default())
}

pub fn from_slice_with<T: JsonType>(v: &[u8], options: &JsonOptions) -> Result<T> {
    from_slice_with_graph(v, options).map(|(value, _)| value)
}

/// Like [`from_slice_with`], also returning the member graph when
/// [`JsonOptions::include_return_graph`] is set.
pub fn from_slice_with_graph<T: JsonType>(v: &[u8], options: &JsonOptions) -> Result<(T, Option<Graph>)> {
    let mut state = ReadState::with_options(options);
    let mut reader = JsonReader::new(v, true);
    match tri!(try_read::<T>(&mut reader, &mut state)) {
        Some(value) => {
            tri!(check_trailing(&mut reader));
            Ok((value, state.take_completed_graph()))
        }
        None => Err(reader.error(ErrorCode::EofWhileParsingValue)),
    }
}

/// Deserialize an instance of type `T` from a string of JSON text.
pub fn from_str<T: JsonType>(s: &str) -> Result<T> {
    from_slice(s.as_bytes())
}

pub fn from_str_with<T: JsonType>(s: &str, options: &JsonOptions) -> Result<T> {
    from_slice_with(s.as_bytes(), options)
}

/// Deserialize an instance of type `T` from an IO stream of JSON, reading it
/// in chunks of the configured buffer size.
pub fn from_reader<R: io::Read, T: JsonType>(reader: R) -> Result<T> {
    from_reader_with(reader, &JsonOptions::default())
}

pub fn from_reader_with<R: io::Read, T: JsonType>(mut reader: R, options: &JsonOptions) -> Result<T> {
    let mut driver = ReadDriver::<T>::with_options(options);
    let mut buffer = vec![0; options.get_buffer_size()];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => return driver.finish(),
            Ok(n) => tri!(driver.feed(&buffer[..n])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(Error::io(err)),
        }
    }
}

/// Serialize the given value as a byte vector of JSON.
pub fn to_vec<T: JsonType>(value: &T) -> Result<Vec<u8>> {
    to_vec_with(value, &JsonOptions::default())
}

pub fn to_vec_with<T: JsonType>(value: &T, options: &JsonOptions) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    tri!(write_chunks(value, options, |chunk| {
        out.extend_from_slice(chunk);
        Ok(())
    }));
    Ok(out)
}

/// Serialize the given value as a String of JSON.
pub fn to_string<T: JsonType>(value: &T) -> Result<String> {
    let vec = tri!(to_vec(value));
    // The writer only ever emits UTF-8.
    String::from_utf8(vec).map_err(|err| Error::io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

/// Serialize the given value as JSON into the IO stream, one chunk of the
/// configured buffer size at a time.
pub fn to_writer<W: io::Write, T: JsonType>(writer: W, value: &T) -> Result<()> {
    to_writer_with(writer, value, &JsonOptions::default())
}

pub fn to_writer_with<W: io::Write, T: JsonType>(mut writer: W, value: &T, options: &JsonOptions) -> Result<()> {
    write_chunks(value, options, |chunk| writer.write_all(chunk).map_err(Error::io))
}

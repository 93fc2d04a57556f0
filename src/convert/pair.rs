use super::{enter_container, ChildConverter, Enter, JsonType};
use crate::drain::DrainState;
use crate::error::{Error, ErrorCode, Result};
use crate::read::JsonReader;
use crate::state::{ReadContinuation, ReadFrame, ReadState, WriteContinuation, WriteFrame, WriteState};
use crate::write::{JsonName, JsonWriter};
use serde::de::Error as _;

/// Reads and writes one dictionary entry as `{"Key":..,"Value":..}`.
///
/// Used for dictionaries whose keys cannot be property names. The two members
/// may come in either order and unknown members are skipped; both must be
/// present.
pub struct PairConverter<K, V> {
    key_name: JsonName,
    value_name: JsonName,
    key: ChildConverter<(K, V), K>,
    value: ChildConverter<(K, V), V>,
}

enum Field {
    None,
    Key,
    Value,
    Skip(DrainState),
}

struct PairProgress<K, V> {
    key: Option<K>,
    value: Option<V>,
    entries: usize,
    field: Field,
}

fn suspend_write(state: &mut WriteState, mut frame: WriteFrame, index: usize) -> Result<bool> {
    frame.continuation = WriteContinuation::Enumerator(index);
    state.suspend(frame);
    Ok(false)
}

impl<K: JsonType, V: JsonType> PairConverter<K, V> {
    pub fn setup() -> Self {
        PairConverter {
            key_name: JsonName::new("Key"),
            value_name: JsonName::new("Value"),
            key: ChildConverter::new(),
            value: ChildConverter::new(),
        }
    }

    fn suspend_read(
        state: &mut ReadState,
        mut frame: ReadFrame,
        progress: PairProgress<K, V>,
    ) -> Result<Option<Option<(K, V)>>> {
        frame.continuation = ReadContinuation::Container(Box::new(progress));
        state.suspend(frame);
        Ok(None)
    }

    /// Reads one pair object. `Ok(None)` means more input is needed;
    /// `Ok(Some(None))` means the entry was `null` or a skipped mismatch and
    /// contributes nothing.
    pub fn try_read_pair(
        &self,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
    ) -> Result<Option<Option<(K, V)>>> {
        let (mut frame, mut progress) =
            match tri!(enter_container(reader, state, b'{', "a key/value pair")) {
                Enter::Opened(frame) => {
                    let progress = PairProgress {
                        key: None,
                        value: None,
                        entries: 0,
                        field: Field::None,
                    };
                    (frame, progress)
                }
                Enter::Resumed(mut frame) => {
                    let progress = tri!(frame.continuation.take_container::<PairProgress<K, V>>());
                    (frame, progress)
                }
                Enter::Default => return Ok(Some(None)),
                Enter::Suspended => return Ok(None),
            };
        frame.has_created = true;

        loop {
            if !frame.has_read_property {
                match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                    None => return Self::suspend_read(state, frame, progress),
                    Some(b'"') => {
                        let field = match tri!(reader.try_read_str()) {
                            Some("Key") => Field::Key,
                            Some("Value") => Field::Value,
                            Some(_) => Field::Skip(DrainState::new()),
                            None => return Self::suspend_read(state, frame, progress),
                        };
                        progress.field = field;
                    }
                    Some(b'}') if progress.entries == 0 => break,
                    Some(b'}') => return Err(reader.error(ErrorCode::TrailingComma)),
                    Some(_) => return Err(reader.error(ErrorCode::KeyMustBeAString)),
                }
                frame.has_read_property = true;
            }

            if !frame.has_read_separator {
                match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                    None => return Self::suspend_read(state, frame, progress),
                    Some(b':') => frame.has_read_separator = true,
                    Some(_) => return Err(reader.error(ErrorCode::ExpectedColon)),
                }
            }

            if !frame.has_read_value {
                let done = match progress.field {
                    Field::Key => match tri!(state.read_nested(reader, self.key.get())) {
                        Some(key) => {
                            progress.key = Some(key);
                            true
                        }
                        None => false,
                    },
                    Field::Value => match tri!(state.read_nested(reader, self.value.get())) {
                        Some(value) => {
                            progress.value = Some(value);
                            true
                        }
                        None => false,
                    },
                    Field::Skip(ref mut drain) => tri!(drain.drain(reader)),
                    Field::None => return Err(Error::config(ErrorCode::ForeignState)),
                };
                if !done {
                    return Self::suspend_read(state, frame, progress);
                }
                progress.field = Field::None;
                progress.entries += 1;
                frame.has_read_value = true;
            }

            match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                None => return Self::suspend_read(state, frame, progress),
                Some(b',') => frame.next_entry(),
                Some(b'}') => break,
                Some(_) => return Err(reader.error(ErrorCode::ExpectedObjectCommaOrEnd)),
            }
        }

        state.end_frame();
        match (progress.key, progress.value) {
            (Some(key), Some(value)) => Ok(Some(Some((key, value)))),
            (None, _) => Err(Error::missing_field("Key").fix_position(|code| reader.error(code))),
            (_, None) => Err(Error::missing_field("Value").fix_position(|code| reader.error(code))),
        }
    }

    /// Writes one pair object.
    pub fn try_write_pair(
        &self,
        writer: &mut JsonWriter<'_>,
        state: &mut WriteState,
        key: &K,
        value: &V,
    ) -> Result<bool> {
        let mut frame = state.take_frame();
        if !frame.enumerator_in_progress {
            if !writer.try_write_open_brace() {
                state.end_frame();
                return Ok(false);
            }
            frame.enumerator_in_progress = true;
        }

        let mut index = frame.enumerator();
        while index < 2 {
            if frame.has_written_first && !frame.has_written_separator {
                if !writer.try_write_comma() {
                    return suspend_write(state, frame, index);
                }
                frame.has_written_separator = true;
            }
            if !frame.has_written_property_name {
                let name = if index == 0 {
                    &self.key_name
                } else {
                    &self.value_name
                };
                if !writer.try_write_name(name) {
                    return suspend_write(state, frame, index);
                }
                frame.has_written_property_name = true;
            }
            let done = if index == 0 {
                tri!(state.write_nested(writer, self.key.get(), key))
            } else {
                tri!(state.write_nested(writer, self.value.get(), value))
            };
            if !done {
                return suspend_write(state, frame, index);
            }
            frame.next_entry();
            index += 1;
        }

        if !writer.try_write_close_brace() {
            return suspend_write(state, frame, index);
        }
        state.end_frame();
        Ok(true)
    }
}

use super::{enter_container, ChildConverter, Converter, Enter, JsonType};
use crate::classify::TypeDetail;
use crate::error::{ErrorCode, Result};
use crate::read::JsonReader;
use crate::state::{ReadContinuation, ReadFrame, ReadState, WriteContinuation, WriteFrame, WriteState};
use crate::write::JsonWriter;

/// Converter for `Vec<T>`, written as a JSON array.
pub struct ArrayConverter<T> {
    element: ChildConverter<Vec<T>, T>,
}

impl<T: JsonType> ArrayConverter<T> {
    pub fn setup() -> Self {
        ArrayConverter {
            element: ChildConverter::new(),
        }
    }
}

fn suspend_read<T: Send + 'static>(
    state: &mut ReadState,
    mut frame: ReadFrame,
    items: Vec<T>,
) -> Result<Option<Vec<T>>> {
    frame.continuation = ReadContinuation::Container(Box::new(items));
    state.suspend(frame);
    Ok(None)
}

fn suspend_write(state: &mut WriteState, mut frame: WriteFrame, index: usize) -> Result<bool> {
    frame.continuation = WriteContinuation::Enumerator(index);
    state.suspend(frame);
    Ok(false)
}

impl<T: JsonType> Converter<Vec<T>> for ArrayConverter<T> {
    fn try_read_value(
        &self,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
    ) -> Result<Option<Vec<T>>> {
        let (mut frame, mut items) = match tri!(enter_container(reader, state, b'[', "a sequence")) {
            Enter::Opened(frame) => (frame, Vec::new()),
            Enter::Resumed(mut frame) => {
                let items = tri!(frame.continuation.take_container::<Vec<T>>());
                (frame, items)
            }
            Enter::Default => return Ok(Some(Vec::new())),
            Enter::Suspended => return Ok(None),
        };
        frame.has_created = true;

        loop {
            if !frame.has_read_value {
                if !frame.has_read_property {
                    match tri!(reader.next_token(ErrorCode::EofWhileParsingList)) {
                        None => return suspend_read(state, frame, items),
                        Some(b']') if items.is_empty() => break,
                        Some(b']') => return Err(reader.error(ErrorCode::TrailingComma)),
                        Some(_) => reader.back_one(),
                    }
                    frame.has_read_property = true;
                }
                match tri!(state.read_nested(reader, self.element.get())) {
                    Some(item) => items.push(item),
                    None => return suspend_read(state, frame, items),
                }
                frame.has_read_value = true;
            }

            match tri!(reader.next_token(ErrorCode::EofWhileParsingList)) {
                None => return suspend_read(state, frame, items),
                Some(b',') => frame.next_entry(),
                Some(b']') => break,
                Some(_) => return Err(reader.error(ErrorCode::ExpectedListCommaOrEnd)),
            }
        }

        state.end_frame();
        Ok(Some(items))
    }

    fn try_write_value(
        &self,
        writer: &mut JsonWriter<'_>,
        state: &mut WriteState,
        value: &Vec<T>,
    ) -> Result<bool> {
        let mut frame = state.take_frame();
        if !frame.enumerator_in_progress {
            let opened = if value.is_empty() {
                writer.try_write_empty_bracket()
            } else {
                writer.try_write_open_bracket()
            };
            if !opened || value.is_empty() {
                state.end_frame();
                return Ok(opened);
            }
            frame.enumerator_in_progress = true;
        }

        let mut index = frame.enumerator();
        while let Some(item) = value.get(index) {
            if frame.has_written_first && !frame.has_written_separator {
                if !writer.try_write_comma() {
                    return suspend_write(state, frame, index);
                }
                frame.has_written_separator = true;
            }
            if !tri!(state.write_nested(writer, self.element.get(), item)) {
                return suspend_write(state, frame, index);
            }
            frame.next_entry();
            index += 1;
        }

        if !writer.try_write_close_bracket() {
            return suspend_write(state, frame, index);
        }
        state.end_frame();
        Ok(true)
    }
}

impl<T: JsonType> JsonType for Vec<T> {
    fn type_detail() -> TypeDetail {
        TypeDetail::array::<Self, T>()
    }

    fn create_converter() -> Box<dyn Converter<Self>> {
        Box::new(ArrayConverter::<T>::setup())
    }
}

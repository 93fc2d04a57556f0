use super::{enter_container, ChildConverter, Converter, Enter, JsonType};
use crate::drain::DrainState;
use crate::error::{Error, ErrorCode, Result};
use crate::graph::Graph;
use crate::read::JsonReader;
use crate::state::{ReadContinuation, ReadFrame, ReadState, WriteContinuation, WriteFrame, WriteState};
use crate::write::{JsonName, JsonWriter};
use std::collections::HashMap;

/// One member of an object: its name, how to reach it, and the converter for
/// its value.
trait MemberAccess<T>: Send + Sync {
    fn name(&self) -> &JsonName;

    fn try_read(&self, reader: &mut JsonReader<'_>, state: &mut ReadState, target: &mut T)
        -> Result<bool>;

    fn try_write(&self, writer: &mut JsonWriter<'_>, state: &mut WriteState, source: &T)
        -> Result<bool>;
}

struct Member<T, V> {
    name: JsonName,
    get: fn(&T) -> &V,
    set: fn(&mut T, V),
    converter: ChildConverter<T, V>,
}

impl<T: Send + 'static, V: JsonType> MemberAccess<T> for Member<T, V> {
    fn name(&self) -> &JsonName {
        &self.name
    }

    fn try_read(
        &self,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
        target: &mut T,
    ) -> Result<bool> {
        match tri!(state.read_nested(reader, self.converter.get())) {
            Some(value) => {
                (self.set)(target, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn try_write(
        &self,
        writer: &mut JsonWriter<'_>,
        state: &mut WriteState,
        source: &T,
    ) -> Result<bool> {
        state.write_nested(writer, self.converter.get(), (self.get)(source))
    }
}

/// The property list of an object type: a factory for the empty value and a
/// getter and setter per member, in the order members are written.
pub struct ObjectDetail<T> {
    factory: fn() -> T,
    members: Vec<Box<dyn MemberAccess<T>>>,
}

impl<T: Send + 'static> ObjectDetail<T> {
    pub fn new(factory: fn() -> T) -> Self {
        ObjectDetail {
            factory,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn member<V: JsonType>(mut self, name: &str, get: fn(&T) -> &V, set: fn(&mut T, V)) -> Self {
        self.members.push(Box::new(Member {
            name: JsonName::new(name),
            get,
            set,
            converter: ChildConverter::new(),
        }));
        self
    }
}

/// Converter for a struct described by an [`ObjectDetail`].
///
/// Members may appear in any order; unknown members are skipped. When the
/// state asks for a return graph, the names of the members that were present
/// are recorded and handed to the parent.
pub struct ObjectConverter<T> {
    detail: ObjectDetail<T>,
    index: HashMap<Box<str>, usize>,
}

enum Pending {
    None,
    Member(usize),
    Skip(DrainState),
}

struct ObjectProgress<T> {
    value: T,
    entries: usize,
    pending: Pending,
    graph: Option<Graph>,
}

impl<T: Send + 'static> ObjectConverter<T> {
    pub fn setup(detail: ObjectDetail<T>) -> Self {
        let index = detail
            .members
            .iter()
            .enumerate()
            .map(|(i, member)| (Box::from(member.name().as_str()), i))
            .collect();
        ObjectConverter { detail, index }
    }

    fn suspend_read(
        &self,
        state: &mut ReadState,
        mut frame: ReadFrame,
        progress: ObjectProgress<T>,
    ) -> Result<Option<T>> {
        frame.continuation = ReadContinuation::Container(Box::new(progress));
        state.suspend(frame);
        Ok(None)
    }
}

fn suspend_write(state: &mut WriteState, mut frame: WriteFrame, index: usize) -> Result<bool> {
    frame.continuation = WriteContinuation::Enumerator(index);
    state.suspend(frame);
    Ok(false)
}

impl<T: Send + 'static> Converter<T> for ObjectConverter<T> {
    fn try_read_value(&self, reader: &mut JsonReader<'_>, state: &mut ReadState) -> Result<Option<T>> {
        let (mut frame, mut progress) = match tri!(enter_container(reader, state, b'{', "an object")) {
            Enter::Opened(frame) => {
                let progress = ObjectProgress {
                    value: (self.detail.factory)(),
                    entries: 0,
                    pending: Pending::None,
                    graph: state.include_return_graph().then(Graph::new),
                };
                (frame, progress)
            }
            Enter::Resumed(mut frame) => {
                let progress = tri!(frame.continuation.take_container::<ObjectProgress<T>>());
                (frame, progress)
            }
            Enter::Default => return Ok(Some((self.detail.factory)())),
            Enter::Suspended => return Ok(None),
        };
        frame.has_created = true;

        loop {
            if !frame.has_read_property {
                match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                    None => return self.suspend_read(state, frame, progress),
                    Some(b'"') => {
                        let pending = match tri!(reader.try_read_str()) {
                            Some(name) => match self.index.get(name) {
                                Some(&i) => Pending::Member(i),
                                None => Pending::Skip(DrainState::new()),
                            },
                            None => return self.suspend_read(state, frame, progress),
                        };
                        progress.pending = pending;
                    }
                    Some(b'}') if progress.entries == 0 => break,
                    Some(b'}') => return Err(reader.error(ErrorCode::TrailingComma)),
                    Some(_) => return Err(reader.error(ErrorCode::KeyMustBeAString)),
                }
                frame.has_read_property = true;
            }

            if !frame.has_read_separator {
                match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                    None => return self.suspend_read(state, frame, progress),
                    Some(b':') => frame.has_read_separator = true,
                    Some(_) => return Err(reader.error(ErrorCode::ExpectedColon)),
                }
            }

            if !frame.has_read_value {
                let done = match progress.pending {
                    Pending::Member(i) => {
                        let member = &self.detail.members[i];
                        let done = tri!(member.try_read(reader, state, &mut progress.value));
                        if done {
                            if let Some(graph) = progress.graph.as_mut() {
                                let name = member.name().as_str();
                                match state.take_completed_graph() {
                                    Some(child) => graph.add_child(name, child),
                                    None => graph.add_member(name),
                                }
                            }
                        }
                        done
                    }
                    Pending::Skip(ref mut drain) => tri!(drain.drain(reader)),
                    Pending::None => return Err(Error::config(ErrorCode::ForeignState)),
                };
                if !done {
                    return self.suspend_read(state, frame, progress);
                }
                progress.pending = Pending::None;
                progress.entries += 1;
                frame.has_read_value = true;
            }

            match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                None => return self.suspend_read(state, frame, progress),
                Some(b',') => frame.next_entry(),
                Some(b'}') => break,
                Some(_) => return Err(reader.error(ErrorCode::ExpectedObjectCommaOrEnd)),
            }
        }

        state.end_frame();
        if let Some(graph) = progress.graph {
            state.set_completed_graph(graph);
        }
        Ok(Some(progress.value))
    }

    fn try_write_value(&self, writer: &mut JsonWriter<'_>, state: &mut WriteState, value: &T) -> Result<bool> {
        let members = &self.detail.members;
        let mut frame = state.take_frame();
        if !frame.enumerator_in_progress {
            let opened = if members.is_empty() {
                writer.try_write_empty_brace()
            } else {
                writer.try_write_open_brace()
            };
            if !opened || members.is_empty() {
                state.end_frame();
                return Ok(opened);
            }
            frame.enumerator_in_progress = true;
        }

        let mut index = frame.enumerator();
        while let Some(member) = members.get(index) {
            if frame.has_written_first && !frame.has_written_separator {
                if !writer.try_write_comma() {
                    return suspend_write(state, frame, index);
                }
                frame.has_written_separator = true;
            }
            if !frame.has_written_property_name {
                if !writer.try_write_name(member.name()) {
                    return suspend_write(state, frame, index);
                }
                frame.has_written_property_name = true;
            }
            if !tri!(member.try_write(writer, state, value)) {
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

//! Dictionaries in all their forms.
//!
//! One converter handles every dictionary target. It decides at setup how
//! entries go on the wire: as the properties of a JSON object when the key
//! type has a property name form, or as an array of key/value pair objects
//! otherwise. The same suspend and resume discipline applies to both.

use super::{enter_container, ChildConverter, Converter, Enter, JsonType, PairConverter, PropertyName};
use crate::classify::{classify, DictionaryKind, Shape, TypeDetail};
use crate::error::{Error, ErrorCode, Result};
use crate::read::JsonReader;
use crate::state::{ReadContinuation, ReadFrame, ReadState, WriteContinuation, WriteFrame, WriteState};
use crate::write::JsonWriter;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

#[cfg(feature = "indexmap")]
use indexmap::IndexMap;

/// A map behind a trait object, for targets typed as `Box<dyn Dictionary<K, V>>`
/// or `Arc<dyn Dictionary<K, V>>`.
pub trait Dictionary<K, V>: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &K) -> Option<&V>;

    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Entries in a stable order for as long as the map is not modified.
    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_>;
}

impl<K, V, S> Dictionary<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn get(&self, key: &K) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        HashMap::insert(self, key, value)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

impl<K, V> Dictionary<K, V> for BTreeMap<K, V>
where
    K: Ord + Send + Sync,
    V: Send + Sync,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

#[cfg(feature = "indexmap")]
impl<K, V, S> Dictionary<K, V> for IndexMap<K, V, S>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn len(&self) -> usize {
        IndexMap::len(self)
    }

    fn get(&self, key: &K) -> Option<&V> {
        IndexMap::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        IndexMap::insert(self, key, value)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

/// A type the dictionary converter can build and walk.
pub trait DictionaryTarget: JsonType {
    type Key: JsonType;
    type Value: JsonType;
    /// What entries are inserted into while reading.
    type Builder: Send + 'static;

    const KIND: DictionaryKind;

    fn create() -> Self::Builder;

    fn insert(builder: &mut Self::Builder, key: Self::Key, value: Self::Value);

    fn finish(builder: Self::Builder) -> Self;

    fn entry_count(&self) -> usize;

    fn entries(&self) -> Box<dyn Iterator<Item = (&Self::Key, &Self::Value)> + '_>;
}

macro_rules! concrete_target {
    ($map:ident<K, V $(, $hasher:ident)?> where K: $($bound:path),+) => {
        impl<K, V $(, $hasher)?> DictionaryTarget for $map<K, V $(, $hasher)?>
        where
            K: JsonType + Sync $(+ $bound)+,
            V: JsonType + Sync,
            $($hasher: BuildHasher + Default + Send + Sync + 'static,)?
        {
            type Key = K;
            type Value = V;
            type Builder = Self;

            const KIND: DictionaryKind = DictionaryKind::Concrete;

            fn create() -> Self {
                Self::default()
            }

            fn insert(builder: &mut Self, key: K, value: V) {
                builder.insert(key, value);
            }

            fn finish(builder: Self) -> Self {
                builder
            }

            fn entry_count(&self) -> usize {
                self.len()
            }

            fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
                Box::new(self.iter())
            }
        }

        impl<K, V $(, $hasher)?> JsonType for $map<K, V $(, $hasher)?>
        where
            K: JsonType + Sync $(+ $bound)+,
            V: JsonType + Sync,
            $($hasher: BuildHasher + Default + Send + Sync + 'static,)?
        {
            fn type_detail() -> TypeDetail {
                TypeDetail::dictionary::<Self, K, V>(DictionaryKind::Concrete)
            }

            fn create_converter() -> Box<dyn Converter<Self>> {
                Box::new(DictionaryConverter::<Self>::setup())
            }
        }
    };
}

concrete_target!(HashMap<K, V, S> where K: Eq, Hash);
concrete_target!(BTreeMap<K, V> where K: Ord);
#[cfg(feature = "indexmap")]
concrete_target!(IndexMap<K, V, S> where K: Eq, Hash);

impl<K, V> DictionaryTarget for Box<dyn Dictionary<K, V>>
where
    K: JsonType + Eq + Hash + Sync,
    V: JsonType + Sync,
{
    type Key = K;
    type Value = V;
    type Builder = HashMap<K, V>;

    const KIND: DictionaryKind = DictionaryKind::Interface;

    fn create() -> HashMap<K, V> {
        HashMap::new()
    }

    fn insert(builder: &mut HashMap<K, V>, key: K, value: V) {
        builder.insert(key, value);
    }

    fn finish(builder: HashMap<K, V>) -> Self {
        Box::new(builder)
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Dictionary::entries(&**self)
    }
}

impl<K, V> JsonType for Box<dyn Dictionary<K, V>>
where
    K: JsonType + Eq + Hash + Sync,
    V: JsonType + Sync,
{
    fn type_detail() -> TypeDetail {
        TypeDetail::dictionary::<Self, K, V>(DictionaryKind::Interface)
    }

    fn create_converter() -> Box<dyn Converter<Self>> {
        Box::new(DictionaryConverter::<Self>::setup())
    }
}

impl<K, V> DictionaryTarget for Arc<dyn Dictionary<K, V>>
where
    K: JsonType + Eq + Hash + Sync,
    V: JsonType + Sync,
{
    type Key = K;
    type Value = V;
    type Builder = HashMap<K, V>;

    const KIND: DictionaryKind = DictionaryKind::ReadOnlyInterface;

    fn create() -> HashMap<K, V> {
        HashMap::new()
    }

    fn insert(builder: &mut HashMap<K, V>, key: K, value: V) {
        builder.insert(key, value);
    }

    fn finish(builder: HashMap<K, V>) -> Self {
        Arc::new(builder)
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Dictionary::entries(&**self)
    }
}

impl<K, V> JsonType for Arc<dyn Dictionary<K, V>>
where
    K: JsonType + Eq + Hash + Sync,
    V: JsonType + Sync,
{
    fn type_detail() -> TypeDetail {
        TypeDetail::dictionary::<Self, K, V>(DictionaryKind::ReadOnlyInterface)
    }

    fn create_converter() -> Box<dyn Converter<Self>> {
        Box::new(DictionaryConverter::<Self>::setup())
    }
}

/// The dictionary under construction and the key waiting for its value.
pub struct DictionaryAccessor<D: DictionaryTarget> {
    builder: D::Builder,
    key: Option<D::Key>,
    entries: usize,
}

impl<D: DictionaryTarget> DictionaryAccessor<D> {
    pub fn new() -> Self {
        DictionaryAccessor {
            builder: D::create(),
            key: None,
            entries: 0,
        }
    }

    pub fn set_key(&mut self, key: D::Key) {
        self.key = Some(key);
    }

    /// Inserts `value` under the pending key.
    pub fn add(&mut self, value: D::Value) -> Result<()> {
        match self.key.take() {
            Some(key) => {
                D::insert(&mut self.builder, key, value);
                Ok(())
            }
            None => Err(Error::config(ErrorCode::ForeignState)),
        }
    }

    /// Marks the current entry as fully read, whether or not it was inserted.
    pub fn end_entry(&mut self) {
        self.entries += 1;
    }

    /// Number of entries read so far, including skipped ones.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn finish(self) -> D {
        D::finish(self.builder)
    }
}

impl<D: DictionaryTarget> Default for DictionaryAccessor<D> {
    fn default() -> Self {
        DictionaryAccessor::new()
    }
}

/// Outcome of the container prologue: keep reading entries, or return now.
enum Entered<D: DictionaryTarget> {
    Ready(ReadFrame, DictionaryAccessor<D>),
    Done(Option<D>),
}

enum Encoding<K, V> {
    /// `{"key":value,...}`
    Object(PropertyName<K>),
    /// `[{"Key":key,"Value":value},...]`
    PairArray(PairConverter<K, V>),
}

/// Converter for every [`DictionaryTarget`].
pub struct DictionaryConverter<D: DictionaryTarget> {
    detail: TypeDetail,
    encoding: Encoding<D::Key, D::Value>,
    value: ChildConverter<D, D::Value>,
}

impl<D: DictionaryTarget> DictionaryConverter<D> {
    pub fn setup() -> Self {
        let detail = D::type_detail();
        let encoding = match (classify(&detail), D::Key::property_name_codec()) {
            (Shape::DictionaryScalarKey, Some(codec)) => Encoding::Object(codec),
            _ => Encoding::PairArray(PairConverter::setup()),
        };
        DictionaryConverter {
            detail,
            encoding,
            value: ChildConverter::new(),
        }
    }

    pub fn detail(&self) -> &TypeDetail {
        &self.detail
    }

    /// Whether entries are written as the properties of a JSON object.
    pub fn can_write_as_properties(&self) -> bool {
        matches!(self.encoding, Encoding::Object(_))
    }

    fn suspend_read(
        state: &mut ReadState,
        mut frame: ReadFrame,
        accessor: DictionaryAccessor<D>,
    ) -> Result<Option<D>> {
        frame.continuation = ReadContinuation::Accessor(Box::new(accessor));
        state.suspend(frame);
        Ok(None)
    }

    fn enter(
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
        open: u8,
        expected: &'static str,
    ) -> Result<Entered<D>> {
        Ok(match tri!(enter_container(reader, state, open, expected)) {
            Enter::Opened(frame) => Entered::Ready(frame, DictionaryAccessor::new()),
            Enter::Resumed(mut frame) => {
                let accessor = tri!(frame.continuation.take_accessor::<DictionaryAccessor<D>>());
                Entered::Ready(frame, accessor)
            }
            Enter::Default => Entered::Done(Some(DictionaryAccessor::<D>::new().finish())),
            Enter::Suspended => Entered::Done(None),
        })
    }

    fn read_object(
        &self,
        codec: &PropertyName<D::Key>,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
    ) -> Result<Option<D>> {
        let (mut frame, mut accessor) = match tri!(Self::enter(reader, state, b'{', "a map")) {
            Entered::Ready(frame, accessor) => (frame, accessor),
            Entered::Done(result) => return Ok(result),
        };
        frame.has_created = true;

        loop {
            if !frame.has_read_property {
                match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                    None => return Self::suspend_read(state, frame, accessor),
                    Some(b'"') => {
                        let key = match tri!(reader.try_read_str()) {
                            Some(name) => (codec.parse)(name),
                            None => return Self::suspend_read(state, frame, accessor),
                        };
                        accessor.set_key(tri!(key.map_err(|err| err.fix_position(|code| reader.error(code)))));
                    }
                    Some(b'}') if accessor.entries() == 0 => break,
                    Some(b'}') => return Err(reader.error(ErrorCode::TrailingComma)),
                    Some(_) => return Err(reader.error(ErrorCode::KeyMustBeAString)),
                }
                frame.has_read_property = true;
            }

            if !frame.has_read_separator {
                match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                    None => return Self::suspend_read(state, frame, accessor),
                    Some(b':') => frame.has_read_separator = true,
                    Some(_) => return Err(reader.error(ErrorCode::ExpectedColon)),
                }
            }

            if !frame.has_read_value {
                match tri!(state.read_nested(reader, self.value.get())) {
                    Some(value) => tri!(accessor.add(value)),
                    None => return Self::suspend_read(state, frame, accessor),
                }
                accessor.end_entry();
                frame.has_read_value = true;
            }

            match tri!(reader.next_token(ErrorCode::EofWhileParsingObject)) {
                None => return Self::suspend_read(state, frame, accessor),
                Some(b',') => frame.next_entry(),
                Some(b'}') => break,
                Some(_) => return Err(reader.error(ErrorCode::ExpectedObjectCommaOrEnd)),
            }
        }

        state.end_frame();
        Ok(Some(accessor.finish()))
    }

    fn read_pairs(
        &self,
        pair: &PairConverter<D::Key, D::Value>,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
    ) -> Result<Option<D>> {
        let (mut frame, mut accessor) =
            match tri!(Self::enter(reader, state, b'[', "a sequence of key/value pairs")) {
                Entered::Ready(frame, accessor) => (frame, accessor),
                Entered::Done(result) => return Ok(result),
            };
        frame.has_created = true;

        loop {
            if !frame.has_read_value {
                if !frame.has_read_property {
                    match tri!(reader.next_token(ErrorCode::EofWhileParsingList)) {
                        None => return Self::suspend_read(state, frame, accessor),
                        Some(b']') if accessor.entries() == 0 => break,
                        Some(b']') => return Err(reader.error(ErrorCode::TrailingComma)),
                        Some(_) => reader.back_one(),
                    }
                    frame.has_read_property = true;
                }
                match tri!(state.nested(reader, |reader, state| pair.try_read_pair(reader, state))) {
                    Some(Some((key, value))) => {
                        accessor.set_key(key);
                        tri!(accessor.add(value));
                    }
                    Some(None) => {}
                    None => return Self::suspend_read(state, frame, accessor),
                }
                accessor.end_entry();
                frame.has_read_value = true;
            }

            match tri!(reader.next_token(ErrorCode::EofWhileParsingList)) {
                None => return Self::suspend_read(state, frame, accessor),
                Some(b',') => frame.next_entry(),
                Some(b']') => break,
                Some(_) => return Err(reader.error(ErrorCode::ExpectedListCommaOrEnd)),
            }
        }

        state.end_frame();
        Ok(Some(accessor.finish()))
    }

    fn write_entries(
        &self,
        writer: &mut JsonWriter<'_>,
        state: &mut WriteState,
        value: &D,
    ) -> Result<bool> {
        let as_object = self.can_write_as_properties();
        let mut frame = state.take_frame();
        if !frame.enumerator_in_progress {
            let empty = value.entry_count() == 0;
            let opened = match (empty, as_object) {
                (true, true) => writer.try_write_empty_brace(),
                (true, false) => writer.try_write_empty_bracket(),
                (false, true) => writer.try_write_open_brace(),
                (false, false) => writer.try_write_open_bracket(),
            };
            if !opened || empty {
                state.end_frame();
                return Ok(opened);
            }
            frame.enumerator_in_progress = true;
        }

        let mut index = frame.enumerator();
        for (key, item) in value.entries().skip(index) {
            if frame.has_written_first && !frame.has_written_separator {
                if !writer.try_write_comma() {
                    return suspend_write(state, frame, index);
                }
                frame.has_written_separator = true;
            }
            let done = match &self.encoding {
                Encoding::Object(codec) => {
                    if !frame.has_written_property_name {
                        if !writer.try_write_property_name(&(codec.format)(key)) {
                            return suspend_write(state, frame, index);
                        }
                        frame.has_written_property_name = true;
                    }
                    tri!(state.write_nested(writer, self.value.get(), item))
                }
                Encoding::PairArray(pair) => tri!(state.nested(writer, |writer, state| {
                    pair.try_write_pair(writer, state, key, item)
                })),
            };
            if !done {
                return suspend_write(state, frame, index);
            }
            frame.next_entry();
            index += 1;
        }

        let closed = if as_object {
            writer.try_write_close_brace()
        } else {
            writer.try_write_close_bracket()
        };
        if !closed {
            return suspend_write(state, frame, index);
        }
        state.end_frame();
        Ok(true)
    }
}

fn suspend_write(state: &mut WriteState, mut frame: WriteFrame, index: usize) -> Result<bool> {
    frame.continuation = WriteContinuation::Enumerator(index);
    state.suspend(frame);
    Ok(false)
}

impl<D: DictionaryTarget> Converter<D> for DictionaryConverter<D> {
    fn try_read_value(&self, reader: &mut JsonReader<'_>, state: &mut ReadState) -> Result<Option<D>> {
        match &self.encoding {
            Encoding::Object(codec) => self.read_object(codec, reader, state),
            Encoding::PairArray(pair) => self.read_pairs(pair, reader, state),
        }
    }

    fn try_write_value(&self, writer: &mut JsonWriter<'_>, state: &mut WriteState, value: &D) -> Result<bool> {
        self.write_entries(writer, state, value)
    }
}

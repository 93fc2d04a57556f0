//! Converters: the unit of work for reading and writing one value.
//!
//! A converter is created once per (parent type, value type) pair by the
//! [registry](crate::ConverterRegistry) and never changes afterwards. All the
//! progress of an operation lives in the [`ReadState`] or [`WriteState`] passed
//! to it, so one converter can serve any number of operations at once.

use crate::classify::TypeDetail;
use crate::drain::DrainState;
use crate::error::{Error, ErrorCode, Result};
use crate::read::JsonReader;
use crate::registry::ConverterRegistry;
use crate::state::{ReadContinuation, ReadFrame, ReadState, WriteState};
use crate::write::JsonWriter;
use core::fmt;
use core::marker::PhantomData;
use once_cell::sync::OnceCell;
use serde::de::{self, Error as _};
use std::borrow::Cow;
use std::sync::Arc;

mod array;
mod dictionary;
mod erased;
mod object;
mod option;
mod pair;
mod scalar;

pub use self::array::ArrayConverter;
pub use self::dictionary::{Dictionary, DictionaryAccessor, DictionaryConverter, DictionaryTarget};
pub use self::erased::{AnyDictionary, ErasedDictionaryConverter};
pub use self::object::{ObjectConverter, ObjectDetail};
pub use self::option::OptionConverter;
pub use self::pair::PairConverter;
pub use self::scalar::{CoreConverter, CoreValue};

/// Reads and writes values of one type, a token at a time.
///
/// Both methods may be called any number of times for the same value: when
/// the reader runs out of input or the writer out of room they record their
/// progress in the state and report that they are not finished, and the next
/// call with the same state continues from there.
pub trait Converter<T>: Send + Sync {
    /// Returns `Ok(None)` when more input is needed.
    fn try_read_value(&self, reader: &mut JsonReader<'_>, state: &mut ReadState)
        -> Result<Option<T>>;

    /// Returns `Ok(false)` when more output room is needed.
    fn try_write_value(
        &self,
        writer: &mut JsonWriter<'_>,
        state: &mut WriteState,
        value: &T,
    ) -> Result<bool>;
}

/// A type the engine knows how to convert.
///
/// Scalars implement it with [`json_core!`](crate::json_core), structs with
/// [`json_object!`](crate::json_object); sequences, options and dictionaries
/// are covered by the crate.
pub trait JsonType: Sized + Send + 'static {
    fn type_detail() -> TypeDetail;

    /// Builds the converter. Called at most once per (parent, type) pair.
    fn create_converter() -> Box<dyn Converter<Self>>;

    /// How a value of this type is turned into a property name and back, for
    /// types that can be dictionary keys written as JSON object properties.
    fn property_name_codec() -> Option<PropertyName<Self>> {
        None
    }
}

/// Conversion between a key and the property name it is written as.
pub struct PropertyName<T> {
    pub format: fn(&T) -> Cow<'_, str>,
    pub parse: fn(&str) -> Result<T>,
}

impl<T> Clone for PropertyName<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PropertyName<T> {}

impl<T> fmt::Debug for PropertyName<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PropertyName")
    }
}

/// The converter for a nested value, looked up in the registry the first time
/// it is needed.
///
/// Resolving lazily keeps converter setup free of registry access, which is
/// what lets a type contain itself.
pub struct ChildConverter<P, V> {
    cell: OnceCell<Arc<dyn Converter<V>>>,
    parent: PhantomData<fn() -> P>,
}

impl<P: 'static, V: JsonType> ChildConverter<P, V> {
    pub fn new() -> Self {
        ChildConverter {
            cell: OnceCell::new(),
            parent: PhantomData,
        }
    }

    pub fn get(&self) -> &dyn Converter<V> {
        &**self
            .cell
            .get_or_init(|| ConverterRegistry::global().converter::<P, V>())
    }
}

impl<P: 'static, V: JsonType> Default for ChildConverter<P, V> {
    fn default() -> Self {
        ChildConverter::new()
    }
}

/// Outcome of starting or resuming a container read.
pub(crate) enum Enter {
    /// The opening bracket was consumed; the container is to be created.
    Opened(ReadFrame),
    /// The container was created by an earlier call.
    Resumed(ReadFrame),
    /// `null`, or a mismatched value that was skipped: the result is the empty
    /// default and the frame is gone.
    Default,
    /// More input is needed.
    Suspended,
}

/// The common first step of every container converter: resume a skip in
/// progress, accept the opening bracket, `null`, or handle a shape mismatch
/// according to the state's policy.
pub(crate) fn enter_container(
    reader: &mut JsonReader<'_>,
    state: &mut ReadState,
    open: u8,
    expected: &'static str,
) -> Result<Enter> {
    let mut frame = state.take_frame();
    if let ReadContinuation::Drain(drain) = &mut frame.continuation {
        return if tri!(drain.drain(reader)) {
            state.end_frame();
            Ok(Enter::Default)
        } else {
            state.suspend(frame);
            Ok(Enter::Suspended)
        };
    }
    if frame.has_created {
        return Ok(Enter::Resumed(frame));
    }

    let ch = match tri!(reader.next_token(ErrorCode::EofWhileParsingValue)) {
        Some(ch) => ch,
        None => {
            state.end_frame();
            return Ok(Enter::Suspended);
        }
    };
    if ch == open {
        return Ok(Enter::Opened(frame));
    }
    reader.back_one();
    if ch == b'n' {
        return match tri!(reader.try_read_scalar()) {
            Some(_) => {
                state.end_frame();
                Ok(Enter::Default)
            }
            None => {
                state.end_frame();
                Ok(Enter::Suspended)
            }
        };
    }

    let unexpected = tri!(unexpected_start(reader, ch));
    if state.error_on_type_mismatch() {
        return Err(mismatch(reader, unexpected, expected));
    }
    let mut drain = DrainState::new();
    if tri!(drain.drain(reader)) {
        state.end_frame();
        Ok(Enter::Default)
    } else {
        frame.continuation = ReadContinuation::Drain(drain);
        state.suspend(frame);
        Ok(Enter::Suspended)
    }
}

/// Describes a value by its first byte.
pub(crate) fn unexpected_start(
    reader: &JsonReader<'_>,
    ch: u8,
) -> Result<de::Unexpected<'static>> {
    match ch {
        b'{' => Ok(de::Unexpected::Map),
        b'[' => Ok(de::Unexpected::Seq),
        b'"' => Ok(de::Unexpected::Other("string")),
        b'-' | b'0'..=b'9' => Ok(de::Unexpected::Other("number")),
        b't' | b'f' => Ok(de::Unexpected::Other("boolean")),
        b'n' => Ok(de::Unexpected::Unit),
        _ => Err(reader.error(ErrorCode::ExpectedSomeValue)),
    }
}

#[cold]
pub(crate) fn mismatch(
    reader: &JsonReader<'_>,
    unexpected: de::Unexpected,
    expected: &'static str,
) -> Error {
    Error::invalid_type(unexpected, &expected).fix_position(|code| reader.peek_error(code))
}

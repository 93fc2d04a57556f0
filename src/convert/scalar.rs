use super::{mismatch, unexpected_start, Converter};
use crate::classify::CoreType;
use crate::drain::DrainState;
use crate::error::{Error, ErrorCode, Result};
use crate::read::{JsonReader, Scalar};
use crate::state::{ReadContinuation, ReadState, WriteState};
use crate::write::JsonWriter;
use core::marker::PhantomData;
use serde::de::{self, Error as _};
use std::borrow::Cow;

/// A value written as one JSON token, with a textual form that can serve as a
/// property name.
///
/// Implement this for a fieldless enum (with [`CoreType::Enum`]) and pass the
/// type to [`json_core!`](crate::json_core) to use it as a value or a
/// dictionary key.
pub trait CoreValue: Default + Send + 'static {
    const CORE_TYPE: CoreType;

    /// Converts a complete token. `Ok(None)` means the token has the wrong
    /// shape for this type.
    fn from_scalar(scalar: Scalar<'_>) -> Result<Option<Self>>;

    /// Writes the value as one token, or nothing if it does not fit.
    fn try_write(&self, writer: &mut JsonWriter<'_>) -> bool;

    fn to_property_name(&self) -> Cow<'_, str>;

    fn from_property_name(name: &str) -> Result<Self>;
}

/// Converter for every [`CoreValue`].
pub struct CoreConverter<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T: CoreValue> CoreConverter<T> {
    pub fn setup() -> Self {
        CoreConverter {
            marker: PhantomData,
        }
    }

    fn resume_drain(&self, reader: &mut JsonReader<'_>, state: &mut ReadState) -> Result<Option<T>> {
        let mut frame = state.take_frame();
        let mut drain = match std::mem::take(&mut frame.continuation) {
            ReadContinuation::Drain(drain) => drain,
            _ => return Err(Error::config(ErrorCode::ForeignState)),
        };
        self.drain(reader, state, &mut drain, frame)
    }

    fn drain(
        &self,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
        drain: &mut DrainState,
        mut frame: crate::state::ReadFrame,
    ) -> Result<Option<T>> {
        if tri!(drain.drain(reader)) {
            state.end_frame();
            Ok(Some(T::default()))
        } else {
            frame.continuation = ReadContinuation::Drain(std::mem::take(drain));
            state.suspend(frame);
            Ok(None)
        }
    }
}

impl<T: CoreValue> Converter<T> for CoreConverter<T> {
    fn try_read_value(&self, reader: &mut JsonReader<'_>, state: &mut ReadState) -> Result<Option<T>> {
        if state.is_resuming() {
            // Scalars only keep a frame while skipping a container.
            return self.resume_drain(reader, state);
        }

        let ch = match tri!(reader.peek_token(ErrorCode::EofWhileParsingValue)) {
            Some(ch) => ch,
            None => return Ok(None),
        };
        if ch == b'{' || ch == b'[' {
            let unexpected = tri!(unexpected_start(reader, ch));
            if state.error_on_type_mismatch() {
                return Err(mismatch(reader, unexpected, T::CORE_TYPE.expecting()));
            }
            let frame = state.take_frame();
            return self.drain(reader, state, &mut DrainState::new(), frame);
        }

        let mismatched = match tri!(reader.try_read_scalar()) {
            None => return Ok(None),
            Some(scalar) => match T::from_scalar(scalar) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => Error::invalid_type(scalar.unexpected(), &T::CORE_TYPE.expecting()),
                Err(err) => return Err(err.fix_position(|code| reader.error(code))),
            },
        };
        if state.error_on_type_mismatch() {
            return Err(mismatched.fix_position(|code| reader.error(code)));
        }
        Ok(Some(T::default()))
    }

    fn try_write_value(&self, writer: &mut JsonWriter<'_>, _state: &mut WriteState, value: &T) -> Result<bool> {
        Ok(value.try_write(writer))
    }
}

#[cold]
fn number_out_of_range() -> Error {
    Error::unpositioned(ErrorCode::NumberOutOfRange)
}

fn is_integer(text: &str) -> bool {
    !text.contains(['.', 'e', 'E'])
}

macro_rules! core_integer {
    ($($ty:ident => $core:ident,)*) => {
        $(
            impl CoreValue for $ty {
                const CORE_TYPE: CoreType = CoreType::$core;

                fn from_scalar(scalar: Scalar<'_>) -> Result<Option<Self>> {
                    match scalar {
                        Scalar::Number(text) if is_integer(text) => match text.parse::<$ty>() {
                            Ok(value) => Ok(Some(value)),
                            Err(_) => Err(number_out_of_range()),
                        },
                        _ => Ok(None),
                    }
                }

                fn try_write(&self, writer: &mut JsonWriter<'_>) -> bool {
                    writer.try_write_integer(*self)
                }

                fn to_property_name(&self) -> Cow<'_, str> {
                    Cow::Owned(itoa::Buffer::new().format(*self).to_owned())
                }

                fn from_property_name(name: &str) -> Result<Self> {
                    name.parse::<$ty>().map_err(|_| {
                        Error::invalid_value(de::Unexpected::Str(name), &Self::CORE_TYPE.expecting())
                    })
                }
            }
        )*
    };
}

core_integer! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    isize => ISize,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    usize => USize,
}

macro_rules! core_float {
    ($($ty:ident => $core:ident, $write:ident;)*) => {
        $(
            impl CoreValue for $ty {
                const CORE_TYPE: CoreType = CoreType::$core;

                fn from_scalar(scalar: Scalar<'_>) -> Result<Option<Self>> {
                    match scalar {
                        Scalar::Number(text) => match text.parse::<$ty>() {
                            Ok(value) if value.is_finite() => Ok(Some(value)),
                            _ => Err(number_out_of_range()),
                        },
                        _ => Ok(None),
                    }
                }

                fn try_write(&self, writer: &mut JsonWriter<'_>) -> bool {
                    writer.$write(*self)
                }

                fn to_property_name(&self) -> Cow<'_, str> {
                    if self.is_finite() {
                        Cow::Owned(zmij::Buffer::new().format_finite(*self).to_owned())
                    } else {
                        Cow::Owned(self.to_string())
                    }
                }

                fn from_property_name(name: &str) -> Result<Self> {
                    name.parse::<$ty>().map_err(|_| {
                        Error::invalid_value(de::Unexpected::Str(name), &Self::CORE_TYPE.expecting())
                    })
                }
            }
        )*
    };
}

core_float! {
    f32 => Float32, try_write_f32;
    f64 => Float64, try_write_f64;
}

impl CoreValue for bool {
    const CORE_TYPE: CoreType = CoreType::Boolean;

    fn from_scalar(scalar: Scalar<'_>) -> Result<Option<Self>> {
        match scalar {
            Scalar::Bool(value) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    fn try_write(&self, writer: &mut JsonWriter<'_>) -> bool {
        writer.try_write_bool(*self)
    }

    fn to_property_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }

    fn from_property_name(name: &str) -> Result<Self> {
        match name {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::invalid_value(de::Unexpected::Str(name), &"a boolean")),
        }
    }
}

impl CoreValue for char {
    const CORE_TYPE: CoreType = CoreType::Char;

    fn from_scalar(scalar: Scalar<'_>) -> Result<Option<Self>> {
        match scalar {
            Scalar::String(s) => Self::from_property_name(s).map(Some),
            _ => Ok(None),
        }
    }

    fn try_write(&self, writer: &mut JsonWriter<'_>) -> bool {
        writer.try_write_string(self.encode_utf8(&mut [0; 4]))
    }

    fn to_property_name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn from_property_name(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::invalid_value(de::Unexpected::Str(name), &"a character")),
        }
    }
}

impl CoreValue for String {
    const CORE_TYPE: CoreType = CoreType::String;

    fn from_scalar(scalar: Scalar<'_>) -> Result<Option<Self>> {
        match scalar {
            Scalar::String(s) => Ok(Some(s.to_owned())),
            _ => Ok(None),
        }
    }

    fn try_write(&self, writer: &mut JsonWriter<'_>) -> bool {
        writer.try_write_string(self)
    }

    fn to_property_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn from_property_name(name: &str) -> Result<Self> {
        Ok(name.to_owned())
    }
}

json_core!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, String);

#[cfg(test)]
mod tests {
    use super::*;

    fn read<T: CoreValue>(input: &str, state: &mut ReadState) -> Result<Option<T>> {
        let mut reader = JsonReader::new(input.as_bytes(), true);
        CoreConverter::<T>::setup().try_read_value(&mut reader, state)
    }

    #[test]
    fn test_integer_range() {
        let mut state = ReadState::new();
        assert_eq!(read::<u8>("255", &mut state).unwrap(), Some(255));
        let err = read::<u8>("256", &mut state).unwrap_err();
        assert_eq!(*err.code(), ErrorCode::NumberOutOfRange);
        assert_eq!(err.column(), 3);
        let err = read::<i32>("1.5", &mut state).unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn test_mismatch_policy() {
        let mut state = ReadState::new();
        let err = read::<String>("true", &mut state).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid type: boolean `true`, expected a string at line 1 column 4"
        );

        let options = crate::JsonOptions::new().error_on_type_mismatch(false);
        let mut state = ReadState::with_options(&options);
        assert_eq!(read::<String>("[1, {}]", &mut state).unwrap(), Some(String::new()));
        assert_eq!(state.pending_frames(), 0);
        assert_eq!(read::<bool>("null", &mut state).unwrap(), Some(false));
    }

    #[test]
    fn test_property_names() {
        assert_eq!(42u16.to_property_name(), "42");
        assert_eq!(u16::from_property_name("42").unwrap(), 42);
        assert!(u16::from_property_name("x").unwrap_err().is_data());
        assert_eq!('é'.to_property_name(), "é");
        assert!(char::from_property_name("ab").is_err());
    }
}

use super::{ChildConverter, Converter, JsonType};
use crate::classify::TypeDetail;
use crate::error::{ErrorCode, Result};
use crate::read::JsonReader;
use crate::state::{ReadState, WriteState};
use crate::write::JsonWriter;

/// `null` is `None`; anything else is read by the inner type's converter at
/// the same nesting level.
pub struct OptionConverter<T> {
    inner: ChildConverter<Option<T>, T>,
}

impl<T: JsonType> OptionConverter<T> {
    pub fn setup() -> Self {
        OptionConverter {
            inner: ChildConverter::new(),
        }
    }
}

impl<T: JsonType> Converter<Option<T>> for OptionConverter<T> {
    fn try_read_value(
        &self,
        reader: &mut JsonReader<'_>,
        state: &mut ReadState,
    ) -> Result<Option<Option<T>>> {
        // A frame at this level belongs to the inner converter, which has
        // already seen that the value is not null.
        if !state.is_resuming() {
            match tri!(reader.peek_token(ErrorCode::EofWhileParsingValue)) {
                None => return Ok(None),
                Some(b'n') => {
                    return Ok(tri!(reader.try_read_scalar()).map(|_| None));
                }
                Some(_) => {}
            }
        }
        Ok(tri!(self.inner.get().try_read_value(reader, state)).map(Some))
    }

    fn try_write_value(
        &self,
        writer: &mut JsonWriter<'_>,
        state: &mut WriteState,
        value: &Option<T>,
    ) -> Result<bool> {
        match value {
            None => Ok(writer.try_write_null()),
            Some(value) => self.inner.get().try_write_value(writer, state, value),
        }
    }
}

impl<T: JsonType> JsonType for Option<T> {
    fn type_detail() -> TypeDetail {
        T::type_detail().nullable()
    }

    fn create_converter() -> Box<dyn Converter<Self>> {
        Box::new(OptionConverter::<T>::setup())
    }
}

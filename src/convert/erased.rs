use super::{Converter, JsonType};
use crate::classify::TypeDetail;
use crate::error::{Error, ErrorCode, Result};
use crate::read::JsonReader;
use crate::state::{ReadState, WriteState};
use crate::write::JsonWriter;
use core::any::{self, Any};
use core::fmt;

/// A dictionary whose key and value types are only known at runtime.
///
/// It can be carried around and downcast, but the engine has no way of
/// choosing converters for its entries, so reading or writing one is always a
/// configuration error.
pub struct AnyDictionary {
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AnyDictionary {
    pub fn new<D: Any + Send + Sync>(dictionary: D) -> Self {
        AnyDictionary {
            inner: Box::new(dictionary),
            type_name: any::type_name::<D>(),
        }
    }

    pub fn downcast_ref<D: Any>(&self) -> Option<&D> {
        self.inner.downcast_ref()
    }

    /// Name of the dictionary type that was erased.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for AnyDictionary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("AnyDictionary").field(&self.type_name).finish()
    }
}

/// Converter for [`AnyDictionary`]; fails without looking at the input.
pub struct ErasedDictionaryConverter {
    detail: TypeDetail,
}

impl ErasedDictionaryConverter {
    pub fn setup() -> Self {
        ErasedDictionaryConverter {
            detail: AnyDictionary::type_detail(),
        }
    }

    #[cold]
    fn error(&self) -> Error {
        Error::config(ErrorCode::UnknownElementTypes(self.detail.name.into()))
    }
}

impl Converter<AnyDictionary> for ErasedDictionaryConverter {
    fn try_read_value(
        &self,
        _reader: &mut JsonReader<'_>,
        _state: &mut ReadState,
    ) -> Result<Option<AnyDictionary>> {
        Err(self.error())
    }

    fn try_write_value(
        &self,
        _writer: &mut JsonWriter<'_>,
        _state: &mut WriteState,
        _value: &AnyDictionary,
    ) -> Result<bool> {
        Err(self.error())
    }
}

impl JsonType for AnyDictionary {
    fn type_detail() -> TypeDetail {
        TypeDetail::erased::<Self>()
    }

    fn create_converter() -> Box<dyn Converter<Self>> {
        Box::new(ErasedDictionaryConverter::setup())
    }
}

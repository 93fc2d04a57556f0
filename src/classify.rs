//! Describing target types and deciding which converter shape handles them.

use crate::convert::JsonType;
use core::any;
use core::fmt::{self, Display};

/// The scalar types that are written as a single JSON token and have a
/// one-line textual form usable as a property name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoreType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    ISize,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    USize,
    Float32,
    Float64,
    Char,
    String,
    /// A user type with a fixed set of textual values.
    Enum,
}

impl CoreType {
    /// What a value of this type looks like, for "invalid type" errors.
    pub fn expecting(self) -> &'static str {
        match self {
            CoreType::Boolean => "a boolean",
            CoreType::Int8 => "i8",
            CoreType::Int16 => "i16",
            CoreType::Int32 => "i32",
            CoreType::Int64 => "i64",
            CoreType::ISize => "isize",
            CoreType::UInt8 => "u8",
            CoreType::UInt16 => "u16",
            CoreType::UInt32 => "u32",
            CoreType::UInt64 => "u64",
            CoreType::USize => "usize",
            CoreType::Float32 => "f32",
            CoreType::Float64 => "f64",
            CoreType::Char => "a character",
            CoreType::String => "a string",
            CoreType::Enum => "a variant name",
        }
    }
}

impl Display for CoreType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.expecting())
    }
}

/// The four ways a dictionary can be targeted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DictionaryKind {
    /// A concrete map type such as `HashMap` or `BTreeMap`.
    Concrete,
    /// `Box<dyn Dictionary<K, V>>`, built as a `HashMap`.
    Interface,
    /// `Arc<dyn Dictionary<K, V>>`, built once and then shared.
    ReadOnlyInterface,
    /// A dictionary whose key and value types are not known.
    Erased,
}

/// The parts of an element type that classification looks at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDetail {
    pub name: &'static str,
    pub core_type: Option<CoreType>,
    pub nullable: bool,
}

impl ElementDetail {
    pub fn of<T: JsonType>() -> Self {
        let detail = T::type_detail();
        ElementDetail {
            name: any::type_name::<T>(),
            core_type: detail.core_type(),
            nullable: detail.nullable,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Core(CoreType),
    Object {
        properties: Vec<&'static str>,
    },
    Array {
        element: ElementDetail,
    },
    Dictionary {
        target: DictionaryKind,
        key: Option<ElementDetail>,
        value: Option<ElementDetail>,
    },
}

/// Immutable description of a target type, built once per type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDetail {
    pub name: &'static str,
    pub kind: TypeKind,
    /// Whether `null` is a value of the type rather than a mismatch.
    pub nullable: bool,
}

impl TypeDetail {
    pub fn core<T: 'static>(core_type: CoreType) -> Self {
        TypeDetail {
            name: any::type_name::<T>(),
            kind: TypeKind::Core(core_type),
            nullable: false,
        }
    }

    pub fn object<T: 'static>(properties: Vec<&'static str>) -> Self {
        TypeDetail {
            name: any::type_name::<T>(),
            kind: TypeKind::Object { properties },
            nullable: false,
        }
    }

    pub fn array<T: 'static, E: JsonType>() -> Self {
        TypeDetail {
            name: any::type_name::<T>(),
            kind: TypeKind::Array {
                element: ElementDetail::of::<E>(),
            },
            nullable: false,
        }
    }

    pub fn dictionary<T: 'static, K: JsonType, V: JsonType>(target: DictionaryKind) -> Self {
        TypeDetail {
            name: any::type_name::<T>(),
            kind: TypeKind::Dictionary {
                target,
                key: Some(ElementDetail::of::<K>()),
                value: Some(ElementDetail::of::<V>()),
            },
            nullable: false,
        }
    }

    pub fn erased<T: 'static>() -> Self {
        TypeDetail {
            name: any::type_name::<T>(),
            kind: TypeKind::Dictionary {
                target: DictionaryKind::Erased,
                key: None,
                value: None,
            },
            nullable: false,
        }
    }

    /// The same type, accepting `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn core_type(&self) -> Option<CoreType> {
        match self.kind {
            TypeKind::Core(core_type) => Some(core_type),
            _ => None,
        }
    }

    /// Whether the engine can create an empty value of this type on its own.
    pub fn has_factory(&self) -> bool {
        match self.kind {
            TypeKind::Core(_) => false,
            TypeKind::Dictionary {
                target: DictionaryKind::Erased,
                ..
            } => false,
            TypeKind::Object { .. } | TypeKind::Array { .. } | TypeKind::Dictionary { .. } => true,
        }
    }
}

/// How a value is laid out on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Object,
    Array,
    /// Written as a JSON object whose property names are the keys.
    DictionaryScalarKey,
    /// Written as a JSON array of `{"Key":..,"Value":..}` objects.
    DictionaryComplexKey,
}

/// Determines the shape of a type from its description.
///
/// A dictionary key is scalar when it is a non-nullable core type. Erased keys
/// are always complex.
pub fn classify(detail: &TypeDetail) -> Shape {
    match &detail.kind {
        TypeKind::Core(_) => Shape::Scalar,
        TypeKind::Object { .. } => Shape::Object,
        TypeKind::Array { .. } => Shape::Array,
        TypeKind::Dictionary {
            key: Some(key), ..
        } if key.core_type.is_some() && !key.nullable => Shape::DictionaryScalarKey,
        TypeKind::Dictionary { .. } => Shape::DictionaryComplexKey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnyDictionary;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    json_object!(Point { x, y });

    #[test]
    fn test_shapes() {
        assert_eq!(classify(&u64::type_detail()), Shape::Scalar);
        assert_eq!(classify(&Point::type_detail()), Shape::Object);
        assert_eq!(classify(&Vec::<Point>::type_detail()), Shape::Array);
        assert_eq!(
            classify(&HashMap::<u32, Point>::type_detail()),
            Shape::DictionaryScalarKey
        );
        assert_eq!(
            classify(&BTreeMap::<char, String>::type_detail()),
            Shape::DictionaryScalarKey
        );
    }

    #[test]
    fn test_complex_keys() {
        let detail = HashMap::<Option<u32>, String>::type_detail();
        assert_eq!(classify(&detail), Shape::DictionaryComplexKey);
        assert_eq!(
            classify(&AnyDictionary::type_detail()),
            Shape::DictionaryComplexKey
        );
        assert!(!AnyDictionary::type_detail().has_factory());
    }

    #[test]
    fn test_property_list() {
        match Point::type_detail().kind {
            TypeKind::Object { properties } => assert_eq!(properties, ["x", "y"]),
            kind => panic!("unexpected kind {:?}", kind),
        }
    }
}

//! The converter cache.

use crate::classify::{classify, TypeDetail};
use crate::convert::{Converter, JsonType};
use core::any::{self, Any, TypeId};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

type Key = (TypeId, TypeId);

/// Converters keyed by (parent type, value type), and type details keyed by
/// type.
///
/// Entries are created on first use. When two threads race to create the same
/// entry both build one, the first to be inserted is kept and every caller gets
/// that one.
pub struct ConverterRegistry {
    converters: DashMap<Key, Box<dyn Any + Send + Sync>>,
    details: DashMap<TypeId, Arc<TypeDetail>>,
}

static GLOBAL: Lazy<ConverterRegistry> = Lazy::new(ConverterRegistry::new);

impl ConverterRegistry {
    pub fn new() -> Self {
        ConverterRegistry {
            converters: DashMap::new(),
            details: DashMap::new(),
        }
    }

    /// The registry used by the drivers and by nested converters.
    pub fn global() -> &'static ConverterRegistry {
        &GLOBAL
    }

    /// The converter for `V` values that appear inside a `P`. Roots use `()`
    /// as their parent.
    pub fn converter<P: 'static, V: JsonType>(&self) -> Arc<dyn Converter<V>> {
        let key = (TypeId::of::<P>(), TypeId::of::<V>());
        if let Some(existing) = self.converters.get(&key) {
            return downcast::<V>(existing.value().as_ref());
        }

        // Built outside of the map's locks: setup may look up other types.
        let detail = self.type_detail::<V>();
        let created: Arc<dyn Converter<V>> = Arc::from(V::create_converter());
        let entry = self
            .converters
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(
                    parent = any::type_name::<P>(),
                    value = detail.name,
                    shape = ?classify(&detail),
                    "created converter"
                );
                Box::new(created) as Box<dyn Any + Send + Sync>
            })
            .downgrade();
        downcast::<V>(entry.value().as_ref())
    }

    pub fn type_detail<T: JsonType>(&self) -> Arc<TypeDetail> {
        let key = TypeId::of::<T>();
        if let Some(existing) = self.details.get(&key) {
            return Arc::clone(existing.value());
        }
        let detail = Arc::new(T::type_detail());
        Arc::clone(self.details.entry(key).or_insert(detail).value())
    }

    /// Number of cached converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        ConverterRegistry::new()
    }
}

fn downcast<V: 'static>(entry: &(dyn Any + Send + Sync)) -> Arc<dyn Converter<V>> {
    match entry.downcast_ref::<Arc<dyn Converter<V>>>() {
        Some(converter) => Arc::clone(converter),
        None => unreachable!("registry entry does not match its key"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;

    #[test]
    fn test_first_write_wins() {
        let registry = Arc::new(ConverterRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.converter::<(), HashMap<String, u64>>())
            })
            .collect();
        let converters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for converter in &converters[1..] {
            assert!(Arc::ptr_eq(&converters[0], converter));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_keyed_by_parent() {
        let registry = ConverterRegistry::new();
        let root = registry.converter::<(), u32>();
        let nested = registry.converter::<Vec<u32>, u32>();
        assert!(!Arc::ptr_eq(&root, &nested));
        assert!(Arc::ptr_eq(&root, &registry.converter::<(), u32>()));
        assert_eq!(registry.len(), 2);
    }
}

//! # Resumable JSON
//!
//! A JSON converter engine that reads and writes typed values a token at a
//! time and can stop at any token boundary. Input may arrive in fragments of
//! any size and output may go to buffers of any size: when the engine runs out
//! of either it records exactly where it was in a [`ReadState`] or
//! [`WriteState`] and reports how many more bytes it needs. Calling it again
//! with more room and the same state continues without re-reading a token or
//! re-writing a byte.
//!
//! # Converting whole documents
//!
//! ```
//! use std::collections::HashMap;
//!
//! let mut scores = HashMap::new();
//! scores.insert(7u32, "seven".to_owned());
//!
//! let json = resumable_json::to_string(&scores)?;
//! assert_eq!(json, r#"{"7":"seven"}"#);
//!
//! let back: HashMap<u32, String> = resumable_json::from_str(&json)?;
//! assert_eq!(back, scores);
//! # Ok::<(), resumable_json::Error>(())
//! ```
//!
//! # Driving the state machine
//!
//! [`try_read`] takes one block of input. A `None` result means the block ran
//! out: keep the bytes the reader did not consume, add more, and call again
//! with the same state.
//!
//! ```
//! use resumable_json::{try_read, JsonReader, ReadState};
//!
//! let mut state = ReadState::new();
//! let mut reader = JsonReader::new(br#"[1, 2, 3"#, false);
//! let first = try_read::<Vec<u8>>(&mut reader, &mut state)?;
//! assert_eq!(first, None);
//!
//! let rest = [reader.remaining(), b"]"].concat();
//! let mut reader = JsonReader::new(&rest, true);
//! let done = try_read::<Vec<u8>>(&mut reader, &mut state)?;
//! assert_eq!(done, Some(vec![1, 2, 3]));
//! # Ok::<(), resumable_json::Error>(())
//! ```
//!
//! # Dictionaries
//!
//! Dictionaries whose keys have a one-line textual form (numbers, strings,
//! booleans, characters and [`CoreValue`] enums) are written as JSON objects.
//! Any other key type makes the dictionary an array of
//! `{"Key":..,"Value":..}` objects. `HashMap`, `BTreeMap`, `IndexMap` (with the
//! `indexmap` feature) and the trait objects `Box<dyn Dictionary<K, V>>` and
//! `Arc<dyn Dictionary<K, V>>` are all supported.

#![doc(html_root_url = "https://docs.rs/resumable_json/0.1.0")]
// Ignored clippy lints
#![allow(
    clippy::match_like_matches_macro,
    clippy::module_name_repetitions,
    clippy::new_without_default,
    clippy::type_complexity,
)]

extern crate serde_core as serde;

#[macro_use]
mod macros;

pub mod classify;
pub mod convert;
pub mod error;
pub mod graph;
pub mod options;
pub mod read;
pub mod state;
pub mod write;

mod drain;
mod driver;
mod registry;

#[doc(inline)]
pub use crate::classify::{classify, CoreType, DictionaryKind, Shape, TypeDetail};
#[doc(inline)]
pub use crate::convert::{
    AnyDictionary, ArrayConverter, ChildConverter, Converter, CoreConverter, CoreValue,
    Dictionary, DictionaryAccessor, DictionaryConverter, DictionaryTarget,
    ErasedDictionaryConverter, JsonType, ObjectConverter, ObjectDetail, OptionConverter,
    PairConverter, PropertyName,
};
pub use crate::drain::DrainState;
pub use crate::driver::{
    from_reader, from_reader_with, from_slice, from_slice_with, from_slice_with_graph, from_str,
    from_str_with, to_string, to_vec, to_vec_with, to_writer, to_writer_with, try_read,
    try_write, ReadDriver, WriteDriver,
};
#[doc(inline)]
pub use crate::error::{Error, Result};
pub use crate::graph::Graph;
pub use crate::options::JsonOptions;
pub use crate::read::{JsonReader, Scalar};
pub use crate::registry::ConverterRegistry;
pub use crate::state::{ReadState, WriteState};
pub use crate::write::{JsonName, JsonWriter};

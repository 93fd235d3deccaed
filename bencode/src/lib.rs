//! All encoding functions take a value and a writer and return the amount of written bytes. All decoding functions
//! take a buffered reader and return the decoded item and the number of consumed bytes.
//!
//! # A note on integers
//!
//! Bencode integers have no size limit on the wire. This crate represents them as `i64`; a digit run which does not
//! fit yields `DecodeError::Overflow` instead of a wrapped value. Likewise, string lengths are written as `i64`,
//! so on architectures where `usize` is larger than that some byte strings can not be encoded and a
//! `EncodeError::Length` will be raised.
//!
//! # A note on dictionaries
//!
//! The variant `Value::Dict` uses a `BTreeMap` keyed by raw bytes, so dictionaries are always written with their
//! keys in ascending byte order as the canonical form requires, regardless of the order they were decoded in.
//! Decoding is permissive by default: keys need not be sorted, a repeated key replaces the earlier entry and leading
//! zeros in decimals are accepted. See [`DecoderConfig`] for stricter settings.
//!
//! # Examples
//!
//! ```
//! use bencode::*;
//! use std::borrow::Cow;
//! use std::collections::BTreeMap;
//!
//! let mut buf = Vec::new();
//! let value = Value::Dict(BTreeMap::from([
//!     (Cow::Borrowed(&b"spam"[..]), Value::List(vec![Value::from("a"), Value::Int(-1)])),
//!     (Cow::Borrowed(&b"cow"[..]), Value::from("moo")),
//! ]));
//! assert_eq!(27, serialize(&value, &mut buf).unwrap());
//! assert_eq!(&buf[..], b"d3:cow3:moo4:spaml1:ai-1eee");
//! let decoded = Decoder::decode(&buf).unwrap();
//! assert_eq!(value, decoded.0);
//! assert_eq!(27, decoded.1);
//! ```

mod config;
mod error;
mod reader;
mod value;

pub mod decimal;
pub mod integer;
pub mod string;

pub use config::*;
pub use error::*;
pub use value::*;

use std::io::{BufRead, Write};

/// Decode a single value from `source` with the default configuration. Input following the value is not consumed.
///
/// ```
/// let value = bencode::parse(&b"l4:spam4:eggse"[..]).unwrap();
/// assert_eq!(Ok("eggs"), value.as_list().unwrap()[1].as_str());
/// ```
pub fn parse<R: BufRead>(source: R) -> Result<Value<'static>, DecoderError> {
    Decoder::new(source).decode_value()
}

/// Encode `value` into `sink` and return the number of written bytes.
pub fn serialize<W: Write + ?Sized>(value: &Value, sink: &mut W) -> Result<usize, EncodeError> {
    Encoder::encode(value, sink)
}

//! Conveniently serialize and deserialize your Rust data structures into bencode.
//!
//! # Mapping of the data model
//!
//! Bencode only knows byte strings, integers, lists and dictionaries, so most of serde's data model has to be
//! folded onto these four:
//!
//! * `bool` becomes the integer `0` or `1`, unit and unit structs become the empty string.
//! * `None` is not written at all. Inside a struct or map the whole entry is left out, which is the usual way
//!   optional fields are expressed in bencoded documents. Anywhere else, for instance as a list element or as the
//!   top level value, it yields [`Error::Unsupported`].
//! * Structs and maps become dictionaries. Their entries are sorted by key before they are written, so the output
//!   is canonical regardless of field order. Map keys must serialize to a string or an integer; integers are
//!   written as their decimal text.
//! * Unit variants become the variant name. All other variants become a dictionary with the variant name as its
//!   single key.
//! * Floating point numbers can not be represented and yield [`Error::Unsupported`]. Unsigned integers above
//!   `i64::MAX` yield [`Error::Int`].
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub enum Species {
//!     PrionailurusViverrinus,
//!     LynxLynx,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Cat<'a> {
//!     species: Species,
//!     name: &'a str,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message<'a> {
//!     version: u32,
//!     #[serde(borrow)]
//!     cats: Vec<Cat<'a>>,
//! }
//!
//! let msg = Message {
//!     version: 1,
//!     cats: vec![
//!         Cat { name: "Jessica", species: Species::PrionailurusViverrinus },
//!         Cat { name: "Wantan", species: Species::LynxLynx },
//!     ],
//! };
//!
//! let bytes = bencode_serde::to_bytes(&msg).unwrap();
//! // keys come out sorted, not in declaration order
//! assert_eq!(
//!     &bytes[..],
//!     &b"d4:catsld4:name7:Jessica7:species22:PrionailurusViverrinused4:name6:Wantan7:species8:LynxLynxee7:versioni1ee"[..],
//! );
//!
//! let deserialized: Message = bencode_serde::from_bytes(&bytes).unwrap();
//! assert_eq!(msg, deserialized);
//! ```
//!
//! Deserialization borrows strings and byte strings straight from the input where the target type allows it.
//! [`from_bytes_with_config`] applies a [`bencode::DecoderConfig`] to limit nesting or reject duplicate keys in maps.

mod de;
mod error;
mod ser;

pub use de::{from_bytes, from_bytes_with_config, Deserializer};
pub use error::{DeserializationError, Error, Result};
pub use ser::{to_bytes, to_writer, Serializer};

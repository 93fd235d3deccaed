use serde::Deserialize;
use serde::de::{self, DeserializeSeed, EnumAccess, IgnoredAny, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::de::value::StrDeserializer;
use serde::forward_to_deserialize_any;
use bencode::{integer, string, DecodeError, DecoderConfig, DuplicateKeys};
use std::collections::BTreeSet;
use std::convert::TryInto;
use std::str::{from_utf8, FromStr};

use crate::error::{DeserializationError, Error, Result};

/// Names the item introduced by the given byte, for error messages.
fn token_name(b: u8) -> &'static str {
    match b {
        b'0'..=b'9' => "string",
        b'i'        => "integer",
        b'l'        => "list",
        b'd'        => "dictionary",
        b'e'        => "end",
        _           => "invalid byte",
    }
}

/// Reads straight from a byte slice so that strings can be handed to the visitor without copying.
pub struct Deserializer<'de> {
    input: &'de [u8],
    len: usize,
    config: DecoderConfig,
    depth: usize,
}

impl<'de> Deserializer<'de> {
    pub fn from_bytes(input: &'de [u8]) -> Self {
        Self::with_config(input, DecoderConfig::default())
    }

    pub fn with_config(input: &'de [u8], config: DecoderConfig) -> Self {
        Deserializer { input, len: input.len(), config, depth: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.len - self.input.len()
    }
}

pub fn from_bytes<'a, T: Deserialize<'a>>(s: &'a [u8]) -> std::result::Result<T, DeserializationError> {
    from_bytes_with_config(s, DecoderConfig::default())
}

/// Like `from_bytes`, but honors the nesting limit and the duplicate key policy of `config`. Note that structs
/// always reject a repeated field, whatever the policy says.
pub fn from_bytes_with_config<'a, T: Deserialize<'a>>(s: &'a [u8], config: DecoderConfig) -> std::result::Result<T, DeserializationError> {
    let mut deserializer = Deserializer::with_config(s, config);
    let t = T::deserialize(&mut deserializer).map_err(|e| e.at(deserializer.position()))?;
    if deserializer.input.is_empty() {
        Ok(t)
    } else {
        Err(Error::Trailing.at(deserializer.position()))
    }
}

impl<'de> Deserializer<'de> {

    fn peek(&self) -> Result<u8> {
        self.input.first().copied().ok_or(Error::Decode(DecodeError::Eof))
    }

    fn expect(&mut self, token: u8, expected: &'static str) -> Result<()> {
        match self.peek()? {
            b if b == token => {
                self.input = &self.input[1..];
                Ok(())
            },
            other => Err(Error::Unexpected { expected, found: token_name(other) }),
        }
    }

    /// Consumes the opening byte of a list or dictionary
    fn open(&mut self, token: u8, expected: &'static str) -> Result<()> {
        self.expect(token, expected)?;
        self.depth += 1;
        match self.config.max_depth {
            Some(max) if self.depth > max => Err(Error::Decode(DecodeError::Depth(max))),
            _ => Ok(()),
        }
    }

    /// Consumes the `e` closing a list or dictionary
    fn end(&mut self, container: &'static str) -> Result<()> {
        match self.peek()? {
            b'e' => {
                self.input = &self.input[1..];
                self.depth -= 1;
                Ok(())
            },
            _ => Err(Error::ExpectedEnd(container)),
        }
    }

    fn at_end(&self) -> Result<bool> {
        Ok(self.peek()? == b'e')
    }

    fn decode_int(&mut self) -> Result<i64> {
        match self.peek()? {
            b'i' => Ok(integer::decode(&mut self.input)?.0),
            other => Err(Error::Unexpected { expected: "integer", found: token_name(other) }),
        }
    }

    fn decode_bytes(&mut self) -> Result<&'de [u8]> {
        match self.peek()? {
            b'0'..=b'9' => {
                let (len, _) = string::decode_len(&mut self.input)?;
                if self.input.len() < len {
                    return Err(Error::Decode(DecodeError::Eof));
                }
                let (bytes, rest) = self.input.split_at(len);
                self.input = rest;
                Ok(bytes)
            },
            other => Err(Error::Unexpected { expected: "string", found: token_name(other) }),
        }
    }

    fn decode_str(&mut self) -> Result<&'de str> {
        Ok(from_utf8(self.decode_bytes()?)?)
    }

}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Deserializer<'de> {
    type Error = Error;

    /// Strings are presented as `str` if they happen to be valid UTF-8 and as bytes otherwise.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.peek()? {
            b'0'..=b'9' => {
                let bytes = self.decode_bytes()?;
                match from_utf8(bytes) {
                    Ok(s) => visitor.visit_borrowed_str(s),
                    Err(_) => visitor.visit_borrowed_bytes(bytes),
                }
            },
            b'i' => visitor.visit_i64(self.decode_int()?),
            b'l' => self.deserialize_seq(visitor),
            b'd' => self.deserialize_map(visitor),
            other => Err(Error::Decode(DecodeError::InvalidFormat(Some(other)))),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_int()? {
            0 => visitor.visit_bool(false),
            1 => visitor.visit_bool(true),
            i => Err(Error::Bool(i)),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.decode_int()?.try_into()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.decode_int()?.try_into()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.decode_int()?.try_into()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.decode_int()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.decode_int()?.try_into()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.decode_int()?.try_into()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.decode_int()?.try_into()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.decode_int()?.try_into()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("f32"))
    }

    fn deserialize_f64<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("f64"))
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let s = self.decode_str()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::Unexpected { expected: "single character", found: "string" }),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.decode_str()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_bytes(self.decode_bytes()?)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.decode_bytes()?.to_vec())
    }

    /// Absent values are never written, so anything that is present is `Some`. Missing struct fields become `None`
    /// through serde's own handling of optional fields.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_bytes()? {
            [] => visitor.visit_unit(),
            _ => Err(Error::Unexpected { expected: "empty string", found: "string" }),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.open(b'l', "list")?;
        let value = visitor.visit_seq(SeqDeserializer::new(&mut *self))?;
        self.end("list")?;
        Ok(value)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.open(b'd', "dictionary")?;
        let value = visitor.visit_map(MapDeserializer::new(&mut *self))?;
        self.end("dictionary")?;
        Ok(value)
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str], visitor: V) -> Result<V::Value> {
        match self.peek()? {
            b'0'..=b'9' => visitor.visit_enum(self.decode_str()?.into_deserializer()),
            b'd' => {
                self.open(b'd', "dictionary")?;
                let value = visitor.visit_enum(EnumDeserializer::new(&mut *self))?;
                self.end("dictionary")?;
                Ok(value)
            },
            other => Err(Error::Unexpected { expected: "string or dictionary", found: token_name(other) }),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_any(visitor)
    }

}

struct SeqDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
}

impl<'a, 'de> SeqDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>) -> Self {
        Self { de }
    }
}

impl<'de, 'a> SeqAccess<'de> for SeqDeserializer<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.de.at_end()? {
            return Ok(None);
        }
        seed.deserialize(&mut *self.de).map(Some)
    }
}

struct MapDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
    seen: BTreeSet<&'de [u8]>,
}

impl<'a, 'de> MapDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>) -> Self {
        Self { de, seen: BTreeSet::new() }
    }
}

impl<'de, 'a> MapAccess<'de> for MapDeserializer<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.de.at_end()? {
            return Ok(None);
        }
        let key = self.de.decode_bytes()?;
        if self.de.config.duplicate_keys == DuplicateKeys::Reject && !self.seen.insert(key) {
            return Err(Error::Decode(DecodeError::DuplicateKey(key.to_vec())));
        }
        seed.deserialize(KeyDeserializer { key }).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }
}

/// Dictionary keys are always strings on the wire. Map keys of integer type are recovered by parsing their text.
struct KeyDeserializer<'de> {
    key: &'de [u8],
}

impl<'de> KeyDeserializer<'de> {
    fn parse<T: FromStr>(&self, expected: &'static str) -> Result<T> {
        let s = from_utf8(self.key)?;
        s.parse().map_err(|_| Error::Key(s.to_owned(), expected))
    }
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match from_utf8(self.key) {
            Ok(s) => visitor.visit_borrowed_str(s),
            Err(_) => visitor.visit_borrowed_bytes(self.key),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.parse("i8")?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.parse("i16")?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.parse("i32")?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.parse("i64")?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.parse("u8")?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.parse("u16")?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.parse("u32")?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.parse("u64")?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_bytes(self.key)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.key.to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str], visitor: V) -> Result<V::Value> {
        visitor.visit_enum(from_utf8(self.key)?.into_deserializer())
    }

    forward_to_deserialize_any! {
        bool f32 f64 char str string unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

struct EnumDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
}

impl<'a, 'de> EnumDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>) -> Self {
        Self { de }
    }
}

/// A variant with content is a dictionary with a single entry, keyed by the variant name.
impl<'de, 'a> EnumAccess<'de> for EnumDeserializer<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant: StrDeserializer<'de, Error> = self.de.decode_str()?.into_deserializer();
        Ok((seed.deserialize(variant)?, self))
    }
}

impl<'de, 'a> VariantAccess<'de> for EnumDeserializer<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        IgnoredAny::deserialize(&mut *self.de)?;
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self.de, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_map(self.de, visitor)
    }
}

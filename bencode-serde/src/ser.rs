use serde::{ser, Serialize};
use bencode::{integer, string};
use std::convert::TryFrom;
use std::io::Write;

use crate::error::{Error, Result};

pub struct Serializer<W> {
    output: W,
    /// Set while a dictionary value is written, the only place where `None` can be expressed by leaving it out.
    optional: bool,
}

pub fn to_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut serializer = Serializer::new(Vec::new());
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

pub fn to_writer<T: ?Sized + Serialize, W: Write>(writer: W, value: &T) -> Result<()> {
    let mut serializer = Serializer::new(writer);
    value.serialize(&mut serializer)
}

/// Encodes a dictionary value on its own. An empty result means the value was `None`.
fn dict_value<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut serializer = Serializer { output: Vec::new(), optional: true };
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

impl<W: Write> Serializer<W> {
    pub fn new(output: W) -> Self {
        Self { output, optional: false }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.write_all(bytes)?;
        Ok(())
    }

    /// Starts a list or dictionary. Its members are no longer dictionary values themselves.
    fn open(&mut self, token: &[u8]) -> Result<()> {
        self.optional = false;
        self.write(token)
    }

    /// Starts the single entry dictionary which wraps a non-unit enum variant
    fn begin_variant(&mut self, variant: &'static str) -> Result<()> {
        self.open(b"d")?;
        string::encode(variant.as_bytes(), &mut self.output)?;
        Ok(())
    }
}

/// Turns an encoded map key into the raw bytes of a dictionary key. Strings are used as they are, integers by their
/// decimal representation.
fn key_bytes(encoded: &[u8]) -> Result<Vec<u8>> {
    let mut input = encoded;
    match input.first() {
        Some(b'0'..=b'9') => Ok(string::decode(&mut input)?.0),
        Some(b'i')        => Ok(integer::decode(&mut input)?.0.to_string().into_bytes()),
        _                 => Err(Error::KeyType),
    }
}

impl<'a, W: Write> ser::Serializer for &'a mut Serializer<W> {

    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = DictSerializer<'a, W>;
    type SerializeStruct = DictSerializer<'a, W>;
    type SerializeStructVariant = DictSerializer<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        integer::encode(v, &mut self.output)?;
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.serialize_i64(i64::try_from(v)?)
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(Error::Unsupported("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(Error::Unsupported("f64"))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_str(v.encode_utf8(&mut [0u8; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.serialize_bytes(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        string::encode(v, &mut self.output)?;
        Ok(())
    }

    /// Bencode has no null. Struct fields and map entries holding `None` are left out of their dictionary, anywhere
    /// else `None` can not be represented.
    fn serialize_none(self) -> Result<()> {
        if self.optional {
            Ok(())
        } else {
            Err(Error::Unsupported("none outside of a dictionary"))
        }
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.serialize_bytes(&[])
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _index: u32, variant: &'static str, value: &T) -> Result<()> {
        self.begin_variant(variant)?;
        value.serialize(&mut *self)?;
        self.write(b"e")
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.open(b"l")?;
        Ok(self)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, variant: &'static str, _len: usize) -> Result<Self::SerializeTupleVariant> {
        self.begin_variant(variant)?;
        self.open(b"l")?;
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(DictSerializer::new(self, false))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(DictSerializer::new(self, false))
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, variant: &'static str, _len: usize) -> Result<Self::SerializeStructVariant> {
        self.begin_variant(variant)?;
        Ok(DictSerializer::new(self, true))
    }

}

impl<'a, W: Write> ser::SerializeSeq for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.write(b"e")
    }

}

impl<'a, W: Write> ser::SerializeTuple for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.write(b"e")
    }
}

impl<'a, W: Write> ser::SerializeTupleStruct for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.write(b"e")
    }
}

impl<'a, W: Write> ser::SerializeTupleVariant for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    /// Closes both the list and the wrapping dictionary
    fn end(self) -> Result<()> {
        self.write(b"ee")
    }
}

/// Dictionaries must be written with sorted keys, but serde hands out struct fields in declaration order and map
/// entries in iteration order. Entries are therefore encoded separately and only written out, sorted, at the end.
pub struct DictSerializer<'a, W> {
    ser: &'a mut Serializer<W>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    key: Option<Vec<u8>>,
    variant: bool,
}

impl<'a, W: Write> DictSerializer<'a, W> {
    fn new(ser: &'a mut Serializer<W>, variant: bool) -> Self {
        Self { ser, entries: Vec::new(), key: None, variant }
    }

    /// Nested dictionaries are buffered once per level, so their bytes are copied as often as they are nested.
    fn push<T: ?Sized + Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<()> {
        let value = dict_value(value)?;
        if !value.is_empty() {
            self.entries.push((key, value));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.ser.open(b"d")?;
        for (key, value) in self.entries.iter() {
            string::encode(key, &mut self.ser.output)?;
            self.ser.write(value)?;
        }
        self.ser.write(if self.variant { &b"ee"[..] } else { &b"e"[..] })
    }
}

impl<'a, W: Write> ser::SerializeMap for DictSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key_bytes(&to_bytes(key)?)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.key.take().ok_or_else(|| Error::Message("serialize_value called before serialize_key".to_owned()))?;
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }

}

impl<'a, W: Write> ser::SerializeStruct for DictSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.push(key.as_bytes().to_vec(), value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }

}

impl<'a, W: Write> ser::SerializeStructVariant for DictSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.push(key.as_bytes().to_vec(), value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }

}

//! The atom of a bencode message is the `Value`.
//! Strings and integers are encoded directly by their sub-codecs, lists and dictionaries are delimited by `l`/`d` and a
//! closing `e`. Dictionaries are kept in a `BTreeMap` so that their keys are always emitted in ascending byte order,
//! which is what the canonical form demands.

use crate::config::{DecoderConfig, DuplicateKeys};
use crate::error::{DecodeError, DecoderError, EncodeError, TypeMismatch};
use crate::reader::{peek, Tracked};
use crate::{integer, string};
use log::{debug, trace};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::str::from_utf8;

/// The possible values according to the bencode data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    /// A byte string, which may or may not be valid Utf-8.
    Bytes(Cow<'a, [u8]>),
    Int(i64),
    List(Vec<Value<'a>>),
    Dict(BTreeMap<Cow<'a, [u8]>, Value<'a>>),
}

impl<'a> Value<'a> {

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Bytes(_) => "string",
            Self::Int(_)   => "integer",
            Self::List(_)  => "list",
            Self::Dict(_)  => "dictionary",
        }
    }

    fn mismatch(&self, expected: &'static str) -> TypeMismatch {
        TypeMismatch { expected, found: self.typename() }
    }

    pub fn as_bytes(&self) -> Result<&[u8], TypeMismatch> {
        match self {
            Value::Bytes(v) => Ok(v),
            o => Err(o.mismatch("string")),
        }
    }

    /// Like `as_bytes`, but additionally requires the bytes to be valid Utf-8.
    pub fn as_str(&self) -> Result<&str, TypeMismatch> {
        from_utf8(self.as_bytes()?).map_err(|_| TypeMismatch { expected: "utf-8 string", found: "binary string" })
    }

    pub fn as_int(&self) -> Result<i64, TypeMismatch> {
        match self {
            Value::Int(v) => Ok(*v),
            o => Err(o.mismatch("integer")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value<'a>], TypeMismatch> {
        match self {
            Value::List(v) => Ok(v),
            o => Err(o.mismatch("list")),
        }
    }

    pub fn as_dict(&self) -> Result<&BTreeMap<Cow<'a, [u8]>, Value<'a>>, TypeMismatch> {
        match self {
            Value::Dict(v) => Ok(v),
            o => Err(o.mismatch("dictionary")),
        }
    }

    /// Looks up `key` if this value is a dictionary.
    pub fn get(&self, key: &[u8]) -> Result<Option<&Value<'a>>, TypeMismatch> {
        Ok(self.as_dict()?.get(key))
    }

    /// Copies all borrowed payloads so the value no longer depends on the data it was built from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Bytes(v) => Value::Bytes(Cow::Owned(v.into_owned())),
            Value::Int(v)   => Value::Int(v),
            Value::List(v)  => Value::List(v.into_iter().map(Value::into_owned).collect()),
            Value::Dict(v)  => Value::Dict(v.into_iter().map(|(k, v)| (Cow::Owned(k.into_owned()), v.into_owned())).collect()),
        }
    }

    fn quote(bytes: &[u8]) -> String {
        match from_utf8(bytes) {
            Ok(s)  => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")),
            Err(_) => format!("'{}'", base64::encode(bytes)),
        }
    }

}

impl<'a> std::fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bytes(v)                 => f.write_str(&Self::quote(v)),
            Value::Int(v)                   => write!(f, "{}", v),
            Value::List(v) if v.is_empty()  => f.write_str("[]"),
            Value::Dict(v) if v.is_empty()  => f.write_str("{}"),
            Value::List(v)                  => write!(f, "[\n{}\n]", v.iter()
                .flat_map(|e| format!("{},", e).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
                .collect::<Vec<String>>().join("\n")),
            Value::Dict(v)                  => write!(f, "{{\n{}\n}}", v.iter()
                .flat_map(|(k, e)| format!("{}: {},", Self::quote(k), e).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
                .collect::<Vec<String>>().join("\n")),
        }
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Bytes(Cow::Borrowed(v.as_bytes()))
    }
}

impl From<String> for Value<'_> {
    fn from(v: String) -> Self {
        Value::Bytes(Cow::Owned(v.into_bytes()))
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for Value<'_> {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Cow::Owned(v))
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(v: Vec<Value<'a>>) -> Self {
        Value::List(v)
    }
}

impl<'a> From<BTreeMap<Cow<'a, [u8]>, Value<'a>>> for Value<'a> {
    fn from(v: BTreeMap<Cow<'a, [u8]>, Value<'a>>) -> Self {
        Value::Dict(v)
    }
}

/// Used to encode bencode values.
pub struct Encoder<'w, W: Write + ?Sized> {
    writer: &'w mut W,
}

impl<'w, W: Write + ?Sized> Encoder<'w, W> {

    /// Encode a value to the given writer. The resulting `usize` is the amount of bytes that got written.
    pub fn encode(value: &Value, writer: &'w mut W) -> Result<usize, EncodeError> {
        Self { writer }.encode_inner(value)
    }

    fn encode_inner(&mut self, value: &Value) -> Result<usize, EncodeError> {
        match value {
            Value::Bytes(v) => string::encode(v, self.writer),
            Value::Int(v)   => integer::encode(*v, self.writer),
            Value::List(inner) => {
                self.writer.write_all(b"l")?;
                let mut c = 2;
                for v in inner.iter() {
                    c += self.encode_inner(v)?;
                }
                self.writer.write_all(b"e")?;
                Ok(c)
            },
            Value::Dict(inner) => {
                self.writer.write_all(b"d")?;
                let mut c = 2;
                for (key, v) in inner.iter() {
                    c += string::encode(key, self.writer)?;
                    c += self.encode_inner(v)?;
                }
                self.writer.write_all(b"e")?;
                Ok(c)
            },
        }
    }

}

/// Used to decode bencode values from a buffered reader. Each value is chosen by looking at a single byte of input
/// without consuming it: a digit starts a string, `i` an integer, `l` a list and `d` a dictionary.
pub struct Decoder<R> {
    reader: Tracked<R>,
    config: DecoderConfig,
    depth: usize,
}

impl<'a> Decoder<&'a [u8]> {

    /// Decode a single value from the given buffer with the default configuration. Returns the value and the
    /// number of consumed bytes; any input after the value is left untouched.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Value<'static>, usize), DecoderError> {
        let mut decoder = Self::new(buf.as_ref());
        let value = decoder.decode_value()?;
        Ok((value, decoder.position()))
    }

}

impl<R: BufRead> Decoder<R> {

    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Self { reader: Tracked::new(reader), config, depth: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.reader.pos()
    }

    /// Returns true if the reader has no more input. Use this to reject trailing data after a value.
    pub fn is_exhausted(&mut self) -> Result<bool, DecoderError> {
        peek(&mut self.reader).map(|b| b.is_none()).map_err(|e| e.at(self.reader.pos()))
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Decode the next value. Consecutive calls decode consecutive values of the same stream. On error, the
    /// position of the reader is unspecified and it should not be used for further decoding.
    pub fn decode_value(&mut self) -> Result<Value<'static>, DecoderError> {
        self.depth = 0;
        let start = self.reader.pos();
        self.value().map_err(|e| {
            let at = self.reader.pos();
            debug!("Decoding value starting at {} failed at {}: {}", start, at, e);
            e.at(at)
        })
    }

    fn value(&mut self) -> Result<Value<'static>, DecodeError> {
        match peek(&mut self.reader)? {
            Some(b'0'..=b'9') => Ok(Value::Bytes(Cow::Owned(string::decode(&mut self.reader)?.0))),
            Some(b'i')        => Ok(Value::Int(integer::decode(&mut self.reader)?.0)),
            Some(b'l')        => {
                self.enter()?;
                let mut elements = Vec::new();
                while !self.leave()? {
                    elements.push(self.value()?);
                }
                Ok(Value::List(elements))
            },
            Some(b'd')        => {
                self.enter()?;
                let mut entries: BTreeMap<Cow<'static, [u8]>, Value<'static>> = BTreeMap::new();
                while !self.leave()? {
                    // keys are always plain strings, never general values
                    let (key, _) = string::decode(&mut self.reader)?;
                    if entries.contains_key(key.as_slice()) {
                        match self.config.duplicate_keys {
                            DuplicateKeys::Reject    => return Err(DecodeError::DuplicateKey(key)),
                            DuplicateKeys::Overwrite => debug!("Overwriting duplicate key {}", String::from_utf8_lossy(&key)),
                        }
                    }
                    let value = self.value()?;
                    entries.insert(Cow::Owned(key), value);
                }
                Ok(Value::Dict(entries))
            },
            other             => Err(DecodeError::InvalidFormat(other)),
        }
    }

    /// Consumes the opening byte of a container
    fn enter(&mut self) -> Result<(), DecodeError> {
        self.reader.consume(1);
        self.depth += 1;
        trace!("Entering container of depth {} at {}", self.depth, self.reader.pos());
        match self.config.max_depth {
            Some(max) if self.depth > max => Err(DecodeError::Depth(max)),
            _                             => Ok(()),
        }
    }

    /// Consumes the closing `e` of the current container if it is next. Running out of input before that is an
    /// error since every container must be terminated.
    fn leave(&mut self) -> Result<bool, DecodeError> {
        match peek(&mut self.reader)? {
            Some(b'e') => {
                self.reader.consume(1);
                self.depth -= 1;
                Ok(true)
            },
            Some(_)    => Ok(false),
            None       => Err(DecodeError::Eof),
        }
    }

}


#[cfg(test)]
mod test {
    use super::{Value, Encoder, Decoder};
    use crate::config::{DecoderConfig, DuplicateKeys};
    use crate::error::{DecodeError, TypeMismatch};
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    fn dict<'a>(entries: Vec<(&'a str, Value<'a>)>) -> Value<'a> {
        Value::Dict(entries.into_iter().map(|(k, v)| (Cow::Borrowed(k.as_bytes()), v)).collect())
    }

    #[test]
    fn simple_values() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Int(0), &mut buf);
        assert_roundtrip(Value::Int(i64::MAX), &mut buf);
        assert_roundtrip(Value::Int(i64::MIN), &mut buf);
        for i in (0..i64::MAX).step_by(3_203_431_780_337) {
            assert_roundtrip(Value::Int(i), &mut buf);
            assert_roundtrip(Value::Int(-i), &mut buf);
        }
    }

    #[test]
    fn strings() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::from("Üben von Xylophon und Querflöte ist ja zweckmäßig."), &mut buf);
        assert_roundtrip(Value::from(&[0u8, 1, 2, 3, 255][..]), &mut buf);
        assert_roundtrip(Value::from(""), &mut buf);
    }

    #[test]
    fn nested() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::List(vec![]), &mut buf);
        assert_roundtrip(dict(vec![]), &mut buf);
        assert_roundtrip(dict(vec![
                ("announce", Value::from("http://example.com/announce")),
                ("list", Value::List(vec![Value::Int(1), Value::from("two"), Value::List(vec![Value::Int(3)])])),
                ("nested", dict(vec![("inner", dict(vec![("deep", Value::Int(-1))]))])),
        ]), &mut buf);
    }

    #[test]
    fn list() {
        let (value, c) = Decoder::decode(b"l4:spam4:eggse").unwrap();
        assert_eq!(Value::List(vec![Value::from("spam"), Value::from("eggs")]), value);
        assert_eq!(14, c);
    }

    #[test]
    fn dictionary() {
        let (value, _) = Decoder::decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
        assert_eq!(dict(vec![("cow", Value::from("moo")), ("spam", Value::from("eggs"))]), value);
        assert_eq!(Some(&Value::from("moo")), value.get(b"cow").unwrap());
        assert_eq!(None, value.get(b"horse").unwrap());
    }

    #[test]
    fn canonical_bytes_roundtrip() {
        let input = b"d4:infod6:lengthi1024e4:name8:file.txte3:keyli-1ei0eee";
        let mut buf = Vec::new();
        assert_eq!(input.len(), Encoder::encode(&Decoder::decode(input).unwrap().0, &mut buf).unwrap());
        assert_eq!(&input[..], &buf[..]);
    }

    #[test]
    fn unsorted_keys_are_sorted_on_output() {
        let (value, _) = Decoder::decode(b"d4:spam4:eggs3:cow3:mooe").unwrap();
        let mut buf = Vec::new();
        Encoder::encode(&value, &mut buf).unwrap();
        assert_eq!(b"d3:cow3:moo4:spam4:eggse", &buf[..]);
    }

    #[test]
    fn duplicate_keys() {
        let (value, c) = Decoder::decode(b"d1:a1:x1:a1:ye").unwrap();
        assert_eq!(dict(vec![("a", Value::from("y"))]), value);
        assert_eq!(14, c);
        let config = DecoderConfig::default().duplicate_keys(DuplicateKeys::Reject);
        let err = Decoder::with_config(&b"d1:a1:x1:a1:ye"[..], config).decode_value().unwrap_err();
        assert_eq!(10, err.position());
        assert!(matches!(err.into_inner(), DecodeError::DuplicateKey(k) if k == b"a"));
    }

    #[test]
    fn depth_limit() {
        let config = DecoderConfig::default().max_depth(3);
        assert!(Decoder::with_config(&b"llleee"[..], config).decode_value().is_ok());
        assert!(Decoder::with_config(&b"ld1:aleee"[..], config).decode_value().is_ok());
        let err = Decoder::with_config(&b"lllleeee"[..], config).decode_value().unwrap_err();
        assert!(matches!(err.into_inner(), DecodeError::Depth(3)));
        // the limit applies per value, not per stream
        let mut decoder = Decoder::with_config(&b"llleeellleee"[..], config);
        assert!(decoder.decode_value().is_ok());
        assert!(decoder.decode_value().is_ok());
    }

    #[test]
    fn consecutive_values() {
        let mut decoder = Decoder::new(&b"i1e3:twoli3eetrailing"[..]);
        assert_eq!(Value::Int(1), decoder.decode_value().unwrap());
        assert_eq!(Value::from("two"), decoder.decode_value().unwrap());
        assert_eq!(Value::List(vec![Value::Int(3)]), decoder.decode_value().unwrap());
        assert_eq!(13, decoder.position());
        assert!(!decoder.is_exhausted().unwrap());
        assert_eq!(b"trailing", decoder.into_inner());
    }

    #[test]
    fn buffered_reader() {
        let reader = std::io::BufReader::with_capacity(2, &b"d3:keyl5:value3:endee"[..]);
        let value = crate::parse(reader).unwrap();
        assert_eq!(dict(vec![("key", Value::List(vec![Value::from("value"), Value::from("end")]))]), value);
    }

    struct Broken;

    impl std::io::Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn reader_errors_pass_through() {
        use std::io::Read;
        let reader = std::io::BufReader::new((&b"l4:spam"[..]).chain(Broken));
        let err = crate::parse(reader).unwrap_err();
        assert_eq!(7, err.position());
        match err.into_inner() {
            DecodeError::Io(e) => {
                assert_eq!(std::io::ErrorKind::Other, e.kind());
                assert_eq!("disk on fire", e.to_string());
            },
            other => panic!("expected an io error, got {:?}", other),
        }
    }

    #[test]
    fn errors() {
        assert!(matches!(Decoder::decode(b"").unwrap_err().into_inner(), DecodeError::InvalidFormat(None)));
        assert!(matches!(Decoder::decode(b"x").unwrap_err().into_inner(), DecodeError::InvalidFormat(Some(b'x'))));
        assert!(matches!(Decoder::decode(b"e").unwrap_err().into_inner(), DecodeError::InvalidFormat(Some(b'e'))));
        assert!(matches!(Decoder::decode(b"l").unwrap_err().into_inner(), DecodeError::Eof));
        assert!(matches!(Decoder::decode(b"li1e").unwrap_err().into_inner(), DecodeError::Eof));
        assert!(matches!(Decoder::decode(b"d3:key").unwrap_err().into_inner(), DecodeError::InvalidFormat(None)));
        assert!(matches!(Decoder::decode(b"di1ei2ee").unwrap_err().into_inner(), DecodeError::MissingDigits));
        assert!(matches!(Decoder::decode(b"l3abce").unwrap_err().into_inner(), DecodeError::MissingColon));
        assert!(matches!(Decoder::decode(b"li4xe").unwrap_err().into_inner(), DecodeError::ExpectedTerminator));
        assert!(matches!(Decoder::decode(b"l5:abce").unwrap_err().into_inner(), DecodeError::Eof));
        let err = Decoder::decode(b"li1ei2ex").unwrap_err();
        assert_eq!(7, err.position());
        assert!(matches!(err.into_inner(), DecodeError::InvalidFormat(Some(b'x'))));
    }

    #[test]
    fn encoded_length() {
        let value = Value::List(vec![Value::Int(-12), dict(vec![("k", Value::from("v"))])]);
        let mut buf = Vec::new();
        let c = Encoder::encode(&value, &mut buf).unwrap();
        assert_eq!(b"li-12ed1:k1:vee", &buf[..]);
        assert_eq!(buf.len(), c);
    }

    #[test]
    fn accessors() {
        assert_eq!(Ok(42), Value::Int(42).as_int());
        assert_eq!(Ok(&b"spam"[..]), Value::from("spam").as_bytes());
        assert_eq!(Ok("spam"), Value::from("spam").as_str());
        assert_eq!(Ok(&[Value::Int(1)][..]), Value::List(vec![Value::Int(1)]).as_list());
        assert_eq!(Ok(0), dict(vec![]).as_dict().map(|d| d.len()));
        assert_eq!(Err(TypeMismatch { expected: "integer", found: "string" }), Value::from("42").as_int());
        assert_eq!(Err(TypeMismatch { expected: "string", found: "integer" }), Value::Int(42).as_bytes());
        assert_eq!(Err(TypeMismatch { expected: "list", found: "dictionary" }), dict(vec![]).as_list().map(|l| l.len()));
        assert_eq!(Err(TypeMismatch { expected: "dictionary", found: "list" }), Value::List(vec![]).get(b"key").map(|v| v.is_some()));
        assert!(Value::from(&[0xffu8, 0xfe][..]).as_str().is_err());
    }

    #[test]
    fn into_owned() {
        let owned: Value<'static> = {
            let bytes = b"borrowed".to_vec();
            Value::List(vec![Value::from(&bytes[..]), dict(vec![("key", Value::from(&bytes[..]))])]).into_owned()
        };
        assert!(matches!(owned.as_list().unwrap()[0], Value::Bytes(Cow::Owned(_))));
        assert_eq!(owned.as_list().unwrap()[0], Value::from("borrowed"));
    }

    #[test]
    fn display() {
        let value = dict(vec![
                ("bin", Value::from(&[0xffu8, 0x00, 0x10][..])),
                ("list", Value::List(vec![Value::Int(1), Value::from("a \"quoted\"\nline")])),
                ("empty", Value::List(vec![])),
        ]);
        assert_eq!("{\n  \"bin\": '/wAQ',\n  \"empty\": [],\n  \"list\": [\n    1,\n    \"a \\\"quoted\\\"\\nline\",\n  ],\n}", format!("{}", &value));
    }

    #[test]
    fn from_conversions() {
        let map: BTreeMap<Cow<[u8]>, Value> = BTreeMap::from([(Cow::Borrowed(&b"k"[..]), Value::from(1i64))]);
        assert_eq!(Value::Dict(map.clone()), Value::from(map));
        assert_eq!(Value::from("x"), Value::from("x".to_string()));
        assert_eq!(Value::from(&b"x"[..]), Value::from(b"x".to_vec()));
        assert_eq!(Value::List(vec![Value::Int(1)]), Value::from(vec![Value::from(1i64)]));
    }

    fn assert_roundtrip(val: Value, buf: &mut Vec<u8>) {
        buf.clear();
        let c = Encoder::encode(&val, buf).unwrap();
        assert_eq!(buf.len(), c);
        assert_eq!((val, c), Decoder::decode(buf).unwrap());
    }

}

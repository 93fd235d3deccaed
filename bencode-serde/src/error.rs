use std::fmt::Display;
use serde::{de, ser};
use bencode::{EncodeError, DecodeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[error("{inner} at input position {at}")]
pub struct DeserializationError {
    #[source]
    inner: Error,
    at: usize,
}

impl DeserializationError {
    pub fn into_inner(self) -> Error {
        self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }
}

#[derive(Debug, Error)]
pub enum Error {
    // Decode
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Trailing characters in input")]
    Trailing,
    #[error("Expected end of {0}")]
    ExpectedEnd(&'static str),
    #[error("Unexpected token: expected {expected}, found {found}")]
    Unexpected { expected: &'static str, found: &'static str },
    #[error("Integer didn't fit into target type")]
    Int,
    #[error("Integer {0} is not a bool")]
    Bool(i64),
    #[error("Bytes aren't valid Utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Key `{0}` could not be parsed as {1}")]
    Key(String, &'static str),
    // Encode
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Map key must serialize to a string or an integer. Maybe use crate `serde_with` to transform the map into a vec of tuples")]
    KeyType,
    // Both
    #[error("Type {0} can not be represented in bencode")]
    Unsupported(&'static str),
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn at(self, at: usize) -> DeserializationError {
        DeserializationError { inner: self, at }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_e: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Encode(EncodeError::Io(e))
    }
}

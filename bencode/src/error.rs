use thiserror::Error;

/// A `DecodeError` together with the input position at which decoding stopped.
#[derive(Debug, Error)]
#[error("{inner} at input position {at}")]
pub struct DecoderError {
    #[source]
    inner: DecodeError,
    at: usize,
}

impl DecoderError {
    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn kind(&self) -> &DecodeError {
        &self.inner
    }

    /// Number of bytes consumed from the source before the error was detected.
    pub fn position(&self) -> usize {
        self.at
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Expected at least one decimal digit")]
    MissingDigits,
    #[error("Expected ':' after string length")]
    MissingColon,
    #[error("Expected integer to start with 'i'")]
    ExpectedIntroducer,
    #[error("Expected integer to end with 'e'")]
    ExpectedTerminator,
    #[error("No value starts with {}", describe(.0))]
    InvalidFormat(Option<u8>),
    #[error("Unexpected end of input while decoding")]
    Eof,
    #[error("Integer does not fit into 64 bits")]
    Overflow,
    #[error("Length {0} is not a valid string length")]
    Length(i64),
    #[error("Key {} found twice in dictionary", String::from_utf8_lossy(.0))]
    DuplicateKey(Vec<u8>),
    #[error("Nesting exceeds maximum depth {0}")]
    Depth(usize),
    #[error("IO error {0}")]
    Io(#[source] std::io::Error),
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> DecodeError {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => DecodeError::Eof,
            _ => DecodeError::Io(e),
        }
    }
}

fn describe(lookahead: &Option<u8>) -> String {
    match *lookahead {
        Some(b) if b.is_ascii_graphic() => format!("'{}'", b as char),
        Some(b) => format!("byte 0x{:02x}", b),
        None => "end of input".to_owned(),
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("IO error {0}")]
    Io(#[from] std::io::Error),
    #[error("Length {0} exceeds maximum {}", i64::MAX)]
    Length(usize),
}

/// Returned by the typed accessors of `Value` when the value holds a different variant.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("Expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

#[cfg(test)]
mod tests {
    use super::DecodeError;

    #[test]
    fn unexpected_eof_maps_to_eof() {
        let e: DecodeError = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(e, DecodeError::Eof));
        let e: DecodeError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(e, DecodeError::Io(_)));
    }

    #[test]
    fn display() {
        assert_eq!("No value starts with 'x' at input position 0", DecodeError::InvalidFormat(Some(b'x')).at(0).to_string());
        assert_eq!("No value starts with end of input", DecodeError::InvalidFormat(None).to_string());
        assert_eq!("No value starts with byte 0xff", DecodeError::InvalidFormat(Some(0xff)).to_string());
        assert_eq!("Key a found twice in dictionary", DecodeError::DuplicateKey(b"a".to_vec()).to_string());
    }
}

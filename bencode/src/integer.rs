//! Integers are encoded as `i<decimal>e`.

use crate::decimal;
use crate::error::{DecodeError, EncodeError};
use crate::reader::next_is;
use std::io::{BufRead, Write};

/// Returns the number of written bytes
pub fn encode<W: Write + ?Sized>(value: i64, w: &mut W) -> Result<usize, EncodeError> {
    w.write_all(b"i")?;
    let c = decimal::encode(value, w)?;
    w.write_all(b"e")?;
    Ok(c + 2)
}

/// Returns the decoded integer and the number of consumed bytes
pub fn decode<R: BufRead + ?Sized>(r: &mut R) -> Result<(i64, usize), DecodeError> {
    if !next_is(r, b'i')? {
        return Err(DecodeError::ExpectedIntroducer);
    }
    let (value, c) = decimal::decode(r)?;
    if !next_is(r, b'e')? {
        return Err(DecodeError::ExpectedTerminator);
    }
    Ok((value, c + 2))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::error::DecodeError;

    #[test]
    fn encoding() {
        let mut buf = Vec::new();
        assert_eq!(4, encode(42, &mut buf).unwrap());
        assert_eq!(b"i42e", &buf[..]);
        buf.clear();
        assert_eq!(3, encode(0, &mut buf).unwrap());
        assert_eq!(b"i0e", &buf[..]);
        buf.clear();
        assert_eq!(4, encode(-3, &mut buf).unwrap());
        assert_eq!(b"i-3e", &buf[..]);
    }

    #[test]
    fn decoding() {
        assert_eq!((42, 4), decode(&mut &b"i42e"[..]).unwrap());
        assert_eq!((-3, 4), decode(&mut &b"i-3e"[..]).unwrap());
        assert_eq!((0, 4), decode(&mut &b"i-0e"[..]).unwrap());
        assert_eq!((3, 5), decode(&mut &b"i003e"[..]).unwrap());
        assert_eq!((i64::MIN, 22), decode(&mut &b"i-9223372036854775808e"[..]).unwrap());
    }

    #[test]
    fn leaves_remaining_input() {
        let mut input = &b"i1ei2e"[..];
        assert_eq!((1, 3), decode(&mut input).unwrap());
        assert_eq!(b"i2e", input);
    }

    #[test]
    fn errors() {
        assert!(matches!(decode(&mut &b"42e"[..]), Err(DecodeError::ExpectedIntroducer)));
        assert!(matches!(decode(&mut &b""[..]), Err(DecodeError::ExpectedIntroducer)));
        assert!(matches!(decode(&mut &b"i4x"[..]), Err(DecodeError::ExpectedTerminator)));
        assert!(matches!(decode(&mut &b"i42"[..]), Err(DecodeError::ExpectedTerminator)));
        assert!(matches!(decode(&mut &b"ie"[..]), Err(DecodeError::MissingDigits)));
        assert!(matches!(decode(&mut &b"i-e"[..]), Err(DecodeError::MissingDigits)));
        assert!(matches!(decode(&mut &b"i99999999999999999999e"[..]), Err(DecodeError::Overflow)));
    }
}

//! Byte strings are encoded as `<length>:<bytes>`, where the length is a decimal.

use crate::decimal;
use crate::error::{DecodeError, EncodeError};
use crate::reader::next_is;
use std::convert::TryFrom;
use std::io::{BufRead, Read, Write};

/// Returns the number of written bytes
pub fn encode<W: Write + ?Sized>(bytes: &[u8], w: &mut W) -> Result<usize, EncodeError> {
    let len = i64::try_from(bytes.len()).map_err(|_| EncodeError::Length(bytes.len()))?;
    let c = decimal::encode(len, w)?;
    w.write_all(b":")?;
    w.write_all(bytes)?;
    Ok(c + 1 + bytes.len())
}

/// Decodes the length prefix including the colon. Returns the announced payload length and
/// the number of consumed bytes; the payload itself is left in the source.
pub fn decode_len<R: BufRead + ?Sized>(r: &mut R) -> Result<(usize, usize), DecodeError> {
    let (len, c) = decimal::decode(r)?;
    if !next_is(r, b':')? {
        return Err(DecodeError::MissingColon);
    }
    let len = usize::try_from(len).map_err(|_| DecodeError::Length(len))?;
    Ok((len, c + 1))
}

/// Returns the decoded bytes and the number of consumed bytes
pub fn decode<R: BufRead + ?Sized>(r: &mut R) -> Result<(Vec<u8>, usize), DecodeError> {
    let (len, c) = decode_len(r)?;
    // grow with the input instead of trusting the length prefix for one big allocation
    let mut bytes = Vec::new();
    r.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() < len {
        return Err(DecodeError::Eof);
    }
    Ok((bytes, c + len))
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_len, encode};
    use crate::error::DecodeError;

    #[test]
    fn encoding() {
        let mut buf = Vec::new();
        assert_eq!(5, encode(b"abc", &mut buf).unwrap());
        assert_eq!(b"3:abc", &buf[..]);
        buf.clear();
        assert_eq!(2, encode(b"", &mut buf).unwrap());
        assert_eq!(b"0:", &buf[..]);
        buf.clear();
        let long = [b'x'; 12];
        assert_eq!(15, encode(&long, &mut buf).unwrap());
        assert_eq!(b"12:xxxxxxxxxxxx", &buf[..]);
    }

    #[test]
    fn consumes_exactly_one_string() {
        let mut input = &b"3:abc4:spam"[..];
        assert_eq!((b"abc".to_vec(), 5), decode(&mut input).unwrap());
        assert_eq!(b"4:spam", input);
    }

    #[test]
    fn binary_payload() {
        let mut input = &[b'3', b':', 0x00, 0xff, b':'][..];
        assert_eq!((vec![0x00, 0xff, b':'], 5), decode(&mut input).unwrap());
    }

    #[test]
    fn length_prefix_only() {
        let mut input = &b"10:0123456789"[..];
        assert_eq!((10, 3), decode_len(&mut input).unwrap());
        assert_eq!(b"0123456789", input);
    }

    #[test]
    fn errors() {
        assert!(matches!(decode(&mut &b"3abc"[..]), Err(DecodeError::MissingColon)));
        assert!(matches!(decode(&mut &b"3"[..]), Err(DecodeError::MissingColon)));
        assert!(matches!(decode(&mut &b":abc"[..]), Err(DecodeError::MissingDigits)));
        assert!(matches!(decode(&mut &b"-3:abc"[..]), Err(DecodeError::Length(-3))));
        assert!(matches!(decode(&mut &b"5:abc"[..]), Err(DecodeError::Eof)));
        assert!(matches!(decode(&mut &b"4294967296000:a"[..]), Err(DecodeError::Eof)));
    }
}

//! Base-10 ASCII digit runs, the building block of both string length prefixes and integer
//! payloads. The encoder always writes the canonical form: no leading zeros and no negative
//! zero. The decoder is permissive and accepts `007` as well as `-0`.

use crate::error::{DecodeError, EncodeError};
use crate::reader::peek;
use std::io::{BufRead, Write};

/// An `i64` never needs more than 19 digits plus a sign.
const MAX_WIDTH: usize = 20;

/// Returns the number of written bytes
pub fn encode<W: Write + ?Sized>(value: i64, w: &mut W) -> Result<usize, EncodeError> {
    let mut buf = [0u8; MAX_WIDTH];
    let mut start = buf.len();
    let mut rest = value.unsigned_abs();
    loop {
        start -= 1;
        buf[start] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    if value < 0 {
        start -= 1;
        buf[start] = b'-';
    }
    w.write_all(&buf[start..])?;
    Ok(buf.len() - start)
}

/// Returns the decoded value and the number of consumed bytes. Decoding stops at the first
/// byte which is not a digit; that byte is left in the source.
pub fn decode<R: BufRead + ?Sized>(r: &mut R) -> Result<(i64, usize), DecodeError> {
    let negative = peek(r)? == Some(b'-');
    if negative {
        r.consume(1);
    }
    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(b) = peek(r)? {
        if !b.is_ascii_digit() {
            break;
        }
        let digit = i64::from(b - b'0');
        // accumulate towards the sign so that i64::MIN stays representable
        value = value
            .checked_mul(10)
            .and_then(|v| if negative { v.checked_sub(digit) } else { v.checked_add(digit) })
            .ok_or(DecodeError::Overflow)?;
        r.consume(1);
        digits += 1;
    }
    if digits == 0 {
        return Err(DecodeError::MissingDigits);
    }
    Ok((value, digits + negative as usize))
}

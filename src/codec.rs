//! Borsh-compatible primitive codec for the registry wire format
//!
//! Every instruction payload and account body is a flat sequence of:
//! - fixed-width little-endian integers (`u8`, `u64`, `i64`)
//! - 32-byte public keys
//! - strings: `u32` LE byte length followed by UTF-8 bytes
//! - string sequences: `u32` LE count followed by that many strings
//! - optionals: one presence byte (`0` absent, `1` present) then the value
//!
//! Encoding appends to a caller-owned buffer. Decoding goes through
//! [`AccountReader`], which checks the remaining length before every read
//! and never panics on truncated or hostile input.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Size of the `u32` length/count prefix on variable-length fields
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Errors produced by the primitive codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before a field could be read
    #[error("unexpected end of buffer reading {field}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A declared length or count is above the field's maximum
    #[error("{field} declares length {actual}, maximum is {max}")]
    LengthExceeded {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// A string field is not valid UTF-8
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// An optional field's presence byte is neither 0 nor 1
    #[error("{field} has invalid presence flag {flag}")]
    InvalidPresenceFlag { field: &'static str, flag: u8 },

    /// A value is too long to be described by a `u32` prefix
    #[error("length {0} does not fit in a u32 prefix")]
    LengthOverflow(usize),
}

fn encode_len(out: &mut Vec<u8>, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Append a length-prefixed UTF-8 string
pub fn encode_text(out: &mut Vec<u8>, value: &str) -> Result<(), CodecError> {
    encode_len(out, value.len())?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Append a count-prefixed sequence of length-prefixed strings
pub fn encode_text_sequence<S: AsRef<str>>(out: &mut Vec<u8>, items: &[S]) -> Result<(), CodecError> {
    encode_len(out, items.len())?;
    for item in items {
        encode_text(out, item.as_ref())?;
    }
    Ok(())
}

pub fn encode_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn encode_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn encode_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn encode_pubkey(out: &mut Vec<u8>, value: &Pubkey) {
    out.extend_from_slice(value.as_ref());
}

/// Append an optional string: presence flag, then the string if present
pub fn encode_optional_text(out: &mut Vec<u8>, value: Option<&str>) -> Result<(), CodecError> {
    match value {
        Some(text) => {
            out.push(1);
            encode_text(out, text)
        }
        None => {
            out.push(0);
            Ok(())
        }
    }
}

/// Append an optional string sequence: presence flag, then the sequence
pub fn encode_optional_text_sequence<S: AsRef<str>>(
    out: &mut Vec<u8>,
    items: Option<&[S]>,
) -> Result<(), CodecError> {
    match items {
        Some(items) => {
            out.push(1);
            encode_text_sequence(out, items)
        }
        None => {
            out.push(0);
            Ok(())
        }
    }
}

/// Append an optional `u64`: presence flag, then 8 bytes if present
pub fn encode_optional_u64(out: &mut Vec<u8>, value: Option<u64>) {
    match value {
        Some(v) => {
            out.push(1);
            encode_u64(out, v);
        }
        None => out.push(0),
    }
}

/// Bounds-checked cursor over a byte buffer
///
/// Each `read_*` advances the cursor only on success; a failed read leaves
/// it where the read started, prefixes included. Variable-length reads
/// take a maximum and reject larger declared lengths before touching the
/// payload, so a corrupt length can never trigger a large allocation.
#[derive(Debug, Clone)]
pub struct AccountReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AccountReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::UnexpectedEof {
                field,
                needed: len,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.data[start..start + len])
    }

    fn take_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let bytes = self.take(field, N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.take_array::<1>(field)?[0])
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_i64(&mut self, field: &'static str) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.take_array(field)?))
    }

    pub fn read_pubkey(&mut self, field: &'static str) -> Result<Pubkey, CodecError> {
        Ok(Pubkey::new_from_array(self.take_array(field)?))
    }

    /// Read a fixed-size tag such as an 8-byte discriminator
    pub fn read_tag(&mut self, field: &'static str) -> Result<[u8; 8], CodecError> {
        self.take_array(field)
    }

    // Run a multi-step read, rewinding to the starting offset if any step fails
    fn rewind_on_error<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        let start = self.offset;
        let result = read(self);
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    fn read_len(&mut self, field: &'static str, max: usize) -> Result<usize, CodecError> {
        let declared = self.read_u32(field)? as usize;
        if declared > max {
            return Err(CodecError::LengthExceeded {
                field,
                max,
                actual: declared,
            });
        }
        Ok(declared)
    }

    /// Read a length-prefixed string of at most `max` bytes
    pub fn read_text(&mut self, field: &'static str, max: usize) -> Result<String, CodecError> {
        self.rewind_on_error(|r| {
            let len = r.read_len(field, max)?;
            let bytes = r.take(field, len)?;
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| CodecError::InvalidUtf8 { field })
        })
    }

    /// Read a count-prefixed string sequence with per-item and count bounds
    pub fn read_text_sequence(
        &mut self,
        field: &'static str,
        max_count: usize,
        max_item_len: usize,
    ) -> Result<Vec<String>, CodecError> {
        self.rewind_on_error(|r| {
            let count = r.read_len(field, max_count)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(r.read_text(field, max_item_len)?);
            }
            Ok(items)
        })
    }

    fn read_presence(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            flag => Err(CodecError::InvalidPresenceFlag { field, flag }),
        }
    }

    fn read_optional<T>(
        &mut self,
        field: &'static str,
        read: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<Option<T>, CodecError> {
        self.rewind_on_error(|r| {
            if r.read_presence(field)? {
                read(r).map(Some)
            } else {
                Ok(None)
            }
        })
    }

    pub fn read_optional_text(
        &mut self,
        field: &'static str,
        max: usize,
    ) -> Result<Option<String>, CodecError> {
        self.read_optional(field, |r| r.read_text(field, max))
    }

    pub fn read_optional_text_sequence(
        &mut self,
        field: &'static str,
        max_count: usize,
        max_item_len: usize,
    ) -> Result<Option<Vec<String>>, CodecError> {
        self.read_optional(field, |r| r.read_text_sequence(field, max_count, max_item_len))
    }

    pub fn read_optional_u64(&mut self, field: &'static str) -> Result<Option<u64>, CodecError> {
        self.read_optional(field, |r| r.read_u64(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_text_layout() {
        let mut out = Vec::new();
        encode_text(&mut out, "abc").unwrap();
        assert_eq!(out, vec![3, 0, 0, 0, b'a', b'b', b'c']);

        let mut empty = Vec::new();
        encode_text(&mut empty, "").unwrap();
        assert_eq!(empty, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_text_sequence_layout() {
        let mut out = Vec::new();
        encode_text_sequence(&mut out, &["a", "bc"]).unwrap();
        assert_eq!(out, vec![2, 0, 0, 0, 1, 0, 0, 0, b'a', 2, 0, 0, 0, b'b', b'c']);
    }

    #[test]
    fn test_encode_optionals() {
        let mut out = Vec::new();
        encode_optional_text(&mut out, None).unwrap();
        encode_optional_u64(&mut out, Some(7));
        encode_optional_text_sequence::<&str>(&mut out, None).unwrap();
        assert_eq!(out, vec![0, 1, 7, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_integers_little_endian() {
        let mut out = Vec::new();
        encode_u64(&mut out, 0x0102_0304_0506_0708);
        encode_i64(&mut out, -2);
        encode_u8(&mut out, 9);
        assert_eq!(&out[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&out[8..16], &[0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(out[16], 9);
    }

    #[test]
    fn test_read_text_rejects_length_past_buffer() {
        // Declares 10 bytes, only 2 follow
        let data = [10, 0, 0, 0, b'h', b'i'];
        let mut reader = AccountReader::new(&data);
        let err = reader.read_text("name", 64).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof { needed: 10, remaining: 2, .. }));
    }

    #[test]
    fn test_read_text_rejects_length_above_max() {
        let mut data = Vec::new();
        encode_text(&mut data, &"x".repeat(65)).unwrap();
        let mut reader = AccountReader::new(&data);
        assert_eq!(
            reader.read_text("name", 64).unwrap_err(),
            CodecError::LengthExceeded { field: "name", max: 64, actual: 65 }
        );
    }

    #[test]
    fn test_read_text_rejects_invalid_utf8() {
        let data = [2, 0, 0, 0, 0xff, 0xfe];
        let mut reader = AccountReader::new(&data);
        assert_eq!(
            reader.read_text("name", 64).unwrap_err(),
            CodecError::InvalidUtf8 { field: "name" }
        );
    }

    #[test]
    fn test_huge_declared_count_does_not_allocate() {
        let data = [0xff, 0xff, 0xff, 0xff];
        let mut reader = AccountReader::new(&data);
        assert!(matches!(
            reader.read_text_sequence("capabilities", 8, 32),
            Err(CodecError::LengthExceeded { actual: 0xffff_ffff, .. })
        ));
    }

    #[test]
    fn test_invalid_presence_flag() {
        let data = [2u8];
        let mut reader = AccountReader::new(&data);
        assert_eq!(
            reader.read_optional_u64("pricing").unwrap_err(),
            CodecError::InvalidPresenceFlag { field: "pricing", flag: 2 }
        );
    }

    #[test]
    fn test_failed_read_does_not_advance() {
        let data = [1, 2, 3];
        let mut reader = AccountReader::new(&data);
        assert!(reader.read_u64("amount").is_err());
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.read_u8("status").unwrap(), 1);
        assert_eq!(reader.remaining(), 2);
    }

    #[test]
    fn test_failed_variable_reads_rewind_past_prefixes() {
        // Valid prefix, payload over the bound
        let mut data = Vec::new();
        encode_text(&mut data, &"x".repeat(40)).unwrap();
        let mut reader = AccountReader::new(&data);
        assert!(reader.read_text("capability", 32).is_err());
        assert_eq!(reader.offset(), 0);

        // Second item truncated mid-sequence
        let mut data = Vec::new();
        encode_text_sequence(&mut data, &["coding", "debugging"]).unwrap();
        data.truncate(data.len() - 3);
        let mut reader = AccountReader::new(&data);
        assert!(reader.read_text_sequence("capabilities", 8, 32).is_err());
        assert_eq!(reader.offset(), 0);

        // Present flag, missing value
        let data = [1u8, 7, 7];
        let mut reader = AccountReader::new(&data);
        assert!(reader.read_optional_u64("pricing").is_err());
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.read_u8("flag").unwrap(), 1);
    }

    proptest! {
        #[test]
        fn prop_text_round_trip(s in ".{0,64}") {
            let mut out = Vec::new();
            encode_text(&mut out, &s).unwrap();
            let mut reader = AccountReader::new(&out);
            prop_assert_eq!(reader.read_text("text", usize::MAX).unwrap(), s);
            prop_assert_eq!(reader.remaining(), 0);
        }

        #[test]
        fn prop_text_sequence_round_trip(items in proptest::collection::vec("[a-z]{0,32}", 0..8)) {
            let mut out = Vec::new();
            encode_text_sequence(&mut out, &items).unwrap();
            let mut reader = AccountReader::new(&out);
            prop_assert_eq!(reader.read_text_sequence("caps", 8, 32).unwrap(), items);
        }

        #[test]
        fn prop_optionals_round_trip(
            text in proptest::option::of("[ -~]{0,40}"),
            items in proptest::option::of(proptest::collection::vec("[a-z]{1,8}", 0..4)),
            number in proptest::option::of(any::<u64>()),
        ) {
            let mut out = Vec::new();
            encode_optional_text(&mut out, text.as_deref()).unwrap();
            encode_optional_text_sequence(&mut out, items.as_deref()).unwrap();
            encode_optional_u64(&mut out, number);

            let mut reader = AccountReader::new(&out);
            prop_assert_eq!(reader.read_optional_text("text", 64).unwrap(), text);
            prop_assert_eq!(reader.read_optional_text_sequence("items", 8, 32).unwrap(), items);
            prop_assert_eq!(reader.read_optional_u64("number").unwrap(), number);
        }

        #[test]
        fn prop_integers_round_trip(a in any::<u64>(), b in any::<i64>(), c in any::<u8>()) {
            let mut out = Vec::new();
            encode_u64(&mut out, a);
            encode_i64(&mut out, b);
            encode_u8(&mut out, c);
            let mut reader = AccountReader::new(&out);
            prop_assert_eq!(reader.read_u64("a").unwrap(), a);
            prop_assert_eq!(reader.read_i64("b").unwrap(), b);
            prop_assert_eq!(reader.read_u8("c").unwrap(), c);
        }
    }
}

//! Base64 Codec
//!
//! RFC 4648 standard alphabet with `=` padding, matching the server-side
//! decoder used for credential and certificate strings. Buffers are short
//! and sized up front, so the codec is a pure slice transform with no
//! streaming state.

use thiserror::Error;
use tracing::warn;

/// Encoding alphabet; index 64 is the padding character.
const ALPHABET: &[u8; 65] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

/// Padding character.
pub const PAD: u8 = b'=';

const INVALID: u8 = 0xff;
const PAD_VALUE: u8 = 64;

/// Inverse of [`ALPHABET`]: character -> 6-bit value, 64 for padding.
const DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Base64 codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base64Error {
    /// Destination cannot hold the output.
    #[error("output buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes the operation may write.
        required: usize,
        /// Bytes the caller supplied.
        available: usize,
    },
    /// Input contains a byte outside the alphabet.
    #[error("invalid base64 byte 0x{byte:02x} at offset {offset}")]
    InvalidByte {
        /// Offset of the byte in the input.
        offset: usize,
        /// The offending byte.
        byte: u8,
    },
    /// Padding appears somewhere other than the end of the input.
    #[error("misplaced padding at offset {0}")]
    InvalidPadding(usize),
}

/// Length of the encoding of `n` bytes: `ceil(n / 3) * 4`.
#[inline]
pub const fn encoded_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}

/// Upper bound on the decoded size of `n` input characters.
///
/// `n` is rounded up to a multiple of 4 first. The real output can be one or
/// two bytes shorter because of padding; use this for buffer sizing only.
#[inline]
pub const fn decoded_len(n: usize) -> usize {
    n.div_ceil(4) * 3
}

/// Encode `src` into `dest`, returning the number of characters written.
///
/// Always writes exactly [`encoded_len`]`(src.len())` bytes.
pub fn encode_into(dest: &mut [u8], src: &[u8]) -> Result<usize, Base64Error> {
    let required = encoded_len(src.len());
    if dest.len() < required {
        return Err(Base64Error::BufferTooSmall {
            required,
            available: dest.len(),
        });
    }

    encode_groups(dest, src);
    Ok(required)
}

/// Encode bytes to a new string.
pub fn encode(src: &[u8]) -> String {
    let mut out = vec![0u8; encoded_len(src.len())];
    encode_groups(&mut out, src);
    out.into_iter().map(char::from).collect()
}

/// Encode every group of `src`; `dest` holds at least `encoded_len` bytes.
fn encode_groups(dest: &mut [u8], src: &[u8]) {
    for (group, out) in src.chunks(3).zip(dest.chunks_mut(4)) {
        let b0 = group[0];
        let b1 = group.get(1).copied().unwrap_or(0);
        let b2 = group.get(2).copied().unwrap_or(0);

        out[0] = ALPHABET[(b0 >> 2) as usize];
        out[1] = ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize];
        out[2] = if group.len() > 1 {
            ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize]
        } else {
            PAD
        };
        out[3] = if group.len() > 2 {
            ALPHABET[(b2 & 0x3f) as usize]
        } else {
            PAD
        };
    }
}

/// Decode `src` into `dest`, returning the number of bytes produced.
///
/// `dest` must hold [`decoded_len`]`(src.len())` bytes. Input whose length is
/// not a multiple of 4 is padded with `=` before decoding; this tolerates
/// truncated text but does not guarantee a meaningful result.
pub fn decode_into(dest: &mut [u8], src: &[u8]) -> Result<usize, Base64Error> {
    let required = decoded_len(src.len());
    if dest.len() < required {
        return Err(Base64Error::BufferTooSmall {
            required,
            available: dest.len(),
        });
    }

    if src.len() % 4 == 0 {
        return decode_groups(dest, src);
    }

    warn!(len = src.len(), "base64 input length not a multiple of 4, padding");
    let mut scratch = src.to_vec();
    scratch.resize(src.len().div_ceil(4) * 4, PAD);
    decode_groups(dest, &scratch)
}

/// Decode text to a new buffer.
pub fn decode(src: impl AsRef<[u8]>) -> Result<Vec<u8>, Base64Error> {
    let src = src.as_ref();
    let mut out = vec![0u8; decoded_len(src.len())];
    let written = decode_into(&mut out, src)?;
    out.truncate(written);
    Ok(out)
}

/// Decode a padded input whose length is a multiple of 4.
fn decode_groups(dest: &mut [u8], src: &[u8]) -> Result<usize, Base64Error> {
    let groups = src.len() / 4;
    let mut written = 0;

    for (g, (chunk, out)) in src.chunks_exact(4).zip(dest.chunks_mut(3)).enumerate() {
        let base = g * 4;
        let last = g + 1 == groups;

        let mut v = [0u8; 4];
        for (k, &c) in chunk.iter().enumerate() {
            let value = DECODE_TABLE[c as usize];
            if value == INVALID {
                return Err(Base64Error::InvalidByte {
                    offset: base + k,
                    byte: c,
                });
            }
            v[k] = value;
        }

        let produced = group_output_len(&v, base, last)?;
        let v = v.map(|x| if x == PAD_VALUE { 0 } else { x });

        let bytes = [
            (v[0] << 2) | (v[1] >> 4),
            (v[1] << 4) | (v[2] >> 2),
            (v[2] << 6) | v[3],
        ];
        out[..produced].copy_from_slice(&bytes[..produced]);
        written += produced;
    }

    Ok(written)
}

/// Bytes produced by one group, validating where padding sits.
///
/// Padding is only legal at the tail of the final group. A pad in the third
/// slot suppresses two bytes, in the fourth slot one byte.
fn group_output_len(v: &[u8; 4], base: usize, last: bool) -> Result<usize, Base64Error> {
    let Some(first) = v.iter().position(|&x| x == PAD_VALUE) else {
        return Ok(3);
    };

    if !last || first == 0 {
        return Err(Base64Error::InvalidPadding(base + first));
    }
    // Once padding starts, the rest of the group must be padding
    if let Some(k) = (first..4).find(|&k| v[k] != PAD_VALUE) {
        return Err(Base64Error::InvalidPadding(base + k));
    }

    // "x===" only arises from padding a truncated input; keep its one byte
    Ok(match first {
        1 | 2 => 1,
        _ => 2,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 4);
        assert_eq!(encoded_len(2), 4);
        assert_eq!(encoded_len(3), 4);
        assert_eq!(encoded_len(4), 8);
        assert_eq!(encoded_len(6), 8);
    }

    #[test]
    fn test_decoded_len_is_upper_bound() {
        assert_eq!(decoded_len(0), 0);
        assert_eq!(decoded_len(4), 3);
        assert_eq!(decoded_len(5), 6);
        assert_eq!(decoded_len(8), 6);
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(&[0x4d, 0x61, 0x6e]), "TWFu");
        assert_eq!(encode(&[0x4d]), "TQ==");
        assert_eq!(encode(b"Ma"), "TWE=");
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
        assert_eq!(encode(&[0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn test_encode_into_reports_length() {
        let mut buf = [0u8; 8];
        let n = encode_into(&mut buf, b"hello").unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buf, b"aGVsbG8=");
    }

    #[test]
    fn test_encode_into_buffer_too_small() {
        let mut buf = [0u8; 3];
        assert_eq!(
            encode_into(&mut buf, b"M"),
            Err(Base64Error::BufferTooSmall {
                required: 4,
                available: 3
            })
        );
        assert_eq!(buf, [0u8; 3]);
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode("TWFu").unwrap(), b"Man");
        assert_eq!(decode("TQ==").unwrap(), b"M");
        assert_eq!(decode("TWE=").unwrap(), b"Ma");
        assert_eq!(decode("").unwrap(), b"");
        assert_eq!(decode("+/8=").unwrap(), [0xfb, 0xff]);
    }

    #[test]
    fn test_decode_into_count_reduced_by_padding() {
        let mut buf = [0u8; 6];
        assert_eq!(decode_into(&mut buf, b"Zm9vYg==").unwrap(), 4);
        assert_eq!(&buf[..4], b"foob");
        assert_eq!(decode_into(&mut buf, b"Zm9vYmE=").unwrap(), 5);
        assert_eq!(&buf[..5], b"fooba");
    }

    #[test]
    fn test_decode_tolerates_truncated_input() {
        // Missing padding is filled in before decoding
        assert_eq!(decode("TQ").unwrap(), b"M");
        assert_eq!(decode("TWE").unwrap(), b"Ma");
        assert_eq!(decode("Zm9vYg").unwrap(), b"foob");
        // A lone trailing character still yields a byte
        assert_eq!(decode("TWFuT").unwrap().len(), 4);
    }

    #[test]
    fn test_decode_rejects_invalid_bytes() {
        assert_eq!(
            decode("TW-u"),
            Err(Base64Error::InvalidByte {
                offset: 2,
                byte: b'-'
            })
        );
        assert!(matches!(
            decode("TWFu\n"),
            Err(Base64Error::InvalidByte { offset: 4, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_misplaced_padding() {
        assert_eq!(decode("=QAA"), Err(Base64Error::InvalidPadding(0)));
        assert_eq!(decode("TQ==TWFu"), Err(Base64Error::InvalidPadding(2)));
        assert_eq!(decode("TQ=u"), Err(Base64Error::InvalidPadding(3)));
    }

    #[test]
    fn test_decode_into_buffer_too_small() {
        let mut buf = [0u8; 2];
        assert!(matches!(
            decode_into(&mut buf, b"TWFu"),
            Err(Base64Error::BufferTooSmall { required: 3, .. })
        ));
    }

    #[test]
    fn test_alphabet_tables_agree() {
        for (i, &c) in ALPHABET.iter().enumerate() {
            assert_eq!(DECODE_TABLE[c as usize] as usize, i);
        }
        let valid = DECODE_TABLE.iter().filter(|&&v| v != INVALID).count();
        assert_eq!(valid, 65);
    }

    proptest! {
        #[test]
        fn prop_round_trip(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let text = encode(&data);
            prop_assert_eq!(text.len(), encoded_len(data.len()));
            prop_assert_eq!(text.len() % 4, 0);
            let back = decode(&text).unwrap();
            prop_assert_eq!(back, data);
        }

        #[test]
        fn prop_decoded_never_exceeds_bound(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = encode(&data);
            let mut buf = vec![0u8; decoded_len(text.len())];
            let n = decode_into(&mut buf, text.as_bytes()).unwrap();
            prop_assert!(n <= decoded_len(text.len()));
            prop_assert!(decoded_len(text.len()) - n <= 2);
        }
    }
}

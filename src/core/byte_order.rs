//! Byte Order Fixing
//!
//! Every binary structure the SDK persists is little-endian on disk. Readers
//! and writers call [`fix_byte_order`] on each multi-byte field; on
//! little-endian hosts this compiles to nothing, on big-endian hosts it
//! reverses the bytes in place.
//!
//! Only 1, 2, 4 and 8 byte scalars implement [`ByteSwap`]. Anything else is
//! rejected by the type checker, there is no runtime fallback.

use thiserror::Error;

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width scalar whose byte order can be reversed.
///
/// Sealed: implemented for `u8 i8 u16 i16 u32 i32 u64 i64 f32 f64` only.
pub trait ByteSwap: Copy + sealed::Sealed {
    /// Width of the value in bytes.
    const WIDTH: usize;

    /// Return the value with its bytes reversed.
    fn byte_swapped(self) -> Self;

    /// Write the value in host order into `out[..Self::WIDTH]`.
    fn write_ne(self, out: &mut [u8]);

    /// Read a value in host order from `src[..Self::WIDTH]`.
    fn read_ne(src: &[u8]) -> Self;
}

/// Swap the two bytes of a 16-bit word.
#[inline]
pub const fn swap16(x: u16) -> u16 {
    (x << 8) | (x >> 8)
}

/// Reverse the four bytes of a 32-bit word.
#[inline]
pub const fn swap32(x: u32) -> u32 {
    (x << 24) | ((x << 8) & 0x00ff_0000) | ((x >> 8) & 0x0000_ff00) | (x >> 24)
}

/// Reverse the eight bytes of a 64-bit word.
///
/// Exchanges the 32-bit halves, then reverses each half.
#[inline]
pub const fn swap64(x: u64) -> u64 {
    let hi = swap32(x as u32) as u64;
    let lo = swap32((x >> 32) as u32) as u64;
    (hi << 32) | lo
}

macro_rules! impl_byte_swap {
    ($($ty:ty => |$v:ident| $swap:expr;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl ByteSwap for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn byte_swapped(self) -> Self {
                    let $v = self;
                    $swap
                }

                #[inline]
                fn write_ne(self, out: &mut [u8]) {
                    out[..Self::WIDTH].copy_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn read_ne(src: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(&src[..Self::WIDTH]);
                    <$ty>::from_ne_bytes(bytes)
                }
            }
        )*
    };
}

impl_byte_swap! {
    u8 => |v| v;
    i8 => |v| v;
    u16 => |v| swap16(v);
    i16 => |v| swap16(v as u16) as i16;
    u32 => |v| swap32(v);
    i32 => |v| swap32(v as u32) as i32;
    u64 => |v| swap64(v);
    i64 => |v| swap64(v as u64) as i64;
    f32 => |v| f32::from_bits(swap32(v.to_bits()));
    f64 => |v| f64::from_bits(swap64(v.to_bits()));
}

/// Reverse the byte order of `value` in place, unconditionally.
#[inline]
pub fn swap<T: ByteSwap>(value: &mut T) {
    *value = value.byte_swapped();
}

/// Convert between on-disk (little-endian) and host byte order in place.
///
/// A no-op on little-endian targets.
#[inline]
pub fn fix_byte_order<T: ByteSwap>(value: &mut T) {
    #[cfg(target_endian = "big")]
    swap(value);
    #[cfg(target_endian = "little")]
    let _ = value;
}

/// Apply [`fix_byte_order`] to every element of `values`.
#[inline]
pub fn fix_byte_order_slice<T: ByteSwap>(values: &mut [T]) {
    for value in values.iter_mut() {
        fix_byte_order(value);
    }
}

// =============================================================================
// LITTLE-ENDIAN READER / WRITER
// =============================================================================

/// Errors raised while reading little-endian data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteOrderError {
    /// Not enough input left for the requested value.
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes required by the read.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
}

/// Appends scalars to a buffer in on-disk (little-endian) order.
#[derive(Debug, Default, Clone)]
pub struct LeWriter {
    buf: Vec<u8>,
}

impl LeWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append one value.
    pub fn put<T: ByteSwap>(&mut self, mut value: T) {
        fix_byte_order(&mut value);
        let start = self.buf.len();
        self.buf.resize(start + T::WIDTH, 0);
        value.write_ne(&mut self.buf[start..]);
    }

    /// Append every value of a slice.
    pub fn put_slice<T: ByteSwap>(&mut self, values: &[T]) {
        self.buf.reserve(values.len() * T::WIDTH);
        for &value in values {
            self.put(value);
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads scalars stored in on-disk (little-endian) order.
#[derive(Debug, Clone)]
pub struct LeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> LeReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read one value and advance.
    pub fn get<T: ByteSwap>(&mut self) -> Result<T, ByteOrderError> {
        let remaining = self.remaining();
        if remaining < T::WIDTH {
            return Err(ByteOrderError::UnexpectedEof {
                needed: T::WIDTH,
                remaining,
            });
        }
        let mut value = T::read_ne(&self.data[self.pos..]);
        fix_byte_order(&mut value);
        self.pos += T::WIDTH;
        Ok(value)
    }

    /// Fill `out` with consecutive values.
    ///
    /// Nothing is consumed if the input is too short for the whole slice.
    pub fn get_into<T: ByteSwap>(&mut self, out: &mut [T]) -> Result<(), ByteOrderError> {
        let needed = out.len() * T::WIDTH;
        let remaining = self.remaining();
        if remaining < needed {
            return Err(ByteOrderError::UnexpectedEof { needed, remaining });
        }
        for slot in out.iter_mut() {
            *slot = self.get()?;
        }
        Ok(())
    }

    /// Current offset into the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_swap_widths() {
        let mut a = 0x12u8;
        swap(&mut a);
        assert_eq!(a, 0x12);

        let mut b = 0x1234u16;
        swap(&mut b);
        assert_eq!(b, 0x3412);

        let mut c = 0x1234_5678u32;
        swap(&mut c);
        assert_eq!(c, 0x7856_3412);

        let mut d = 0x0102_0304_0506_0708u64;
        swap(&mut d);
        assert_eq!(d, 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_swap_matches_std() {
        assert_eq!(swap16(0xabcd), 0xabcdu16.swap_bytes());
        assert_eq!(swap32(0xdead_beef), 0xdead_beefu32.swap_bytes());
        assert_eq!(
            swap64(0x0123_4567_89ab_cdef),
            0x0123_4567_89ab_cdefu64.swap_bytes()
        );
    }

    #[test]
    fn test_swap_signed_and_float() {
        let mut i = -2i32;
        swap(&mut i);
        assert_eq!(i as u32, 0xfeff_ffff);

        let mut f = 1.0f32;
        swap(&mut f);
        assert_eq!(f.to_bits(), 0x0000_803f);
        swap(&mut f);
        assert_eq!(f, 1.0);

        let mut d = -0.5f64;
        let bits = d.to_bits();
        swap(&mut d);
        assert_eq!(d.to_bits(), bits.swap_bytes());
    }

    #[test]
    fn test_fix_byte_order_matches_le_layout() {
        let mut value = 0x1122_3344u32;
        fix_byte_order(&mut value);
        assert_eq!(value.to_ne_bytes(), 0x1122_3344u32.to_le_bytes());
    }

    #[test]
    fn test_fix_byte_order_slice() {
        let original = [1u16, 0x0200, 0xfffe, 0x1234];
        let mut values = original;
        fix_byte_order_slice(&mut values);
        for (fixed, raw) in values.iter().zip(original.iter()) {
            assert_eq!(fixed.to_ne_bytes(), raw.to_le_bytes());
        }
        fix_byte_order_slice(&mut values);
        assert_eq!(values, original);
    }

    #[test]
    fn test_writer_layout_is_little_endian() {
        let mut w = LeWriter::new();
        w.put(0x0102u16);
        w.put(0x0304_0506u32);
        w.put(-1i8);
        assert_eq!(w.as_bytes(), &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0xff]);
        assert_eq!(w.len(), 7);
    }

    #[test]
    fn test_reader_round_trip() {
        let mut w = LeWriter::with_capacity(32);
        w.put(42u64);
        w.put(-7i16);
        w.put(2.5f64);
        w.put_slice(&[1u32, 2, 3]);
        let bytes = w.into_bytes();

        let mut r = LeReader::new(&bytes);
        assert_eq!(r.get::<u64>().unwrap(), 42);
        assert_eq!(r.get::<i16>().unwrap(), -7);
        assert_eq!(r.get::<f64>().unwrap(), 2.5);
        let mut words = [0u32; 3];
        r.get_into(&mut words).unwrap();
        assert_eq!(words, [1, 2, 3]);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_reader_short_input() {
        let bytes = [1u8, 2, 3];
        let mut r = LeReader::new(&bytes);
        assert_eq!(
            r.get::<u32>(),
            Err(ByteOrderError::UnexpectedEof {
                needed: 4,
                remaining: 3
            })
        );
        // Failed read consumes nothing
        assert_eq!(r.position(), 0);
        assert_eq!(r.get::<u16>().unwrap(), 0x0201);

        let mut out = [0u16; 2];
        assert!(r.get_into(&mut out).is_err());
        assert_eq!(r.position(), 2);
    }

    proptest! {
        #[test]
        fn prop_swap_twice_is_identity_u16(x: u16) {
            let mut v = x;
            swap(&mut v);
            swap(&mut v);
            prop_assert_eq!(v, x);
        }

        #[test]
        fn prop_swap_twice_is_identity_u32(x: u32) {
            let mut v = x;
            swap(&mut v);
            swap(&mut v);
            prop_assert_eq!(v, x);
        }

        #[test]
        fn prop_swap_twice_is_identity_i64(x: i64) {
            let mut v = x;
            swap(&mut v);
            swap(&mut v);
            prop_assert_eq!(v, x);
        }

        #[test]
        fn prop_swap64_is_full_reversal(x: u64) {
            let mut bytes = x.to_ne_bytes();
            bytes.reverse();
            prop_assert_eq!(swap64(x), u64::from_ne_bytes(bytes));
        }
    }
}

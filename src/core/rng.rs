//! Deterministic Random Number Generator
//!
//! MT19937 Mersenne Twister: 624-word state, period 2^19937 - 1.
//! Given the same seed, produces the identical sequence on all platforms,
//! and the full state can be checkpointed to a fixed-size blob and restored.
//!
//! ```text
//! ┌──────────┐  seed / seed_array / first draw   ┌──────────┐
//! │ Unseeded │ ─────────────────────────────────▶ │  Seeded  │ ◀─┐
//! │ idx=625  │                                    │ idx≤624  │   │ restore_state
//! └──────────┘                                    └──────────┘ ──┘
//! ```

use thiserror::Error;
use tracing::{debug, trace};

use super::byte_order::{ByteOrderError, LeReader, LeWriter};

/// Number of words in the state vector.
pub const STATE_WORDS: usize = 624;

/// Size in bytes of a saved state blob: 624 words plus the cursor.
pub const STATE_SIZE: usize = (STATE_WORDS + 1) * 4;

/// Seed used when drawing from a generator that was never seeded.
pub const DEFAULT_SEED: u32 = 5489;

const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Cursor value marking an unseeded generator.
const UNSEEDED: usize = STATE_WORDS + 1;

/// Seed applied before mixing in an array key.
const ARRAY_SEED: u32 = 19_650_218;

/// Errors from restoring or saving generator state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Output buffer cannot hold the state blob.
    #[error("state buffer too small: {required} bytes required")]
    BufferTooSmall {
        /// Bytes needed for a complete blob.
        required: usize,
    },
    /// Blob ended before the state was complete.
    #[error("truncated state blob: {0}")]
    Truncated(#[from] ByteOrderError),
    /// Cursor stored in the blob is out of range.
    #[error("invalid state cursor: {0}")]
    InvalidCursor(u32),
}

/// MT19937 pseudo-random generator with save/restore.
///
/// # Determinism Guarantee
///
/// Identical seeds yield identical sequences on every platform. The saved
/// state blob is little-endian regardless of host.
///
/// # Example
///
/// ```
/// use playground::core::rng::MersenneTwister;
///
/// let mut rng = MersenneTwister::with_seed(1);
/// assert_eq!(rng.rand32(), 1791095845);
/// ```
#[derive(Clone)]
pub struct MersenneTwister {
    mt: [u32; STATE_WORDS],
    index: usize,
}

impl Default for MersenneTwister {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MersenneTwister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MersenneTwister")
            .field("index", &self.index)
            .field("seeded", &self.is_seeded())
            .finish_non_exhaustive()
    }
}

impl MersenneTwister {
    /// Create an unseeded generator.
    ///
    /// The first draw seeds it with [`DEFAULT_SEED`].
    pub fn new() -> Self {
        Self {
            mt: [0; STATE_WORDS],
            index: UNSEEDED,
        }
    }

    /// Create a generator seeded with `seed`.
    pub fn with_seed(seed: u32) -> Self {
        let mut rng = Self::new();
        rng.seed(seed);
        rng
    }

    /// Create a generator seeded from an array key.
    pub fn with_key(key: &[u32]) -> Self {
        let mut rng = Self::new();
        rng.seed_array(key);
        rng
    }

    /// True once the state vector has been initialised.
    pub fn is_seeded(&self) -> bool {
        self.index != UNSEEDED
    }

    /// Reinitialise the state from a single 32-bit seed.
    ///
    /// The next draw regenerates the whole vector.
    pub fn seed(&mut self, seed: u32) {
        self.mt[0] = seed;
        for i in 1..STATE_WORDS {
            let prev = self.mt[i - 1];
            self.mt[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        self.index = STATE_WORDS;
    }

    /// Reinitialise the state from an array key.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty.
    pub fn seed_array(&mut self, key: &[u32]) {
        assert!(!key.is_empty(), "seed_array requires a non-empty key");

        self.seed(ARRAY_SEED);
        let mut i = 1usize;
        let mut j = 0usize;

        for _ in 0..STATE_WORDS.max(key.len()) {
            let prev = self.mt[i - 1];
            self.mt[i] = (self.mt[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= STATE_WORDS {
                self.mt[0] = self.mt[STATE_WORDS - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }

        for _ in 0..STATE_WORDS - 1 {
            let prev = self.mt[i - 1];
            self.mt[i] = (self.mt[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= STATE_WORDS {
                self.mt[0] = self.mt[STATE_WORDS - 1];
                i = 1;
            }
        }

        // MSB is 1, assuring a non-zero initial vector
        self.mt[0] = UPPER_MASK;
        self.index = STATE_WORDS;
    }

    /// Regenerate all 624 words in place.
    fn twist(&mut self) {
        trace!("regenerating mersenne twister state");
        for k in 0..STATE_WORDS {
            let y = (self.mt[k] & UPPER_MASK) | (self.mt[(k + 1) % STATE_WORDS] & LOWER_MASK);
            let mag = if y & 1 == 0 { 0 } else { MATRIX_A };
            self.mt[k] = self.mt[(k + M) % STATE_WORDS] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }

    /// Generate the next tempered 32-bit value.
    #[inline]
    pub fn rand32(&mut self) -> u32 {
        if self.index >= STATE_WORDS {
            if self.index == UNSEEDED {
                self.seed(DEFAULT_SEED);
            }
            self.twist();
        }

        let mut y = self.mt[self.index];
        self.index += 1;

        // Tempering
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    /// Generate a float in `[0, 1)`.
    ///
    /// The divisor is 2^32 + 128 so the result stays below 1.0 after
    /// narrowing to `f32`.
    #[inline]
    pub fn rand_float(&mut self) -> f32 {
        (self.rand32() as f64 * (1.0 / 4_294_967_424.0)) as f32
    }

    /// Generate a double in `[0, 1)` with 53 bits of randomness.
    #[inline]
    pub fn rand_double(&mut self) -> f64 {
        let a = (self.rand32() >> 5) as f64;
        let b = (self.rand32() >> 6) as f64;
        (a * 67_108_864.0 + b) * (1.0 / 9_007_199_254_740_992.0)
    }

    /// Generate an integer in `[lo, hi]`, both bounds inclusive.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    #[inline]
    pub fn rand_range(&mut self, lo: i32, hi: i32) -> i32 {
        assert!(lo <= hi, "rand_range called with lo {} > hi {}", lo, hi);
        let span = hi as i64 - lo as i64 + 1;
        let offset = (self.rand_double() * span as f64) as i64;
        (lo as i64 + offset) as i32
    }

    /// Fill a byte slice with random bytes.
    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.rand32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.index_below(i + 1);
            slice.swap(i, j);
        }
    }

    /// Uniform index in `[0, n)`; same draw as `rand_range(0, n - 1)` when
    /// `n` fits in `i32`.
    fn index_below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let idx = (self.rand_double() * n as f64) as usize;
        idx.min(n - 1)
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            Some(&slice[self.index_below(slice.len())])
        }
    }

    /// Write the state blob into `buf`.
    ///
    /// Returns the number of bytes written ([`STATE_SIZE`]). If `buf` is too
    /// small nothing is written and the required size is reported.
    pub fn save_state(&self, buf: &mut [u8]) -> Result<usize, StateError> {
        if buf.len() < STATE_SIZE {
            return Err(StateError::BufferTooSmall {
                required: STATE_SIZE,
            });
        }
        let blob = self.state_bytes();
        buf[..STATE_SIZE].copy_from_slice(&blob);
        Ok(STATE_SIZE)
    }

    /// Serialize the state into a newly allocated blob.
    pub fn state_bytes(&self) -> Vec<u8> {
        let mut w = LeWriter::with_capacity(STATE_SIZE);
        w.put_slice(&self.mt);
        w.put(self.index as u32);
        w.into_bytes()
    }

    /// Replace the state with one previously produced by [`save_state`].
    ///
    /// On error the generator is left unchanged.
    ///
    /// [`save_state`]: Self::save_state
    pub fn restore_state(&mut self, buf: &[u8]) -> Result<(), StateError> {
        let mut r = LeReader::new(buf);
        let mut mt = [0u32; STATE_WORDS];
        r.get_into(&mut mt)?;
        let cursor: u32 = r.get()?;
        if cursor as usize > UNSEEDED {
            return Err(StateError::InvalidCursor(cursor));
        }

        self.mt = mt;
        self.index = cursor as usize;
        debug!(cursor, "restored mersenne twister state");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

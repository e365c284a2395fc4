//! Blowfish Block Cipher
//!
//! Standard 64-bit block Blowfish: 16-round Feistel network with
//! key-dependent S-boxes and P-array. Blocks are processed independently
//! (ECB), each half read as a big-endian word, so ciphertext interoperates
//! with reference implementations and server-issued credential strings.
//!
//! ```text
//!   xl ──⊕P[i]──┬──────────────▶ (swap) ── ... 16 rounds ... ── ⊕P[17] ─▶ xl'
//!               │
//!               F
//!               │
//!   xr ─────────⊕──────────────▶ (swap) ── ... 16 rounds ... ── ⊕P[16] ─▶ xr'
//! ```

use thiserror::Error;
use tracing::debug;

use super::blowfish_tables::{P_INIT, S_INIT};

/// Number of Feistel rounds.
pub const ROUNDS: usize = 16;

/// Block size in bytes.
pub const BLOCK_SIZE: usize = 8;

/// Shortest accepted key, in bytes.
pub const MIN_KEY_LEN: usize = 1;

/// Longest accepted key, in bytes (448 bits).
pub const MAX_KEY_LEN: usize = 56;

/// Blowfish errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlowfishError {
    /// Key is empty or longer than 56 bytes.
    #[error("invalid key length {0}: must be 1..=56 bytes")]
    InvalidKeyLength(usize),
    /// Input is not a whole number of 8-byte blocks.
    #[error("input length {0} is not a multiple of 8")]
    UnalignedLength(usize),
}

/// A keyed Blowfish schedule.
///
/// A value only exists once a key has been expanded; [`rekey`](Self::rekey)
/// replaces the schedule in place.
#[derive(Clone)]
pub struct Blowfish {
    p: [u32; ROUNDS + 2],
    s: [[u32; 256]; 4],
}

impl std::fmt::Debug for Blowfish {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("Blowfish").finish_non_exhaustive()
    }
}

impl Blowfish {
    /// Expand `key` into a new schedule.
    pub fn new(key: &[u8]) -> Result<Self, BlowfishError> {
        let mut cipher = Self {
            p: P_INIT,
            s: S_INIT,
        };
        cipher.expand_key(key)?;
        Ok(cipher)
    }

    /// Discard the current schedule and expand `key`.
    ///
    /// On error the existing schedule is kept.
    pub fn rekey(&mut self, key: &[u8]) -> Result<(), BlowfishError> {
        check_key(key)?;
        self.p = P_INIT;
        self.s = S_INIT;
        self.expand_key(key)
    }

    /// Canonical key schedule.
    ///
    /// Each encryption runs on the partially updated tables, so the P-array
    /// must be complete before S0 is filled, S0 before S1, and so on.
    fn expand_key(&mut self, key: &[u8]) -> Result<(), BlowfishError> {
        check_key(key)?;

        let mut k = 0;
        for p in self.p.iter_mut() {
            let mut word = 0u32;
            for _ in 0..4 {
                word = (word << 8) | key[k] as u32;
                k = (k + 1) % key.len();
            }
            *p ^= word;
        }

        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..ROUNDS + 2).step_by(2) {
            (l, r) = self.encrypt_halves(l, r);
            self.p[i] = l;
            self.p[i + 1] = r;
        }
        for b in 0..4 {
            for i in (0..256).step_by(2) {
                (l, r) = self.encrypt_halves(l, r);
                self.s[b][i] = l;
                self.s[b][i + 1] = r;
            }
        }

        debug!(key_len = key.len(), "blowfish key schedule expanded");
        Ok(())
    }

    /// Round function: `((S0[a] + S1[b]) ^ S2[c]) + S3[d]`.
    #[inline]
    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        (self.s[0][a as usize].wrapping_add(self.s[1][b as usize]) ^ self.s[2][c as usize])
            .wrapping_add(self.s[3][d as usize])
    }

    /// Encrypt one block given as its two 32-bit halves.
    #[inline]
    pub fn encrypt_halves(&self, mut xl: u32, mut xr: u32) -> (u32, u32) {
        for i in 0..ROUNDS {
            xl ^= self.p[i];
            xr ^= self.f(xl);
            std::mem::swap(&mut xl, &mut xr);
        }
        std::mem::swap(&mut xl, &mut xr);
        xr ^= self.p[ROUNDS];
        xl ^= self.p[ROUNDS + 1];
        (xl, xr)
    }

    /// Decrypt one block given as its two 32-bit halves.
    #[inline]
    pub fn decrypt_halves(&self, mut xl: u32, mut xr: u32) -> (u32, u32) {
        for i in (2..ROUNDS + 2).rev() {
            xl ^= self.p[i];
            xr ^= self.f(xl);
            std::mem::swap(&mut xl, &mut xr);
        }
        std::mem::swap(&mut xl, &mut xr);
        xr ^= self.p[1];
        xl ^= self.p[0];
        (xl, xr)
    }

    /// Encrypt one 8-byte block in place.
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        let (l, r) = split_block(block);
        let (l, r) = self.encrypt_halves(l, r);
        join_block(block, l, r);
    }

    /// Decrypt one 8-byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        let (l, r) = split_block(block);
        let (l, r) = self.decrypt_halves(l, r);
        join_block(block, l, r);
    }

    /// Encrypt a buffer of whole blocks in place.
    ///
    /// The caller pads the input; lengths that are not a multiple of 8 are
    /// rejected and the buffer is left untouched.
    pub fn encrypt_in_place(&self, data: &mut [u8]) -> Result<(), BlowfishError> {
        check_aligned(data)?;
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let (l, r) = split_block(chunk);
            let (l, r) = self.encrypt_halves(l, r);
            join_block(chunk, l, r);
        }
        Ok(())
    }

    /// Decrypt a buffer of whole blocks in place.
    pub fn decrypt_in_place(&self, data: &mut [u8]) -> Result<(), BlowfishError> {
        check_aligned(data)?;
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let (l, r) = split_block(chunk);
            let (l, r) = self.decrypt_halves(l, r);
            join_block(chunk, l, r);
        }
        Ok(())
    }

    /// Encrypt `data` into a newly allocated buffer of the same length.
    pub fn encrypt_bytes(&self, data: &[u8]) -> Result<Vec<u8>, BlowfishError> {
        let mut out = data.to_vec();
        self.encrypt_in_place(&mut out)?;
        Ok(out)
    }

    /// Decrypt `data` into a newly allocated buffer of the same length.
    pub fn decrypt_bytes(&self, data: &[u8]) -> Result<Vec<u8>, BlowfishError> {
        let mut out = data.to_vec();
        self.decrypt_in_place(&mut out)?;
        Ok(out)
    }
}

#[inline]
fn check_key(key: &[u8]) -> Result<(), BlowfishError> {
    if (MIN_KEY_LEN..=MAX_KEY_LEN).contains(&key.len()) {
        Ok(())
    } else {
        Err(BlowfishError::InvalidKeyLength(key.len()))
    }
}

#[inline]
fn check_aligned(data: &[u8]) -> Result<(), BlowfishError> {
    if data.len() % BLOCK_SIZE == 0 {
        Ok(())
    } else {
        Err(BlowfishError::UnalignedLength(data.len()))
    }
}

/// Read a block as two big-endian words. `block` is at least 8 bytes.
#[inline]
fn split_block(block: &[u8]) -> (u32, u32) {
    let l = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let r = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    (l, r)
}

#[inline]
fn join_block(block: &mut [u8], l: u32, r: u32) {
    block[..4].copy_from_slice(&l.to_be_bytes());
    block[4..8].copy_from_slice(&r.to_be_bytes());
}

// =============================================================================
// TESTS
// =============================================================================

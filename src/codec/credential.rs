//! Credential Sealing
//!
//! Hiscore logins and certificates are stored as Base64 text wrapping
//! Blowfish-ECB ciphertext. Plaintext is NUL-padded to a whole number of
//! blocks before encryption and the padding is stripped after decryption,
//! so sealed strings must not contain NUL themselves.

use thiserror::Error;

use super::base64::{self, Base64Error};
use super::blowfish::{Blowfish, BlowfishError, BLOCK_SIZE};

/// Credential sealing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Key rejected or ciphertext misaligned.
    #[error("cipher error: {0}")]
    Cipher(#[from] BlowfishError),
    /// Sealed text is not valid Base64.
    #[error("encoding error: {0}")]
    Encoding(#[from] Base64Error),
    /// Plaintext contains a NUL byte, which the padding cannot preserve.
    #[error("credential contains an embedded NUL at byte {0}")]
    EmbeddedNul(usize),
    /// Decrypted bytes are not UTF-8 (wrong key or corrupt text).
    #[error("decrypted credential is not valid UTF-8")]
    NotUtf8,
}

/// Seals and opens credential strings under one key.
#[derive(Debug, Clone)]
pub struct CredentialCipher {
    cipher: Blowfish,
}

impl CredentialCipher {
    /// Create a cipher for `key` (1 to 56 bytes).
    pub fn new(key: &[u8]) -> Result<Self, CredentialError> {
        Ok(Self {
            cipher: Blowfish::new(key)?,
        })
    }

    /// Wrap an already keyed Blowfish schedule.
    pub fn from_cipher(cipher: Blowfish) -> Self {
        Self { cipher }
    }

    /// Encrypt `plain` and return it as Base64 text.
    pub fn seal(&self, plain: &str) -> Result<String, CredentialError> {
        if let Some(pos) = plain.bytes().position(|b| b == 0) {
            return Err(CredentialError::EmbeddedNul(pos));
        }

        let mut data = plain.as_bytes().to_vec();
        data.resize(padded_len(data.len()), 0);
        self.cipher.encrypt_in_place(&mut data)?;
        Ok(base64::encode(&data))
    }

    /// Decode and decrypt text produced by [`seal`](Self::seal).
    pub fn open(&self, sealed: &str) -> Result<String, CredentialError> {
        let mut data = base64::decode(sealed)?;
        self.cipher.decrypt_in_place(&mut data)?;

        let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        data.truncate(end);
        String::from_utf8(data).map_err(|_| CredentialError::NotUtf8)
    }
}

/// Round `len` up to a whole number of cipher blocks.
#[inline]
fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

// =============================================================================
// TESTS
// =============================================================================

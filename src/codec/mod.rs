//! Codecs for credential and certificate protection.
//!
//! Base64 is the text carrier; Blowfish provides the encryption. The
//! `credential` module combines the two the way the hiscore subsystem stores
//! logins.

pub mod base64;
pub mod blowfish;
mod blowfish_tables;
pub mod credential;

// Re-export codec types
pub use base64::{decode, decoded_len, encode, encoded_len, Base64Error};
pub use blowfish::{Blowfish, BlowfishError};
pub use credential::{CredentialCipher, CredentialError};

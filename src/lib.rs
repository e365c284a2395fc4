//! # Playground Core
//!
//! Portable data and numeric core of the Playground game SDK.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PLAYGROUND CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                 │
//! │  ├── byte_order.rs - Little-endian file layout fixing       │
//! │  └── rng.rs      - MT19937 PRNG with save/restore           │
//! │                                                             │
//! │  codec/          - Credential protection                    │
//! │  ├── base64.rs   - RFC 4648 Base64                          │
//! │  ├── blowfish.rs - Blowfish block cipher (ECB)              │
//! │  └── credential.rs - Blowfish + Base64 credential strings   │
//! │                                                             │
//! │  config.rs       - Environment configuration                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Every component is a synchronous, bounded computation with no I/O:
//! - The RNG produces the reference MT19937 sequence for a given seed
//! - Saved RNG state is little-endian on every host
//! - Blowfish output matches the published test vectors
//!
//! `MersenneTwister` and `Blowfish` carry mutable per-instance state; give
//! each thread its own instance or guard one with a lock.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod core;

// Re-export commonly used types
pub use codec::{Blowfish, CredentialCipher};
pub use config::AppConfig;
pub use crate::core::rng::MersenneTwister;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core deterministic primitives.
//!
//! Byte order fixing for little-endian binary files and the Mersenne Twister
//! random source. Both behave identically on every platform.

pub mod byte_order;
pub mod rng;

// Re-export core types
pub use byte_order::{fix_byte_order, fix_byte_order_slice, swap, ByteSwap, LeReader, LeWriter};
pub use rng::{MersenneTwister, StateError, STATE_SIZE};

//! Shared utilities.
//!
//! Common utilities used across the crate including hashing, path handling,
//! atomic writes, and test helpers.

pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;

pub use fs::{normalize_path, relative_id, write_atomic};
pub use hash::{ContentHash, hash_bytes, hash_file};

//! chefsync-lib: Core logic for chefsync
//!
//! This crate keeps per-target dependency-caching workspaces in sync with a
//! real Cargo workspace:
//! - `members`: discovers the local path dependencies of a target's root package
//! - `manifest` / `scratch`: synthesize a trimmed workspace the resolver can run against
//! - `resolver`: runs the external lockfile generator
//! - `lock` / `diff`: parse lockfiles and report added/removed/updated packages
//! - `regenerate`: the per-target pipeline tying everything together

pub mod checksum;
pub mod config;
pub mod consts;
pub mod diff;
pub mod lock;
pub mod manifest;
pub mod members;
pub mod regenerate;
pub mod resolver;
pub mod scratch;
pub mod util;

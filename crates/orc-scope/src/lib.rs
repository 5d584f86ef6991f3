// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Content hashing, custom glob scope matching, `.intentignore` matching,
//! and mutation classification for the intent gate.
//!
//! This crate depends only on [`orc_core`]. It has no dependency on an
//! external glob-matching library; [`glob::CompiledGlob`] lowers patterns to
//! `regex::Regex` by hand.

mod glob;
mod hash;
mod ignore;
mod mutation;

pub use glob::{is_in_scope, normalize_path, CompiledGlob, GlobError};
pub use hash::{compute_content_hash, compute_file_hash};
pub use ignore::IgnoreMatcher;
pub use mutation::classify_mutation;

// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Library-level pieces of the `orc` host CLI, kept separate from
//! `main.rs` so they can be unit-tested without spawning the binary.

pub mod commands;
pub mod host;
pub mod payload;
pub mod wiring;

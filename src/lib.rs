//! `mlogc` is a compiler back-end: it lowers a checked, tree-shaped
//! semantic target into a linear stream of processor instructions for a
//! fictional in-game programmable logic processor, and serializes that
//! stream as `.mlog` assembly text.
//!
//! See `src/bin/mlogc.rs` for the CLI that drives this library.

// Because this is a library, allow dead code to make in-class exercises easier
// to develop.
#![allow(dead_code)]

pub mod builtins;
pub mod common;
pub mod emitter;
pub mod error;
pub mod instruction;
pub mod program;
pub mod register;
pub mod semantic;
pub mod stack;

pub use emitter::build;
pub use error::Diagnostic;

//! Tag-vocabulary parsers shared across format parsers.
//!
//! These are free functions over a reader or a byte slice, deliberately not
//! a trait hierarchy. A format parser that finds an embedded tag block builds
//! a sub-reader over the block body and calls the same functions that run
//! against whole files.

pub mod ape;
pub mod id3;
pub mod vorbis;

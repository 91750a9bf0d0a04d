//! Core engine for quill property-based testing.
//!
//! Generators decode typed values from a structured, replayable bit stream.
//! When a property fails, the shrinker rewrites that stream toward a simpler
//! one that still fails the same way, so every counterexample is minimal and
//! reproducible from its recorded words.

pub mod bits;
pub mod case;
pub mod collections;
pub mod data;
pub mod decode;
pub mod error;
pub mod fault;
pub mod floats;
pub mod gen;
pub mod property;
pub mod shrink;
pub mod text;
pub mod tree;

// Re-export the main types
pub use bits::{compare_bits, BitStream, Group, GroupLabel, GroupToken, Recording};
pub use case::Case;
pub use data::*;
pub use error::*;
pub use gen::*;
pub use property::*;
pub use shrink::{Counterexample, Shrinker, Shrunk};
pub use tree::Tree;

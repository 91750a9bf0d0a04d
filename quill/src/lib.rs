//! quill property-based testing library.
//!
//! This is the main entry point for quill, re-exporting the engine from
//! `quill-core` and, with the `derive` feature, `#[derive(Generate)]`.
//!
//! ```
//! use quill::*;
//!
//! let prop = for_all_named(Gen::vec_of(Gen::<u8>::any()), "xs", |xs| {
//!     let mut sorted = xs.clone();
//!     sorted.sort();
//!     sorted.len() == xs.len()
//! });
//! assert!(prop.run(&Config::default()).is_pass());
//! ```

pub use quill_core::*;

// Re-export derive macros when available
#[cfg(feature = "derive")]
pub use quill_derive::*;

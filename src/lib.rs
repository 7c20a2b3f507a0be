#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Value-semantic runtime polymorphism without an inheritance hierarchy.
//!
//! ## Overview
//!
//! This crate provides [`Poly`], a container that can hold a value of *any*
//! concrete type implementing the [`Print`] capability, behind a single
//! non-generic type. A `Poly` is an ordinary value: it can be cloned,
//! assigned over, moved out of, stored in collections, and dropped, and it
//! always does the right thing for the concrete type it currently holds.
//!
//! Unlike `Box<dyn Trait>`, a `Poly` keeps small payloads *inside* the
//! container itself (small-object optimization): a payload whose size fits
//! the fixed inline capacity never touches the heap. Larger payloads are
//! transparently placed on their own heap block. The placement is decided
//! once per payload type, at compile time.
//!
//! ## Quick Example
//!
//! ```
//! use core::fmt;
//!
//! use polybox::{Poly, Print};
//!
//! #[derive(Clone, Default)]
//! struct Answer(i32);
//!
//! impl Print for Answer {
//!     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "answer: {}", self.0)
//!     }
//! }
//!
//! let value = Poly::new(Answer(42));
//! assert_eq!(value.to_string(), "answer: 42");
//!
//! let copy = value.clone();
//! assert_eq!(copy.to_string(), "answer: 42");
//! ```
//!
//! ## Value Semantics
//!
//! Every `Poly` is the sole owner of its payload. Cloning produces an
//! independent payload, never aliasing. Assigning one `Poly` over another
//! with [`Clone::clone_from`] takes a fast path when both hold the same
//! concrete type: the payload is assigned in place, reusing existing
//! storage, exactly as assigning the concrete values directly would.
//!
//! Moving the payload out with [`Poly::take`] or [`Poly::take_from`] leaves
//! the source container *live*: it keeps its concrete type and holds that
//! type's default value afterwards. A moved-from `Poly` can still be
//! invoked, reassigned, and dropped — this mirrors how moved-from values
//! behave in the C++ tradition this design comes from, and is an intentional
//! part of the contract.
//!
//! ## Extending the Capability Set
//!
//! [`Poly`] fixes the capability set to the single [`Print`] operation. The
//! underlying machinery ([`RawPoly`] plus the [`PolyHandler`] trait) is
//! generic over the capability: a container with a different or wider
//! capability set is a thin wrapper in the same shape as [`Poly`] itself.
//!
//! ## Feature Flags
//!
//! - `std` *(default)*: enables the [`Poly::print`] convenience method,
//!   which writes to stdout.
//! - `heap` *(default)*: enables the heap fallback for payload types larger
//!   than the inline capacity. Without it, oversized payload types are
//!   rejected at compile time.

#[cfg(feature = "std")]
extern crate std;

mod facade;
mod print;

pub use polybox_internals::{INLINE_ALIGN, INLINE_CAPACITY, RawPoly, handlers::PolyHandler};

pub use crate::{
    facade::Poly,
    print::{Print, PrintHandler},
};

#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`polybox`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased container and the unsafe
//! operations that power the [`polybox`] crate. It implements value-semantic
//! runtime polymorphism through per-type dispatch tables and a small-object
//! storage scheme: a payload lives inside the container's fixed inline region
//! when it fits, and on its own heap block otherwise.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`polybox`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`poly`]**: The type-erased container
//!   - [`RawPoly`]: Owned container holding one live payload of some erased
//!     type
//!   - [`PolyVtable`]: Per-type function pointers for lifecycle operations
//!     and the capability thunk
//!   - [`PolyStorage`]: The inline-or-heap storage union
//!
//! - **[`handlers`]**: The capability seam
//!   - [`PolyHandler`]: Defines the operation a payload type exposes through
//!     the container
//!
//! # Safety Strategy
//!
//! Erasing the payload type means the vtable's function pointers must always
//! match the concrete type actually stored in the container. This crate
//! maintains that guarantee through:
//!
//! - **Module-based encapsulation**: the vtable and storage fields are
//!   module-private, so every way of pairing a table with a payload is
//!   locally verifiable within a single file
//! - **`&'static` vtables**: tables are created once per concrete type via
//!   [`PolyVtable::new`], which fixes the function pointers to that exact
//!   type at compile time
//! - **Documented vtable contracts**: each vtable method specifies exactly
//!   when it can be safely called
//!
//! [`polybox`]: https://docs.rs/polybox/latest/polybox/
//! [`PolyVtable`]: poly::vtable::PolyVtable
//! [`PolyVtable::new`]: poly::vtable::PolyVtable::new
//! [`PolyStorage`]: poly::storage::PolyStorage
//! [`PolyHandler`]: handlers::PolyHandler

#[cfg(any(test, feature = "heap"))]
extern crate alloc;

pub mod handlers;
mod poly;
mod util;

pub use poly::{INLINE_ALIGN, INLINE_CAPACITY, RawPoly};

//! Module containing the type-erased container and its dispatch machinery

mod raw;
pub(crate) mod storage;
pub(crate) mod vtable;

pub use self::{
    raw::RawPoly,
    storage::{INLINE_ALIGN, INLINE_CAPACITY},
};

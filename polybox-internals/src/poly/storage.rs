//! Inline-or-heap payload storage.
//!
//! This module encapsulates the fields of [`PolyStorage`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **which arm of the union is active is dictated solely by the
//! `on_heap` flag of the vtable paired with the storage, never re-evaluated
//! per instance**.
//!
//! # Safety Invariant
//!
//! The invariant is maintained because the only constructors are
//! [`PolyStorage::uninit`] (inline arm) and [`PolyStorage::from_heap`] (heap
//! arm), and the container pairing a storage with a vtable chooses the
//! constructor from the vtable's own placement decision.
//!
//! # Address Computation
//!
//! The container does not store the current payload address. Rust moves
//! values bitwise, so a stored pointer into the inline region would dangle as
//! soon as the container itself moved. Instead the address is computed on
//! demand: the inline region's own address when the payload fits inline, the
//! heap block's address otherwise. The union is `#[repr(C)]`, so the inline
//! region lives at offset zero and the union's address *is* the inline
//! region's address.

use core::{mem::MaybeUninit, ptr::NonNull};

use crate::util::Erased;

/// Number of bytes reserved inside every container for payloads stored
/// inline. A payload type whose size exceeds this is placed on the heap.
pub const INLINE_CAPACITY: usize = 64;

/// Alignment of the inline region. A payload type with a stricter alignment
/// requirement is placed on the heap regardless of its size.
pub const INLINE_ALIGN: usize = 16;

/// Whether payloads of type `P` are stored inline.
///
/// This is a per-type decision, made once when the type's dispatch table is
/// generated. A type whose size exactly equals [`INLINE_CAPACITY`] is still
/// stored inline; only strictly larger types go to the heap.
pub(crate) const fn fits_inline<P>() -> bool {
    size_of::<P>() <= INLINE_CAPACITY && align_of::<P>() <= INLINE_ALIGN
}

/// The fixed byte region used for inline payload placement.
///
/// The `align(16)` attribute must agree with [`INLINE_ALIGN`]; a unit test
/// below checks that they stay in sync.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
struct InlineRegion {
    /// The raw byte region payloads are written into.
    bytes: [MaybeUninit<u8>; INLINE_CAPACITY],
}

/// Storage for one type-erased payload: either the payload's bytes inline,
/// or a pointer to a heap block holding them.
///
/// # Safety
///
/// The following safety invariants are guaranteed to be upheld as long as
/// this struct exists:
///
/// 1. The active arm never changes after construction: a storage created
///    with [`PolyStorage::uninit`] only ever carries inline payload bytes,
///    and a storage created with [`PolyStorage::from_heap`] only ever
///    carries the heap pointer it was created with.
/// 2. In the heap arm, the pointer comes from `Box::into_raw` of a box
///    holding the payload, and stays valid until the payload is dropped
///    through the paired vtable.
#[repr(C)]
pub(crate) union PolyStorage {
    /// Inline arm: the payload's bytes, starting at offset zero.
    inline: InlineRegion,
    /// Heap arm: the address of the heap block holding the payload.
    heap: NonNull<Erased>,
}

impl PolyStorage {
    /// Creates an inline-arm storage with uninitialized contents.
    ///
    /// The caller is expected to write a payload into [`inline_ptr_mut`]
    /// before the storage is paired with a vtable.
    ///
    /// [`inline_ptr_mut`]: PolyStorage::inline_ptr_mut
    #[inline]
    pub(crate) const fn uninit() -> Self {
        Self {
            inline: InlineRegion {
                bytes: [MaybeUninit::uninit(); INLINE_CAPACITY],
            },
        }
    }

    /// Creates a heap-arm storage from the address of a heap block.
    ///
    /// The pointer must come from `Box::into_raw` of a box holding a live
    /// payload; see the invariants on [`PolyStorage`].
    #[inline]
    pub(crate) const fn from_heap(block: NonNull<Erased>) -> Self {
        Self { heap: block }
    }

    /// Returns the address of the inline region for shared access.
    ///
    /// Always safe to call: it only takes the address of the union itself,
    /// which coincides with the inline region because the union is
    /// `#[repr(C)]`. The result may only be *read through* if the inline arm
    /// is active and holds a live payload.
    #[inline]
    pub(crate) fn inline_ptr(&self) -> NonNull<Erased> {
        NonNull::from(self).cast::<Erased>()
    }

    /// Returns the address of the inline region for exclusive access.
    ///
    /// Same contract as [`inline_ptr`], but derived from a mutable borrow so
    /// the result may also be written through.
    ///
    /// [`inline_ptr`]: PolyStorage::inline_ptr
    #[inline]
    pub(crate) fn inline_ptr_mut(&mut self) -> NonNull<Erased> {
        NonNull::from(self).cast::<Erased>()
    }

    /// Returns the heap block address.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The heap arm is active, i.e. this storage was created with
    ///    [`PolyStorage::from_heap`].
    #[inline]
    pub(crate) unsafe fn heap_ptr(&self) -> NonNull<Erased> {
        // SAFETY: The heap arm is active as guaranteed by the caller, so the
        // union holds a valid `NonNull<Erased>` and reading it is sound.
        unsafe { self.heap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_layout() {
        assert_eq!(size_of::<PolyStorage>(), INLINE_CAPACITY);
        assert_eq!(align_of::<PolyStorage>(), INLINE_ALIGN);
        assert_eq!(align_of::<InlineRegion>(), INLINE_ALIGN);
    }

    #[test]
    fn test_inline_ptr_is_storage_address() {
        let mut storage = PolyStorage::uninit();
        let base: *const PolyStorage = &raw const storage;
        assert_eq!(storage.inline_ptr().as_ptr().cast::<PolyStorage>(), base.cast_mut());
        assert_eq!(
            storage.inline_ptr_mut().as_ptr().cast::<PolyStorage>(),
            base.cast_mut()
        );
    }

    #[test]
    fn test_fits_inline_boundaries() {
        // Exactly the capacity stays inline; one byte more goes to the heap.
        assert!(fits_inline::<[u8; INLINE_CAPACITY]>());
        assert!(!fits_inline::<[u8; INLINE_CAPACITY + 1]>());

        // Over-aligned types go to the heap regardless of size.
        #[repr(align(32))]
        struct LargeAlignment {
            _value: u8,
        }
        assert!(!fits_inline::<LargeAlignment>());

        assert!(fits_inline::<u8>());
        assert!(fits_inline::<[u64; 8]>());
        assert!(!fits_inline::<[u64; 9]>());
    }
}

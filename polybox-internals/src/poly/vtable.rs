//! Vtable for type-erased container operations.
//!
//! This module contains the [`PolyVtable`] which enables running lifecycle
//! operations and the capability on a payload when its concrete type `P` and
//! handler type `H` have been erased. The vtable stores function pointers
//! that dispatch to the correct typed implementations.
//!
//! This module encapsulates the fields of [`PolyVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameters must match the actual payload
//! type stored at the address the container pairs it with**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`PolyVtable::new`], which pairs the function pointers with
//! specific types `P` and `H` at compile time. One canonical table exists per
//! instantiated `(P, H)` pair, so comparing table addresses with
//! [`core::ptr::eq`] is a sufficient (though not necessary) test for "same
//! underlying payload type".

use core::{any::TypeId, ptr::NonNull};

#[cfg(feature = "heap")]
use alloc::boxed::Box;

use crate::{
    handlers::PolyHandler,
    poly::storage::fits_inline,
    util::Erased,
};

/// Vtable for type-erased container operations.
///
/// Contains function pointers for performing lifecycle operations and the
/// capability on payloads without knowing their concrete type at compile
/// time, plus the per-type placement decision.
///
/// # Safety Invariant
///
/// The fields `drop`, `clone_into`, `clone_from`, `take_into`, `take_from`
/// and `invoke` are guaranteed to point to the functions defined below
/// instantiated with the payload type `P` and handler type `H` that were used
/// to create this [`PolyVtable`], and `on_heap` is guaranteed to equal
/// `!fits_inline::<P>()` for that same `P`.
pub(crate) struct PolyVtable {
    /// Gets the [`TypeId`] of the payload type that was used to create this
    /// [`PolyVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the payload type that was used to
    /// create this [`PolyVtable`].
    type_name: fn() -> &'static str,
    /// Placement decision for the payload type: `true` if payloads live on a
    /// heap block, `false` if they live in the container's inline region.
    /// Decided once per type when the table is generated, never re-evaluated
    /// per instance.
    on_heap: bool,
    /// Destroys the payload at the given address. For heap-placed types this
    /// also releases the heap block.
    drop: unsafe fn(NonNull<Erased>),
    /// Copy-constructs a new payload from the payload at `source`, placing it
    /// either in the provided inline slot or on a fresh heap block, and
    /// returns the new payload's address.
    clone_into: unsafe fn(NonNull<Erased>, NonNull<Erased>) -> NonNull<Erased>,
    /// Copy-assigns the payload at `source` over the live payload at `dest`,
    /// in place.
    clone_from: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Move-constructs a new payload out of the payload at `source`, leaving
    /// the source payload live in its default state, and returns the new
    /// payload's address (inline slot or fresh heap block).
    take_into: unsafe fn(NonNull<Erased>, NonNull<Erased>) -> NonNull<Erased>,
    /// Move-assigns the payload at `source` over the live payload at `dest`,
    /// leaving the source payload live in its default state.
    take_from: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Invokes the capability on the payload at the given address via the
    /// handler's `invoke` method.
    invoke: unsafe fn(NonNull<Erased>, &mut core::fmt::Formatter<'_>) -> core::fmt::Result,
}

impl PolyVtable {
    /// Creates a new [`PolyVtable`] for the payload type `P` and the handler
    /// type `H`.
    ///
    /// Without the `heap` feature there is no out-of-line placement, so this
    /// rejects, at monomorphization time, any payload type that does not fit
    /// the inline region.
    pub(crate) const fn new<P, H>() -> &'static Self
    where
        P: Clone + Default + 'static,
        H: PolyHandler<P>,
    {
        const {
            #[cfg(not(feature = "heap"))]
            assert!(
                fits_inline::<P>(),
                "payload type exceeds the inline capacity and the `heap` feature is disabled"
            );
            &Self {
                type_id: TypeId::of::<P>,
                type_name: core::any::type_name::<P>,
                on_heap: !fits_inline::<P>(),
                drop: drop_payload::<P>,
                clone_into: clone_into::<P>,
                clone_from: clone_from::<P>,
                take_into: take_into::<P>,
                take_from: take_from::<P>,
                invoke: invoke::<P, H>,
            }
        }
    }

    /// Gets the [`TypeId`] of the payload type that was used to create this
    /// [`PolyVtable`].
    #[inline]
    pub(crate) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the payload type that was used to
    /// create this [`PolyVtable`].
    #[inline]
    pub(crate) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Whether payloads described by this table live on a heap block rather
    /// than in the container's inline region.
    #[inline]
    pub(crate) fn on_heap(&self) -> bool {
        self.on_heap
    }

    /// Destroys the payload at `payload`, releasing its heap block if the
    /// payload type is heap-placed.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the payload type stored at
    ///    `payload`, and `payload` must be the address the container derived
    ///    from this table's placement decision.
    /// 2. The payload at `payload` is live and has not been destroyed before,
    ///    the caller is able to transfer ownership of it, and the caller will
    ///    not use the address after calling this method.
    #[inline]
    pub(crate) unsafe fn drop(&self, payload: NonNull<Erased>) {
        // SAFETY: We know that `self.drop` points to the function
        // `drop_payload::<P>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe {
            (self.drop)(payload);
        }
    }

    /// Copy-constructs a new payload from the one at `source` and returns its
    /// address: `slot` itself for inline-placed types, a fresh heap block
    /// otherwise.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the payload type stored at
    ///    `source`.
    /// 2. If the payload type is inline-placed, `slot` must be valid for
    ///    writes of the payload type and at least as aligned as the inline
    ///    region.
    #[inline]
    pub(crate) unsafe fn clone_into(
        &self,
        slot: NonNull<Erased>,
        source: NonNull<Erased>,
    ) -> NonNull<Erased> {
        // SAFETY: We know that `self.clone_into` points to the function
        // `clone_into::<P>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.clone_into)(slot, source) }
    }

    /// Copy-assigns the payload at `source` over the live payload at `dest`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the payload types stored
    ///    at *both* `dest` and `source` (only containers sharing this table
    ///    may be assigned in place).
    /// 2. `dest` and `source` do not alias.
    /// 3. The caller has exclusive access to the payload at `dest` and shared
    ///    access to the payload at `source`.
    #[inline]
    pub(crate) unsafe fn clone_from(&self, dest: NonNull<Erased>, source: NonNull<Erased>) {
        // SAFETY: We know that `self.clone_from` points to the function
        // `clone_from::<P>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.clone_from)(dest, source);
        }
    }

    /// Move-constructs a new payload out of the one at `source`, leaving the
    /// source payload live in its default state, and returns the new
    /// payload's address.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the payload type stored at
    ///    `source`, and the caller must have exclusive access to that
    ///    payload.
    /// 2. If the payload type is inline-placed, `slot` must be valid for
    ///    writes of the payload type and at least as aligned as the inline
    ///    region.
    #[inline]
    pub(crate) unsafe fn take_into(
        &self,
        slot: NonNull<Erased>,
        source: NonNull<Erased>,
    ) -> NonNull<Erased> {
        // SAFETY: We know that `self.take_into` points to the function
        // `take_into::<P>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.take_into)(slot, source) }
    }

    /// Move-assigns the payload at `source` over the live payload at `dest`,
    /// leaving the source payload live in its default state.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the payload types stored
    ///    at *both* `dest` and `source`.
    /// 2. `dest` and `source` do not alias.
    /// 3. The caller has exclusive access to the payloads at both `dest` and
    ///    `source`.
    #[inline]
    pub(crate) unsafe fn take_from(&self, dest: NonNull<Erased>, source: NonNull<Erased>) {
        // SAFETY: We know that `self.take_from` points to the function
        // `take_from::<P>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.take_from)(dest, source);
        }
    }

    /// Invokes the capability on the payload at `payload` using the
    /// [`H::invoke`] function used when creating this [`PolyVtable`].
    ///
    /// [`H::invoke`]: PolyHandler::invoke
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the payload type stored at
    ///    `payload`.
    #[inline]
    pub(crate) unsafe fn invoke(
        &self,
        payload: NonNull<Erased>,
        formatter: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        // SAFETY: We know that `self.invoke` points to the function
        // `invoke::<P, H>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.invoke)(payload, formatter) }
    }
}

/// Destroys the payload of type `P` at `payload`.
///
/// For inline-placed types the destructor runs in place and no memory is
/// released. For heap-placed types the heap block is released, running the
/// destructor as part of the release.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `P` matches the actual payload type stored at `payload`, and
///    `payload` is the address dictated by `P`'s placement decision (an
///    inline region for inline-placed `P`, a `Box::into_raw` block
///    otherwise).
/// 2. The payload is live and has not been destroyed before, the caller is
///    able to transfer ownership of it, and the address is not used after
///    this call.
unsafe fn drop_payload<P: 'static>(payload: NonNull<Erased>) {
    #[cfg(feature = "heap")]
    if !fits_inline::<P>() {
        // SAFETY: For heap-placed `P` the address came from `Box::into_raw`
        // of a `Box<P>`, as guaranteed by the caller, and ownership is
        // transferred to us.
        let boxed = unsafe { Box::from_raw(payload.cast::<P>().as_ptr()) };
        core::mem::drop(boxed);
        return;
    }
    // SAFETY: The address holds a live `P` we are entitled to destroy, as
    // guaranteed by the caller.
    unsafe {
        payload.cast::<P>().drop_in_place();
    }
}

/// Copy-constructs a new `P` from the payload at `source`.
///
/// Inline-placed types are written into `slot` and `slot` is returned;
/// heap-placed types are placed on a fresh heap block whose address is
/// returned.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `P` matches the actual payload type stored at `source`.
/// 2. If `P` is inline-placed, `slot` is valid for writes of a `P`.
unsafe fn clone_into<P: Clone + 'static>(
    slot: NonNull<Erased>,
    source: NonNull<Erased>,
) -> NonNull<Erased> {
    // SAFETY:
    // 1. Guaranteed by the caller
    let source: &P = unsafe { source.cast::<P>().as_ref() };
    let payload = source.clone();
    // SAFETY:
    // 1. Guaranteed by the caller
    unsafe { place::<P>(slot, payload) }
}

/// Copy-assigns the `P` at `source` over the live `P` at `dest`, in place.
///
/// Uses [`Clone::clone_from`], so payload types that reuse their existing
/// allocations on assignment keep doing so through the erased container.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `P` matches the actual payload types stored at both `dest`
///    and `source`.
/// 2. `dest` and `source` do not alias.
/// 3. The caller has exclusive access to the payload at `dest` and shared
///    access to the payload at `source`.
unsafe fn clone_from<P: Clone + 'static>(dest: NonNull<Erased>, source: NonNull<Erased>) {
    // SAFETY:
    // 1. Guaranteed by the caller (shared access, no aliasing with `dest`)
    let source: &P = unsafe { source.cast::<P>().as_ref() };
    // SAFETY:
    // 1. Guaranteed by the caller (exclusive access, no aliasing with
    //    `source`)
    let dest: &mut P = unsafe { dest.cast::<P>().as_mut() };
    dest.clone_from(source);
}

/// Move-constructs a new `P` out of the payload at `source`, leaving the
/// source payload live holding `P::default()`.
///
/// Placement of the new payload is as for [`clone_into`].
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `P` matches the actual payload type stored at `source`, and
///    the caller has exclusive access to that payload.
/// 2. If `P` is inline-placed, `slot` is valid for writes of a `P`.
unsafe fn take_into<P: Default + 'static>(
    slot: NonNull<Erased>,
    source: NonNull<Erased>,
) -> NonNull<Erased> {
    // SAFETY:
    // 1. Guaranteed by the caller
    let source: &mut P = unsafe { source.cast::<P>().as_mut() };
    let payload = core::mem::take(source);
    // SAFETY:
    // 2. Guaranteed by the caller
    unsafe { place::<P>(slot, payload) }
}

/// Move-assigns the `P` at `source` over the live `P` at `dest`, leaving the
/// source payload live holding `P::default()`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `P` matches the actual payload types stored at both `dest`
///    and `source`.
/// 2. `dest` and `source` do not alias.
/// 3. The caller has exclusive access to the payloads at both `dest` and
///    `source`.
unsafe fn take_from<P: Default + 'static>(dest: NonNull<Erased>, source: NonNull<Erased>) {
    // SAFETY:
    // 1. Guaranteed by the caller (exclusive access, no aliasing with `dest`)
    let source: &mut P = unsafe { source.cast::<P>().as_mut() };
    // SAFETY:
    // 1. Guaranteed by the caller (exclusive access, no aliasing with
    //    `source`)
    let dest: &mut P = unsafe { dest.cast::<P>().as_mut() };
    *dest = core::mem::take(source);
}

/// Invokes the capability on the payload at `payload` via `H::invoke`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `P` matches the actual payload type stored at `payload`.
unsafe fn invoke<P: 'static, H: PolyHandler<P>>(
    payload: NonNull<Erased>,
    formatter: &mut core::fmt::Formatter<'_>,
) -> core::fmt::Result {
    // SAFETY:
    // 1. Guaranteed by the caller
    let payload: &P = unsafe { payload.cast::<P>().as_ref() };
    H::invoke(payload, formatter)
}

/// Places a freshly constructed payload according to `P`'s placement
/// decision: written into `slot` for inline-placed types, moved onto a fresh
/// heap block otherwise. Returns the payload's address.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. If `P` is inline-placed, `slot` is valid for writes of a `P` and at
///    least as aligned as the inline region. Heap-placed types never touch
///    `slot`.
unsafe fn place<P: 'static>(slot: NonNull<Erased>, payload: P) -> NonNull<Erased> {
    #[cfg(feature = "heap")]
    if !fits_inline::<P>() {
        let block: *mut P = Box::into_raw(Box::new(payload));
        // SAFETY: `Box::into_raw` returns a non-null pointer
        let block = unsafe { NonNull::new_unchecked(block) };
        return block.cast::<Erased>();
    }
    let slot = slot.cast::<P>();
    // SAFETY: `P` is inline-placed here, so `slot` is valid for writes of a
    // `P` as guaranteed by the caller.
    unsafe {
        slot.write(payload);
    }
    slot.cast::<Erased>()
}

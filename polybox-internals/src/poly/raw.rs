//! The owned, type-erased container.
//!
//! This module encapsulates the fields of [`RawPoly`], ensuring they are only
//! visible within this module. This visibility restriction guarantees the
//! safety invariant: **the vtable always describes the payload currently
//! stored, and the active storage arm always matches the vtable's placement
//! decision**.
//!
//! # Safety Invariant
//!
//! Since the fields can only be set via [`RawPoly::new`] and the assignment
//! methods in this module (each of which installs a vtable together with a
//! storage constructed through that same vtable), the pairing remains valid
//! throughout the value's lifetime. There is no empty state: from successful
//! construction to destruction the container always holds exactly one live
//! payload.
//!
//! # Type Erasure
//!
//! The concrete payload type `P` is erased at construction; the dispatch
//! table stored alongside the payload provides everything needed to copy,
//! move, destroy and invoke it. After construction, no code path ever
//! branches on the concrete type again.

use core::{any::TypeId, ptr::NonNull};

use crate::{
    handlers::PolyHandler,
    poly::{
        storage::PolyStorage,
        vtable::PolyVtable,
    },
    util::Erased,
};

/// An owned, type-erased container holding exactly one live payload of some
/// concrete type `P`, though we do not know which actual `P` it is.
///
/// The payload's bytes live in the container's inline region when `P` fits
/// the inline capacity, and on a dedicated heap block otherwise; the decision
/// is made once per type when `P`'s dispatch table is generated.
///
/// All lifecycle operations (clone, assignment, move-out, destruction) and
/// the capability flow through the dispatch table recorded at construction.
pub struct RawPoly {
    /// The dispatch table of the payload currently stored.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long
    /// as this struct exists:
    ///
    /// 1. The table describes the concrete type of the payload currently
    ///    held in `storage`.
    /// 2. The table's placement decision matches the active arm of
    ///    `storage`: inline arm iff `!vtable.on_heap()`.
    vtable: &'static PolyVtable,
    /// The payload's bytes (inline arm) or the address of the heap block
    /// holding them (heap arm).
    ///
    /// # Safety
    ///
    /// The payload reachable through this storage is live and fully
    /// constructed for the entire lifetime of this object, except during the
    /// execution of the `Drop` implementation.
    storage: PolyStorage,
}

impl RawPoly {
    /// Creates a new [`RawPoly`] holding the given payload.
    ///
    /// The type parameters are the compile-time tag selecting which dispatch
    /// table the container binds to: `P` is the concrete payload type and
    /// `H` the handler implementing the capability for it.
    #[inline]
    pub fn new<P, H>(payload: P) -> Self
    where
        P: Clone + Default + 'static,
        H: PolyHandler<P>,
    {
        let vtable = PolyVtable::new::<P, H>();

        #[cfg(feature = "heap")]
        if vtable.on_heap() {
            let block: *mut P = alloc::boxed::Box::into_raw(alloc::boxed::Box::new(payload));
            // SAFETY: `Box::into_raw` returns a non-null pointer
            let block = unsafe { NonNull::new_unchecked(block) };
            return Self {
                vtable,
                storage: PolyStorage::from_heap(block.cast::<Erased>()),
            };
        }

        let mut storage = PolyStorage::uninit();
        // SAFETY: `P` fits the inline region (the heap case returned above;
        // without the `heap` feature, oversized types are rejected at
        // compile time), and the region is valid for writes of a `P`.
        unsafe {
            storage.inline_ptr_mut().cast::<P>().write(payload);
        }
        Self { vtable, storage }
    }

    /// Returns the address of the live payload for shared access.
    ///
    /// By the container invariants this equals the inline region's address
    /// for inline-placed payload types and the heap block's address
    /// otherwise.
    #[inline]
    fn payload_ptr(&self) -> NonNull<Erased> {
        if self.vtable.on_heap() {
            // SAFETY: The heap arm is active because the vtable says the
            // payload is heap-placed (container invariant 2).
            unsafe { self.storage.heap_ptr() }
        } else {
            self.storage.inline_ptr()
        }
    }

    /// Returns the address of the live payload for exclusive access.
    #[inline]
    fn payload_ptr_mut(&mut self) -> NonNull<Erased> {
        if self.vtable.on_heap() {
            // SAFETY: The heap arm is active because the vtable says the
            // payload is heap-placed (container invariant 2).
            unsafe { self.storage.heap_ptr() }
        } else {
            self.storage.inline_ptr_mut()
        }
    }

    /// Returns the address of the live payload.
    ///
    /// Useful for identity checks: a payload stored inline lives at an
    /// address inside the container itself, a heap-placed payload does not,
    /// and same-type assignment never changes the address of the
    /// destination's payload.
    #[inline]
    pub fn payload_addr(&self) -> *const () {
        self.payload_ptr().as_ptr().cast::<()>().cast_const()
    }

    /// Returns the [`TypeId`] of the payload.
    #[inline]
    pub fn payload_type_id(&self) -> TypeId {
        self.vtable.type_id()
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[inline]
    pub fn payload_type_name(&self) -> &'static str {
        self.vtable.type_name()
    }

    /// Whether the payload is stored in the container's inline region rather
    /// than on a heap block.
    ///
    /// This is a property of the payload's type, not of the individual
    /// container: all containers holding the same concrete type agree.
    #[inline]
    pub fn is_inline(&self) -> bool {
        !self.vtable.on_heap()
    }

    /// Whether `self` and `other` hold payloads of the same concrete type.
    #[inline]
    pub fn holds_same_type_as(&self, other: &RawPoly) -> bool {
        // Address equality is the fast, sufficient check; `TypeId` equality
        // covers tables duplicated across codegen units.
        core::ptr::eq(self.vtable, other.vtable) || self.vtable.type_id() == other.vtable.type_id()
    }

    /// Invokes the capability on the payload, writing its output to the
    /// formatter.
    #[inline]
    pub fn invoke(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // SAFETY:
        // 1. The vtable describes the payload at `payload_ptr` (container
        //    invariant 1).
        unsafe { self.vtable.invoke(self.payload_ptr(), formatter) }
    }

    /// Accesses the payload as a reference to the specified type.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the type `P` matches the actual payload
    /// type stored in this container.
    #[inline]
    pub unsafe fn payload_downcast_unchecked<P: 'static>(&self) -> &P {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.vtable.type_id(), TypeId::of::<P>());

        let payload = self.payload_ptr().cast::<P>();
        // SAFETY: The address holds a live, fully-constructed payload
        // (container invariant), and its type is `P` as guaranteed by the
        // caller. Shared access is allowed for the lifetime of `&self`.
        unsafe { payload.as_ref() }
    }

    /// Accesses the payload as a mutable reference to the specified type.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the type `P` matches the actual payload
    /// type stored in this container.
    #[inline]
    pub unsafe fn payload_downcast_unchecked_mut<P: 'static>(&mut self) -> &mut P {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.vtable.type_id(), TypeId::of::<P>());

        let mut payload = self.payload_ptr_mut().cast::<P>();
        // SAFETY: The address holds a live, fully-constructed payload
        // (container invariant), its type is `P` as guaranteed by the
        // caller, and exclusive access follows from `&mut self`.
        unsafe { payload.as_mut() }
    }

    /// Moves the payload into a new container, leaving `self` live.
    ///
    /// This is the move-construction of the container protocol: the returned
    /// container holds the payload's previous value, while `self` keeps its
    /// dispatch table and is left holding the payload type's default value.
    /// `self` remains fully invocable and is destroyed normally when its own
    /// lifetime ends.
    #[inline]
    pub fn take(&mut self) -> RawPoly {
        let vtable = self.vtable;
        let mut slot = PolyStorage::uninit();
        // SAFETY:
        // 1. The vtable describes the payload at `payload_ptr_mut`
        //    (container invariant 1), and `&mut self` grants exclusive
        //    access.
        // 2. The slot is a fresh inline region, valid for writes of the
        //    payload type whenever that type is inline-placed.
        let addr = unsafe { vtable.take_into(slot.inline_ptr_mut(), self.payload_ptr_mut()) };
        let storage = if vtable.on_heap() {
            PolyStorage::from_heap(addr)
        } else {
            slot
        };
        RawPoly { vtable, storage }
    }

    /// Move-assigns the payload held by `source` into `self`, leaving
    /// `source` live.
    ///
    /// If both containers hold the same concrete type, the assignment runs
    /// in place: no destruction, no reallocation, and `self`'s payload
    /// address does not change. Otherwise `self`'s payload is destroyed and
    /// `self` adopts `source`'s dispatch table along with a payload
    /// move-constructed from `source`'s.
    ///
    /// Either way `source` keeps its own dispatch table and is left holding
    /// its payload type's default value; it remains fully invocable and is
    /// destroyed normally by its owner.
    #[inline]
    pub fn take_from(&mut self, source: &mut RawPoly) {
        if core::ptr::eq(self.vtable, source.vtable) {
            // SAFETY:
            // 1. Both payloads are described by this shared vtable
            //    (container invariant 1 on both sides).
            // 2. `self` and `source` are distinct objects (two live `&mut`),
            //    so their payloads do not alias.
            // 3. Exclusive access to both follows from the borrows.
            unsafe {
                self.vtable.take_from(self.payload_ptr_mut(), source.payload_ptr_mut());
            }
            return;
        }

        let vtable = source.vtable;
        let mut slot = PolyStorage::uninit();
        // Construct the replacement before touching `self`, so a failed
        // allocation cannot leave `self` holding a destroyed payload.
        //
        // SAFETY:
        // 1. `source`'s vtable describes `source`'s payload, and `&mut
        //    source` grants exclusive access.
        // 2. The slot is a fresh inline region, valid for writes of the
        //    payload type whenever that type is inline-placed.
        let addr = unsafe { vtable.take_into(slot.inline_ptr_mut(), source.payload_ptr_mut()) };
        let storage = if vtable.on_heap() {
            PolyStorage::from_heap(addr)
        } else {
            slot
        };

        // SAFETY:
        // 1. `self.vtable` still describes the old payload, which is live
        //    and owned by us; its address is not used again below.
        unsafe {
            self.vtable.drop(self.payload_ptr_mut());
        }
        self.vtable = vtable;
        self.storage = storage;
    }
}

impl Clone for RawPoly {
    /// Copy-constructs an independent container: the clone adopts `self`'s
    /// dispatch table and holds a payload copy-constructed from `self`'s.
    #[inline]
    fn clone(&self) -> Self {
        let vtable = self.vtable;
        let mut slot = PolyStorage::uninit();
        // SAFETY:
        // 1. The vtable describes the payload at `payload_ptr` (container
        //    invariant 1).
        // 2. The slot is a fresh inline region, valid for writes of the
        //    payload type whenever that type is inline-placed.
        let addr = unsafe { vtable.clone_into(slot.inline_ptr_mut(), self.payload_ptr()) };
        let storage = if vtable.on_heap() {
            PolyStorage::from_heap(addr)
        } else {
            slot
        };
        RawPoly { vtable, storage }
    }

    /// Copy-assigns `source`'s payload into `self`.
    ///
    /// If both containers hold the same concrete type, the assignment runs
    /// in place through [`Clone::clone_from`] of the payload type: no
    /// destruction, no reallocation, and `self`'s payload address does not
    /// change. Otherwise `self`'s payload is destroyed and `self` adopts
    /// `source`'s dispatch table along with a fresh payload copy.
    #[inline]
    fn clone_from(&mut self, source: &Self) {
        if core::ptr::eq(self.vtable, source.vtable) {
            // SAFETY:
            // 1. Both payloads are described by this shared vtable
            //    (container invariant 1 on both sides).
            // 2. `self` is exclusively borrowed while `source` is shared, so
            //    they are distinct objects and their payloads do not alias.
            // 3. Access rights follow from the borrows.
            unsafe {
                self.vtable.clone_from(self.payload_ptr_mut(), source.payload_ptr());
            }
            return;
        }

        let vtable = source.vtable;
        let mut slot = PolyStorage::uninit();
        // Construct the replacement before touching `self`, so a failed
        // allocation cannot leave `self` holding a destroyed payload.
        //
        // SAFETY:
        // 1. `source`'s vtable describes `source`'s payload.
        // 2. The slot is a fresh inline region, valid for writes of the
        //    payload type whenever that type is inline-placed.
        let addr = unsafe { vtable.clone_into(slot.inline_ptr_mut(), source.payload_ptr()) };
        let storage = if vtable.on_heap() {
            PolyStorage::from_heap(addr)
        } else {
            slot
        };

        // SAFETY:
        // 1. `self.vtable` still describes the old payload, which is live
        //    and owned by us; its address is not used again below.
        unsafe {
            self.vtable.drop(self.payload_ptr_mut());
        }
        self.vtable = vtable;
        self.storage = storage;
    }
}

impl core::ops::Drop for RawPoly {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.vtable;
        // SAFETY:
        // 1. The vtable describes the live payload at `payload_ptr_mut`
        //    (container invariants); we own it, it has not been destroyed
        //    before, and its address is not used afterwards, as we are in
        //    the drop function.
        unsafe {
            vtable.drop(self.payload_ptr_mut());
        }
    }
}

impl core::fmt::Debug for RawPoly {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        formatter
            .debug_struct("RawPoly")
            .field("payload_type", &self.payload_type_name())
            .field("inline", &self.is_inline())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::String};
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::poly::storage::{INLINE_ALIGN, INLINE_CAPACITY};

    struct DisplayHandler;

    impl PolyHandler<i32> for DisplayHandler {
        fn invoke(value: &i32, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Display::fmt(value, formatter)
        }
    }

    impl PolyHandler<String> for DisplayHandler {
        fn invoke(value: &String, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Display::fmt(value, formatter)
        }
    }

    #[derive(Clone, Default)]
    struct Big([u64; 16]);

    impl PolyHandler<Big> for DisplayHandler {
        fn invoke(value: &Big, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(formatter, "big:{}", value.0[0])
        }
    }

    // Helper adapter turning `RawPoly::invoke` into a `Display` value
    struct Invoked<'a>(&'a RawPoly);

    impl core::fmt::Display for Invoked<'_> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            self.0.invoke(f)
        }
    }

    fn render(poly: &RawPoly) -> String {
        format!("{}", Invoked(poly))
    }

    #[test]
    fn test_raw_poly_size() {
        // vtable reference rounded up to the inline region's alignment
        assert_eq!(size_of::<RawPoly>(), INLINE_CAPACITY + INLINE_ALIGN);
    }

    #[test]
    fn test_inline_payload_lives_inside_container() {
        let poly = RawPoly::new::<i32, DisplayHandler>(7);
        let base = (&raw const poly).addr();
        let addr = poly.payload_addr().addr();

        assert!(poly.is_inline());
        assert!(addr >= base && addr < base + size_of::<RawPoly>());
    }

    #[cfg(feature = "heap")]
    #[test]
    fn test_heap_payload_lives_outside_container() {
        let poly = RawPoly::new::<Big, DisplayHandler>(Big([3; 16]));
        let base = (&raw const poly).addr();
        let addr = poly.payload_addr().addr();

        assert!(!poly.is_inline());
        assert!(addr < base || addr >= base + size_of::<RawPoly>());
        assert_eq!(render(&poly), "big:3");
    }

    #[test]
    fn test_invoke_dispatches_per_type() {
        let int_poly = RawPoly::new::<i32, DisplayHandler>(42);
        let string_poly = RawPoly::new::<String, DisplayHandler>(String::from("hello"));

        assert_eq!(render(&int_poly), "42");
        assert_eq!(render(&string_poly), "hello");
        assert_eq!(int_poly.payload_type_id(), TypeId::of::<i32>());
        assert!(!int_poly.holds_same_type_as(&string_poly));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = RawPoly::new::<String, DisplayHandler>(String::from("one"));
        let copy = original.clone();

        assert!(original.holds_same_type_as(&copy));
        assert_ne!(original.payload_addr(), copy.payload_addr());

        // SAFETY: `original` holds a `String`.
        let payload = unsafe { original.payload_downcast_unchecked_mut::<String>() };
        payload.push_str(" mutated");

        assert_eq!(render(&original), "one mutated");
        assert_eq!(render(&copy), "one");
    }

    #[test]
    fn test_same_type_assignment_keeps_address() {
        let mut dest = RawPoly::new::<i32, DisplayHandler>(1);
        let source = RawPoly::new::<i32, DisplayHandler>(2);
        let addr = dest.payload_addr();

        dest.clone_from(&source);

        assert_eq!(dest.payload_addr(), addr);
        assert_eq!(render(&dest), "2");
    }

    #[cfg(feature = "heap")]
    #[test]
    fn test_same_type_heap_assignment_keeps_block() {
        let mut dest = RawPoly::new::<Big, DisplayHandler>(Big([1; 16]));
        let source = RawPoly::new::<Big, DisplayHandler>(Big([2; 16]));
        let block = dest.payload_addr();

        dest.clone_from(&source);

        assert_eq!(dest.payload_addr(), block);
        assert_eq!(render(&dest), "big:2");
    }

    #[test]
    fn test_cross_type_assignment_switches_table() {
        let mut dest = RawPoly::new::<i32, DisplayHandler>(10);
        let source = RawPoly::new::<String, DisplayHandler>(String::from("swap"));

        dest.clone_from(&source);

        assert_eq!(dest.payload_type_id(), TypeId::of::<String>());
        assert!(dest.holds_same_type_as(&source));
        assert_eq!(render(&dest), "swap");
    }

    #[test]
    fn test_take_leaves_source_live() {
        let mut source = RawPoly::new::<String, DisplayHandler>(String::from("moved"));
        let dest = source.take();

        assert_eq!(render(&dest), "moved");
        // The source keeps its table and holds the payload default.
        assert_eq!(source.payload_type_id(), TypeId::of::<String>());
        assert_eq!(render(&source), "");
    }

    #[test]
    fn test_take_from_cross_type() {
        let mut dest = RawPoly::new::<i32, DisplayHandler>(5);
        let mut source = RawPoly::new::<String, DisplayHandler>(String::from("payload"));

        dest.take_from(&mut source);

        assert_eq!(render(&dest), "payload");
        assert_eq!(render(&source), "");
        assert_eq!(source.payload_type_id(), TypeId::of::<String>());
    }

    #[test]
    fn test_drop_runs_payload_destructor_once() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        #[derive(Clone, Default)]
        struct Counted;

        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        impl PolyHandler<Counted> for DisplayHandler {
            fn invoke(_: &Counted, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("counted")
            }
        }

        let poly = RawPoly::new::<Counted, DisplayHandler>(Counted);
        let copy = poly.clone();
        drop(poly);
        drop(copy);

        assert_eq!(DROPS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(RawPoly: Send, Sync);
    }
}

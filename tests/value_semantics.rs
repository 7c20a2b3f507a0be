//! End-to-end checks of the container's value semantics: placement, copy
//! independence, storage reuse on same-type assignment, table switching on
//! cross-type assignment, and move-leaves-source-valid behavior.

mod common;

use common::{BigHolder, EdgeHolder, FloatHolder, IntHolder, SeqHolder};
use polybox::{INLINE_ALIGN, INLINE_CAPACITY, Poly};

/// Whether `poly`'s payload lives within `poly`'s own bytes.
fn payload_within(poly: &Poly) -> bool {
    let base = (poly as *const Poly).addr();
    let addr = poly.payload_addr().addr();
    addr >= base && addr < base + size_of::<Poly>()
}

#[test]
fn container_is_one_inline_region_plus_one_pointer() {
    // The vtable reference rounds up to the inline region's alignment.
    assert_eq!(size_of::<Poly>(), INLINE_CAPACITY + INLINE_ALIGN);
}

#[test]
fn small_payloads_are_stored_inline() {
    let int_poly = Poly::new(IntHolder(7));
    let seq_poly = Poly::new(SeqHolder::from_range(0, 3));

    assert!(int_poly.is_inline());
    assert!(seq_poly.is_inline());
    assert!(payload_within(&int_poly));
    assert!(payload_within(&seq_poly));
}

#[test]
fn payload_size_equal_to_capacity_stays_inline() {
    let edge = Poly::new(EdgeHolder([9; INLINE_CAPACITY]));

    assert!(edge.is_inline());
    assert!(payload_within(&edge));
    assert_eq!(edge.to_string(), "edge:9");
}

#[cfg(feature = "heap")]
#[test]
fn oversized_payloads_are_heap_placed() {
    let big = Poly::new(BigHolder([5; 16]));

    assert!(!big.is_inline());
    assert!(!payload_within(&big));
    assert_eq!(big.to_string(), "big:5");
}

#[test]
fn clone_produces_an_independent_payload() {
    let mut original = Poly::new(SeqHolder::from_range(1, 4));
    let copy = original.clone();

    assert!(original.holds_same_type_as(&copy));
    assert_ne!(original.payload_addr(), copy.payload_addr());

    // Mutating one side must not be observable through the other.
    original.downcast_mut::<SeqHolder>().unwrap().0.push(99);
    assert_eq!(original.to_string(), "1, 2, 3, 99");
    assert_eq!(copy.to_string(), "1, 2, 3");
}

#[test]
fn same_type_assignment_reuses_inline_storage() {
    let mut dest = Poly::new(IntHolder(1));
    let source = Poly::new(IntHolder(2));
    let addr = dest.payload_addr();

    dest.clone_from(&source);

    assert_eq!(dest.payload_addr(), addr);
    assert_eq!(dest.to_string(), "2");
}

#[cfg(feature = "heap")]
#[test]
fn same_type_assignment_preserves_heap_block() {
    let mut dest = Poly::new(BigHolder([1; 16]));
    let source = Poly::new(BigHolder([2; 16]));
    let block = dest.payload_addr();

    dest.clone_from(&source);

    assert_eq!(dest.payload_addr(), block);
    assert_eq!(dest.to_string(), "big:2");
}

#[test]
fn cross_type_assignment_switches_table_and_storage() {
    let mut dest = Poly::new(IntHolder(10));
    let source = Poly::new(FloatHolder(2.5));

    dest.clone_from(&source);

    assert!(dest.holds::<FloatHolder>());
    assert!(!dest.holds::<IntHolder>());
    assert!(dest.holds_same_type_as(&source));
    assert_eq!(dest.to_string(), "2.5");
    assert!(dest.is_inline());
}

#[cfg(feature = "heap")]
#[test]
fn cross_type_assignment_adopts_the_source_placement() {
    let mut dest = Poly::new(IntHolder(10));
    let source = Poly::new(BigHolder([4; 16]));

    dest.clone_from(&source);
    assert!(!dest.is_inline());
    assert_eq!(dest.to_string(), "big:4");

    // And back again: heap-placed to inline-placed.
    let small = Poly::new(IntHolder(11));
    dest.clone_from(&small);
    assert!(dest.is_inline());
    assert_eq!(dest.to_string(), "11");
}

#[test]
fn take_leaves_the_source_fully_usable() {
    let mut source = Poly::new(SeqHolder::from_range(5, 9));
    let moved = source.take();

    assert_eq!(moved.to_string(), "5, 6, 7, 8");

    // The source keeps its concrete type and holds the default value.
    assert!(source.holds::<SeqHolder>());
    assert_eq!(source.to_string(), "");

    // It can still be assigned into and invoked.
    source.clone_from(&moved);
    assert_eq!(source.to_string(), "5, 6, 7, 8");
}

#[test]
fn take_from_runs_in_place_for_matching_types() {
    let mut dest = Poly::new(SeqHolder::from_range(0, 2));
    let mut source = Poly::new(SeqHolder::from_range(5, 9));
    let addr = dest.payload_addr();

    dest.take_from(&mut source);

    assert_eq!(dest.payload_addr(), addr);
    assert_eq!(dest.to_string(), "5, 6, 7, 8");
    assert_eq!(source.to_string(), "");
}

#[test]
fn take_from_switches_table_for_differing_types() {
    let mut dest = Poly::new(IntHolder(1));
    let mut source = Poly::new(SeqHolder::from_range(3, 6));

    dest.take_from(&mut source);

    assert!(dest.holds::<SeqHolder>());
    assert_eq!(dest.to_string(), "3, 4, 5");
    assert!(source.holds::<SeqHolder>());
    assert_eq!(source.to_string(), "");
}

#[test]
fn round_trip_output_is_identical_across_copies() {
    let original = Poly::new(IntHolder(10));
    let first = original.to_string();

    let copy = original.clone();
    let second = copy.to_string();

    assert_eq!(first, "10");
    assert_eq!(first, second);
}

#[test]
fn downcasting_is_checked_by_concrete_type() {
    let value = Poly::new(IntHolder(42));

    assert_eq!(value.downcast_ref::<IntHolder>().unwrap().0, 42);
    assert!(value.downcast_ref::<FloatHolder>().is_none());
    assert!(value.payload_type_name().contains("IntHolder"));
}

#[test]
fn container_is_not_thread_safe() {
    static_assertions::assert_not_impl_any!(Poly: Send, Sync);
}

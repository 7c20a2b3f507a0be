//! Demonstration payload types shared by the integration tests.
//!
//! These play the role of client code: interchangeable concrete types that
//! expose the `Print` capability and ordinary value semantics. Nothing in
//! the library knows about them.

#![allow(dead_code)]

use core::fmt;

use polybox::Print;

/// Small scalar payload; always fits the inline region.
#[derive(Clone, Default, PartialEq)]
pub struct IntHolder(pub i32);

impl Print for IntHolder {
    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Another small scalar payload, distinct from [`IntHolder`].
#[derive(Clone, Default, PartialEq)]
pub struct FloatHolder(pub f64);

impl Print for FloatHolder {
    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload owning a heap-backed collection. The holder itself is small
/// enough to live inline; its elements live wherever `Vec` puts them.
#[derive(Clone, Default, PartialEq)]
pub struct SeqHolder(pub Vec<i32>);

impl SeqHolder {
    /// Builds a holder over the half-open range `begin..end`.
    pub fn from_range(begin: i32, end: i32) -> Self {
        Self((begin..end).collect())
    }
}

impl Print for SeqHolder {
    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for item in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
            first = false;
        }
        Ok(())
    }
}

/// Payload larger than the inline capacity; always heap-placed.
#[derive(Clone)]
pub struct BigHolder(pub [u64; 16]);

impl Default for BigHolder {
    fn default() -> Self {
        Self([0; 16])
    }
}

impl Print for BigHolder {
    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "big:{}", self.0[0])
    }
}

/// Payload whose size exactly equals the inline capacity.
#[derive(Clone)]
pub struct EdgeHolder(pub [u8; polybox::INLINE_CAPACITY]);

impl Default for EdgeHolder {
    fn default() -> Self {
        Self([0; polybox::INLINE_CAPACITY])
    }
}

impl Print for EdgeHolder {
    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge:{}", self.0[0])
    }
}

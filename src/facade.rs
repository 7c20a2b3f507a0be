//! The public container fixing the capability set to [`Print`].

use core::{any::TypeId, fmt};

use polybox_internals::RawPoly;

use crate::print::{Print, PrintHandler};

/// A value-semantic container holding one value of *some* type implementing
/// [`Print`].
///
/// A `Poly` behaves like an ordinary value of the payload's type, without
/// naming that type:
///
/// - [`Poly::new`] stores any [`Print`] payload, inline when it fits the
///   container's inline capacity and on its own heap block otherwise;
/// - [`Clone`] copies the payload; [`Clone::clone_from`] assigns it in place
///   when both sides hold the same concrete type;
/// - [`Poly::take`] and [`Poly::take_from`] move the payload while leaving
///   the source container live (holding the payload type's default value);
/// - [`Display`](fmt::Display) invokes the payload's [`Print`] capability.
///
/// # Examples
///
/// ```
/// use core::fmt;
///
/// use polybox::{Poly, Print};
///
/// #[derive(Clone, Default)]
/// struct Count(u32);
///
/// impl Print for Count {
///     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "count = {}", self.0)
///     }
/// }
///
/// #[derive(Clone, Default)]
/// struct Label(&'static str);
///
/// impl Print for Label {
///     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str(self.0)
///     }
/// }
///
/// // One collection, two concrete types.
/// let values = [Poly::new(Count(3)), Poly::new(Label("done"))];
/// let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
/// assert_eq!(rendered, ["count = 3", "done"]);
/// ```
pub struct Poly {
    /// The generic type-erased container, with the capability fixed to
    /// [`PrintHandler`].
    raw: RawPoly,
}

impl Poly {
    /// Creates a new `Poly` holding the given payload.
    ///
    /// The payload type (usually inferred) is the compile-time tag that
    /// selects the dispatch table the container binds to. Whether the
    /// payload lives inline or on the heap is decided here, once per type,
    /// from the type's size and alignment.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::fmt;
    ///
    /// use polybox::{Poly, Print};
    ///
    /// #[derive(Clone, Default)]
    /// struct Answer(i32);
    ///
    /// impl Print for Answer {
    ///     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    ///         write!(f, "{}", self.0)
    ///     }
    /// }
    ///
    /// let value = Poly::new(Answer(10));
    /// assert_eq!(value.to_string(), "10");
    /// assert!(value.holds::<Answer>());
    /// ```
    #[must_use]
    pub fn new<P: Print>(payload: P) -> Self {
        Self {
            raw: RawPoly::new::<P, PrintHandler>(payload),
        }
    }

    /// Invokes the payload's [`Print`] capability, writing to stdout with a
    /// trailing newline.
    ///
    /// Equivalent to `println!("{self}")`; use the
    /// [`Display`](fmt::Display) implementation directly to write somewhere
    /// else.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn print(&self) {
        std::println!("{self}");
    }

    /// Moves the payload into a new `Poly`, leaving `self` live.
    ///
    /// After the call, `self` still holds a value of the same concrete type:
    /// that type's [`Default`] value. It remains printable, assignable and
    /// droppable.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::fmt;
    ///
    /// use polybox::{Poly, Print};
    ///
    /// #[derive(Clone, Default)]
    /// struct Items(Vec<i32>);
    ///
    /// impl Print for Items {
    ///     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    ///         write!(f, "{:?}", self.0)
    ///     }
    /// }
    ///
    /// let mut source = Poly::new(Items(vec![1, 2, 3]));
    /// let moved = source.take();
    ///
    /// assert_eq!(moved.to_string(), "[1, 2, 3]");
    /// // The source is still a valid container, now holding the default.
    /// assert_eq!(source.to_string(), "[]");
    /// ```
    #[must_use]
    pub fn take(&mut self) -> Poly {
        Self {
            raw: self.raw.take(),
        }
    }

    /// Move-assigns the payload held by `source` into `self`, leaving
    /// `source` live.
    ///
    /// When both containers hold the same concrete type the payload is
    /// assigned in place, reusing `self`'s existing storage. Otherwise
    /// `self`'s payload is destroyed and `self` adopts `source`'s concrete
    /// type. Either way `source` is left holding its payload type's default
    /// value and remains fully usable.
    pub fn take_from(&mut self, source: &mut Poly) {
        self.raw.take_from(&mut source.raw);
    }

    /// Whether the payload is of concrete type `P`.
    #[must_use]
    pub fn holds<P: Print>(&self) -> bool {
        self.raw.payload_type_id() == TypeId::of::<P>()
    }

    /// Whether `self` and `other` hold payloads of the same concrete type.
    #[must_use]
    pub fn holds_same_type_as(&self, other: &Poly) -> bool {
        self.raw.holds_same_type_as(&other.raw)
    }

    /// Returns a reference to the payload if it is of concrete type `P`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::fmt;
    ///
    /// use polybox::{Poly, Print};
    ///
    /// #[derive(Clone, Default)]
    /// struct Answer(i32);
    ///
    /// impl Print for Answer {
    ///     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    ///         write!(f, "{}", self.0)
    ///     }
    /// }
    ///
    /// #[derive(Clone, Default)]
    /// struct Other;
    /// # impl Print for Other {
    /// #     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    /// #         f.write_str("other")
    /// #     }
    /// # }
    ///
    /// let value = Poly::new(Answer(42));
    /// assert_eq!(value.downcast_ref::<Answer>().unwrap().0, 42);
    /// assert!(value.downcast_ref::<Other>().is_none());
    /// ```
    #[must_use]
    pub fn downcast_ref<P: Print>(&self) -> Option<&P> {
        if self.holds::<P>() {
            // SAFETY: We just checked that the payload type is `P`.
            Some(unsafe { self.raw.payload_downcast_unchecked::<P>() })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the payload if it is of concrete type
    /// `P`.
    #[must_use]
    pub fn downcast_mut<P: Print>(&mut self) -> Option<&mut P> {
        if self.holds::<P>() {
            // SAFETY: We just checked that the payload type is `P`.
            Some(unsafe { self.raw.payload_downcast_unchecked_mut::<P>() })
        } else {
            None
        }
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[must_use]
    pub fn payload_type_name(&self) -> &'static str {
        self.raw.payload_type_name()
    }

    /// Whether the payload is stored inline within the container rather than
    /// on a heap block.
    ///
    /// This is a property of the payload's concrete type: every `Poly`
    /// holding the same type agrees.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.raw.is_inline()
    }

    /// Returns the address of the live payload.
    ///
    /// Mainly useful for storage-identity checks: same-type assignment never
    /// changes the address of the destination's payload.
    #[must_use]
    pub fn payload_addr(&self) -> *const () {
        self.raw.payload_addr()
    }
}

impl Clone for Poly {
    /// Copy-constructs an independent `Poly` holding a copy of the payload.
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }

    /// Copy-assigns `source`'s payload into `self`, reusing `self`'s
    /// existing storage when both hold the same concrete type.
    fn clone_from(&mut self, source: &Self) {
        self.raw.clone_from(&source.raw);
    }
}

impl fmt::Display for Poly {
    /// Invokes the payload's [`Print`] capability.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.invoke(formatter)
    }
}

impl fmt::Debug for Poly {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Poly")
            .field("payload_type", &self.payload_type_name())
            .field("inline", &self.is_inline())
            .finish_non_exhaustive()
    }
}

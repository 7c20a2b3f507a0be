//! The capability set exposed through [`Poly`](crate::Poly), and the handler
//! bridging it into the generic dispatch machinery.

use core::fmt;

use polybox_internals::handlers::PolyHandler;

/// The capability a payload type must expose to be stored in a
/// [`Poly`](crate::Poly).
///
/// The supertraits carry the lifecycle half of the contract:
///
/// - [`Clone`] backs copy-construction and copy-assignment of the container;
/// - [`Default`] defines the *moved-from* state — after
///   [`Poly::take`](crate::Poly::take) or
///   [`Poly::take_from`](crate::Poly::take_from), the source payload holds
///   `Self::default()`;
/// - `'static` is required because the container erases the payload type.
///
/// # Examples
///
/// ```
/// use core::fmt;
///
/// use polybox::{Poly, Print};
///
/// #[derive(Clone, Default)]
/// struct Greeting(&'static str);
///
/// impl Print for Greeting {
///     fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "hello, {}", self.0)
///     }
/// }
///
/// let value = Poly::new(Greeting("world"));
/// assert_eq!(value.to_string(), "hello, world");
/// ```
pub trait Print: Clone + Default + 'static {
    /// Writes the payload's printed form to the formatter.
    ///
    /// This is the operation dispatched by
    /// [`Poly::print`](crate::Poly::print) and by the
    /// [`Display`](core::fmt::Display) implementation of
    /// [`Poly`](crate::Poly).
    fn print(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Handler dispatching the [`Print`] capability through the generic
/// container machinery.
///
/// This is the glue between the facade's capability trait and the
/// [`PolyHandler`] seam of the internals: one zero-sized handler whose
/// `invoke` forwards to [`Print::print`]. A container with a different
/// capability set would define its own handler in the same shape.
#[derive(Clone, Copy, Debug)]
pub struct PrintHandler;

impl<P: Print> PolyHandler<P> for PrintHandler {
    fn invoke(value: &P, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        value.print(formatter)
    }
}

//! Handlers that define the capability a payload type exposes through the
//! type-erased container.
//!
//! A handler is a zero-sized type whose associated functions become the
//! capability thunks of a dispatch table. Keeping the capability in a
//! separate handler type (instead of an inherent method on the payload)
//! means the same payload type can be stored behind different capability
//! sets, and the container machinery never needs to name the payload type's
//! own methods.

/// Trait for implementing the capability dispatched through a [`RawPoly`].
///
/// The single method of this trait is instantiated per payload type and
/// stored as a function pointer in the payload's dispatch table. Extending
/// the capability set of a container means adding methods here and
/// corresponding fields to the vtable; the lifecycle machinery is unaffected.
///
/// # Examples
///
/// ```
/// use polybox_internals::handlers::PolyHandler;
///
/// #[derive(Clone, Default)]
/// struct Celsius(f64);
///
/// struct CelsiusHandler;
///
/// impl PolyHandler<Celsius> for CelsiusHandler {
///     fn invoke(value: &Celsius, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
///         write!(formatter, "{} °C", value.0)
///     }
/// }
/// ```
///
/// [`RawPoly`]: crate::RawPoly
pub trait PolyHandler<P>: 'static {
    /// Invokes the capability against the payload, writing any observable
    /// output to the formatter.
    ///
    /// This is called whenever the capability of a container holding a `P`
    /// is invoked. The formatter-sink signature keeps the operation free of
    /// I/O assumptions: callers decide where the output goes.
    fn invoke(value: &P, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result;
}

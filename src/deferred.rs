//! Deferred values.

/// A computation that produces a value, or fails, each time it is asked.
///
/// Nothing is cached: whether calling [`value`](Self::value) twice is cheap,
/// or even safe, is up to the implementation. Wrap it in a
/// [`Sticky`](crate::Sticky) to run it at most once.
///
/// Any `Fn() -> Result<T, E>` closure is a `Deferred`.
pub trait Deferred {
   /// The produced value.
   type Output;
   /// The failure.
   type Error;

   /// Runs the computation.
   fn value(&self) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Deferred for F
where
   F: Fn() -> Result<T, E>,
{
   type Output = T;
   type Error = E;

   #[inline]
   fn value(&self) -> Result<T, E> {
      self()
   }
}

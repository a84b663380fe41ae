//! Re-traversable sequences.

/// A source that hands out a fresh traversal on every request.
///
/// Each call to [`traverse`](Self::traverse) starts from the beginning and may
/// observe different elements, or repeat side effects, if the source is
/// stateful. [`Materialized`](crate::Materialized) turns such a source into a
/// stored collection traversed only once.
///
/// Any `Fn() -> impl IntoIterator` closure is a `Sequence`.
pub trait Sequence {
   /// The element type.
   type Item;
   /// The traversal cursor.
   type Iter<'a>: Iterator<Item = Self::Item>
   where
      Self: 'a;

   /// Starts a new traversal.
   fn traverse(&self) -> Self::Iter<'_>;
}

impl<F, I> Sequence for F
where
   F: Fn() -> I,
   I: IntoIterator,
{
   type Item = I::Item;
   type Iter<'a>
      = I::IntoIter
   where
      Self: 'a;

   #[inline]
   fn traverse(&self) -> I::IntoIter {
      self().into_iter()
   }
}

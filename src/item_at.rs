//! Positional lookup with fallbacks.
//!
//! [`item_at`] walks a traversal up to the requested zero-based position. When
//! the traversal ends first, a [`Fallback`] decides the outcome: the default
//! [`Missing`] fails with [`Error`], [`Value`] substitutes a fixed element, and
//! any `Fn(Exhausted) -> Result<T, E>` computes one. Fallbacks only run on the
//! exhaustion path, and whatever they return (including their own failure) is
//! what the caller sees.
//!
//! Nothing here is cached. [`ItemAt`] packages a lookup as a [`Deferred`] that
//! re-traverses its source on every call; wrap it in a [`Sticky`](crate::Sticky)
//! to keep the first answer. Because it still owns the source, its fallback
//! may be a [`SequenceFallback`] that traverses the source again, e.g. through
//! [`ItemAt::or_else_from`].

use core::convert::Infallible;

use crate::deferred::Deferred;
use crate::error::Error;
use crate::sequence::Sequence;

/// What the traversal looked like when it ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Exhausted {
   /// The requested position.
   pub position: usize,
   /// How many elements the traversal produced.
   pub len: usize,
}

impl Exhausted {
   /// Checks if the traversal produced nothing at all.
   #[inline]
   pub const fn is_empty(&self) -> bool {
      self.len == 0
   }
}

/// Decides the outcome of a lookup past the end of a sequence.
pub trait Fallback<T> {
   /// The failure this fallback can produce.
   type Error;

   /// Produces a substitute element, or fails.
   fn recover(&self, exhausted: Exhausted) -> Result<T, Self::Error>;
}

/// The default fallback: fails with [`Error::EmptySequence`] for position 0
/// and [`Error::PositionNotFound`] otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Missing;

impl<T> Fallback<T> for Missing {
   type Error = Error;

   fn recover(&self, exhausted: Exhausted) -> Result<T, Error> {
      Err(match exhausted.position {
         0 => Error::EmptySequence,
         position => Error::PositionNotFound(position),
      })
   }
}

/// A fallback that substitutes a fixed element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Value<T>(pub T);

impl<T: Clone> Fallback<T> for Value<T> {
   type Error = Infallible;

   #[inline]
   fn recover(&self, _: Exhausted) -> Result<T, Infallible> {
      Ok(self.0.clone())
   }
}

impl<F, T, E> Fallback<T> for F
where
   F: Fn(Exhausted) -> Result<T, E>,
{
   type Error = E;

   #[inline]
   fn recover(&self, exhausted: Exhausted) -> Result<T, E> {
      self(exhausted)
   }
}

/// Decides the outcome of an [`ItemAt`] lookup past the end of its source,
/// with the source itself at hand.
///
/// Every [`Fallback`] is one, ignoring the source. [`FromSource`] adapts a
/// closure that wants to look at it.
pub trait SequenceFallback<S: Sequence> {
   /// The failure this fallback can produce.
   type Error;

   /// Produces a substitute element, or fails. `source` can be traversed again.
   fn recover(&self, source: &S, exhausted: Exhausted) -> Result<S::Item, Self::Error>;
}

impl<S, F> SequenceFallback<S> for F
where
   S: Sequence,
   F: Fallback<S::Item>,
{
   type Error = F::Error;

   #[inline]
   fn recover(&self, _: &S, exhausted: Exhausted) -> Result<S::Item, F::Error> {
      <F as Fallback<S::Item>>::recover(self, exhausted)
   }
}

/// A fallback computed from the source and the exhausted traversal.
#[derive(Debug, Clone, Copy)]
pub struct FromSource<G>(pub G);

impl<S, G, E> SequenceFallback<S> for FromSource<G>
where
   S: Sequence,
   G: Fn(&S, Exhausted) -> Result<S::Item, E>,
{
   type Error = E;

   #[inline]
   fn recover(&self, source: &S, exhausted: Exhausted) -> Result<S::Item, E> {
      (self.0)(source, exhausted)
   }
}

/// Returns the element at `position`, failing with [`Error`] if there is none.
///
/// # Examples
///
/// ```rust
/// use solid_once::{item_at, Error};
///
/// assert_eq!(item_at([10, 20, 30, 40], 3), Ok(40));
/// assert_eq!(item_at(Vec::<i32>::new(), 0), Err(Error::EmptySequence));
/// assert_eq!(item_at([1, 2], 5), Err(Error::PositionNotFound(5)));
/// ```
#[inline]
pub fn item_at<I>(source: I, position: usize) -> Result<I::Item, Error>
where
   I: IntoIterator,
{
   item_at_with(source, position, &Missing)
}

/// Returns the element at `position`, or `default` if there is none.
#[inline]
pub fn item_at_or<I>(source: I, position: usize, default: I::Item) -> I::Item
where
   I: IntoIterator,
{
   lookup(source.into_iter(), position).unwrap_or(default)
}

/// Returns the element at `position`, deferring to `fallback` if there is none.
pub fn item_at_with<I, F>(source: I, position: usize, fallback: &F) -> Result<I::Item, F::Error>
where
   I: IntoIterator,
   F: Fallback<I::Item> + ?Sized,
{
   match lookup(source.into_iter(), position) {
      Ok(item) => Ok(item),
      Err(exhausted) => Fallback::recover(fallback, exhausted),
   }
}

/// Advances `iter` to `position`, counting what it produced if it runs out.
fn lookup<I: Iterator>(iter: I, position: usize) -> Result<I::Item, Exhausted> {
   let mut len = 0;
   for item in iter {
      if len == position {
         return Ok(item);
      }
      len += 1;
   }
   Err(Exhausted { position, len })
}

/// A positional lookup as a [`Deferred`] value.
///
/// Every [`value`](Deferred::value) call starts a new traversal of the source.
///
/// # Examples
///
/// ```rust
/// use solid_once::{Deferred, ItemAt};
///
/// let third = ItemAt::new(|| vec![1, 2, 3], 2);
/// assert_eq!(third.value(), Ok(3));
///
/// let tenth = ItemAt::new(|| vec![1, 2, 3], 9).or(0);
/// assert_eq!(tenth.value(), Ok(0));
/// ```
#[derive(Debug, Clone)]
pub struct ItemAt<S, F = Missing> {
   source: S,
   position: usize,
   fallback: F,
}

impl<S: Sequence> ItemAt<S> {
   /// Looks up `position` in `source`, failing with [`Error`] if it is absent.
   #[inline]
   #[must_use]
   pub fn new(source: S, position: usize) -> Self {
      Self {
         source,
         position,
         fallback: Missing,
      }
   }
}

impl<S: Sequence, F> ItemAt<S, F> {
   /// Replaces the fallback.
   #[inline]
   #[must_use]
   pub fn with_fallback<G: SequenceFallback<S>>(self, fallback: G) -> ItemAt<S, G> {
      ItemAt {
         source: self.source,
         position: self.position,
         fallback,
      }
   }

   /// Falls back to a fixed element.
   #[inline]
   #[must_use]
   pub fn or(self, default: S::Item) -> ItemAt<S, Value<S::Item>>
   where
      S::Item: Clone,
   {
      self.with_fallback(Value(default))
   }

   /// Falls back to an element computed from the exhausted traversal.
   #[inline]
   #[must_use]
   pub fn or_else<G, E>(self, fallback: G) -> ItemAt<S, G>
   where
      G: Fn(Exhausted) -> Result<S::Item, E>,
   {
      self.with_fallback(fallback)
   }

   /// Falls back to an element computed from the source, traversed anew, and
   /// the exhausted traversal.
   ///
   /// ```rust
   /// use solid_once::{Deferred, ItemAt, Sequence};
   ///
   /// let clamped = ItemAt::new(|| vec![1, 2, 3], 9)
   ///    .or_else_from(|source, _| source.traverse().last().ok_or("empty"));
   /// assert_eq!(clamped.value(), Ok(3));
   /// ```
   #[inline]
   #[must_use]
   pub fn or_else_from<G, E>(self, fallback: G) -> ItemAt<S, FromSource<G>>
   where
      G: Fn(&S, Exhausted) -> Result<S::Item, E>,
   {
      self.with_fallback(FromSource(fallback))
   }

   /// The requested position.
   #[inline]
   pub fn position(&self) -> usize {
      self.position
   }
}

impl<S, F> Deferred for ItemAt<S, F>
where
   S: Sequence,
   F: SequenceFallback<S>,
{
   type Output = S::Item;
   type Error = F::Error;

   #[inline]
   fn value(&self) -> Result<S::Item, F::Error> {
      match lookup(self.source.traverse(), self.position) {
         Ok(item) => Ok(item),
         Err(exhausted) => SequenceFallback::recover(&self.fallback, &self.source, exhausted),
      }
   }
}

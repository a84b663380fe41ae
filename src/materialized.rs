//! Sequences traversed once and stored.

use core::fmt;
use core::iter::Cloned;
use core::ops::Index;
use core::slice;

use tracing::debug;

use crate::memo::Memoizer;
use crate::sequence::Sequence;

/// A [`Sequence`] traversed exactly once, then served from memory.
///
/// The first access of any kind (length, indexing, iteration, another
/// traversal) walks the source and stores every element in order; nothing
/// after that touches the source again, no matter how many threads ask.
/// Use it when a traversal is expensive or has side effects that must not
/// repeat.
///
/// Elements are stored as produced. If they are themselves deferred values
/// they are not forced, and indexing the same position twice returns the same
/// instance.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use solid_once::Materialized;
///
/// let traversals = AtomicUsize::new(0);
/// let list = Materialized::new(|| {
///    traversals.fetch_add(1, Ordering::SeqCst);
///    [1, -1, 0, 1].into_iter().map(|i| i + 1)
/// });
///
/// assert_eq!(list.len(), 4);
/// assert_eq!(list[1], 0);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [2, 0, 1, 2]);
/// assert_eq!(traversals.load(Ordering::SeqCst), 1);
/// ```
pub struct Materialized<S: Sequence> {
   source: S,
   memo: Memoizer<(), Vec<S::Item>>,
}

impl<S: Sequence> Materialized<S> {
   /// Wraps `source` without traversing it.
   #[inline]
   #[must_use]
   pub fn new(source: S) -> Self {
      Self {
         source,
         memo: Memoizer::new(),
      }
   }

   /// Returns the stored elements, traversing the source on first use.
   pub fn items(&self) -> &[S::Item] {
      self.memo.get_or_init((), || {
         let items: Vec<_> = self.source.traverse().collect();
         debug!(len = items.len(), "sequence materialized");
         items
      })
   }

   /// Checks if the source has been traversed yet. Never blocks.
   #[inline]
   pub fn is_materialized(&self) -> bool {
      self.memo.peek(&()).is_some()
   }

   /// Number of elements.
   #[inline]
   pub fn len(&self) -> usize {
      self.items().len()
   }

   /// Returns `true` if the source produced no elements.
   #[inline]
   pub fn is_empty(&self) -> bool {
      self.items().is_empty()
   }

   /// Returns the element at `index`, if any.
   #[inline]
   pub fn get(&self, index: usize) -> Option<&S::Item> {
      self.items().get(index)
   }

   /// Iterates over the stored elements by reference.
   #[inline]
   pub fn iter(&self) -> slice::Iter<'_, S::Item> {
      self.items().iter()
   }

   /// Checks if an element equal to `item` was produced.
   #[inline]
   pub fn contains(&self, item: &S::Item) -> bool
   where
      S::Item: PartialEq,
   {
      self.items().contains(item)
   }
}

impl<S> Sequence for Materialized<S>
where
   S: Sequence,
   S::Item: Clone,
{
   type Item = S::Item;
   type Iter<'a>
      = Cloned<slice::Iter<'a, S::Item>>
   where
      Self: 'a;

   #[inline]
   fn traverse(&self) -> Self::Iter<'_> {
      self.iter().cloned()
   }
}

impl<S: Sequence> Index<usize> for Materialized<S> {
   type Output = S::Item;

   #[inline]
   fn index(&self, index: usize) -> &S::Item {
      &self.items()[index]
   }
}

impl<'a, S: Sequence> IntoIterator for &'a Materialized<S> {
   type Item = &'a S::Item;
   type IntoIter = slice::Iter<'a, S::Item>;

   #[inline]
   fn into_iter(self) -> Self::IntoIter {
      self.iter()
   }
}

impl<S> fmt::Debug for Materialized<S>
where
   S: Sequence,
   S::Item: fmt::Debug,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.memo.peek(&()) {
         Some(Ok(items)) => f.debug_tuple("Materialized").field(items).finish(),
         Some(Err(never)) => match *never {},
         None => f.write_str("Materialized(<pending>)"),
      }
   }
}

/// A [`Sequence`] of `Result`s traversed exactly once into a `Vec` of values.
///
/// The traversal stops at the first `Err`. That failure becomes the stored
/// outcome, so every caller, on any thread, receives the same error, and no
/// partially collected elements are ever exposed. Like [`Materialized`], the
/// source is never traversed a second time, whether it succeeded or not.
///
/// # Examples
///
/// ```rust
/// use solid_once::TryMaterialized;
///
/// let numbers = TryMaterialized::new(|| "1 2 x 4".split(' ').map(str::parse::<u8>));
///
/// assert!(numbers.items().is_err());
/// assert!(numbers.len().is_err());
///
/// let numbers = TryMaterialized::new(|| "1 2 3".split(' ').map(str::parse::<u8>));
/// assert_eq!(numbers.items(), Ok(&[1, 2, 3][..]));
/// ```
pub struct TryMaterialized<S, T, E> {
   source: S,
   memo: Memoizer<(), Vec<T>, E>,
}

impl<S, T, E> TryMaterialized<S, T, E>
where
   S: Sequence<Item = Result<T, E>>,
{
   /// Wraps `source` without traversing it.
   #[inline]
   #[must_use]
   pub fn new(source: S) -> Self {
      Self {
         source,
         memo: Memoizer::new(),
      }
   }

   /// Returns the stored elements or the stored failure, traversing the source on first use.
   pub fn items(&self) -> Result<&[T], &E> {
      self
         .memo
         .get((), || {
            let items: Result<Vec<_>, _> = self.source.traverse().collect();
            match &items {
               Ok(items) => debug!(len = items.len(), "sequence materialized"),
               Err(_) => debug!("sequence traversal failed, caching the failure"),
            }
            items
         })
         .map(Vec::as_slice)
   }

   /// Checks if the source has been traversed yet. Never blocks.
   #[inline]
   pub fn is_materialized(&self) -> bool {
      self.memo.peek(&()).is_some()
   }

   /// Number of elements.
   #[inline]
   pub fn len(&self) -> Result<usize, &E> {
      self.items().map(<[T]>::len)
   }

   /// Returns `Ok(true)` if the source produced no elements.
   #[inline]
   pub fn is_empty(&self) -> Result<bool, &E> {
      self.items().map(<[T]>::is_empty)
   }

   /// Returns the element at `index`, if any.
   #[inline]
   pub fn get(&self, index: usize) -> Result<Option<&T>, &E> {
      self.items().map(|items| items.get(index))
   }

   /// Iterates over the stored elements by reference.
   #[inline]
   pub fn iter(&self) -> Result<slice::Iter<'_, T>, &E> {
      self.items().map(<[T]>::iter)
   }
}

impl<S, T, E> fmt::Debug for TryMaterialized<S, T, E>
where
   T: fmt::Debug,
   E: fmt::Debug,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.memo.peek(&()) {
         Some(Ok(items)) => f.debug_tuple("TryMaterialized").field(items).finish(),
         Some(Err(e)) => f.debug_tuple("TryMaterialized").field(&format_args!("Err({e:?})")).finish(),
         None => f.write_str("TryMaterialized(<pending>)"),
      }
   }
}

//! Functions memoized per input.

use core::fmt;
use core::hash::Hash;

use crate::memo::Memoizer;

/// A function that runs at most once per distinct input.
///
/// Each outcome, value or failure, is kept for the lifetime of the `MemoFn`.
///
/// # Examples
///
/// ```rust
/// use solid_once::MemoFn;
///
/// let parse = MemoFn::new(|s: &String| s.parse::<u32>().map_err(|e| e.to_string()));
///
/// assert_eq!(parse.call(&"12".to_string()), Ok(&12));
/// assert!(parse.call(&"x".to_string()).is_err());
/// assert_eq!(parse.len(), 2);
/// ```
pub struct MemoFn<K, T, E, F> {
   func: F,
   memo: Memoizer<K, T, E>,
}

impl<K, T, E, F> MemoFn<K, T, E, F>
where
   K: Hash + Eq + Clone,
   F: Fn(&K) -> Result<T, E>,
{
   /// Wraps `func`.
   #[inline]
   #[must_use]
   pub fn new(func: F) -> Self {
      Self {
         func,
         memo: Memoizer::new(),
      }
   }

   /// Returns the outcome for `key`, calling the function only the first time.
   ///
   /// The key is cloned into the cache only when it is new.
   pub fn call(&self, key: &K) -> Result<&T, &E> {
      self.memo.get_by_ref(key, || (self.func)(key))
   }

   /// Number of distinct inputs seen.
   #[inline]
   pub fn len(&self) -> usize {
      self.memo.len()
   }

   /// Returns `true` if the function was never called.
   #[inline]
   pub fn is_empty(&self) -> bool {
      self.memo.is_empty()
   }
}

impl<K, T, E, F> fmt::Debug for MemoFn<K, T, E, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("MemoFn").field("len", &self.memo.len()).finish()
   }
}

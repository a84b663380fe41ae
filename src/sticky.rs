//! Deferred values computed at most once.

use core::fmt;

use crate::deferred::Deferred;
use crate::memo::Memoizer;

/// A [`Deferred`] whose outcome is computed once and then reused.
///
/// The first call to [`get`](Self::get) (or the first of a concurrent group)
/// runs the wrapped computation; every call afterwards, from any thread,
/// receives the same outcome. A failure sticks just like a value does.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use solid_once::Sticky;
///
/// let runs = AtomicUsize::new(0);
/// let answer = Sticky::new(|| {
///    runs.fetch_add(1, Ordering::SeqCst);
///    Ok::<_, String>(42)
/// });
///
/// assert_eq!(answer.get(), Ok(&42));
/// assert_eq!(answer.get(), Ok(&42));
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
pub struct Sticky<D: Deferred> {
   source: D,
   memo: Memoizer<(), D::Output, D::Error>,
}

impl<D: Deferred> Sticky<D> {
   /// Wraps `source` without running it.
   #[inline]
   #[must_use]
   pub fn new(source: D) -> Self {
      Self {
         source,
         memo: Memoizer::new(),
      }
   }

   /// Returns the outcome, computing it on first use.
   #[inline]
   pub fn get(&self) -> Result<&D::Output, &D::Error> {
      self.memo.get((), || self.source.value())
   }

   /// Checks if the outcome is already stored. Never blocks.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.memo.peek(&()).is_some()
   }
}

impl<D> Deferred for Sticky<D>
where
   D: Deferred,
   D::Output: Clone,
   D::Error: Clone,
{
   type Output = D::Output;
   type Error = D::Error;

   #[inline]
   fn value(&self) -> Result<D::Output, D::Error> {
      self.get().cloned().map_err(|e| e.clone())
   }
}

impl<D> fmt::Debug for Sticky<D>
where
   D: Deferred,
   D::Output: fmt::Debug,
   D::Error: fmt::Debug,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("Sticky");
      match self.memo.peek(&()) {
         Some(Ok(v)) => d.field(v),
         Some(Err(e)) => d.field(&format_args!("Err({e:?})")),
         None => d.field(&format_args!("<pending>")),
      };
      d.finish()
   }
}

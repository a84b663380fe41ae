//! A single memoized outcome.
//!
//! [`MemoEntry`] is the slot behind every memo key: it holds nothing until the
//! first caller runs the computation, then holds that computation's `Result`
//! forever. Success and failure are stored alike, so a failed computation is
//! replayed rather than retried.

use core::cell::UnsafeCell;
use core::fmt;
use core::future::Future;
use core::mem;

use tracing::{debug, trace};

use crate::state::EntryState;

pub(crate) struct MemoEntry<T, E> {
   outcome: UnsafeCell<mem::MaybeUninit<Result<T, E>>>,
   state: EntryState,
}

impl<T, E> MemoEntry<T, E> {
   #[inline]
   pub(crate) const fn new() -> Self {
      Self {
         outcome: UnsafeCell::new(mem::MaybeUninit::uninit()),
         state: EntryState::new(),
      }
   }

   /// Checks if the outcome has been stored. Never blocks.
   #[inline]
   pub(crate) fn is_done(&self) -> bool {
      self.state.is_done()
   }

   /// Returns the stored outcome, or `None` while absent or in progress.
   #[inline]
   pub(crate) fn get(&self) -> Option<Result<&T, &E>> {
      if self.is_done() {
         // SAFETY: DONE is only set after the outcome was written.
         Some(unsafe { self.outcome_unchecked() })
      } else {
         None
      }
   }

   /// Returns the stored outcome, running `compute` first if nobody has.
   ///
   /// Concurrent callers block until the single running computation commits.
   #[inline]
   pub(crate) fn get_or_compute<F>(&self, compute: F) -> Result<&T, &E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      if let Some(outcome) = self.get() {
         return outcome;
      }
      self.compute(compute);
      // SAFETY: `compute` only returns once the entry is DONE.
      unsafe { self.outcome_unchecked() }
   }

   /// Async counterpart of [`get_or_compute`](Self::get_or_compute).
   pub(crate) async fn get_or_compute_async<F, Fut>(&self, compute: F) -> Result<&T, &E>
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = Result<T, E>>,
   {
      if let Some(outcome) = self.get() {
         return outcome;
      }
      self.compute_async(compute).await;
      // SAFETY: `compute_async` only returns once the entry is DONE.
      unsafe { self.outcome_unchecked() }
   }

   /// # Safety
   ///
   /// The entry must be DONE.
   #[inline]
   unsafe fn outcome_unchecked(&self) -> Result<&T, &E> {
      debug_assert!(self.is_done(), "outcome read before it was stored");
      unsafe { (*self.outcome.get()).assume_init_ref() }.as_ref()
   }

   #[cold]
   fn compute<F>(&self, compute: F)
   where
      F: FnOnce() -> Result<T, E>,
   {
      let Some(guard) = self.state.lock() else {
         return;
      };
      trace!("running memoized computation");
      let outcome = compute();
      if outcome.is_err() {
         debug!("memoized computation failed, caching the failure");
      }
      // SAFETY: we hold the compute lock and the entry is not DONE, so no
      // reader can observe the slot yet.
      unsafe { (*self.outcome.get()).write(outcome) };
      guard.commit();
   }

   #[cold]
   async fn compute_async<F, Fut>(&self, compute: F)
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = Result<T, E>>,
   {
      let Some(guard) = self.state.lock_async().await else {
         return;
      };
      trace!("running memoized computation (async)");
      let outcome = compute().await;
      if outcome.is_err() {
         debug!("memoized computation failed, caching the failure");
      }
      // SAFETY: as in `compute`.
      unsafe { (*self.outcome.get()).write(outcome) };
      guard.commit();
   }
}

// SAFETY: the outcome is written once under the compute lock and only shared
// by reference afterwards, so sharing needs `Sync` outcomes; it may be produced
// on one thread and dropped on another, which needs `Send`.
unsafe impl<T: Send + Sync, E: Send + Sync> Sync for MemoEntry<T, E> {}
// SAFETY: owning the entry owns the outcome.
unsafe impl<T: Send, E: Send> Send for MemoEntry<T, E> {}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for MemoEntry<T, E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.get() {
         Some(Ok(v)) => f.debug_tuple("Ok").field(v).finish(),
         Some(Err(e)) => f.debug_tuple("Err").field(e).finish(),
         None => f.write_str("<pending>"),
      }
   }
}

impl<T, E> Drop for MemoEntry<T, E> {
   #[inline]
   fn drop(&mut self) {
      if self.is_done() {
         // SAFETY: exclusive access and the outcome was written.
         unsafe { self.outcome.get_mut().assume_init_drop() };
      }
   }
}

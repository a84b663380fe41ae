//! Per-entry synchronization state for memoized computations.
//!
//! Every memo entry owns one [`EntryState`], an `AtomicU8` packed as:
//! - Bit 0: DONE - The outcome (value or failure) is stored
//! - Bit 1: LOCKED - A caller is running the computation
//! - Bit 2: WAITING - At least one caller is parked on this entry
//! - Bits 3-7: EPOCH - Generation counter so parked callers see every transition
//!
//! LOCKED is the "compute in progress" marker: it is taken with a
//! compare-exchange before the computation starts, so at most one caller can
//! ever run it. Callers that lose the race park on the state's address through
//! `parking_lot_core` and are woken when the winner commits.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Atomic state of a single memo entry.
#[repr(transparent)]
pub(crate) struct EntryState(AtomicU8);

impl EntryState {
   /// Bit flag: outcome stored.
   const DONE: u8 = 1;
   /// Bit flag: computation in progress.
   const LOCKED: u8 = 2;
   /// Bit flag: someone is parked.
   const WAITING: u8 = 4;
   /// Lowest epoch bit.
   const EPOCH_1: u8 = 8;
   /// Mask for epoch bits.
   const EPOCH_MASK: u8 = !(Self::DONE | Self::LOCKED | Self::WAITING);

   #[inline(always)]
   const fn next_epoch(current: u8) -> u8 {
      (current & Self::EPOCH_MASK).wrapping_add(Self::EPOCH_1) & Self::EPOCH_MASK
   }

   /// Creates the state of an entry nobody has computed yet.
   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   #[inline]
   fn notify_all(&self) {
      // SAFETY: the key is the address of our atomic, the same one `wait` parks on.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the caller until the state moves away from `expected`.
   #[inline]
   fn wait(&self, expected: u8) {
      // SAFETY: see `notify_all`.
      unsafe {
         // The validate closure runs under the bucket lock, so a commit racing
         // with us either happens before (we don't sleep) or wakes us.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Publishes the outcome: sets DONE, bumps the epoch and wakes waiters.
   ///
   /// Must only be called by the holder of the LOCKED bit.
   #[inline]
   fn set_done(&self) {
      let current = self.0.load(Ordering::Relaxed);
      let next = Self::DONE | Self::next_epoch(current);
      // Release pairs with the Acquire load in `is_done`, making the stored
      // outcome visible to every reader that observes DONE.
      let prev = self.0.swap(next, Ordering::Release);
      if prev & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   /// Abandons an in-progress computation without an outcome.
   ///
   /// Only reachable when the computation unwinds; the next caller retakes the lock.
   #[inline]
   fn set_abandoned(&self) {
      let current = self.0.load(Ordering::Relaxed);
      let prev = self.0.swap(Self::next_epoch(current), Ordering::Release);
      if prev & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   /// Checks whether the outcome has been published.
   #[inline]
   pub(crate) fn is_done(&self) -> bool {
      self.0.load(Ordering::Acquire) & Self::DONE != 0
   }

   /// One attempt at taking the compute lock.
   ///
   /// - `Ok(None)`: the outcome is already stored.
   /// - `Ok(Some(guard))`: we own the computation.
   /// - `Err(state)`: someone else is computing; `state` has WAITING set.
   #[inline]
   fn lock_step(&self) -> Result<Option<ComputeGuard<'_>>, u8> {
      loop {
         let current = self.0.load(Ordering::Relaxed);
         if current & Self::DONE != 0 {
            return Ok(None);
         }

         if current & Self::LOCKED == 0 {
            match self.0.compare_exchange_weak(
               current,
               current | Self::LOCKED,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Ok(Some(ComputeGuard { state: self })),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         if current & Self::WAITING == 0 {
            let flagged = current | Self::WAITING;
            match self.0.compare_exchange_weak(
               current,
               flagged,
               Ordering::Relaxed,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Err(flagged),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }
         return Err(current);
      }
   }

   /// Takes the compute lock, parking while another caller holds it.
   ///
   /// Returns `None` once the outcome is stored (possibly by the caller we waited on).
   #[inline]
   pub(crate) fn lock(&self) -> Option<ComputeGuard<'_>> {
      let mut observed = match self.lock_step() {
         Ok(guard) => return guard,
         Err(state) => state,
      };
      loop {
         self.wait(observed);
         match self.lock_step() {
            Ok(guard) => return guard,
            Err(state) => observed = state,
         }
      }
   }

   /// Async flavour of [`lock`](Self::lock).
   ///
   /// Yields to the runtime while the holder is busy, then falls back to
   /// parking inside `block_in_place` on the multi-threaded runtime.
   #[inline]
   pub(crate) async fn lock_async(&self) -> Option<ComputeGuard<'_>> {
      #[allow(clippy::never_loop)]
      loop {
         for _ in 0..16 {
            match self.lock_step() {
               Ok(guard) => return guard,
               Err(state) => {
                  for _ in 0..32 {
                     #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
                     tokio::task::yield_now().await;
                     if self.0.load(Ordering::Relaxed) != state {
                        break;
                     }
                  }
               }
            }
         }

         #[cfg(feature = "async-tokio-mt")]
         {
            return match self.lock_step() {
               Ok(guard) => guard,
               Err(state) => tokio::task::block_in_place(|| {
                  self.wait(state);
                  self.lock()
               }),
            };
         }
      }
   }
}

/// Proof of holding the LOCKED bit.
///
/// [`commit`](Self::commit) publishes the outcome; dropping the guard
/// without committing (an unwinding computation) releases the lock instead.
pub(crate) struct ComputeGuard<'a> {
   state: &'a EntryState,
}

impl ComputeGuard<'_> {
   /// Marks the entry DONE and wakes every waiter.
   #[inline(always)]
   pub(crate) fn commit(self) {
      self.state.set_done();
      mem::forget(self);
   }
}

impl Drop for ComputeGuard<'_> {
   #[inline(always)]
   fn drop(&mut self) {
      self.state.set_abandoned();
   }
}

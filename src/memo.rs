//! Keyed once-only evaluation.
//!
//! [`Memoizer`] maps keys to memo entries. Keys are hashed before the map's
//! lock is touched; a hit then takes only the shared side of the lock, and the
//! exclusive side is taken just long enough to insert a missing key. The
//! computation itself runs outside the lock, serialized per key by the
//! entry's own compute lock. Two callers racing on one key therefore see a
//! single invocation, while callers on different keys never wait for each
//! other's computation.

use core::convert::Infallible;
use core::fmt;
use core::future::Future;
use core::hash::{BuildHasher, Hash};
use core::ptr::NonNull;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use crate::entry::MemoEntry;

/// Keys sharing one hash, with their leaked entries.
type Bucket<K, T, E> = Vec<(K, NonNull<MemoEntry<T, E>>)>;

/// A thread-safe cache that computes each key's outcome at most once.
///
/// The outcome of the first computation for a key, success or failure, is
/// stored permanently and handed out by reference to every later caller.
/// There is no eviction and no retry: to try again, build a new `Memoizer`.
///
/// A computation that panics leaves no outcome behind; the next caller for
/// that key runs its own computation. Calling [`get`](Self::get) for a key
/// from inside that same key's computation deadlocks.
///
/// # Examples
///
/// ```rust
/// use solid_once::Memoizer;
///
/// let memo: Memoizer<&str, usize, String> = Memoizer::new();
///
/// assert_eq!(memo.get("four", || Ok(4)), Ok(&4));
/// assert_eq!(memo.get("four", || Ok(5)), Ok(&4));
///
/// assert_eq!(memo.get("bad", || Err("nope".to_string())), Err(&"nope".to_string()));
/// assert_eq!(memo.get("bad", || Ok(0)), Err(&"nope".to_string()));
/// ```
pub struct Memoizer<K, T, E = Infallible> {
   hasher: RandomState,
   // Leaked entries never move and are never removed before `drop`, which is
   // what lets `entry` hand out references that outlive the lock guard.
   entries: RwLock<HashMap<u64, Bucket<K, T, E>>>,
}

impl<K, T, E> Memoizer<K, T, E> {
   /// Creates an empty memoizer.
   #[inline]
   #[must_use]
   pub fn new() -> Self {
      Self {
         hasher: RandomState::new(),
         entries: RwLock::new(HashMap::new()),
      }
   }

   /// Number of keys that have been requested so far, including ones still computing.
   pub fn len(&self) -> usize {
      self.entries.read().values().map(Vec::len).sum()
   }

   /// Returns `true` if no key has ever been requested.
   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }
}

impl<K: Hash + Eq, T, E> Memoizer<K, T, E> {
   /// Returns the outcome for `key`, running `compute` if no caller has yet.
   ///
   /// If another caller is computing the same key, this blocks until it
   /// finishes and then returns that caller's outcome.
   pub fn get<F>(&self, key: K, compute: F) -> Result<&T, &E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      self.entry(key).get_or_compute(compute)
   }

   /// Async counterpart of [`get`](Self::get).
   ///
   /// Shares entries with the blocking path: whichever caller reaches a key
   /// first computes it for both.
   pub async fn get_async<F, Fut>(&self, key: K, compute: F) -> Result<&T, &E>
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = Result<T, E>>,
   {
      self.entry(key).get_or_compute_async(compute).await
   }

   /// Like [`get`](Self::get), but borrows the key and clones it only when
   /// the key is new.
   pub fn get_by_ref<F>(&self, key: &K, compute: F) -> Result<&T, &E>
   where
      K: Clone,
      F: FnOnce() -> Result<T, E>,
   {
      let hash = self.hasher.hash_one(key);
      let entry = match self.find(hash, key) {
         Some(entry) => entry,
         None => self.insert(hash, key.clone()),
      };
      // SAFETY: see `entry`.
      unsafe { entry.as_ref() }.get_or_compute(compute)
   }

   /// Returns the stored outcome for `key` without computing or blocking.
   ///
   /// `None` if the key was never requested or is still being computed.
   pub fn peek(&self, key: &K) -> Option<Result<&T, &E>> {
      let entry = self.find(self.hasher.hash_one(key), key)?;
      // SAFETY: see `entry`.
      unsafe { entry.as_ref() }.get()
   }

   /// Finds or inserts the entry for `key`.
   fn entry(&self, key: K) -> &MemoEntry<T, E> {
      let hash = self.hasher.hash_one(&key);
      let entry = match self.find(hash, &key) {
         Some(entry) => entry,
         None => self.insert(hash, key),
      };
      // SAFETY: the pointer comes from `Box::leak` and is only reclaimed in
      // `drop`, which needs `&mut self`; the borrow of `self` keeps it alive.
      unsafe { entry.as_ref() }
   }

   /// Looks `key` up under the shared lock.
   fn find(&self, hash: u64, key: &K) -> Option<NonNull<MemoEntry<T, E>>> {
      let entries = self.entries.read();
      entries
         .get(&hash)?
         .iter()
         .find(|(candidate, _)| candidate == key)
         .map(|&(_, entry)| entry)
   }

   /// Inserts `key` under the exclusive lock, unless a racing caller already did.
   #[cold]
   fn insert(&self, hash: u64, key: K) -> NonNull<MemoEntry<T, E>> {
      let mut entries = self.entries.write();
      let bucket = entries.entry(hash).or_default();
      if let Some(&(_, entry)) = bucket.iter().find(|(candidate, _)| *candidate == key) {
         return entry;
      }
      trace!("creating memo entry");
      let entry = NonNull::from(Box::leak(Box::new(MemoEntry::new())));
      bucket.push((key, entry));
      entry
   }
}

impl<K, T> Memoizer<K, T, Infallible>
where
   K: Hash + Eq,
{
   /// Returns the value for `key`, computing it with `f` if needed.
   pub fn get_or_init<F>(&self, key: K, f: F) -> &T
   where
      F: FnOnce() -> T,
   {
      match self.get(key, || Ok(f())) {
         Ok(value) => value,
         Err(never) => match *never {},
      }
   }
}

impl<K, T, E> Default for Memoizer<K, T, E> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<K, T, E> fmt::Debug for Memoizer<K, T, E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Memoizer").field("len", &self.len()).finish()
   }
}

impl<K, T, E> Drop for Memoizer<K, T, E> {
   fn drop(&mut self) {
      for (_, entry) in self.entries.get_mut().drain().flat_map(|(_, bucket)| bucket) {
         // SAFETY: every pointer in the map came from `Box::leak` and no
         // reference to it can outlive `&self`.
         drop(unsafe { Box::from_raw(entry.as_ptr()) });
      }
   }
}

// SAFETY: the map owns its keys and entries like a `HashMap<K, Box<MemoEntry>>`.
unsafe impl<K: Send, T: Send, E: Send> Send for Memoizer<K, T, E> {}
// SAFETY: the map is behind a lock whose shared side lets threads compare keys
// concurrently, hence `K: Sync`; entries are shared by reference across
// threads, which `MemoEntry` allows for `Send + Sync` outcomes.
unsafe impl<K: Send + Sync, T: Send + Sync, E: Send + Sync> Sync for Memoizer<K, T, E> {}

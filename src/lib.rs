//! Thread-safe memoization for deferred values and sequences.
//!
//! Deferred computations are described by two capabilities:
//!
//! - [`Deferred`]: "produce a value or fail", invoked on demand.
//! - [`Sequence`]: "produce a fresh traversal", possibly expensive or side-effecting.
//!
//! On top of them this crate provides wrappers that run the underlying work
//! **at most once**, even under concurrent first access, and hand every caller
//! the same outcome:
//!
//! - [`Sticky<D>`]: a `Deferred` computed once; failures stick too.
//! - [`Materialized<S>`]: a `Sequence` traversed once into an indexable store.
//! - [`TryMaterialized`]: the same for a traversal that can fail part way.
//! - [`MemoFn`]: a function computed once per distinct input.
//! - [`Memoizer<K, T, E>`]: the keyed cache all of the above delegate to.
//!
//! plus uncached positional lookup with fallbacks: [`item_at`],
//! [`item_at_or`], [`item_at_with`] and the [`ItemAt`] deferred value.
//!
//! Keys are hashed before any lock is taken, and a cache hit only holds a
//! shared read lock on the key map for the lookup. On a miss the calling
//! thread runs the computation itself while others wanting the same key park
//! on it via `parking_lot`'s futex-based primitives.
//!
//! # Examples
//!
//! ```rust
//! use solid_once::{Deferred, ItemAt, Materialized, Sticky};
//!
//! // Traverse an expensive source once, then index it freely.
//! let squares = Materialized::new(|| (1..=4).map(|i| i * i));
//! assert_eq!(squares.get(2), Some(&9));
//!
//! // Remember a lookup that would otherwise re-traverse every time.
//! let last = Sticky::new(ItemAt::new(|| squares.iter().copied(), 3));
//! assert_eq!(last.get(), Ok(&16));
//! assert_eq!(last.value(), Ok(16));
//! ```

/// Deferred values.
mod deferred;

/// A single memoized outcome.
mod entry;

/// Positional lookup errors.
mod error;

/// Positional lookup with fallbacks.
mod item_at;

/// Sequences traversed once and stored.
mod materialized;

/// Keyed once-only evaluation.
mod memo;

/// Functions memoized per input.
mod memo_fn;

/// Re-traversable sequences.
mod sequence;

/// Per-entry synchronization state.
mod state;

/// Deferred values computed at most once.
mod sticky;

pub use deferred::Deferred;
pub use error::Error;
pub use item_at::{
   item_at, item_at_or, item_at_with, Exhausted, Fallback, FromSource, ItemAt, Missing, SequenceFallback, Value,
};
pub use materialized::{Materialized, TryMaterialized};
pub use memo::Memoizer;
pub use memo_fn::MemoFn;
pub use sequence::Sequence;
pub use sticky::Sticky;

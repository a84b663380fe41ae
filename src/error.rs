//! Error type for positional lookups.

/// Raised by the default fallback when a sequence is exhausted before the
/// requested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
   /// Position 0 was requested and the sequence produced nothing.
   #[error("the sequence is empty")]
   EmptySequence,

   /// The sequence ended before reaching the position.
   #[error("the sequence doesn't have the position #{0}")]
   PositionNotFound(usize),
}

impl Error {
   /// The position that was requested.
   pub const fn position(&self) -> usize {
      match *self {
         Self::EmptySequence => 0,
         Self::PositionNotFound(position) => position,
      }
   }
}


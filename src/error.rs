//! Allocator error types.

use thiserror::Error;

/// Errors surfaced by [`release`](crate::ArenaAllocator::release).
///
/// Allocation failures keep the classic contract and surface as a null
/// return from `allocate`/`resize`; only pointer misuse is reported loudly,
/// since silently accepting it would hide double-release and foreign-pointer
/// bugs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
  /// The address was never handed out by this allocator.
  #[error("unknown payload address {0:?}")]
  UnknownPointer(*mut u8),

  /// The chunk at this address has already been released.
  #[error("double release of payload address {0:?}")]
  DoubleRelease(*mut u8),
}

use std::ptr;

use tracing::{debug, trace};

use crate::chunk::{ChunkHeader, HEADER_SIZE};
use crate::config::AllocatorConfig;
use crate::error::AllocError;
use crate::registry::ChunkRegistry;
use crate::system::{MemorySource, Sbrk};

/// First-fit chunk allocator over a growable arena.
///
/// The arena is obtained from a [`MemorySource`] in coarse over-provisioned
/// extensions and never returned. Every carved chunk is tracked in a bounded
/// registry and reused across release/allocate cycles; adjacent free chunks
/// are not coalesced.
///
/// The allocator holds raw pointers into the arena, so it is neither `Send`
/// nor `Sync`; a single flow of control is assumed.
pub struct ArenaAllocator<S: MemorySource = Sbrk> {
  registry: ChunkRegistry,
  system: S,
  growth_factor: usize,
}

impl ArenaAllocator<Sbrk> {
  /// Allocator over the program break.
  pub fn new() -> Self {
    Self::with_source(Sbrk)
  }
}

impl Default for ArenaAllocator<Sbrk> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: MemorySource> ArenaAllocator<S> {
  pub fn with_source(system: S) -> Self {
    Self::with_config(system, AllocatorConfig::new())
  }

  pub fn with_config(
    system: S,
    config: AllocatorConfig,
  ) -> Self {
    Self {
      registry: ChunkRegistry::with_capacity(config.registry_capacity),
      system,
      growth_factor: config.growth_factor,
    }
  }

  /// Number of chunks the registry currently tracks, free or in use.
  pub fn tracked_chunks(&self) -> usize {
    self.registry.len()
  }

  /// Allocates `size` zeroed bytes and returns the payload address, or null
  /// when `size` is zero or the arena cannot be grown any further.
  ///
  /// # Safety
  ///
  /// The returned region is only valid while the allocator (and its memory
  /// source) is alive, and only for `size` bytes.
  pub unsafe fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    if size == 0 {
      return ptr::null_mut();
    }

    let payload = match unsafe { self.registry.claim_first_fit(size) } {
      Some(payload) => payload,
      None => match self.grow(size) {
        Some(payload) => payload,
        None => return ptr::null_mut(),
      },
    };

    // A claim without a split can exceed the request; the whole recorded
    // region belongs to the caller and starts out zeroed.
    let header = unsafe { ChunkHeader::read_from(payload) };
    unsafe { ptr::write_bytes(payload, 0, header.size) };

    payload
  }

  /// Requests one over-provisioned extension from the memory source and
  /// carves it into the requested in-use chunk plus a free leftover.
  ///
  /// Returns the payload address of the requested chunk, or `None` when the
  /// source refuses or the request size overflows.
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<*mut u8> {
    let surplus = size.checked_mul(self.growth_factor)?;
    let extension = size.checked_add(HEADER_SIZE)?.checked_add(surplus)?;

    let region = self.system.extend(extension);
    if region.is_null() {
      debug!(size, extension, "memory source refused to extend the arena");
      return None;
    }

    let payload = region.wrapping_add(HEADER_SIZE);
    unsafe { ChunkHeader::write_to(payload, ChunkHeader::new(size, false, payload)) };
    self.registry.insert(size, payload);

    // The surplus seeds one free chunk right after the requested one,
    // provided it can hold a header and at least one byte.
    if let Some(leftover_size) = surplus.checked_sub(HEADER_SIZE).filter(|&n| n > 0) {
      let leftover_payload = payload.wrapping_add(size + HEADER_SIZE);

      unsafe {
        ChunkHeader::write_to(
          leftover_payload,
          ChunkHeader::new(leftover_size, true, leftover_payload),
        );
      }

      self.registry.insert(leftover_size, leftover_payload);
    }

    trace!(size, extension, "grew arena");

    Some(payload)
  }

  /// Returns a region to the allocator for reuse.
  ///
  /// Null is accepted silently. Addresses this allocator never handed out
  /// and chunks that are already free are reported instead of ignored. The
  /// chunk is only relabeled: nothing is scrubbed, merged, or returned to
  /// the system.
  ///
  /// # Safety
  ///
  /// A non-null `payload` must have been returned by [`allocate`] or
  /// [`resize`] on this allocator.
  ///
  /// [`allocate`]: ArenaAllocator::allocate
  /// [`resize`]: ArenaAllocator::resize
  pub unsafe fn release(
    &mut self,
    payload: *mut u8,
  ) -> Result<(), AllocError> {
    if payload.is_null() {
      return Ok(());
    }

    if !self.registry.tracks(payload) {
      return Err(AllocError::UnknownPointer(payload));
    }

    let mut header = unsafe { ChunkHeader::read_from(payload) };
    debug_assert_eq!(header.payload, payload);

    if header.free {
      return Err(AllocError::DoubleRelease(payload));
    }

    header.free = true;
    unsafe { ChunkHeader::write_to(payload, header) };

    Ok(())
  }

  /// Resizes the region at `payload` to `new_size` bytes.
  ///
  /// Null behaves as `allocate(new_size)`; `new_size == 0` releases the
  /// region and returns null. A request that fits the chunk's recorded size
  /// returns `payload` unchanged. Growing allocates a new region, copies the
  /// old recorded size of bytes, and releases the old region; if the new
  /// allocation fails, null is returned and the old region stays live and
  /// owned by the caller.
  ///
  /// Untracked addresses and already-released chunks are refused with null,
  /// touching nothing.
  ///
  /// # Safety
  ///
  /// Same contract as [`release`](ArenaAllocator::release) for non-null
  /// `payload`.
  pub unsafe fn resize(
    &mut self,
    payload: *mut u8,
    new_size: usize,
  ) -> *mut u8 {
    if payload.is_null() {
      return unsafe { self.allocate(new_size) };
    }

    if !self.registry.tracks(payload) {
      return ptr::null_mut();
    }

    let header = unsafe { ChunkHeader::read_from(payload) };
    if header.free {
      return ptr::null_mut();
    }

    if new_size == 0 {
      let released = unsafe { self.release(payload) };
      debug_assert!(released.is_ok());
      return ptr::null_mut();
    }

    if new_size <= header.size {
      return payload;
    }

    let new_payload = unsafe { self.allocate(new_size) };
    if new_payload.is_null() {
      return ptr::null_mut();
    }

    unsafe { ptr::copy_nonoverlapping(payload, new_payload, header.size) };

    let released = unsafe { self.release(payload) };
    debug_assert!(released.is_ok());

    new_payload
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::system::FixedRegion;

  fn fixed(capacity: usize) -> ArenaAllocator<FixedRegion> {
    ArenaAllocator::with_source(FixedRegion::new(capacity))
  }

  #[test]
  fn growth_carves_primary_and_leftover() {
    let mut allocator = fixed(4096);

    let payload = unsafe { allocator.allocate(10) };
    assert!(!payload.is_null());
    assert_eq!(allocator.tracked_chunks(), 2);

    let primary = unsafe { ChunkHeader::read_from(payload) };
    assert_eq!(primary.size, 10);
    assert!(!primary.free);

    let leftover_payload = payload.wrapping_add(10 + HEADER_SIZE);
    let leftover = unsafe { ChunkHeader::read_from(leftover_payload) };
    assert_eq!(leftover.size, 10 * 4 - HEADER_SIZE);
    assert!(leftover.free);
  }

  #[test]
  fn tiny_growth_skips_the_leftover() {
    // A surplus of 4 bytes cannot hold a header, so only the requested
    // chunk is carved.
    let mut allocator = fixed(4096);

    let payload = unsafe { allocator.allocate(1) };
    assert!(!payload.is_null());
    assert_eq!(allocator.tracked_chunks(), 1);
  }

  #[test]
  fn allocate_zero_returns_null() {
    let mut allocator = fixed(4096);

    assert!(unsafe { allocator.allocate(0) }.is_null());
    assert_eq!(allocator.tracked_chunks(), 0);
  }

  #[test]
  fn exhausted_source_returns_null() {
    let mut allocator = fixed(64);

    // 10 + HEADER_SIZE + 40 bytes exceed the region.
    assert!(unsafe { allocator.allocate(10) }.is_null());
  }

  #[test]
  fn release_then_allocate_reuses_the_address() {
    let mut allocator = fixed(4096);

    unsafe {
      let first = allocator.allocate(10);
      assert!(!first.is_null());

      allocator.release(first).unwrap();

      // Smaller request, first fit: same chunk, handed out whole.
      let second = allocator.allocate(5);
      assert_eq!(second, first);
    }
  }

  #[test]
  fn reused_chunk_is_zero_filled() {
    let mut allocator = fixed(4096);

    unsafe {
      let payload = allocator.allocate(10);
      payload.write_bytes(0xFF, 10);

      allocator.release(payload).unwrap();

      let reused = allocator.allocate(10);
      assert_eq!(reused, payload);

      for offset in 0..10 {
        assert_eq!(reused.add(offset).read(), 0);
      }
    }
  }

  #[test]
  fn release_null_is_accepted() {
    let mut allocator = fixed(4096);

    assert_eq!(unsafe { allocator.release(ptr::null_mut()) }, Ok(()));
  }

  #[test]
  fn release_foreign_pointer_is_reported() {
    let mut allocator = fixed(4096);
    let mut foreign = 0u8;
    let address: *mut u8 = &mut foreign;

    assert_eq!(
      unsafe { allocator.release(address) },
      Err(AllocError::UnknownPointer(address))
    );
  }

  #[test]
  fn double_release_is_reported() {
    let mut allocator = fixed(4096);

    unsafe {
      let payload = allocator.allocate(10);
      allocator.release(payload).unwrap();

      assert_eq!(
        allocator.release(payload),
        Err(AllocError::DoubleRelease(payload))
      );
    }
  }

  #[test]
  fn resize_null_behaves_as_allocate() {
    let mut allocator = fixed(4096);

    let payload = unsafe { allocator.resize(ptr::null_mut(), 10) };
    assert!(!payload.is_null());
  }

  #[test]
  fn resize_to_zero_releases() {
    let mut allocator = fixed(4096);

    unsafe {
      let payload = allocator.allocate(10);

      assert!(allocator.resize(payload, 0).is_null());

      // The chunk is free again; the next fitting request takes it.
      assert_eq!(allocator.allocate(10), payload);
    }
  }

  #[test]
  fn resize_within_recorded_size_is_in_place() {
    let mut allocator = fixed(4096);

    unsafe {
      let payload = allocator.allocate(10);

      assert_eq!(allocator.resize(payload, 5), payload);
      assert_eq!(allocator.resize(payload, 10), payload);
    }
  }

  #[test]
  fn resize_grow_copies_and_releases_the_old_region() {
    let mut allocator = fixed(4096);

    unsafe {
      let old = allocator.allocate(10);
      for offset in 0..10 {
        old.add(offset).write(offset as u8 + 1);
      }

      let new = allocator.resize(old, 50);
      assert!(!new.is_null());
      assert_ne!(new, old);

      for offset in 0..10 {
        assert_eq!(new.add(offset).read(), offset as u8 + 1);
      }
      for offset in 10..50 {
        assert_eq!(new.add(offset).read(), 0);
      }

      // The old region was released and is reusable.
      assert_eq!(allocator.allocate(10), old);
    }
  }

  #[test]
  fn failed_resize_leaves_the_region_live() {
    let mut allocator = fixed(256);

    unsafe {
      let payload = allocator.allocate(10);
      payload.write_bytes(0x5A, 10);

      // The region cannot satisfy 1000 * 5 + HEADER_SIZE more bytes.
      assert!(allocator.resize(payload, 1000).is_null());

      assert_eq!(payload.read(), 0x5A);
      assert_eq!(allocator.release(payload), Ok(()));
    }
  }

  #[test]
  fn resize_of_untracked_pointer_is_refused() {
    let mut allocator = fixed(4096);
    let mut foreign = 0u8;

    assert!(unsafe { allocator.resize(&mut foreign, 10) }.is_null());
  }

  #[test]
  fn resize_of_released_chunk_is_refused() {
    let mut allocator = fixed(4096);

    unsafe {
      let payload = allocator.allocate(10);
      allocator.release(payload).unwrap();

      assert!(allocator.resize(payload, 20).is_null());
    }
  }

  #[test]
  fn full_registry_still_serves_but_loses_track() {
    let config = AllocatorConfig {
      growth_factor: 4,
      registry_capacity: 2,
    };
    let mut allocator = ArenaAllocator::with_config(FixedRegion::new(4096), config);

    unsafe {
      // Fills both slots: primary plus leftover.
      let first = allocator.allocate(10);
      assert!(!first.is_null());
      assert_eq!(allocator.tracked_chunks(), 2);

      // The leftover (16 bytes) cannot serve 100, so the arena grows, but
      // neither new carve fits the registry.
      let second = allocator.allocate(100);
      assert!(!second.is_null());
      assert_eq!(allocator.tracked_chunks(), 2);

      second.write_bytes(0x11, 100);

      assert_eq!(
        allocator.release(second),
        Err(AllocError::UnknownPointer(second))
      );
    }
  }

  #[test]
  fn allocates_on_the_program_break() {
    let mut allocator = ArenaAllocator::new();

    unsafe {
      let first = allocator.allocate(8);
      assert!(!first.is_null());

      (first as *mut u64).write_unaligned(3);
      assert_eq!((first as *mut u64).read_unaligned(), 3);

      let second = allocator.allocate(12);
      assert!(!second.is_null());
      second.write_bytes(0x22, 12);

      assert_eq!((first as *mut u64).read_unaligned(), 3);

      allocator.release(first).unwrap();

      let third = allocator.allocate(4);
      assert_eq!(third, first);

      allocator.release(third).unwrap();
      allocator.release(second).unwrap();
    }
  }
}

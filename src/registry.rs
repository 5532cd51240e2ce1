use tracing::trace;

use crate::chunk::{ChunkHeader, HEADER_SIZE};

/// One registry slot: a chunk's payload address keyed by its size at
/// insertion time. Later splits truncate the chunk's header without touching
/// the key.
#[derive(Clone, Copy, Debug)]
struct Slot {
  key: usize,
  payload: *mut u8,
}

/// Bounded record of every chunk ever carved from the arena, free or in use.
///
/// The backing array keeps a min-heap order on `key`: insertion appends and
/// bubbles the slot upward while its key is smaller than its parent's.
/// Lookups ignore that order and scan the array front to back, so search is
/// first-fit over a heap-ordered sequence.
///
/// Slots are never removed, only relabeled through the chunk headers they
/// point at. The inline header is the single authoritative copy of a chunk's
/// size and free flag.
pub(crate) struct ChunkRegistry {
  slots: Vec<Slot>,
  capacity: usize,
}

impl ChunkRegistry {
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      slots: Vec::with_capacity(capacity),
      capacity,
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.slots.len()
  }

  /// Records a freshly carved chunk. A full registry drops the insertion
  /// silently; the chunk stays valid in the arena but is never found again.
  pub(crate) fn insert(
    &mut self,
    key: usize,
    payload: *mut u8,
  ) {
    if self.slots.len() == self.capacity {
      trace!(key, "registry full, dropping insertion");
      return;
    }

    self.slots.push(Slot { key, payload });
    self.bubble_up(self.slots.len() - 1);
  }

  fn bubble_up(
    &mut self,
    mut index: usize,
  ) {
    while index > 0 {
      let parent = (index - 1) / 2;

      if self.slots[index].key >= self.slots[parent].key {
        break;
      }

      self.slots.swap(index, parent);
      index = parent;
    }
  }

  /// First-fit claim: scans slots in array order and takes the first chunk
  /// that is free and at least `min_size` bytes, marking its header in use.
  ///
  /// An oversized chunk whose surplus can hold a header plus at least one
  /// byte is split in place: the claimed header is truncated to `min_size`
  /// and a new free chunk is carved from the tail and registered. Smaller
  /// surpluses are handed out whole.
  ///
  /// # Safety
  ///
  /// Every registered payload must still point into live arena memory with
  /// a valid header in front of it.
  pub(crate) unsafe fn claim_first_fit(
    &mut self,
    min_size: usize,
  ) -> Option<*mut u8> {
    for index in 0..self.slots.len() {
      let payload = self.slots[index].payload;
      let mut header = unsafe { ChunkHeader::read_from(payload) };

      if !header.free || header.size < min_size {
        continue;
      }

      debug_assert_eq!(header.payload, payload);

      header.free = false;

      if header.size - min_size > HEADER_SIZE {
        // Leftover header goes right after the claimed payload, so the
        // leftover ends exactly where the original chunk did.
        let leftover_size = header.size - min_size - HEADER_SIZE;
        let leftover_payload = payload.wrapping_add(min_size + HEADER_SIZE);

        unsafe {
          ChunkHeader::write_to(
            leftover_payload,
            ChunkHeader::new(leftover_size, true, leftover_payload),
          );
        }

        header.size = min_size;
        self.insert(leftover_size, leftover_payload);

        trace!(claimed = min_size, leftover = leftover_size, "split chunk");
      }

      unsafe { ChunkHeader::write_to(payload, header) };

      return Some(payload);
    }

    None
  }

  /// Whether `payload` was ever carved by this allocator.
  pub(crate) fn tracks(
    &self,
    payload: *mut u8,
  ) -> bool {
    self.slots.iter().any(|slot| slot.payload == payload)
  }

  #[cfg(test)]
  fn keys(&self) -> Vec<usize> {
    self.slots.iter().map(|slot| slot.key).collect()
  }
}

//! Sources of raw address space for the arena.
//!
//! The allocator asks for coarse one-way extensions and never hands memory
//! back. Regions obtained from distinct calls do not have to be contiguous;
//! the carving logic never assumes adjacency between extensions.

use std::ptr;

use libc::{c_void, intptr_t};

/// A one-way supply of address space.
///
/// # Safety
///
/// A non-null return from [`extend`](MemorySource::extend) must point at
/// `delta` bytes of writable memory that stay valid for the lifetime of the
/// implementor and are handed out to no one else.
pub unsafe trait MemorySource {
  /// Extends the arena by `delta` bytes and returns the first byte of the
  /// new region, or null when the system refuses.
  fn extend(&mut self, delta: usize) -> *mut u8;
}

/// Grows the program break with `sbrk(2)`. Unix only.
#[derive(Debug, Default)]
pub struct Sbrk;

unsafe impl MemorySource for Sbrk {
  fn extend(&mut self, delta: usize) -> *mut u8 {
    let address = unsafe { libc::sbrk(delta as intptr_t) };

    if address == usize::MAX as *mut c_void {
      return ptr::null_mut();
    }

    address as *mut u8
  }
}

/// Maps fresh anonymous pages for every extension.
///
/// Substitute for [`Sbrk`] on systems without a linear growable data
/// segment.
#[derive(Debug, Default)]
pub struct PageMap;

unsafe impl MemorySource for PageMap {
  fn extend(&mut self, delta: usize) -> *mut u8 {
    let address = unsafe {
      libc::mmap(
        ptr::null_mut(),
        delta,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == libc::MAP_FAILED {
      return ptr::null_mut();
    }

    address as *mut u8
  }
}

/// A bounded region carved from an ordinary heap buffer.
///
/// Extensions bump a cursor through the buffer; once it is spent every
/// further extension is refused. Gives tests a deterministic way to observe
/// exhaustion and keeps them off the real program break.
#[derive(Debug)]
pub struct FixedRegion {
  buffer: Box<[u8]>,
  // Taken once at construction so every extension shares one provenance.
  base: *mut u8,
  used: usize,
}

impl FixedRegion {
  pub fn new(capacity: usize) -> Self {
    let mut buffer = vec![0u8; capacity].into_boxed_slice();
    let base = buffer.as_mut_ptr();

    Self { buffer, base, used: 0 }
  }

  /// Bytes still available for extensions.
  pub fn remaining(&self) -> usize {
    self.buffer.len() - self.used
  }
}

unsafe impl MemorySource for FixedRegion {
  fn extend(&mut self, delta: usize) -> *mut u8 {
    if delta > self.remaining() {
      return ptr::null_mut();
    }

    let address = unsafe { self.base.add(self.used) };
    self.used += delta;

    address
  }
}

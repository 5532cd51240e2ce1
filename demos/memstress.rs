//! Randomized allocate/release/resize workload.
//!
//! Mirrors the classic malloc stress loop: mostly small text-sized buffers,
//! the occasional large one, releases and resizes interleaved at random.
//! Useful for watching the allocator's growth and reuse behavior through
//! its trace output, or for inspecting the process with `pmap`/`htop`.
//!
//! ```text
//!   cargo run --example memstress [sample-text] [seed]
//! ```
//!
//! With a seed the run is reproducible.

use std::ptr;

use challoc::ArenaAllocator;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::info;

const TEST_SIZE: usize = 30;
const LARGE_ALLOC_MIN: usize = 1024;
const LARGE_ALLOC_MAX: usize = 1024 * 1024;
const LARGE_ALLOC_PROBABILITY: f64 = 0.1;
const RESIZE_PROBABILITY: f64 = 0.1;

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::TRACE)
    .init();

  let sample_text = std::env::args().nth(1).unwrap_or_else(|| {
    "Now is the time for all good people to come to the aid of their country.".to_string()
  });
  let sample = sample_text.as_bytes();

  let seed = match std::env::args().nth(2) {
    Some(seed) => seed.parse().expect("seed must be a u64"),
    None => rand::rng().random(),
  };
  info!(seed, "workload seed");

  let mut rng = ChaCha8Rng::seed_from_u64(seed);
  let mut allocator = ArenaAllocator::new();
  let mut buffers: Vec<(*mut u8, usize)> = vec![(ptr::null_mut(), 0); TEST_SIZE];

  for ix in 0..TEST_SIZE {
    let size = if rng.random::<f64>() < LARGE_ALLOC_PROBABILITY {
      rng.random_range(LARGE_ALLOC_MIN..=LARGE_ALLOC_MAX)
    } else {
      rng.random_range(1..=sample.len() + 1)
    };

    let buffer = unsafe { allocator.allocate(size) };
    if buffer.is_null() {
      eprintln!("[{ix}] allocation of {size} bytes failed");
      std::process::exit(1);
    }

    // Copy as much of the sample text as fits, NUL-terminated like the
    // classic workload.
    let text = sample.len().min(size - 1);
    unsafe {
      ptr::copy_nonoverlapping(sample.as_ptr(), buffer, text);
      buffer.add(text).write(0);
    }
    buffers[ix] = (buffer, size);

    info!(ix, size, address = ?buffer, "allocated");

    // Randomly release one of the buffers handed out so far.
    let victim = rng.random_range(0..=ix);
    let (victim_buffer, _) = buffers[victim];
    if !victim_buffer.is_null() {
      unsafe { allocator.release(victim_buffer).expect("release of live buffer") };
      buffers[victim] = (ptr::null_mut(), 0);

      info!(victim, address = ?victim_buffer, "released");
    }

    // Occasionally resize the fresh buffer, growing or shrinking.
    let (buffer, size) = buffers[ix];
    if !buffer.is_null() && rng.random::<f64>() < RESIZE_PROBABILITY {
      let new_size = if rng.random::<bool>() {
        rng.random_range(size..=LARGE_ALLOC_MAX)
      } else {
        rng.random_range(1..=size)
      };

      let resized = unsafe { allocator.resize(buffer, new_size) };
      if resized.is_null() {
        eprintln!("[{ix}] resize to {new_size} bytes failed");
        std::process::exit(1);
      }
      buffers[ix] = (resized, new_size);

      info!(ix, new_size, address = ?resized, "resized");
    }
  }

  for (ix, (buffer, _)) in buffers.iter().enumerate() {
    if buffer.is_null() {
      info!(ix, "already released");
    } else {
      unsafe { allocator.release(*buffer).expect("release of live buffer") };
      info!(ix, address = ?buffer, "released");
    }
  }

  info!(chunks = allocator.tracked_chunks(), "workload complete");
}

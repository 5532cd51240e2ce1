//! # challoc - A First-Fit Chunk Allocator
//!
//! This crate provides a user-space replacement for the classic
//! allocate/free/resize primitives. It manages a single growable **arena**
//! obtained from the operating system in coarse extensions and tracks every
//! carved region through an explicit **chunk registry**.
//!
//! ## Overview
//!
//! ```text
//!   Arena after one allocation:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                        ARENA (one extension)                     │
//!   │                                                                  │
//!   │   ┌────────┬──────────────┬────────┬───────────────────────────┐ │
//!   │   │ Header │   Payload A  │ Header │    Free leftover          │ │
//!   │   └────────┴──────────────┴────────┴───────────────────────────┘ │
//!   │            ▲                       ▲                             │
//!   │            │                       │                             │
//!   │      returned to caller      seeds the next                     │
//!   │                              first-fit hit                      │
//!   └──────────────────────────────────────────────────────────────────┘
//!
//!   Every extension over-provisions 5x the immediate need, so most
//!   requests are served from leftovers without touching the OS again.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   challoc
//!   ├── chunk      - Chunk header representation (metadata in the arena)
//!   ├── registry   - Bounded min-heap registry, first-fit claim, splitting
//!   ├── system     - Memory sources: Sbrk, PageMap, FixedRegion
//!   ├── config     - Growth factor and registry capacity
//!   ├── error      - Release errors (unknown pointer, double release)
//!   └── arena      - ArenaAllocator: allocate / release / resize
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use challoc::ArenaAllocator;
//!
//! fn main() {
//!     let mut allocator = ArenaAllocator::new();
//!
//!     unsafe {
//!         // Allocate 16 zeroed bytes.
//!         let ptr = allocator.allocate(16);
//!
//!         // Use the memory.
//!         ptr.write(42);
//!
//!         // Return it for reuse.
//!         allocator.release(ptr).unwrap();
//!     }
//! }
//! ```
//!
//! ## How It Works
//!
//! Each payload is preceded by a fixed-size header inside the arena:
//!
//! ```text
//!   Single chunk:
//!   ┌───────────────────────────┬────────────────────────────────┐
//!   │       Chunk Header        │           User Data            │
//!   │  ┌─────────────────────┐  │                                │
//!   │  │ size: N             │  │  ┌──────────────────────────┐  │
//!   │  │ free: false         │  │  │     N bytes, zeroed      │  │
//!   │  │ payload: back-ref   │  │  │     at hand-out          │  │
//!   │  └─────────────────────┘  │  └──────────────────────────┘  │
//!   └───────────────────────────┴────────────────────────────────┘
//!                               ▲
//!                               └── Pointer returned to user
//! ```
//!
//! The registry keeps one slot per carved chunk, ordered as a binary
//! min-heap on the size each chunk had when it was inserted. Allocation
//! scans the slots front to back and claims the first free chunk that is
//! large enough (first fit); an oversized hit is split in place and the
//! free tail is registered as a chunk of its own. When no chunk fits, the
//! arena grows by one over-provisioned extension through a pluggable
//! [`MemorySource`] - `sbrk` by default, anonymous pages or a bounded
//! buffer as substitutes.
//!
//! ## Features
//!
//! - **Chunk reuse**: released regions are found again by first-fit search
//! - **Over-provisioned growth**: one OS call serves many allocations
//! - **Pluggable memory source**: `sbrk`, `mmap`, or a fixed test region
//! - **Loud misuse reporting**: double release and foreign pointers are
//!   surfaced as errors instead of silently ignored
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization; the allocator is
//!   neither `Send` nor `Sync`
//! - **No coalescing**: adjacent free chunks are never merged
//! - **No alignment guarantees**: payloads land on arbitrary byte offsets
//! - **Memory is never returned**: the arena only grows; the OS reclaims
//!   everything at process exit
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! Allocation, release, and resize all require `unsafe` blocks; the
//! returned regions are only valid while the allocator is alive.

mod arena;
mod chunk;
mod config;
mod error;
mod registry;
pub mod system;

pub use arena::ArenaAllocator;
pub use chunk::{ChunkHeader, HEADER_SIZE};
pub use config::AllocatorConfig;
pub use error::AllocError;
pub use system::{FixedRegion, MemorySource, PageMap, Sbrk};

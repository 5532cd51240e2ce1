//! Allocator tuning parameters.

/// Configuration for an [`ArenaAllocator`](crate::ArenaAllocator).
///
/// All values are fixed once the allocator is constructed.
#[derive(Clone, Debug)]
pub struct AllocatorConfig {
  /// Over-provision multiple applied to every arena extension.
  ///
  /// An allocation of `n` bytes that finds no free chunk requests
  /// `n + HEADER_SIZE + n * growth_factor` bytes from the memory source in
  /// one call; the surplus seeds a free chunk that serves later requests
  /// without another extension. The default of 4 makes each extension five
  /// times the immediate need.
  pub growth_factor: usize,

  /// Maximum number of chunks the registry tracks.
  ///
  /// Chunks carved past this limit stay valid but are never found again;
  /// the overflow is not reported to callers.
  pub registry_capacity: usize,
}

impl AllocatorConfig {
  pub const DEFAULT_GROWTH_FACTOR: usize = 4;
  pub const DEFAULT_REGISTRY_CAPACITY: usize = 64 * 1024;

  pub fn new() -> Self {
    Self {
      growth_factor: Self::DEFAULT_GROWTH_FACTOR,
      registry_capacity: Self::DEFAULT_REGISTRY_CAPACITY,
    }
  }
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_over_provision_five_times() {
    let config = AllocatorConfig::new();

    assert_eq!(config.growth_factor, 4);
    assert_eq!(config.registry_capacity, 65_536);
  }
}

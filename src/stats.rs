use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running counters kept by the allocator.
///
/// Outside system-allocator mode,
/// `free_objects + objects_in_use == pages_in_use * objects_per_page`
/// after every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stats {
  pub object_size: usize,
  pub page_size: usize,
  /// Blocks on the free list. Always 0 in system-allocator mode, which has
  /// no free list; its frees show up in `objects_in_use` and
  /// `deallocations` instead.
  pub free_objects: usize,
  pub objects_in_use: usize,
  pub pages_in_use: usize,
  /// Peak of `objects_in_use`.
  pub most_objects: usize,
  pub allocations: usize,
  pub deallocations: usize,
}

impl fmt::Display for Stats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "object size = {}, page size = {}, free = {}, in use = {}, pages = {}, peak = {}, allocations = {}, deallocations = {}",
      self.object_size,
      self.page_size,
      self.free_objects,
      self.objects_in_use,
      self.pages_in_use,
      self.most_objects,
      self.allocations,
      self.deallocations,
    )
  }
}

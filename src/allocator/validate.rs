//! Read-only walks over every block, plus the empty page reclaim pass.

use std::ptr::NonNull;

use log::{debug, warn};

use super::ObjectAllocator;
use crate::block::BlockId;

impl ObjectAllocator {
  /// Calls `callback(payload, object_size)` for every block not on the free
  /// list and returns how many there were.
  ///
  /// Each membership test scans the free list, so this pass is quadratic in
  /// the worst case. It is meant for leak reports, not hot paths.
  pub fn dump_memory_in_use(
    &self,
    mut callback: impl FnMut(NonNull<u8>, usize),
  ) -> usize {
    let mut count = 0;

    for (index, page) in self.pages.iter().enumerate().rev() {
      for slot in 0..self.layout.objects_per_page {
        if self.free_list.contains(BlockId::new(index, slot)) {
          continue;
        }

        callback(
          page.ptr_at(self.layout.payload_offset(slot)),
          self.layout.object_size,
        );
        count += 1;
      }
    }

    count
  }

  /// Calls `callback(payload, object_size)` for every block whose pad bytes
  /// no longer hold the pad pattern and returns how many there were.
  ///
  /// Does nothing unless debug is on and pad bytes are configured.
  pub fn validate_pages(
    &self,
    mut callback: impl FnMut(NonNull<u8>, usize),
  ) -> usize {
    if !self.config.debug || self.layout.pad_bytes == 0 {
      return 0;
    }

    let mut count = 0;

    for page in self.pages.iter().rev() {
      for slot in 0..self.layout.objects_per_page {
        if self.pads_intact(page, slot) {
          continue;
        }

        let object = page.ptr_at(self.layout.payload_offset(slot));
        warn!("block at {:p} has corrupted pad bytes", object);

        callback(object, self.layout.object_size);
        count += 1;
      }
    }

    count
  }

  /// Releases every page whose blocks are all free and returns how many
  /// were released. The remaining free list keeps its order.
  pub fn free_empty_pages(&mut self) -> usize {
    if self.pages.is_empty() {
      return 0;
    }

    let per_page = self.layout.objects_per_page;

    let mut free_blocks = vec![0usize; self.pages.len()];
    for block in self.free_list.iter() {
      free_blocks[block.page()] += 1;
    }

    let empty: Vec<bool> = free_blocks.iter().map(|&free| free == per_page).collect();
    let released = empty.iter().filter(|&&empty| empty).count();

    if released == 0 {
      return 0;
    }

    // Old page index -> index after removal.
    let mut next = 0;
    let remap: Vec<Option<usize>> = empty
      .iter()
      .map(|&empty| {
        if empty {
          None
        } else {
          next += 1;
          Some(next - 1)
        }
      })
      .collect();

    self
      .free_list
      .retain_map(|block| remap[block.page()].map(|page| BlockId::new(page, block.slot())));

    let mut index = 0;
    self.pages.retain(|_| {
      let keep = !empty[index];
      index += 1;
      keep
    });

    self.relink_pages();

    self.stats.pages_in_use -= released;
    self.stats.free_objects -= released * per_page;

    debug!(
      "released {} empty pages, {} left",
      released,
      self.pages.len()
    );

    released
  }
}

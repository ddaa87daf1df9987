use std::ptr::NonNull;

use crate::{
  block::BlockId,
  layout::BlockLayout,
  page::Page,
};

/// LIFO stack of free blocks. The head is the last entry.
///
/// Blocks are tracked by position instead of by a link word threaded
/// through the payload, so push and pop stay O(1) without aliasing the
/// client's memory.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
  entries: Vec<BlockId>,
}

impl FreeList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn push(
    &mut self,
    block: BlockId,
  ) {
    self.entries.push(block);
  }

  pub fn pop(&mut self) -> Option<BlockId> {
    self.entries.pop()
  }

  /// Linear in the number of free blocks.
  pub fn contains(
    &self,
    block: BlockId,
  ) -> bool {
    self.entries.contains(&block)
  }

  /// Head first.
  pub fn iter(&self) -> impl Iterator<Item = BlockId> + '_ {
    self.entries.iter().rev().copied()
  }

  /// Rewrites every entry through `map`, dropping those it rejects and
  /// preserving the order of the rest. Returns how many were dropped.
  pub fn retain_map(
    &mut self,
    mut map: impl FnMut(BlockId) -> Option<BlockId>,
  ) -> usize {
    let before = self.entries.len();
    let mut kept = 0;

    for index in 0..before {
      if let Some(block) = map(self.entries[index]) {
        self.entries[kept] = block;
        kept += 1;
      }
    }

    self.entries.truncate(kept);
    before - kept
  }
}

/// Read-only view of the free list, yielding payload pointers head first.
#[derive(Clone, Copy)]
pub struct FreeListView<'a> {
  list: &'a FreeList,
  pages: &'a [Page],
  layout: &'a BlockLayout,
}

impl<'a> FreeListView<'a> {
  pub(crate) fn new(
    list: &'a FreeList,
    pages: &'a [Page],
    layout: &'a BlockLayout,
  ) -> Self {
    Self {
      list,
      pages,
      layout,
    }
  }

  pub fn len(&self) -> usize {
    self.list.len()
  }

  pub fn is_empty(&self) -> bool {
    self.list.is_empty()
  }

  /// The block that the next `allocate` will hand out.
  pub fn head(&self) -> Option<NonNull<u8>> {
    self.iter().next()
  }

  pub fn iter(&self) -> impl Iterator<Item = NonNull<u8>> + 'a {
    let list = self.list;
    let pages = self.pages;
    let layout = self.layout;

    list
      .iter()
      .map(move |block| pages[block.page()].ptr_at(layout.payload_offset(block.slot())))
  }

  pub fn contains(
    &self,
    object: NonNull<u8>,
  ) -> bool {
    self.iter().any(|free| free == object)
  }
}

/// Read-only view of the page list, yielding page base pointers newest first.
#[derive(Clone, Copy)]
pub struct PageListView<'a> {
  pages: &'a [Page],
}

impl<'a> PageListView<'a> {
  pub(crate) fn new(pages: &'a [Page]) -> Self {
    Self { pages }
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = NonNull<u8>> + 'a {
    let pages = self.pages;
    pages.iter().rev().map(Page::base)
  }

  /// Whether `address` falls inside any page.
  pub fn contains(
    &self,
    address: *const u8,
  ) -> bool {
    self.pages.iter().any(|page| page.contains(address as usize))
  }
}

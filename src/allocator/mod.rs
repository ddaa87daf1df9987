use std::ptr::NonNull;

use log::{debug, trace, warn};

use crate::{
  block::{self, BlockHeader, BlockId},
  config::{Config, HeaderMode},
  error::{AllocatorError, Result},
  layout::BlockLayout,
  list::{FreeList, FreeListView, PageListView},
  page::Page,
  pattern::{
    ALIGN_PATTERN, ALLOCATED_PATTERN, FREED_PATTERN, PAD_PATTERN, PAGE_LINK_SIZE,
    UNALLOCATED_PATTERN,
  },
  stats::Stats,
};

mod validate;

#[cfg(test)]
mod tests;

/// Hands out and takes back blocks of one fixed size from pages it owns.
///
/// The allocator is a single-owner structure: it never locks, and callers
/// that share one between threads wrap it in their own mutex.
pub struct ObjectAllocator {
  config: Config,
  layout: BlockLayout,
  stats: Stats,
  /// Creation order. The page list proper runs from the last one backwards.
  pages: Vec<Page>,
  free_list: FreeList,
}

impl ObjectAllocator {
  /// Creates an allocator for objects of `object_size` bytes and eagerly
  /// creates its first page (unless it delegates to the system allocator).
  pub fn new(
    object_size: usize,
    config: Config,
  ) -> Result<Self> {
    config.validate(object_size)?;

    let layout = BlockLayout::new(object_size, &config)?;

    let mut allocator = Self {
      config,
      layout,
      stats: Stats {
        object_size,
        page_size: layout.page_size,
        ..Default::default()
      },
      pages: Vec::new(),
      free_list: FreeList::new(),
    };

    if !config.use_system_allocator {
      allocator.create_page()?;
    }

    debug!(
      "object allocator ready: object size = {}, page size = {}, {:?}",
      object_size, layout.page_size, config
    );

    Ok(allocator)
  }

  /// Both the empty page reclaim pass and payload alignment are supported.
  pub const fn implemented_extra_credit() -> bool {
    true
  }

  /// Takes a block off the free list and hands it to the client.
  ///
  /// `label` is kept with the block in [`HeaderMode::External`] and ignored
  /// otherwise. A failed call leaves the allocator untouched.
  pub fn allocate(
    &mut self,
    label: Option<&str>,
  ) -> Result<NonNull<u8>> {
    if self.config.use_system_allocator {
      return self.allocate_system();
    }

    if self.free_list.is_empty() {
      if self.config.max_pages > 0 && self.pages.len() >= self.config.max_pages {
        return Err(AllocatorError::OutOfPages {
          max_pages: self.config.max_pages,
        });
      }

      self.create_page()?;
    }

    let block = self.free_list.pop().ok_or(AllocatorError::OutOfPages {
      max_pages: self.config.max_pages,
    })?;

    let slot = block.slot();
    let payload = self.layout.payload_offset(slot);
    let page = &mut self.pages[block.page()];

    if self.config.debug {
      page.fill(payload, self.layout.object_size, ALLOCATED_PATTERN);
    }

    self.stats.free_objects -= 1;
    self.stats.objects_in_use += 1;
    self.stats.most_objects = self.stats.most_objects.max(self.stats.objects_in_use);
    self.stats.allocations += 1;

    block::stamp_allocated(
      page,
      &self.layout,
      self.config.header,
      slot,
      self.stats.allocations as u32,
      label,
    );

    let object = page.ptr_at(payload);
    trace!("allocate #{} -> {:p}", self.stats.allocations, object);

    Ok(object)
  }

  /// Returns a block to the free list.
  ///
  /// With debug on, the pointer is checked (boundary, double free, pad
  /// corruption) before anything changes, and a failed check leaves the
  /// allocator untouched.
  ///
  /// # Safety
  ///
  /// With debug off, `object` must come from [`ObjectAllocator::allocate`]
  /// on this allocator and must not have been freed since. With the system
  /// allocator in use, this holds regardless of debug.
  pub unsafe fn free(
    &mut self,
    object: NonNull<u8>,
  ) -> Result<()> {
    if self.config.use_system_allocator {
      unsafe { libc::free(object.as_ptr().cast()) };

      self.stats.objects_in_use -= 1;
      self.stats.deallocations += 1;
      trace!("free (system) {:p}", object);

      return Ok(());
    }

    let block = self.locate(object)?;

    if self.config.debug {
      self.check_multiple_free(block, object)?;
      self.check_padding(block, object)?;
    }

    let slot = block.slot();
    let page = &mut self.pages[block.page()];

    if self.config.debug {
      page.fill(
        self.layout.payload_offset(slot),
        self.layout.object_size,
        FREED_PATTERN,
      );
    }

    block::stamp_freed(page, &self.layout, self.config.header, slot);
    self.free_list.push(block);

    self.stats.free_objects += 1;
    self.stats.objects_in_use -= 1;
    self.stats.deallocations += 1;
    trace!("free {:p}", object);

    Ok(())
  }

  /// Turns pattern stamping and `free`-time checks on or off.
  pub fn set_debug_state(
    &mut self,
    state: bool,
  ) {
    self.config.debug = state;
  }

  pub fn config(&self) -> Config {
    self.config
  }

  pub fn stats(&self) -> Stats {
    self.stats
  }

  pub fn layout(&self) -> &BlockLayout {
    &self.layout
  }

  pub fn free_list(&self) -> FreeListView<'_> {
    FreeListView::new(&self.free_list, &self.pages, &self.layout)
  }

  pub fn page_list(&self) -> PageListView<'_> {
    PageListView::new(&self.pages)
  }

  /// Header of the block whose payload starts at `object`, if there is one.
  pub fn block_header(
    &self,
    object: NonNull<u8>,
  ) -> Option<BlockHeader<'_>> {
    let address = object.as_ptr() as usize;
    let page = self.pages.iter().find(|page| page.contains(address))?;
    let slot = self.layout.slot_of_payload(address - page.addr())?;

    Some(block::read(page, &self.layout, self.config.header, slot))
  }

  fn allocate_system(&mut self) -> Result<NonNull<u8>> {
    let bytes = self.layout.object_size;
    let object = NonNull::new(unsafe { libc::malloc(bytes) }.cast::<u8>())
      .ok_or(AllocatorError::OutOfMemory { bytes })?;

    self.stats.objects_in_use += 1;
    self.stats.most_objects = self.stats.most_objects.max(self.stats.objects_in_use);
    self.stats.allocations += 1;
    trace!("allocate (system) #{} -> {:p}", self.stats.allocations, object);

    Ok(object)
  }

  /// Allocates a page, stamps it, and pushes all of its blocks on the free
  /// list. Nothing changes if the page cannot be allocated.
  fn create_page(&mut self) -> Result<()> {
    let layout = self.layout;
    let mut page = Page::allocate(&layout, self.config.header == HeaderMode::External)?;

    // Pads and alignment bytes are stamped regardless of debug. Only the
    // payload pattern follows the flag.
    page.fill(PAGE_LINK_SIZE, layout.left_align, ALIGN_PATTERN);

    for slot in 0..layout.objects_per_page {
      page.fill(layout.left_pad_offset(slot), layout.pad_bytes, PAD_PATTERN);
      page.fill(layout.right_pad_offset(slot), layout.pad_bytes, PAD_PATTERN);

      if self.config.debug {
        page.fill(layout.payload_offset(slot), layout.object_size, UNALLOCATED_PATTERN);
      }

      if slot + 1 < layout.objects_per_page {
        page.fill(layout.inter_align_offset(slot), layout.inter_align, ALIGN_PATTERN);
      }
    }

    page.set_link(self.pages.last().map_or(0, Page::addr));

    let index = self.pages.len();
    for slot in 0..layout.objects_per_page {
      self.free_list.push(BlockId::new(index, slot));
    }

    debug!(
      "created page {} at {:p} ({} bytes)",
      index,
      page.base(),
      page.size()
    );

    self.pages.push(page);
    self.stats.pages_in_use += 1;
    self.stats.free_objects += layout.objects_per_page;

    Ok(())
  }

  /// Rewrites every page's link word after pages were removed.
  fn relink_pages(&mut self) {
    let mut next = 0;
    for page in &mut self.pages {
      page.set_link(next);
      next = page.addr();
    }
  }

  /// Maps a client pointer back to its block.
  ///
  /// With debug on the pointer must be exactly the start of a payload; with
  /// debug off any address inside a block's region resolves to that block.
  fn locate(
    &self,
    object: NonNull<u8>,
  ) -> Result<BlockId> {
    let address = object.as_ptr() as usize;

    let Some(index) = self.pages.iter().position(|page| page.contains(address)) else {
      return Err(Self::bad_boundary(address));
    };

    let offset = address - self.pages[index].addr();
    let slot = if self.config.debug {
      self.layout.slot_of_payload(offset)
    } else {
      self.layout.slot_containing(offset)
    };

    match slot {
      Some(slot) => Ok(BlockId::new(index, slot)),
      None => Err(Self::bad_boundary(address)),
    }
  }

  fn bad_boundary(address: usize) -> AllocatorError {
    warn!("free of {:#x} rejected: not on a block boundary", address);
    AllocatorError::BadBoundary { address }
  }

  fn check_multiple_free(
    &self,
    block: BlockId,
    object: NonNull<u8>,
  ) -> Result<()> {
    let page = &self.pages[block.page()];

    let already_free = match block::in_use(page, &self.layout, self.config.header, block.slot()) {
      Some(in_use) => !in_use,
      None => self.free_list.contains(block),
    };

    if already_free {
      warn!("free of {:p} rejected: block is already free", object);
      return Err(AllocatorError::MultipleFree {
        address: object.as_ptr() as usize,
      });
    }

    Ok(())
  }

  fn check_padding(
    &self,
    block: BlockId,
    object: NonNull<u8>,
  ) -> Result<()> {
    if self.pads_intact(&self.pages[block.page()], block.slot()) {
      return Ok(());
    }

    warn!("free of {:p} rejected: pad bytes overwritten", object);
    Err(AllocatorError::CorruptedBlock {
      address: object.as_ptr() as usize,
    })
  }

  fn pads_intact(
    &self,
    page: &Page,
    slot: usize,
  ) -> bool {
    let pad = self.layout.pad_bytes;

    page
      .bytes(self.layout.left_pad_offset(slot), pad)
      .iter()
      .chain(page.bytes(self.layout.right_pad_offset(slot), pad))
      .all(|&byte| byte == PAD_PATTERN)
  }
}

impl Drop for ObjectAllocator {
  fn drop(&mut self) {
    if self.stats.objects_in_use > 0 {
      let headers: usize = self.pages.iter().map(Page::external_count).sum();
      debug!(
        "releasing {} pages with {} blocks ({} header records) still in use",
        self.pages.len(),
        self.stats.objects_in_use,
        headers
      );
    }
  }
}

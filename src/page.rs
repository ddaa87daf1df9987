use std::{alloc, alloc::Layout, ptr, ptr::NonNull};

use crate::{
  block::ExternalHeader,
  error::{AllocatorError, Result},
  layout::BlockLayout,
};

/// One raw buffer carved into `objects_per_page` blocks.
///
/// All accesses go through raw pointers so the client's own pointers into
/// the payloads stay valid while the allocator stamps patterns around them.
pub(crate) struct Page {
  base: NonNull<u8>,
  layout: Layout,
  /// Header records for External mode, indexed by slot. Empty otherwise.
  external: Box<[Option<Box<ExternalHeader>>]>,
}

// The buffer is exclusively owned by the page.
unsafe impl Send for Page {}

impl Page {
  /// Allocates a zeroed page. Stamping patterns is left to the caller.
  pub fn allocate(
    block_layout: &BlockLayout,
    external_headers: bool,
  ) -> Result<Self> {
    let bytes = block_layout.page_size;
    let layout = Layout::from_size_align(bytes, block_layout.page_align)
      .map_err(|_| AllocatorError::OutOfMemory { bytes })?;

    let base = unsafe { alloc::alloc_zeroed(layout) };
    let base = NonNull::new(base).ok_or(AllocatorError::OutOfMemory { bytes })?;

    let slots = if external_headers {
      block_layout.objects_per_page
    } else {
      0
    };

    Ok(Self {
      base,
      layout,
      external: (0..slots).map(|_| None).collect(),
    })
  }

  #[inline(always)]
  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  #[inline(always)]
  pub fn addr(&self) -> usize {
    self.base.as_ptr() as usize
  }

  #[inline(always)]
  pub fn size(&self) -> usize {
    self.layout.size()
  }

  pub fn contains(
    &self,
    address: usize,
  ) -> bool {
    address >= self.addr() && address - self.addr() < self.size()
  }

  #[inline(always)]
  pub fn ptr_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    debug_assert!(offset < self.size());
    unsafe { self.base.add(offset) }
  }

  pub fn fill(
    &mut self,
    offset: usize,
    len: usize,
    byte: u8,
  ) {
    debug_assert!(offset + len <= self.size());
    unsafe { ptr::write_bytes(self.base.as_ptr().add(offset), byte, len) };
  }

  pub fn bytes(
    &self,
    offset: usize,
    len: usize,
  ) -> &[u8] {
    debug_assert!(offset + len <= self.size());
    unsafe { std::slice::from_raw_parts(self.base.as_ptr().add(offset), len) }
  }

  pub fn write(
    &mut self,
    offset: usize,
    data: &[u8],
  ) {
    debug_assert!(offset + data.len() <= self.size());
    unsafe {
      ptr::copy_nonoverlapping(data.as_ptr(), self.base.as_ptr().add(offset), data.len())
    };
  }

  pub fn read_array<const N: usize>(
    &self,
    offset: usize,
  ) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(self.bytes(offset, N));
    out
  }

  /// Address stored in the leading link word.
  #[cfg(test)]
  pub fn link(&self) -> usize {
    usize::from_ne_bytes(self.read_array::<{ crate::pattern::PAGE_LINK_SIZE }>(0))
  }

  pub fn set_link(
    &mut self,
    next: usize,
  ) {
    self.write(0, &next.to_ne_bytes());
  }

  pub fn external(
    &self,
    slot: usize,
  ) -> Option<&ExternalHeader> {
    self.external.get(slot)?.as_deref()
  }

  pub fn set_external(
    &mut self,
    slot: usize,
    header: ExternalHeader,
  ) -> &ExternalHeader {
    &**self.external[slot].insert(Box::new(header))
  }

  pub fn take_external(
    &mut self,
    slot: usize,
  ) -> Option<Box<ExternalHeader>> {
    self.external.get_mut(slot)?.take()
  }

  /// Header records still alive in this page.
  pub fn external_count(&self) -> usize {
    self.external.iter().filter(|header| header.is_some()).count()
  }
}

impl Drop for Page {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
  }
}

//! Byte geometry of a page.
//!
//! ```text
//!   ┌──────┬──────┬────────┬─────┬─────────┬─────┬───────┬────────┬─────┬─────────┬─────┬───
//!   │ link │ left │ header │ pad │ payload │ pad │ inter │ header │ pad │ payload │ pad │ ...
//!   │ word │ align│        │     │         │     │ align │        │     │         │     │
//!   └──────┴──────┴────────┴─────┴─────────┴─────┴───────┴────────┴─────┴─────────┴─────┴───
//!                 ◄──────────────────── stride ──────────────────►
//! ```
//!
//! The last block has no inter-block alignment after it.

use std::mem;

use crate::{
  align_to,
  config::Config,
  error::{AllocatorError, Result},
  pattern::PAGE_LINK_SIZE,
};

/// `value` rounded up to `alignment`, or `None` on overflow.
fn aligned(
  value: usize,
  alignment: usize,
) -> Option<usize> {
  value.checked_add(alignment.saturating_sub(1))?;
  Some(align_to!(value, alignment))
}

/// Offsets shared by every page of one allocator, computed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
  pub object_size: usize,
  pub objects_per_page: usize,
  pub header_size: usize,
  pub pad_bytes: usize,
  pub left_align: usize,
  pub inter_align: usize,
  /// Distance between the headers of two neighbouring blocks.
  pub stride: usize,
  pub page_size: usize,
  /// Alignment of the page buffer itself.
  pub page_align: usize,
}

impl BlockLayout {
  /// Fails with [`AllocatorError::OutOfMemory`] when the page would not fit
  /// in the address space.
  pub fn new(
    object_size: usize,
    config: &Config,
  ) -> Result<Self> {
    let header_size = config.header.size();
    let pad_bytes = config.pad_bytes;
    let objects_per_page = config.objects_per_page;
    let alignment = config.alignment;

    let too_large = || AllocatorError::OutOfMemory { bytes: usize::MAX };

    let lead = PAGE_LINK_SIZE
      .checked_add(header_size)
      .and_then(|lead| lead.checked_add(pad_bytes))
      .ok_or_else(too_large)?;
    let left_align = aligned(lead, alignment).ok_or_else(too_large)? - lead;

    let block = pad_bytes
      .checked_mul(2)
      .and_then(|pads| pads.checked_add(header_size))
      .and_then(|block| block.checked_add(object_size))
      .ok_or_else(too_large)?;
    let inter_align = aligned(block, alignment).ok_or_else(too_large)? - block;

    let stride = block + inter_align;
    let page_size = objects_per_page
      .checked_mul(stride)
      .and_then(|blocks| blocks.checked_add(PAGE_LINK_SIZE + left_align))
      .and_then(|size| size.checked_sub(inter_align))
      .ok_or_else(too_large)?;

    Ok(Self {
      object_size,
      objects_per_page,
      header_size,
      pad_bytes,
      left_align,
      inter_align,
      stride,
      page_size,
      page_align: mem::align_of::<usize>().max(alignment),
    })
  }

  #[inline(always)]
  pub const fn first_block(&self) -> usize {
    PAGE_LINK_SIZE + self.left_align
  }

  #[inline(always)]
  pub const fn header_offset(
    &self,
    slot: usize,
  ) -> usize {
    self.first_block() + slot * self.stride
  }

  #[inline(always)]
  pub const fn left_pad_offset(
    &self,
    slot: usize,
  ) -> usize {
    self.header_offset(slot) + self.header_size
  }

  #[inline(always)]
  pub const fn payload_offset(
    &self,
    slot: usize,
  ) -> usize {
    self.left_pad_offset(slot) + self.pad_bytes
  }

  #[inline(always)]
  pub const fn right_pad_offset(
    &self,
    slot: usize,
  ) -> usize {
    self.payload_offset(slot) + self.object_size
  }

  #[inline(always)]
  pub const fn inter_align_offset(
    &self,
    slot: usize,
  ) -> usize {
    self.right_pad_offset(slot) + self.pad_bytes
  }

  /// Slot whose payload starts exactly at `offset` bytes into the page.
  pub fn slot_of_payload(
    &self,
    offset: usize,
  ) -> Option<usize> {
    let first = self.payload_offset(0);
    let distance = offset.checked_sub(first)?;

    if distance % self.stride != 0 {
      return None;
    }

    let slot = distance / self.stride;
    (slot < self.objects_per_page).then_some(slot)
  }

  /// Slot whose region (header through inter alignment) covers `offset`.
  pub fn slot_containing(
    &self,
    offset: usize,
  ) -> Option<usize> {
    let distance = offset.checked_sub(self.first_block())?;
    let slot = distance / self.stride;
    (slot < self.objects_per_page).then_some(slot)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::HeaderMode;

  const WORD: usize = mem::size_of::<usize>();

  #[test]
  fn test_plain_page_size() {
    let config = Config::default().with_objects_per_page(4);
    let layout = BlockLayout::new(16, &config).unwrap();

    assert_eq!(layout.page_size, 4 * 16 + WORD);
    assert_eq!(layout.stride, 16);
    assert_eq!(layout.payload_offset(0), WORD);
    assert_eq!(layout.payload_offset(3), WORD + 48);
  }

  #[test]
  fn test_padded_header_page_size() {
    let config = Config::default()
      .with_objects_per_page(4)
      .with_pad_bytes(2)
      .with_header(HeaderMode::Basic);
    let layout = BlockLayout::new(16, &config).unwrap();

    // objects * size + link + 2 * objects * pad + header * objects
    assert_eq!(layout.page_size, 4 * 16 + WORD + 2 * 4 * 2 + 5 * 4);
    assert_eq!(layout.header_offset(1), WORD + 25);
    assert_eq!(layout.left_pad_offset(1), WORD + 30);
    assert_eq!(layout.payload_offset(1), WORD + 32);
    assert_eq!(layout.right_pad_offset(1), WORD + 48);
  }

  #[test]
  fn test_aligned_payloads() {
    let config = Config::default()
      .with_objects_per_page(3)
      .with_pad_bytes(3)
      .with_header(HeaderMode::Basic)
      .with_alignment(16);
    let layout = BlockLayout::new(10, &config).unwrap();

    for slot in 0..3 {
      assert_eq!(layout.payload_offset(slot) % 16, 0);
    }
    assert_eq!(layout.page_align, 16);
    assert_eq!(
      layout.page_size,
      layout.right_pad_offset(2) + layout.pad_bytes
    );
  }

  #[test]
  fn test_slot_of_payload() {
    let config = Config::default().with_objects_per_page(4).with_pad_bytes(4);
    let layout = BlockLayout::new(8, &config).unwrap();

    for slot in 0..4 {
      assert_eq!(layout.slot_of_payload(layout.payload_offset(slot)), Some(slot));
      assert_eq!(layout.slot_of_payload(layout.payload_offset(slot) + 1), None);
    }

    assert_eq!(layout.slot_of_payload(0), None);
    assert_eq!(layout.slot_of_payload(layout.payload_offset(4)), None);
  }

  #[test]
  fn test_slot_containing() {
    let config = Config::default().with_objects_per_page(2).with_pad_bytes(4);
    let layout = BlockLayout::new(8, &config).unwrap();

    assert_eq!(layout.slot_containing(0), None);
    assert_eq!(layout.slot_containing(layout.header_offset(0)), Some(0));
    assert_eq!(layout.slot_containing(layout.payload_offset(1) + 3), Some(1));
    assert_eq!(layout.slot_containing(layout.page_size), None);
  }

  #[test]
  fn test_oversized_geometry_is_out_of_memory() {
    let too_many = Config::default().with_objects_per_page(usize::MAX / 4);
    assert_eq!(
      BlockLayout::new(16, &too_many),
      Err(AllocatorError::OutOfMemory { bytes: usize::MAX })
    );

    let too_wide = Config::default().with_pad_bytes(usize::MAX / 2);
    assert!(BlockLayout::new(16, &too_wide).is_err());

    assert!(BlockLayout::new(usize::MAX - 4, &Config::default()).is_err());
  }
}

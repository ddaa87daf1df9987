//! Sentinel bytes and fixed header sizes.
//!
//! Every byte the allocator owns but the client does not is stamped with
//! one of these values while debug mode is on, so a memory dump tells at a
//! glance which state each region is in.

use std::mem;

/// Payload of a block that has never been handed out.
pub const UNALLOCATED_PATTERN: u8 = 0xAA;

/// Payload of a block right after `allocate`.
pub const ALLOCATED_PATTERN: u8 = 0xBB;

/// Payload of a block right after `free`.
pub const FREED_PATTERN: u8 = 0xCC;

/// Guard bytes around each payload.
pub const PAD_PATTERN: u8 = 0xDD;

/// Filler inserted to align payloads.
pub const ALIGN_PATTERN: u8 = 0xEE;

/// Size of the word at the start of every page that links to the next page.
pub const PAGE_LINK_SIZE: usize = mem::size_of::<usize>();

/// Allocation number (4 bytes) + in-use flag (1 byte).
pub const BASIC_HEADER_SIZE: usize = 5;

/// Use count (2 bytes) + allocation number (4 bytes) + in-use flag (1 byte),
/// not counting the user-defined bytes in front of them.
pub const EXTENDED_HEADER_FIXED: usize = 7;

/// Slot holding the address of the out-of-page header record.
pub const EXTERNAL_HEADER_SIZE: usize = mem::size_of::<usize>();

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_patterns_are_distinct() {
    let patterns = [
      UNALLOCATED_PATTERN,
      ALLOCATED_PATTERN,
      FREED_PATTERN,
      PAD_PATTERN,
      ALIGN_PATTERN,
    ];

    for (i, a) in patterns.iter().enumerate() {
      for b in &patterns[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }
}

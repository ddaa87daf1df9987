use thiserror::Error;

/// Failures reported by [`ObjectAllocator`](crate::ObjectAllocator).
///
/// Capacity errors come out of construction and `allocate`; misuse and
/// corruption errors come out of `free` while debug checks are enabled.
/// A failed call leaves the allocator exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
  /// The underlying raw allocation for a page (or a system block) failed.
  #[error("out of memory: failed to allocate {bytes} bytes")]
  OutOfMemory { bytes: usize },

  /// The free list is empty and the page limit has been reached.
  #[error("out of pages: limit of {max_pages} pages reached")]
  OutOfPages { max_pages: usize },

  /// The freed pointer is outside every page or not at the start of a block.
  #[error("bad boundary: {address:#x} is not the start of a block")]
  BadBoundary { address: usize },

  /// The freed pointer is already on the free list.
  #[error("multiple free: block at {address:#x} is already free")]
  MultipleFree { address: usize },

  /// A pad region next to the freed block has been overwritten.
  #[error("corrupted block: pad bytes around {address:#x} were overwritten")]
  CorruptedBlock { address: usize },

  /// The configuration cannot describe a usable page.
  #[error("invalid configuration: {0}")]
  InvalidConfig(&'static str),
}

pub type Result<T> = core::result::Result<T, AllocatorError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    assert_eq!(
      AllocatorError::OutOfPages { max_pages: 3 }.to_string(),
      "out of pages: limit of 3 pages reached"
    );
    assert_eq!(
      AllocatorError::MultipleFree { address: 0x10 }.to_string(),
      "multiple free: block at 0x10 is already free"
    );
    assert_eq!(
      AllocatorError::InvalidConfig("objects per page must be positive").to_string(),
      "invalid configuration: objects per page must be positive"
    );
  }
}

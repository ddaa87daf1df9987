use crate::{
  error::{AllocatorError, Result},
  pattern::{BASIC_HEADER_SIZE, EXTENDED_HEADER_FIXED, EXTERNAL_HEADER_SIZE},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which per-block header sits in front of each block's leading pad.
///
/// ```text
///   None      ┌──────────────────────────────────────────┐
///             │ (no bytes)                               │
///             └──────────────────────────────────────────┘
///   Basic     ┌──────────────────────┬──────────┐
///             │ allocation # (u32)   │ in use   │   5 bytes
///             └──────────────────────┴──────────┘
///   Extended  ┌────────────┬───────────┬──────────────────────┬──────────┐
///             │ user bytes │ uses (u16)│ allocation # (u32)   │ in use   │
///             └────────────┴───────────┴──────────────────────┴──────────┘
///   External  ┌──────────────────────────────────────────┐
///             │ address of the header record (usize)     │
///             └──────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderMode {
  #[default]
  None,
  Basic,
  Extended { user_bytes: usize },
  External,
}

impl HeaderMode {
  /// Bytes the header occupies in front of every block.
  pub const fn size(self) -> usize {
    match self {
      HeaderMode::None => 0,
      HeaderMode::Basic => BASIC_HEADER_SIZE,
      HeaderMode::Extended { user_bytes } => user_bytes.saturating_add(EXTENDED_HEADER_FIXED),
      HeaderMode::External => EXTERNAL_HEADER_SIZE,
    }
  }
}

/// Parameters fixed for the lifetime of an allocator, apart from `debug`
/// which can be flipped with `set_debug_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
  /// Bypass pages entirely and hand out blocks from `malloc`.
  pub use_system_allocator: bool,
  /// Blocks carved out of every page.
  pub objects_per_page: usize,
  /// Page ceiling, 0 means unbounded.
  pub max_pages: usize,
  /// Pattern stamping and `free`-time checks.
  pub debug: bool,
  /// Guard bytes on each side of every payload.
  pub pad_bytes: usize,
  pub header: HeaderMode,
  /// Payload alignment, 0 or 1 disables it.
  pub alignment: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      use_system_allocator: false,
      objects_per_page: 4,
      max_pages: 3,
      debug: false,
      pad_bytes: 0,
      header: HeaderMode::None,
      alignment: 0,
    }
  }
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub const fn with_system_allocator(
    mut self,
    enabled: bool,
  ) -> Self {
    self.use_system_allocator = enabled;
    self
  }

  pub const fn with_objects_per_page(
    mut self,
    objects_per_page: usize,
  ) -> Self {
    self.objects_per_page = objects_per_page;
    self
  }

  pub const fn with_max_pages(
    mut self,
    max_pages: usize,
  ) -> Self {
    self.max_pages = max_pages;
    self
  }

  pub const fn with_debug(
    mut self,
    debug: bool,
  ) -> Self {
    self.debug = debug;
    self
  }

  pub const fn with_pad_bytes(
    mut self,
    pad_bytes: usize,
  ) -> Self {
    self.pad_bytes = pad_bytes;
    self
  }

  pub const fn with_header(
    mut self,
    header: HeaderMode,
  ) -> Self {
    self.header = header;
    self
  }

  pub const fn with_alignment(
    mut self,
    alignment: usize,
  ) -> Self {
    self.alignment = alignment;
    self
  }

  /// Checks that a page can be laid out for objects of `object_size` bytes.
  pub fn validate(
    &self,
    object_size: usize,
  ) -> Result<()> {
    if object_size == 0 {
      return Err(AllocatorError::InvalidConfig("object size must be positive"));
    }

    if self.objects_per_page == 0 {
      return Err(AllocatorError::InvalidConfig(
        "objects per page must be positive",
      ));
    }

    if self.alignment > 1 && !self.alignment.is_power_of_two() {
      return Err(AllocatorError::InvalidConfig(
        "alignment must be a power of two",
      ));
    }

    Ok(())
  }
}

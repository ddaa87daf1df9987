use crate::{
  config::HeaderMode,
  layout::BlockLayout,
  page::Page,
  pattern::EXTERNAL_HEADER_SIZE,
};

/// Position of a block: index of its page (creation order) and its slot
/// inside that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BlockId {
  page: u32,
  slot: u32,
}

impl BlockId {
  pub fn new(
    page: usize,
    slot: usize,
  ) -> Self {
    Self {
      page: page as u32,
      slot: slot as u32,
    }
  }

  #[inline(always)]
  pub fn page(self) -> usize {
    self.page as usize
  }

  #[inline(always)]
  pub fn slot(self) -> usize {
    self.slot as usize
  }
}

/// Header record living outside the page in [`HeaderMode::External`].
///
/// Owned by the block's header slot; dropped (together with its label) when
/// the block is freed or the allocator goes away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalHeader {
  in_use: bool,
  allocation: u32,
  label: Option<String>,
}

impl ExternalHeader {
  pub fn new(
    allocation: u32,
    label: Option<&str>,
  ) -> Self {
    Self {
      in_use: true,
      allocation,
      label: label.map(str::to_owned),
    }
  }

  pub fn in_use(&self) -> bool {
    self.in_use
  }

  pub fn allocation(&self) -> u32 {
    self.allocation
  }

  pub fn label(&self) -> Option<&str> {
    self.label.as_deref()
  }
}

/// Snapshot of a block's header, as returned by
/// [`ObjectAllocator::block_header`](crate::ObjectAllocator::block_header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockHeader<'a> {
  None,
  Basic {
    allocation: u32,
    in_use: bool,
  },
  Extended {
    user: &'a [u8],
    use_count: u16,
    allocation: u32,
    in_use: bool,
  },
  External(Option<&'a ExternalHeader>),
}

/// Byte offsets (from the page base) of the in-page header fields.
struct Fields {
  use_count: Option<usize>,
  allocation: usize,
  flag: usize,
}

impl Fields {
  fn locate(
    block_layout: &BlockLayout,
    mode: HeaderMode,
    slot: usize,
  ) -> Option<Self> {
    let header = block_layout.header_offset(slot);
    match mode {
      HeaderMode::Basic => Some(Self {
        use_count: None,
        allocation: header,
        flag: header + 4,
      }),
      HeaderMode::Extended { user_bytes } => Some(Self {
        use_count: Some(header + user_bytes),
        allocation: header + user_bytes + 2,
        flag: header + user_bytes + 6,
      }),
      HeaderMode::None | HeaderMode::External => None,
    }
  }
}

/// Marks a block as handed out under allocation number `allocation`.
pub(crate) fn stamp_allocated(
  page: &mut Page,
  block_layout: &BlockLayout,
  mode: HeaderMode,
  slot: usize,
  allocation: u32,
  label: Option<&str>,
) {
  match mode {
    HeaderMode::None => {}
    HeaderMode::Basic | HeaderMode::Extended { .. } => {
      let Some(fields) = Fields::locate(block_layout, mode, slot) else {
        return;
      };
      if let Some(offset) = fields.use_count {
        let uses = u16::from_ne_bytes(page.read_array(offset)).wrapping_add(1);
        page.write(offset, &uses.to_ne_bytes());
      }
      page.write(fields.allocation, &allocation.to_ne_bytes());
      page.write(fields.flag, &[1]);
    }
    HeaderMode::External => {
      let record = page.set_external(slot, ExternalHeader::new(allocation, label));
      let address = record as *const ExternalHeader as usize;
      page.write(block_layout.header_offset(slot), &address.to_ne_bytes());
    }
  }
}

/// Clears the in-use marker. The Extended use count is cumulative and kept.
pub(crate) fn stamp_freed(
  page: &mut Page,
  block_layout: &BlockLayout,
  mode: HeaderMode,
  slot: usize,
) {
  match mode {
    HeaderMode::None => {}
    HeaderMode::Basic | HeaderMode::Extended { .. } => {
      if let Some(fields) = Fields::locate(block_layout, mode, slot) {
        page.write(fields.allocation, &0u32.to_ne_bytes());
        page.write(fields.flag, &[0]);
      }
    }
    HeaderMode::External => {
      drop(page.take_external(slot));
      page.write(
        block_layout.header_offset(slot),
        &[0; EXTERNAL_HEADER_SIZE],
      );
    }
  }
}

/// In-use state recorded in the header, or `None` when there is no header
/// to ask.
pub(crate) fn in_use(
  page: &Page,
  block_layout: &BlockLayout,
  mode: HeaderMode,
  slot: usize,
) -> Option<bool> {
  match read(page, block_layout, mode, slot) {
    BlockHeader::None => None,
    BlockHeader::Basic { in_use, .. } | BlockHeader::Extended { in_use, .. } => Some(in_use),
    BlockHeader::External(record) => Some(record.is_some_and(ExternalHeader::in_use)),
  }
}

pub(crate) fn read<'a>(
  page: &'a Page,
  block_layout: &BlockLayout,
  mode: HeaderMode,
  slot: usize,
) -> BlockHeader<'a> {
  let fields = Fields::locate(block_layout, mode, slot);
  match (mode, fields) {
    (HeaderMode::Basic, Some(fields)) => BlockHeader::Basic {
      allocation: u32::from_ne_bytes(page.read_array(fields.allocation)),
      in_use: page.bytes(fields.flag, 1)[0] != 0,
    },
    (HeaderMode::Extended { user_bytes }, Some(fields)) => BlockHeader::Extended {
      user: page.bytes(block_layout.header_offset(slot), user_bytes),
      use_count: fields
        .use_count
        .map_or(0, |offset| u16::from_ne_bytes(page.read_array(offset))),
      allocation: u32::from_ne_bytes(page.read_array(fields.allocation)),
      in_use: page.bytes(fields.flag, 1)[0] != 0,
    },
    (HeaderMode::External, _) => BlockHeader::External(page.external(slot)),
    _ => BlockHeader::None,
  }
}

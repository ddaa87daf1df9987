use std::ptr::NonNull;

use super::*;
use crate::pattern::{ALIGN_PATTERN, PAD_PATTERN};

fn debug_config() -> Config {
  Config::default()
    .with_objects_per_page(4)
    .with_max_pages(0)
    .with_debug(true)
    .with_pad_bytes(4)
}

fn payload(
  allocator: &ObjectAllocator,
  object: NonNull<u8>,
) -> &[u8] {
  unsafe { std::slice::from_raw_parts(object.as_ptr(), allocator.layout.object_size) }
}

#[test]
fn test_first_page_is_created_eagerly() {
  let allocator = ObjectAllocator::new(16, debug_config()).unwrap();

  assert_eq!(allocator.pages.len(), 1);
  assert_eq!(allocator.free_list.len(), 4);
  assert_eq!(allocator.stats.pages_in_use, 1);
  assert_eq!(allocator.stats.free_objects, 4);
  assert_eq!(allocator.stats.page_size, allocator.layout.page_size);
}

#[test]
fn test_fresh_page_patterns() {
  let allocator = ObjectAllocator::new(16, debug_config().with_alignment(16)).unwrap();
  let page = &allocator.pages[0];
  let layout = allocator.layout;

  assert!(
    page
      .bytes(PAGE_LINK_SIZE, layout.left_align)
      .iter()
      .all(|&b| b == ALIGN_PATTERN)
  );

  for slot in 0..layout.objects_per_page {
    assert!(
      page
        .bytes(layout.left_pad_offset(slot), layout.pad_bytes)
        .iter()
        .all(|&b| b == PAD_PATTERN)
    );
    assert!(
      page
        .bytes(layout.payload_offset(slot), layout.object_size)
        .iter()
        .all(|&b| b == UNALLOCATED_PATTERN)
    );
    assert!(
      page
        .bytes(layout.right_pad_offset(slot), layout.pad_bytes)
        .iter()
        .all(|&b| b == PAD_PATTERN)
    );
  }

  for slot in 0..layout.objects_per_page - 1 {
    assert!(
      page
        .bytes(layout.inter_align_offset(slot), layout.inter_align)
        .iter()
        .all(|&b| b == ALIGN_PATTERN)
    );
  }
}

#[test]
fn test_only_pads_stamped_without_debug() {
  let allocator = ObjectAllocator::new(16, debug_config().with_debug(false)).unwrap();
  let page = &allocator.pages[0];
  let layout = allocator.layout;

  for slot in 0..layout.objects_per_page {
    assert!(
      page
        .bytes(layout.payload_offset(slot), layout.object_size)
        .iter()
        .all(|&b| b == 0)
    );
    assert!(
      page
        .bytes(layout.left_pad_offset(slot), layout.pad_bytes)
        .iter()
        .chain(page.bytes(layout.right_pad_offset(slot), layout.pad_bytes))
        .all(|&b| b == PAD_PATTERN)
    );
  }
}

#[test]
fn test_unpadded_page_is_untouched_without_debug() {
  let config = debug_config().with_debug(false).with_pad_bytes(0);
  let allocator = ObjectAllocator::new(16, config).unwrap();
  let page = &allocator.pages[0];

  assert!(
    page
      .bytes(PAGE_LINK_SIZE, page.size() - PAGE_LINK_SIZE)
      .iter()
      .all(|&b| b == 0)
  );
}

#[test]
fn test_allocate_and_free_stamp_payload() {
  let mut allocator = ObjectAllocator::new(16, debug_config()).unwrap();

  let object = allocator.allocate(None).unwrap();
  assert!(payload(&allocator, object).iter().all(|&b| b == ALLOCATED_PATTERN));

  unsafe { allocator.free(object).unwrap() };
  assert!(payload(&allocator, object).iter().all(|&b| b == FREED_PATTERN));
}

#[test]
fn test_last_block_of_page_is_handed_out_first() {
  let mut allocator = ObjectAllocator::new(16, debug_config()).unwrap();

  let object = allocator.allocate(None).unwrap();
  let expected = allocator.pages[0].ptr_at(allocator.layout.payload_offset(3));

  assert_eq!(object, expected);
}

#[test]
fn test_page_links() {
  let mut allocator = ObjectAllocator::new(8, debug_config().with_objects_per_page(1)).unwrap();

  allocator.allocate(None).unwrap();
  allocator.allocate(None).unwrap();
  allocator.allocate(None).unwrap();

  assert_eq!(allocator.pages.len(), 3);
  assert_eq!(allocator.pages[0].link(), 0);
  assert_eq!(allocator.pages[1].link(), allocator.pages[0].addr());
  assert_eq!(allocator.pages[2].link(), allocator.pages[1].addr());
}

#[test]
fn test_relink_after_reclaim() {
  let mut allocator = ObjectAllocator::new(8, debug_config().with_objects_per_page(1)).unwrap();

  let a = allocator.allocate(None).unwrap();
  let b = allocator.allocate(None).unwrap();
  let c = allocator.allocate(None).unwrap();

  unsafe { allocator.free(b).unwrap() };
  assert_eq!(allocator.free_empty_pages(), 1);

  assert_eq!(allocator.pages.len(), 2);
  assert_eq!(allocator.pages[0].link(), 0);
  assert_eq!(allocator.pages[1].link(), allocator.pages[0].addr());

  unsafe {
    allocator.free(a).unwrap();
    allocator.free(c).unwrap();
  }
}

#[test]
fn test_basic_header_bytes() {
  let config = debug_config().with_header(HeaderMode::Basic);
  let mut allocator = ObjectAllocator::new(16, config).unwrap();

  allocator.allocate(None).unwrap();
  let object = allocator.allocate(None).unwrap();

  // Slot 2 holds the second allocation.
  let header = allocator.pages[0].bytes(allocator.layout.header_offset(2), 5);
  assert_eq!(u32::from_ne_bytes(header[..4].try_into().unwrap()), 2);
  assert_eq!(header[4], 1);

  unsafe { allocator.free(object).unwrap() };

  let header = allocator.pages[0].bytes(allocator.layout.header_offset(2), 5);
  assert_eq!(header, &[0; 5]);
}

#[test]
fn test_external_header_slot_holds_record_address() {
  let config = debug_config().with_header(HeaderMode::External);
  let mut allocator = ObjectAllocator::new(16, config).unwrap();

  let object = allocator.allocate(Some("widget")).unwrap();
  let page = &allocator.pages[0];
  let slot = page.read_array::<{ std::mem::size_of::<usize>() }>(allocator.layout.header_offset(3));
  let record = page.external(3).unwrap();

  assert_eq!(usize::from_ne_bytes(slot), record as *const _ as usize);

  unsafe { allocator.free(object).unwrap() };

  let page = &allocator.pages[0];
  assert_eq!(
    page.read_array::<{ std::mem::size_of::<usize>() }>(allocator.layout.header_offset(3)),
    [0; std::mem::size_of::<usize>()]
  );
  assert_eq!(page.external_count(), 0);
}

#[test]
fn test_debug_off_resolves_interior_pointer() {
  let mut allocator = ObjectAllocator::new(16, debug_config().with_debug(false)).unwrap();

  let object = allocator.allocate(None).unwrap();
  let interior = unsafe { object.add(5) };

  unsafe { allocator.free(interior).unwrap() };

  assert_eq!(allocator.free_list().head(), Some(object));
  assert_eq!(allocator.stats.objects_in_use, 0);
}

#[test]
fn test_failed_free_changes_nothing() {
  let mut allocator = ObjectAllocator::new(16, debug_config()).unwrap();

  let object = allocator.allocate(None).unwrap();
  let before = allocator.stats();
  let free_before = allocator.free_list.len();

  let misaligned = unsafe { object.add(1) };
  assert!(unsafe { allocator.free(misaligned) }.is_err());

  assert_eq!(allocator.stats(), before);
  assert_eq!(allocator.free_list.len(), free_before);
  assert!(payload(&allocator, object).iter().all(|&b| b == ALLOCATED_PATTERN));
}

#[test]
fn test_outstanding_external_records_are_owned_by_pages() {
  let config = debug_config().with_header(HeaderMode::External);
  let mut allocator = ObjectAllocator::new(16, config).unwrap();

  let objects: Vec<_> = (0..6)
    .map(|i| allocator.allocate(Some(&format!("leak {i}"))).unwrap())
    .collect();
  unsafe { allocator.free(objects[0]).unwrap() };

  let records: usize = allocator.pages.iter().map(Page::external_count).sum();
  assert_eq!(records, 5);
  drop(allocator);
}

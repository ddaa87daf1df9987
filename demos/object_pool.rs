use std::ptr::NonNull;

use objpool::{BlockHeader, Config, HeaderMode, ObjectAllocator};

/// A client type with a known, fixed size.
#[repr(C)]
struct Particle {
  position: [f32; 3],
  velocity: [f32; 3],
  life: f32,
}

const SIZE: usize = std::mem::size_of::<Particle>();

/// Prints the bytes of a block, its pads included.
unsafe fn print_block(
  label: &str,
  object: NonNull<u8>,
  pad: usize,
) {
  let bytes = unsafe { std::slice::from_raw_parts(object.as_ptr().sub(pad), SIZE + 2 * pad) };
  let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
  println!("[{label}] {:p}: {}", object, hex.join(" "));
}

fn main() {
  let config = Config::default()
    .with_objects_per_page(4)
    .with_max_pages(2)
    .with_debug(true)
    .with_pad_bytes(2)
    .with_header(HeaderMode::External);

  let mut allocator = ObjectAllocator::new(SIZE, config).expect("allocator");
  println!("[start] {}", allocator.stats());

  // --------------------------------------------------------------------
  // 1) Allocate a particle. The payload starts out as 0xBB.
  // --------------------------------------------------------------------
  let first = allocator.allocate(Some("first particle")).expect("allocate");
  unsafe { print_block("1", first, 2) };

  unsafe {
    first.cast::<Particle>().as_ptr().write(Particle {
      position: [1.0, 2.0, 3.0],
      velocity: [0.0, -9.8, 0.0],
      life: 1.0,
    });
    print_block("1", first, 2);
  }

  if let Some(BlockHeader::External(Some(record))) = allocator.block_header(first) {
    println!(
      "[1] header: allocation #{}, label {:?}",
      record.allocation(),
      record.label()
    );
  }

  // --------------------------------------------------------------------
  // 2) Fill the first page and spill into a second one.
  // --------------------------------------------------------------------
  let mut others = Vec::new();
  for _ in 0..4 {
    others.push(allocator.allocate(None).expect("allocate"));
  }
  println!("\n[2] {}", allocator.stats());
  for page in allocator.page_list().iter() {
    println!("[2] page at {:p}", page);
  }

  // --------------------------------------------------------------------
  // 3) Overrun one block and let validation find it.
  // --------------------------------------------------------------------
  unsafe { others[0].as_ptr().add(SIZE).write(0) };
  let corrupted = allocator.validate_pages(|object, size| {
    println!("\n[3] corrupted block at {:p} ({} bytes)", object, size);
  });
  println!("[3] {} corrupted block(s)", corrupted);

  match unsafe { allocator.free(others[0]) } {
    Ok(()) => println!("[3] freed"),
    Err(error) => println!("[3] free refused: {error}"),
  }

  // --------------------------------------------------------------------
  // 4) Free a block twice.
  // --------------------------------------------------------------------
  unsafe {
    allocator.free(first).expect("free");
    print_block("4", first, 2);

    if let Err(error) = allocator.free(first) {
      println!("[4] second free refused: {error}");
    }
  }

  // --------------------------------------------------------------------
  // 5) Leak report, then reclaim whatever pages are empty.
  // --------------------------------------------------------------------
  for &object in &others[1..] {
    unsafe { allocator.free(object).expect("free") };
  }

  let leaked = allocator.dump_memory_in_use(|object, size| {
    println!("\n[5] still in use: {:p} ({} bytes)", object, size);
  });
  println!("[5] {} block(s) still in use", leaked);
  println!("[5] released {} empty page(s)", allocator.free_empty_pages());
  println!("[5] {}", allocator.stats());

  // --------------------------------------------------------------------
  // 6) End of demo. Dropping the allocator releases every page, including
  //    the one still holding the corrupted block.
  // --------------------------------------------------------------------
  println!("\n[6] End of example.");
}

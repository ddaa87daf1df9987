//! # objpool - A Fixed-Size Object Allocator
//!
//! This crate provides an **object allocator** (also known as a pool or
//! fixed-size block allocator): it hands out and takes back blocks of one
//! size, carved out of pages it owns, instead of going through the general
//! purpose heap for every object.
//!
//! ## Overview
//!
//! ```text
//!   Page list (newest first):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │  Page 2   ┌──────┬─────────┬─────────┬─────────┬─────────┐           │
//!   │           │ link │ block 0 │ block 1 │ block 2 │ block 3 │           │
//!   │           └──┬───┴─────────┴────▲────┴─────────┴────▲────┘           │
//!   │              │                  │ in use            │ free           │
//!   │              ▼                                                       │
//!   │  Page 1   ┌──────┬─────────┬─────────┬─────────┬─────────┐           │
//!   │           │ link │ block 0 │ block 1 │ block 2 │ block 3 │           │
//!   │           └──┬───┴─────────┴─────────┴─────────┴─────────┘           │
//!   │              ▼                                                       │
//!   │             null                                                     │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   allocate: pop the head of the free list      O(1)
//!   free:     push the block back on the head    O(1)
//! ```
//!
//! A new page is created whenever the free list runs dry, until the
//! configured page limit is reached.
//!
//! ## Crate Structure
//!
//! ```text
//!   objpool
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── pattern    - Sentinel bytes and header sizes
//!   ├── config     - Config and HeaderMode
//!   ├── stats      - Running counters
//!   ├── error      - AllocatorError
//!   ├── layout     - Byte geometry of a page
//!   ├── page       - Owned page buffers (internal)
//!   ├── block      - Per-block headers
//!   ├── list       - Free list and read-only list views
//!   └── allocator  - ObjectAllocator, validation and reclaim passes
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use objpool::{Config, ObjectAllocator};
//!
//! let config = Config::default().with_objects_per_page(8).with_debug(true);
//! let mut allocator = ObjectAllocator::new(32, config).unwrap();
//!
//! let object = allocator.allocate(None).unwrap();
//! unsafe {
//!     object.as_ptr().write_bytes(7, 32);
//!     allocator.free(object).unwrap();
//! }
//!
//! assert_eq!(allocator.stats().allocations, 1);
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   Single Block:
//!   ┌──────────────┬───────────┬────────────────────────────┬───────────┐
//!   │    Header    │  Left Pad │          Payload           │ Right Pad │
//!   │ (HeaderMode) │ 0xDD ...  │  object_size bytes usable  │ 0xDD ...  │
//!   └──────────────┴───────────┴────────────────────────────┴───────────┘
//!                              ▲
//!                              └── Pointer returned to the client
//! ```
//!
//! While debug is on the payload carries a pattern telling its state:
//! `0xAA` never handed out, `0xBB` just allocated, `0xCC` freed. The pads
//! are checked on every `free` and by [`ObjectAllocator::validate_pages`].
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **One size**: The object size is fixed per allocator
//! - **No coalescing**: Pages are fixed arrays of fixed slots
//!
//! ## Safety
//!
//! Clients write through the raw pointers they are handed, which needs
//! `unsafe`. [`ObjectAllocator::free`] is `unsafe` because with checks off
//! (or with the system allocator) it trusts the pointer it is given.

pub mod align;
mod allocator;
mod block;
mod config;
mod error;
mod layout;
mod list;
mod page;
pub mod pattern;
mod stats;

pub use allocator::ObjectAllocator;
pub use block::{BlockHeader, ExternalHeader};
pub use config::{Config, HeaderMode};
pub use error::{AllocatorError, Result};
pub use layout::BlockLayout;
pub use list::{FreeListView, PageListView};
pub use stats::Stats;

/// Rounds `value` up to the machine word size.
///
/// # Examples
///
/// ```rust
/// use objpool::align;
///
/// match core::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. An alignment of 0 or 1 leaves the
/// value untouched.
///
/// ```rust
/// use objpool::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(5, 0), 5);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {{
    let alignment: usize = $alignment;
    let value: usize = $value;
    if alignment <= 1 {
      value
    } else {
      (value + alignment - 1) & !(alignment - 1)
    }
  }};
}

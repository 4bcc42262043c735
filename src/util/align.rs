// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr;
use std::{fmt, mem};

/// An analog to a `Box<[T]>` where the underlying slice is aligned.
/// Alignment is according to the architecture-specific SIMD constraints.
///
/// Scratch grids for the restoration kernels live in these so that row
/// starts at multiples of 8 elements are 32-byte aligned.
pub struct AlignedBoxedSlice<T> {
  ptr: ptr::NonNull<T>,
  len: usize,
}

impl<T> AlignedBoxedSlice<T> {
  // Data alignment in bytes.
  cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
      const DATA_ALIGNMENT_LOG2: usize = 3;
    } else {
      const DATA_ALIGNMENT_LOG2: usize = 6;
    }
  }

  fn layout(len: usize) -> Layout {
    // The size is never zero: empty slices still get one aligned element.
    let size = len.max(1) * mem::size_of::<T>();
    match Layout::from_size_align(size, 1 << Self::DATA_ALIGNMENT_LOG2) {
      Ok(layout) => layout,
      Err(_) => panic!("aligned allocation of {len} elements overflows"),
    }
  }

  fn alloc(len: usize) -> ptr::NonNull<T> {
    let layout = Self::layout(len);
    // SAFETY: The layout has a non-zero size.
    let p = unsafe { alloc(layout) } as *mut T;
    match ptr::NonNull::new(p) {
      Some(p) => p,
      None => handle_alloc_error(layout),
    }
  }

  /// Creates a [`AlignedBoxedSlice`] with a slice of length `len` filled with
  /// `val`.
  pub fn new(len: usize, val: T) -> Self
  where
    T: Clone,
  {
    let output = Self { ptr: Self::alloc(len), len };

    // The memory is uninitialized, so it must be written without dropping
    // whatever garbage happens to be there.
    for i in 0..len {
      // SAFETY: `i` is within the allocation made for `len` elements.
      unsafe { ptr::write(output.ptr.as_ptr().add(i), val.clone()) };
    }

    output
  }
}

impl<T: Clone> Clone for AlignedBoxedSlice<T> {
  fn clone(&self) -> Self {
    let output = Self { ptr: Self::alloc(self.len), len: self.len };
    for (i, v) in self.iter().enumerate() {
      // SAFETY: `i` is within the allocation made for `self.len` elements.
      unsafe { ptr::write(output.ptr.as_ptr().add(i), v.clone()) };
    }
    output
  }
}

impl<T: fmt::Debug> fmt::Debug for AlignedBoxedSlice<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&**self, f)
  }
}

impl<T> std::ops::Deref for AlignedBoxedSlice<T> {
  type Target = [T];

  fn deref(&self) -> &[T] {
    // SAFETY: We know that `self.ptr` is not null, and we know its length.
    unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }
}

impl<T> std::ops::DerefMut for AlignedBoxedSlice<T> {
  fn deref_mut(&mut self) -> &mut [T] {
    // SAFETY: We know that `self.ptr` is not null, and we know its length.
    unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }
}

impl<T> std::ops::Drop for AlignedBoxedSlice<T> {
  fn drop(&mut self) {
    // SAFETY: We know that the contents of this struct are aligned and valid
    // to drop.
    unsafe {
      for a in self.iter_mut() {
        ptr::drop_in_place(a)
      }

      dealloc(self.ptr.as_ptr() as *mut u8, Self::layout(self.len));
    }
  }
}

// SAFETY: The slice owns its elements exclusively.
unsafe impl<T> Send for AlignedBoxedSlice<T> where T: Send {}
// SAFETY: Shared access only hands out `&[T]`.
unsafe impl<T> Sync for AlignedBoxedSlice<T> where T: Sync {}

// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use num_traits::Zero;

use crate::util::{AlignedBoxedSlice, Fixed};

/// A 2D buffer addressed in logical coordinates, with a border of `border`
/// elements on every side of a `width`x`height` interior.
///
/// Valid coordinates are `x` in `[-border, width + border)` and `y` in
/// `[-border, height + border)`. Each row is followed by `stride - cols`
/// guard elements which are never part of the logical grid.
#[derive(Clone, Debug)]
pub struct BorderedGrid<T> {
  data: AlignedBoxedSlice<T>,
  stride: usize,
  border: usize,
  width: usize,
  height: usize,
}

impl<T: Copy + Zero> BorderedGrid<T> {
  /// Allocates a zeroed grid whose stride is the bordered width plus at
  /// least `guard` elements, rounded up to a multiple of 8.
  pub fn new(
    width: usize, height: usize, border: usize, guard: usize,
  ) -> Self {
    let stride = (width + 2 * border + guard).align_power_of_two(3);
    Self::with_stride(width, height, border, stride)
  }

  /// Allocates a zeroed grid with an explicit row stride.
  ///
  /// # Panics
  ///
  /// - If `stride` is narrower than the bordered width.
  pub fn with_stride(
    width: usize, height: usize, border: usize, stride: usize,
  ) -> Self {
    assert!(stride >= width + 2 * border);
    let rows = height + 2 * border;
    BorderedGrid {
      data: AlignedBoxedSlice::new(stride * rows, T::zero()),
      stride,
      border,
      width,
      height,
    }
  }

  #[inline(always)]
  pub const fn stride(&self) -> usize {
    self.stride
  }

  #[inline(always)]
  pub const fn border(&self) -> usize {
    self.border
  }

  #[inline(always)]
  pub const fn width(&self) -> usize {
    self.width
  }

  #[inline(always)]
  pub const fn height(&self) -> usize {
    self.height
  }

  /// Number of allocated columns in a row, border included, guard excluded.
  #[inline(always)]
  pub const fn cols(&self) -> usize {
    self.width + 2 * self.border
  }

  /// Number of allocated rows, border included.
  #[inline(always)]
  pub const fn rows(&self) -> usize {
    self.height + 2 * self.border
  }

  #[inline(always)]
  fn index(&self, x: isize, y: isize) -> usize {
    let b = self.border as isize;
    debug_assert!(
      x >= -b && x < (self.width + self.border) as isize,
      "x = {x} outside [-{b}, {})",
      self.width + self.border
    );
    debug_assert!(
      y >= -b && y < (self.height + self.border) as isize,
      "y = {y} outside [-{b}, {})",
      self.height + self.border
    );
    (y + b) as usize * self.stride + (x + b) as usize
  }

  #[inline(always)]
  pub fn at(&self, x: isize, y: isize) -> T {
    self.data[self.index(x, y)]
  }

  #[inline(always)]
  pub fn set(&mut self, x: isize, y: isize, v: T) {
    let i = self.index(x, y);
    self.data[i] = v;
  }

  /// Row `y` from column `x` up to the end of the stride, guard included.
  #[inline(always)]
  pub fn row_from(&self, x: isize, y: isize) -> &[T] {
    let i = self.index(x, y);
    let end = i - (x + self.border as isize) as usize + self.stride;
    &self.data[i..end]
  }

  /// Mutable row `y` from column `x` up to the end of the stride.
  #[inline(always)]
  pub fn row_from_mut(&mut self, x: isize, y: isize) -> &mut [T] {
    let i = self.index(x, y);
    let end = i - (x + self.border as isize) as usize + self.stride;
    &mut self.data[i..end]
  }

  /// Full physical row `y`, starting at column `-border`.
  #[inline(always)]
  pub fn row(&self, y: isize) -> &[T] {
    self.row_from(-(self.border as isize), y)
  }

  #[inline(always)]
  pub fn row_mut(&mut self, y: isize) -> &mut [T] {
    self.row_from_mut(-(self.border as isize), y)
  }

  /// Returns row `y - 1` and a mutable row `y`, both starting at column
  /// `-border`.
  pub fn row_pair_mut(&mut self, y: isize) -> (&[T], &mut [T]) {
    let cur = self.index(-(self.border as isize), y);
    let stride = self.stride;
    assert!(cur >= stride);
    let (above, below) = self.data.split_at_mut(cur);
    (&above[cur - stride..], &mut below[..stride])
  }

  pub fn fill(&mut self, v: T) {
    self.data.iter_mut().for_each(|d| *d = v);
  }
}

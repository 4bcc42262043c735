// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use super::grid::BorderedGrid;
use super::{SGRPROJ_BORDER_HORZ, SGRPROJ_BORDER_VERT};
use crate::frame::PlaneSlice;
use crate::util::{CastFromPrimitive, Pixel};

/// Zeroed columns kept to the right of every integral image row.
pub const INTEGRAL_IMAGE_GUARD: usize = 16;

/// Sum and sum-of-squares integral images of a bordered processing unit.
///
/// `sum.at(X, Y)` is the sum of `src(x, y)` over
/// `-BORDER_HORZ <= x < X`, `-BORDER_VERT <= y < Y`, so row and column
/// `-BORDER` are the zero margin. All sums wrap modulo 2^32; differences of
/// four corners are exact as long as the box itself fits in 32 bits.
#[derive(Clone, Debug)]
pub struct IntegralImages {
  pub sum: BorderedGrid<u32>,
  pub sum_sq: BorderedGrid<u32>,
  width: usize,
  height: usize,
}

impl IntegralImages {
  /// Allocates zeroed integral images for a `width`x`height` unit.
  pub fn new(width: usize, height: usize) -> Self {
    debug_assert_eq!(SGRPROJ_BORDER_HORZ, SGRPROJ_BORDER_VERT);
    // One more logical column/row than pixels: X runs over [-3, w + 3].
    let alloc = || {
      BorderedGrid::new(
        width + 1,
        height + 1,
        SGRPROJ_BORDER_HORZ,
        INTEGRAL_IMAGE_GUARD,
      )
    };
    IntegralImages { sum: alloc(), sum_sq: alloc(), width, height }
  }

  /// Builds the integral images of the `width`x`height` unit starting at
  /// `dgd`, reading `SGRPROJ_BORDER_*` pixels around it.
  pub fn build<T: Pixel>(
    dgd: &PlaneSlice<'_, T>, width: usize, height: usize,
  ) -> Self {
    let mut ii = Self::new(width, height);
    ii.fill(dgd);
    ii
  }

  #[inline(always)]
  pub const fn width(&self) -> usize {
    self.width
  }

  #[inline(always)]
  pub const fn height(&self) -> usize {
    self.height
  }

  /// Recomputes both images from `dgd`; the unit size is fixed at
  /// allocation.
  pub fn fill<T: Pixel>(&mut self, dgd: &PlaneSlice<'_, T>) {
    let width_ext = self.width + 2 * SGRPROJ_BORDER_HORZ;
    let height_ext = self.height + 2 * SGRPROJ_BORDER_VERT;
    let origin = dgd.go_left(SGRPROJ_BORDER_HORZ).go_up(SGRPROJ_BORDER_VERT);
    let top = -(SGRPROJ_BORDER_VERT as isize);

    // Zero margin row, guard included.
    self.sum.row_mut(top).fill(0);
    self.sum_sq.row_mut(top).fill(0);

    for j in 0..height_ext {
      let src = &origin[j][..width_ext];
      let y = top + 1 + j as isize;
      let (above, cur) = self.sum.row_pair_mut(y);
      let (above_sq, cur_sq) = self.sum_sq.row_pair_mut(y);

      cur[0] = 0;
      cur_sq[0] = 0;

      // Running sums of the current row are carried from left to right and
      // added to the finished row above.
      let mut left = 0u32;
      let mut left_sq = 0u32;
      for (i, &p) in src.iter().enumerate() {
        let v = u32::cast_from(p);
        left = left.wrapping_add(v);
        left_sq = left_sq.wrapping_add(v * v);
        cur[i + 1] = above[i + 1].wrapping_add(left);
        cur_sq[i + 1] = above_sq[i + 1].wrapping_add(left_sq);
      }

      // Later box queries may read a vector's worth past the last column.
      cur[width_ext + 1..].fill(0);
      cur_sq[width_ext + 1..].fill(0);
    }
  }

  /// Sum of pixel values in the `(2r+1)x(2r+1)` box centered on `(x, y)`.
  #[inline(always)]
  pub fn box_sum(&self, x: isize, y: isize, r: usize) -> u32 {
    box_sum(&self.sum, x, y, r)
  }

  /// Sum of squared pixel values in the `(2r+1)x(2r+1)` box centered on
  /// `(x, y)`.
  #[inline(always)]
  pub fn box_sum_sq(&self, x: isize, y: isize, r: usize) -> u32 {
    box_sum(&self.sum_sq, x, y, r)
  }
}

#[inline(always)]
fn box_sum(ii: &BorderedGrid<u32>, x: isize, y: isize, r: usize) -> u32 {
  let r = r as isize;
  let tl = ii.at(x - r, y - r);
  let tr = ii.at(x + r + 1, y - r);
  let bl = ii.at(x - r, y + r + 1);
  let br = ii.at(x + r + 1, y + r + 1);
  br.wrapping_sub(bl).wrapping_sub(tr).wrapping_add(tl)
}

// Copyright (c) 2018-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

pub use v_frame::plane::*;

use crate::util::Pixel;

/// Logical region of a plane, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
  pub x: usize,
  pub y: usize,
  pub width: usize,
  pub height: usize,
}

impl Rect {
  #[inline]
  pub const fn offset(&self) -> PlaneOffset {
    PlaneOffset { x: self.x as isize, y: self.y as isize }
  }

  #[inline]
  pub const fn area(&self) -> usize {
    self.width * self.height
  }
}

pub trait AsRegion<T: Pixel> {
  /// Returns a slice positioned at the top-left corner of `rect`.
  fn region(&self, rect: Rect) -> PlaneSlice<'_, T>;
}

impl<T: Pixel> AsRegion<T> for Plane<T> {
  #[inline]
  fn region(&self, rect: Rect) -> PlaneSlice<'_, T> {
    self.slice(rect.offset())
  }
}

/// Number of pixels addressable to the left of and above `slice`, taking
/// the plane padding into account.
pub fn available_border<T: Pixel>(
  slice: &PlaneSlice<'_, T>,
) -> (usize, usize) {
  let cfg = &slice.plane.cfg;
  let left = (cfg.xorigin as isize + slice.x).max(0) as usize;
  let top = (cfg.yorigin as isize + slice.y).max(0) as usize;
  (left, top)
}

/// Number of pixels addressable to the right of and below a `w`x`h` region
/// starting at `slice`.
pub fn available_border_after<T: Pixel>(
  slice: &PlaneSlice<'_, T>, w: usize, h: usize,
) -> (usize, usize) {
  let cfg = &slice.plane.cfg;
  let right =
    cfg.stride as isize - (cfg.xorigin as isize + slice.x + w as isize);
  let bottom =
    cfg.alloc_height as isize - (cfg.yorigin as isize + slice.y + h as isize);
  (right.max(0) as usize, bottom.max(0) as usize)
}

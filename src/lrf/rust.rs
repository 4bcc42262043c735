// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use super::grid::BorderedGrid;
use super::integral::IntegralImages;
use super::tables::{ONE_BY_X, X_BY_XPLUS1};
use super::*;
use crate::cpu_features::CpuFeatureLevel;
use crate::util::{
  round_power_of_two, round_shift_signed, CastFromPrimitive, Pixel,
};

/// Turns the box statistics of one pixel into its filter slope `A` and
/// intercept `b`.
#[inline(always)]
pub(crate) fn sgrproj_sum_finish(
  ssq: u32, sum: u32, n: u32, one_over_n: u32, s: u32, bit_depth: usize,
) -> (u32, u32) {
  let p = if bit_depth == 8 {
    // Never negative for exact box sums.
    n.wrapping_mul(ssq).wrapping_sub(sum.wrapping_mul(sum))
  } else {
    let bdm8 = bit_depth - 8;
    let scaled_ssq = round_power_of_two(ssq, 2 * bdm8);
    let scaled_sum = round_power_of_two(sum, bdm8);
    let b2 = scaled_sum.wrapping_mul(scaled_sum);
    // Rounding can push the variance estimate below zero.
    scaled_ssq.wrapping_mul(n).max(b2) - b2
  };
  let z = round_power_of_two(p.wrapping_mul(s), SGRPROJ_MTABLE_BITS).min(255);
  let a = X_BY_XPLUS1[z as usize];
  // (SGR - A) * (1/n) fits in 17 bits, so it is formed before scaling the
  // much larger sum.
  let b = round_power_of_two(
    ((SGRPROJ_SGR - a) * one_over_n).wrapping_mul(sum),
    SGRPROJ_RECIP_BITS,
  );
  (a, b)
}

/// Computes `A` and `b` for columns `start_x..=w` of row `y`.
///
/// `a_row` and `b_row` start at column -1.
#[inline(always)]
pub(crate) fn sgrproj_box_ab_internal(
  a_row: &mut [u32], b_row: &mut [u32], ii: &IntegralImages, y: isize,
  start_x: isize, r: usize, s: u32, bit_depth: usize,
) {
  let d = 2 * r + 1;
  let n = (d * d) as u32;
  let one_over_n = ONE_BY_X[n as usize - 1];
  let w = ii.width() as isize;

  for x in start_x..=w {
    let sum = ii.box_sum(x, y, r);
    let ssq = ii.box_sum_sq(x, y, r);
    let (a, b) = sgrproj_sum_finish(ssq, sum, n, one_over_n, s, bit_depth);
    a_row[(x + 1) as usize] = a;
    b_row[(x + 1) as usize] = b;
  }
}

/// Computes `A` and `b` for columns `-1..=w` of row `y`.
pub fn sgrproj_box_ab_row(
  a_row: &mut [u32], b_row: &mut [u32], ii: &IntegralImages, y: isize,
  r: usize, s: u32, bit_depth: usize, _cpu: CpuFeatureLevel,
) {
  sgrproj_box_ab_internal(a_row, b_row, ii, y, -1, r, s, bit_depth);
}

/// Full 3x3 neighborhood: corners weigh 3, edges and center weigh 4.
#[inline(always)]
fn cross_sum(g: &BorderedGrid<u32>, x: isize, y: isize) -> u32 {
  let fours = g.at(x - 1, y)
    + g.at(x, y - 1)
    + g.at(x, y)
    + g.at(x + 1, y)
    + g.at(x, y + 1);
  let threes = g.at(x - 1, y - 1)
    + g.at(x + 1, y - 1)
    + g.at(x - 1, y + 1)
    + g.at(x + 1, y + 1);
  fours.wrapping_mul(4).wrapping_add(threes.wrapping_mul(3))
}

/// Only rows y - 1 and y + 1 were estimated: verticals weigh 6, diagonals 5.
#[inline(always)]
fn cross_sum_fast_even_row(g: &BorderedGrid<u32>, x: isize, y: isize) -> u32 {
  let sixes = g.at(x, y - 1) + g.at(x, y + 1);
  let fives = g.at(x - 1, y - 1)
    + g.at(x + 1, y - 1)
    + g.at(x - 1, y + 1)
    + g.at(x + 1, y + 1);
  sixes.wrapping_mul(6).wrapping_add(fives.wrapping_mul(5))
}

/// Horizontal 5-6-5 triple of an estimated row.
#[inline(always)]
fn cross_sum_fast_odd_row(g: &BorderedGrid<u32>, x: isize, y: isize) -> u32 {
  let sixes = g.at(x, y);
  let fives = g.at(x - 1, y) + g.at(x + 1, y);
  sixes.wrapping_mul(6).wrapping_add(fives.wrapping_mul(5))
}

#[inline(always)]
fn sgrproj_filter_px(a: u32, b: u32, src: u32, shift: usize) -> i32 {
  let v = a.wrapping_mul(src).wrapping_add(b) as i32;
  round_shift_signed(v, shift)
}

/// Filters columns `start_x..w` of row `y` with the full 3x3 kernel.
#[inline(always)]
pub(crate) fn sgrproj_box_f_internal<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, start_x: usize, w: usize,
) {
  const SHIFT: usize = SGRPROJ_SGR_BITS + 5 - SGRPROJ_RST_BITS;
  for x in start_x..w {
    let xi = x as isize;
    flt[x] = sgrproj_filter_px(
      cross_sum(a, xi, y),
      cross_sum(b, xi, y),
      u32::cast_from(dgd[x]),
      SHIFT,
    );
  }
}

/// Filters columns `start_x..w` of row `y` with the row-parity dependent
/// kernel of the subsampled estimator.
#[inline(always)]
pub(crate) fn sgrproj_box_f_fast_internal<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, start_x: usize, w: usize,
) {
  const SHIFT_EVEN: usize = SGRPROJ_SGR_BITS + 5 - SGRPROJ_RST_BITS;
  const SHIFT_ODD: usize = SGRPROJ_SGR_BITS + 4 - SGRPROJ_RST_BITS;
  if y & 1 == 0 {
    for x in start_x..w {
      let xi = x as isize;
      flt[x] = sgrproj_filter_px(
        cross_sum_fast_even_row(a, xi, y),
        cross_sum_fast_even_row(b, xi, y),
        u32::cast_from(dgd[x]),
        SHIFT_EVEN,
      );
    }
  } else {
    for x in start_x..w {
      let xi = x as isize;
      flt[x] = sgrproj_filter_px(
        cross_sum_fast_odd_row(a, xi, y),
        cross_sum_fast_odd_row(b, xi, y),
        u32::cast_from(dgd[x]),
        SHIFT_ODD,
      );
    }
  }
}

pub fn sgrproj_box_f_row<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, w: usize, _cpu: CpuFeatureLevel,
) {
  sgrproj_box_f_internal(flt, a, b, dgd, y, 0, w);
}

pub fn sgrproj_box_f_fast_row<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, w: usize, _cpu: CpuFeatureLevel,
) {
  sgrproj_box_f_fast_internal(flt, a, b, dgd, y, 0, w);
}

/// Blends one row of filter outputs with the source pixels.
///
/// An inactive radius passes `None` and its weight is never read.
pub(crate) fn sgrproj_blend_row<T: Pixel>(
  dst: &mut [T], src: &[T], flt0: Option<&[i32]>, flt1: Option<&[i32]>,
  xq: [i32; 2], w: usize, pixel_max: i32,
) {
  const SHIFT: usize = SGRPROJ_PRJ_BITS + SGRPROJ_RST_BITS;
  for x in 0..w {
    let u = i32::cast_from(src[x]) << SGRPROJ_RST_BITS;
    let mut v = u << SGRPROJ_PRJ_BITS;
    if let Some(flt0) = flt0 {
      v += xq[0] * (flt0[x] - u);
    }
    if let Some(flt1) = flt1 {
      v += xq[1] * (flt1[x] - u);
    }
    let out = round_shift_signed(v, SHIFT);
    dst[x] = T::cast_from(out.clamp(0, pixel_max));
  }
}

// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Self-guided restoration filter.
//!
//! A processing unit is filtered by estimating, for every pixel, a linear
//! map `A * src + b` from the mean and variance of a square window around
//! it, smoothing `A` and `b` over a 3x3 neighborhood, and finally blending
//! up to two such filtered images with the source using the projection
//! weights `xq`.

cfg_if::cfg_if! {
  if #[cfg(target_arch = "x86_64")] {
    use crate::asm::x86::lrf::*;
  } else {
    use self::rust::*;
  }
}

pub mod grid;
pub mod integral;
pub mod plane;
pub(crate) mod rust;
pub mod solve;
pub mod tables;

pub use grid::BorderedGrid;
pub use integral::IntegralImages;
pub use plane::*;
pub use solve::*;

use thiserror::Error;

use crate::config::{InvalidConfig, RestorationConfig};
use crate::cpu_features::CpuFeatureLevel;
use crate::frame::{
  available_border, available_border_after, PlaneMutSlice, PlaneSlice,
};
use crate::util::{clamp, AlignedBoxedSlice, Pixel};

pub const SGRPROJ_BORDER_VERT: usize = 3;
pub const SGRPROJ_BORDER_HORZ: usize = 3;
pub const RESTORATION_BORDER: usize = 3;

pub const SGRPROJ_XQD_MIN: [i8; 2] = [-96, -32];
pub const SGRPROJ_XQD_MID: [i8; 2] = [-32, 31];
pub const SGRPROJ_XQD_MAX: [i8; 2] = [31, 95];
pub const SGRPROJ_PRJ_BITS: usize = 7;
pub const SGRPROJ_PARAMS_BITS: u8 = 4;
pub const SGRPROJ_MTABLE_BITS: usize = 20;
pub const SGRPROJ_SGR_BITS: usize = 8;
pub const SGRPROJ_SGR: u32 = 1 << SGRPROJ_SGR_BITS;
pub const SGRPROJ_RECIP_BITS: usize = 12;
pub const SGRPROJ_RST_BITS: usize = 4;

pub const RESTORATION_PROC_UNIT_SIZE: usize = 64;
pub const RESTORATION_UNITSIZE_MAX: usize = 256;
pub const RESTORATION_UNIT_OFFSET: usize = 8;
/// Widest unit the kernels accept: a stretched 1.5x unit plus border and
/// alignment slack.
pub const RESTORATION_UNITPELS_HORZ_MAX: usize =
  RESTORATION_UNITSIZE_MAX * 3 / 2 + 2 * RESTORATION_BORDER + 16;
pub const RESTORATION_UNITPELS_VERT_MAX: usize = RESTORATION_UNITSIZE_MAX * 3
  / 2
  + 2 * RESTORATION_BORDER
  + RESTORATION_UNIT_OFFSET;
pub const RESTORATION_UNITPELS_MAX: usize =
  RESTORATION_UNITPELS_HORZ_MAX * RESTORATION_UNITPELS_VERT_MAX;

/// Zeroed columns kept to the right of the `A`/`b` grids.
const AB_GUARD: usize = 8;

/// Radii and strengths of one self-guided filter configuration.
///
/// Slot 0 always uses the subsampled estimator, slot 1 the full one. A
/// radius of 0 disables the slot; its strength is then meaningless.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SgrParams {
  pub r: [usize; 2],
  pub s: [u32; 2],
}

impl SgrParams {
  /// Looks up a parameter set by index.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidParamSet` if `set` is not below
  ///   `1 << SGRPROJ_PARAMS_BITS`.
  pub fn from_set(set: u8) -> Result<Self, SgrprojError> {
    SGRPROJ_PARAMS
      .get(set as usize)
      .copied()
      .ok_or(SgrprojError::InvalidParamSet(set))
  }

  #[inline(always)]
  pub const fn is_active(&self, pass: usize) -> bool {
    self.r[pass] > 0
  }

  /// Number of pixels in the window of slot `pass`.
  #[inline(always)]
  pub const fn n(&self, pass: usize) -> u32 {
    let d = 2 * self.r[pass] as u32 + 1;
    d * d
  }

  /// Checks that the kernels can run this configuration.
  ///
  /// # Errors
  ///
  /// - Returns `BothRadiiZero` if neither slot is active; such units must
  ///   skip restoration instead.
  /// - Returns `RadiusExceedsBorder` if a window would reach past the
  ///   border the unit is padded with.
  pub fn validate(&self) -> Result<(), SgrprojError> {
    if !self.is_active(0) && !self.is_active(1) {
      return Err(SgrprojError::BothRadiiZero);
    }
    let border = SGRPROJ_BORDER_VERT.min(SGRPROJ_BORDER_HORZ);
    for &radius in &self.r {
      if radius >= border {
        return Err(SgrprojError::RadiusExceedsBorder { radius, border });
      }
    }
    Ok(())
  }
}

macro_rules! sgr_params {
  ($(($r0:expr, $r1:expr, $s0:expr, $s1:expr)),* $(,)?) => {
    [$(SgrParams { r: [$r0, $r1], s: [$s0, $s1] }),*]
  };
}

pub static SGRPROJ_PARAMS: [SgrParams; 1 << SGRPROJ_PARAMS_BITS] = sgr_params![
  (2, 1, 140, 3236),
  (2, 1, 112, 2158),
  (2, 1, 93, 1618),
  (2, 1, 80, 1438),
  (2, 1, 70, 1295),
  (2, 1, 58, 1177),
  (2, 1, 47, 1079),
  (2, 1, 37, 996),
  (2, 1, 30, 925),
  (2, 1, 25, 863),
  (0, 1, 0, 2589),
  (0, 1, 0, 1618),
  (0, 1, 0, 1177),
  (0, 1, 0, 925),
  (2, 0, 56, 0),
  (2, 0, 22, 0),
];

/// Errors reported by the checked entry points.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum SgrprojError {
  #[error("invalid parameter set {0} (expected < 16)")]
  InvalidParamSet(u8),
  #[error("both radii are zero")]
  BothRadiiZero,
  #[error("radius {radius} must be smaller than the border of {border}")]
  RadiusExceedsBorder { radius: usize, border: usize },
  #[error("invalid unit size {width}x{height} (expected >= 1, <= 406x398)")]
  InvalidDimensions { width: usize, height: usize },
  #[error("buffer holds {actual} elements, {required} required")]
  BufferTooSmall { required: usize, actual: usize },
  #[error("unit needs a border of {required} pixels, {available} available")]
  InsufficientBorder { required: usize, available: usize },
  #[error("output plane is {actual:?}, input plane is {expected:?}")]
  PlaneSizeMismatch { expected: (usize, usize), actual: (usize, usize) },
  #[error(transparent)]
  InvalidConfig(#[from] InvalidConfig),
}

/// Decodes the signalled weights into projection coefficients.
pub fn decode_xq(xqd: [i8; 2], params: &SgrParams) -> [i32; 2] {
  let xqd = [xqd[0] as i32, xqd[1] as i32];
  let one = 1 << SGRPROJ_PRJ_BITS;
  if !params.is_active(0) {
    [0, one - xqd[1]]
  } else if !params.is_active(1) {
    [xqd[0], 0]
  } else {
    [xqd[0], one - xqd[0] - xqd[1]]
  }
}

/// Encodes projection coefficients into signalled weights, clamping them to
/// the representable range.
pub fn encode_xq(xq: [i32; 2], params: &SgrParams) -> [i8; 2] {
  let one = 1 << SGRPROJ_PRJ_BITS;
  let clamp0 =
    |v: i32| clamp(v, SGRPROJ_XQD_MIN[0] as i32, SGRPROJ_XQD_MAX[0] as i32);
  let clamp1 =
    |v: i32| clamp(v, SGRPROJ_XQD_MIN[1] as i32, SGRPROJ_XQD_MAX[1] as i32);
  let (xqd0, xqd1) = if !params.is_active(0) {
    (0, clamp1(one - xq[1]))
  } else if !params.is_active(1) {
    let xqd0 = clamp0(xq[0]);
    (xqd0, clamp1(one - xqd0))
  } else {
    let xqd0 = clamp0(xq[0]);
    (xqd0, clamp1(one - xqd0 - xq[1]))
  };
  [xqd0 as i8, xqd1 as i8]
}

/// Fills rows `-1..=h` of `a` and `b` with the filter coefficients of a
/// radius `r` window.
pub fn calc_ab(
  a: &mut BorderedGrid<u32>, b: &mut BorderedGrid<u32>, ii: &IntegralImages,
  r: usize, s: u32, bit_depth: usize, cpu: CpuFeatureLevel,
) {
  for y in -1..=ii.height() as isize {
    sgrproj_box_ab_row(
      a.row_from_mut(-1, y),
      b.row_from_mut(-1, y),
      ii,
      y,
      r,
      s,
      bit_depth,
      cpu,
    );
  }
}

/// Like [`calc_ab`], but only fills every other row starting at -1. The
/// rows in between are reconstructed by [`final_filter_fast`].
pub fn calc_ab_fast(
  a: &mut BorderedGrid<u32>, b: &mut BorderedGrid<u32>, ii: &IntegralImages,
  r: usize, s: u32, bit_depth: usize, cpu: CpuFeatureLevel,
) {
  for y in (-1..=ii.height() as isize).step_by(2) {
    sgrproj_box_ab_row(
      a.row_from_mut(-1, y),
      b.row_from_mut(-1, y),
      ii,
      y,
      r,
      s,
      bit_depth,
      cpu,
    );
  }
}

/// Smooths the coefficients of [`calc_ab`] and applies them to `dgd`,
/// writing `width`x`height` unblended values to `flt`.
pub fn final_filter<T: Pixel>(
  flt: &mut [i32], flt_stride: usize, a: &BorderedGrid<u32>,
  b: &BorderedGrid<u32>, dgd: &PlaneSlice<'_, T>, width: usize,
  height: usize, cpu: CpuFeatureLevel,
) {
  for (y, flt) in flt.chunks_mut(flt_stride).take(height).enumerate() {
    sgrproj_box_f_row(flt, a, b, &dgd[y], y as isize, width, cpu);
  }
}

/// Counterpart of [`final_filter`] for the coefficients of
/// [`calc_ab_fast`].
pub fn final_filter_fast<T: Pixel>(
  flt: &mut [i32], flt_stride: usize, a: &BorderedGrid<u32>,
  b: &BorderedGrid<u32>, dgd: &PlaneSlice<'_, T>, width: usize,
  height: usize, cpu: CpuFeatureLevel,
) {
  for (y, flt) in flt.chunks_mut(flt_stride).take(height).enumerate() {
    sgrproj_box_f_fast_row(flt, a, b, &dgd[y], y as isize, width, cpu);
  }
}

/// Runs both self-guided filters of `params` over the `width`x`height` unit
/// at `dgd`, writing unblended results to `flt0` (slot 0) and `flt1`
/// (slot 1). The buffer of an inactive slot is left untouched.
///
/// `dgd` must have `SGRPROJ_BORDER_*` readable pixels on every side.
///
/// # Panics
///
/// - If both radii are zero, or a radius is not smaller than the border.
/// - If an active output buffer is too small for `flt_stride` and the unit.
pub fn selfguided_restoration<T: Pixel>(
  dgd: &PlaneSlice<'_, T>, width: usize, height: usize, params: &SgrParams,
  bit_depth: usize, flt0: &mut [i32], flt1: &mut [i32], flt_stride: usize,
  cpu: CpuFeatureLevel,
) {
  // Both radii being zero means restoration is skipped upstream.
  assert!(params.is_active(0) || params.is_active(1));
  assert!(params.r[0] < SGRPROJ_BORDER_VERT.min(SGRPROJ_BORDER_HORZ));
  assert!(params.r[1] < SGRPROJ_BORDER_VERT.min(SGRPROJ_BORDER_HORZ));
  assert!(width > 0 && height > 0);
  assert!(flt_stride >= width);
  let flt_len = flt_stride * (height - 1) + width;

  let ii = IntegralImages::build(dgd, width, height);

  // The second pass overwrites the coefficients of the first, which is
  // complete by then.
  let mut a: BorderedGrid<u32> = BorderedGrid::new(width, height, 1, AB_GUARD);
  let mut b: BorderedGrid<u32> = BorderedGrid::new(width, height, 1, AB_GUARD);

  if params.is_active(0) {
    assert!(flt0.len() >= flt_len);
    let (r, s) = (params.r[0], params.s[0]);
    calc_ab_fast(&mut a, &mut b, &ii, r, s, bit_depth, cpu);
    final_filter_fast(flt0, flt_stride, &a, &b, dgd, width, height, cpu);
  }

  if params.is_active(1) {
    assert!(flt1.len() >= flt_len);
    calc_ab(&mut a, &mut b, &ii, params.r[1], params.s[1], bit_depth, cpu);
    final_filter(flt1, flt_stride, &a, &b, dgd, width, height, cpu);
  }
}

/// Intermediate filter outputs of one unit.
#[derive(Clone, Debug)]
pub struct RestorationScratch {
  pub flt0: AlignedBoxedSlice<i32>,
  pub flt1: AlignedBoxedSlice<i32>,
}

impl Default for RestorationScratch {
  fn default() -> Self {
    Self::new(RESTORATION_UNITPELS_MAX)
  }
}

impl RestorationScratch {
  /// Scratch for units of up to `pels` pixels.
  pub fn new(pels: usize) -> Self {
    RestorationScratch {
      flt0: AlignedBoxedSlice::new(pels, 0),
      flt1: AlignedBoxedSlice::new(pels, 0),
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.flt0.len().min(self.flt1.len())
  }
}

/// Restores the `width`x`height` unit at `dgd` with parameter set `set`
/// and signalled weights `xqd`, writing clamped pixels to `dst`.
///
/// # Panics
///
/// - If `set` is out of range or its parameters can't be run.
/// - If `scratch` holds fewer than `width * height` pixels.
pub fn apply_selfguided_restoration<T: Pixel>(
  dgd: &PlaneSlice<'_, T>, width: usize, height: usize, set: u8, xqd: [i8; 2],
  bit_depth: usize, dst: &mut PlaneMutSlice<'_, T>,
  scratch: &mut RestorationScratch, cpu: CpuFeatureLevel,
) {
  let params = &SGRPROJ_PARAMS[set as usize];
  assert!(width * height <= scratch.capacity());

  let RestorationScratch { flt0, flt1 } = scratch;
  selfguided_restoration(
    dgd, width, height, params, bit_depth, flt0, flt1, width, cpu,
  );

  let xq = decode_xq(xqd, params);
  let pixel_max = (1 << bit_depth) - 1;
  for y in 0..height {
    let row = y * width;
    rust::sgrproj_blend_row(
      &mut dst[y][..width],
      &dgd[y][..width],
      params.is_active(0).then(|| &flt0[row..row + width]),
      params.is_active(1).then(|| &flt1[row..row + width]),
      xq,
      width,
      pixel_max,
    );
  }
}

/// Checks everything [`apply_selfguided_restoration`] asserts.
///
/// # Errors
///
/// Returns the first violated requirement.
pub fn validate_unit<T: Pixel>(
  dgd: &PlaneSlice<'_, T>, width: usize, height: usize, set: u8,
  cfg: &RestorationConfig, scratch: &RestorationScratch,
) -> Result<SgrParams, SgrprojError> {
  cfg.validate_for::<T>()?;
  let params = SgrParams::from_set(set)?;
  params.validate()?;

  if width == 0
    || height == 0
    || width > RESTORATION_UNITPELS_HORZ_MAX
    || height > RESTORATION_UNITPELS_VERT_MAX
  {
    return Err(SgrprojError::InvalidDimensions { width, height });
  }
  if scratch.capacity() < width * height {
    return Err(SgrprojError::BufferTooSmall {
      required: width * height,
      actual: scratch.capacity(),
    });
  }

  let (left, top) = available_border(dgd);
  let (right, bottom) = available_border_after(dgd, width, height);
  let available = left.min(top).min(right).min(bottom);
  let required = SGRPROJ_BORDER_HORZ.max(SGRPROJ_BORDER_VERT);
  if available < required {
    return Err(SgrprojError::InsufficientBorder { required, available });
  }

  Ok(params)
}

/// Checked form of [`apply_selfguided_restoration`].
///
/// # Errors
///
/// Returns an error instead of panicking for any input the kernels can't
/// run; see [`validate_unit`].
pub fn try_apply_selfguided_restoration<T: Pixel>(
  dgd: &PlaneSlice<'_, T>, width: usize, height: usize, set: u8, xqd: [i8; 2],
  cfg: &RestorationConfig, dst: &mut PlaneMutSlice<'_, T>,
  scratch: &mut RestorationScratch,
) -> Result<(), SgrprojError> {
  validate_unit(dgd, width, height, set, cfg, scratch)?;
  apply_selfguided_restoration(
    dgd,
    width,
    height,
    set,
    xqd,
    cfg.bit_depth,
    dst,
    scratch,
    cfg.cpu_feature_level,
  );
  Ok(())
}

#[cfg(test)]
mod test;

// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Encoder side: choosing the parameter set and projection weights that
//! bring a degraded unit closest to its source.

use super::*;
use crate::util::CastFromPrimitive;

/// Outcome of [`search_sgrproj_params`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SgrprojSearchResult {
  pub set: u8,
  pub xqd: [i8; 2],
  /// Squared error of the restored unit against the source.
  pub sse: u64,
}

/// Least-squares projection of `src - dgd` onto the filter residuals
/// `flt - dgd`, in units of `1 << SGRPROJ_PRJ_BITS`.
///
/// Returns `[0, 0]` when the system is ill-posed.
pub fn get_proj_subspace<T: Pixel>(
  src: &PlaneSlice<'_, T>, dgd: &PlaneSlice<'_, T>, width: usize,
  height: usize, flt0: &[i32], flt1: &[i32], flt_stride: usize,
  params: &SgrParams,
) -> [i32; 2] {
  let mut h: [[f64; 2]; 2] = [[0., 0.], [0., 0.]];
  let mut c: [f64; 2] = [0., 0.];

  for y in 0..height {
    let src_row = &src[y][..width];
    let dgd_row = &dgd[y][..width];
    let flt0_row = &flt0[y * flt_stride..];
    let flt1_row = &flt1[y * flt_stride..];
    for x in 0..width {
      let u = i32::cast_from(dgd_row[x]) << SGRPROJ_RST_BITS;
      let s = (i32::cast_from(src_row[x]) << SGRPROJ_RST_BITS) - u;
      let f1 = (if params.is_active(0) { flt0_row[x] - u } else { 0 }) as f64;
      let f2 = (if params.is_active(1) { flt1_row[x] - u } else { 0 }) as f64;
      let s = s as f64;
      h[0][0] += f1 * f1;
      h[1][1] += f2 * f2;
      h[0][1] += f1 * f2;
      c[0] += f1 * s;
      c[1] += f2 * s;
    }
  }

  let n = (width * height) as f64;
  h[0][0] /= n;
  h[0][1] /= n;
  h[1][1] /= n;
  h[1][0] = h[0][1];
  c[0] /= n;
  c[1] /= n;

  let scale = (1 << SGRPROJ_PRJ_BITS) as f64;
  let quantize = |v: f64| (v * scale).round() as i32;

  if !params.is_active(0) {
    // H is the scalar h[1][1], C the scalar c[1]
    if h[1][1] < 1e-8 {
      return [0, 0];
    }
    [0, quantize(c[1] / h[1][1])]
  } else if !params.is_active(1) {
    if h[0][0] < 1e-8 {
      return [0, 0];
    }
    [quantize(c[0] / h[0][0]), 0]
  } else {
    let det = h[0][0] * h[1][1] - h[0][1] * h[1][0];
    if det < 1e-8 {
      return [0, 0];
    }
    let x0 = (h[1][1] * c[0] - h[0][1] * c[1]) / det;
    let x1 = (h[0][0] * c[1] - h[1][0] * c[0]) / det;
    [quantize(x0), quantize(x1)]
  }
}

// Leaves the filter outputs of `set` in `scratch`.
fn solve_into<T: Pixel>(
  set: u8, src: &PlaneSlice<'_, T>, dgd: &PlaneSlice<'_, T>, width: usize,
  height: usize, cfg: &RestorationConfig, scratch: &mut RestorationScratch,
) -> [i8; 2] {
  let params = &SGRPROJ_PARAMS[set as usize];
  let RestorationScratch { flt0, flt1 } = scratch;
  selfguided_restoration(
    dgd,
    width,
    height,
    params,
    cfg.bit_depth,
    flt0,
    flt1,
    width,
    cfg.cpu_feature_level,
  );
  let xq =
    get_proj_subspace(src, dgd, width, height, flt0, flt1, width, params);
  encode_xq(xq, params)
}

/// Finds the projection weights that best map the `set` restoration of
/// `dgd` onto `src`.
///
/// Both slices address the same `width`x`height` unit; `dgd` needs the
/// usual restoration border.
///
/// # Panics
///
/// - If `set` is out of range.
pub fn sgrproj_solve<T: Pixel>(
  set: u8, src: &PlaneSlice<'_, T>, dgd: &PlaneSlice<'_, T>, width: usize,
  height: usize, cfg: &RestorationConfig,
) -> [i8; 2] {
  let mut scratch = RestorationScratch::new(width * height);
  solve_into(set, src, dgd, width, height, cfg, &mut scratch)
}

/// Tries every parameter set on the unit and keeps the one whose restored
/// output has the lowest squared error against `src`. Ties keep the lower
/// set.
///
/// # Errors
///
/// Fails if the unit can't be restored; see [`validate_unit`].
pub fn search_sgrproj_params<T: Pixel>(
  src: &PlaneSlice<'_, T>, dgd: &PlaneSlice<'_, T>, width: usize,
  height: usize, cfg: &RestorationConfig,
) -> Result<SgrprojSearchResult, SgrprojError> {
  let mut scratch = RestorationScratch::new(width * height);
  validate_unit(dgd, width, height, 0, cfg, &scratch)?;

  let pixel_max = cfg.pixel_max();
  let mut restored = vec![T::cast_from(0); width];
  let mut evaluate = |set: u8| {
    let params = &SGRPROJ_PARAMS[set as usize];
    let xqd = solve_into(set, src, dgd, width, height, cfg, &mut scratch);
    let xq = decode_xq(xqd, params);

    let mut sse = 0u64;
    for y in 0..height {
      let row = y * width;
      rust::sgrproj_blend_row(
        &mut restored,
        &dgd[y][..width],
        params.is_active(0).then(|| &scratch.flt0[row..row + width]),
        params.is_active(1).then(|| &scratch.flt1[row..row + width]),
        xq,
        width,
        pixel_max,
      );
      sse += restored
        .iter()
        .zip(&src[y][..width])
        .map(|(&a, &b)| {
          let d = (i32::cast_from(a) - i32::cast_from(b)) as i64;
          (d * d) as u64
        })
        .sum::<u64>();
    }

    log::trace!("set {} xqd {:?} sse {}", set, xqd, sse);
    SgrprojSearchResult { set, xqd, sse }
  };

  let mut best = evaluate(0);
  for set in 1..SGRPROJ_PARAMS.len() as u8 {
    let candidate = evaluate(set);
    if candidate.sse < best.sse {
      best = candidate;
    }
  }

  log::debug!(
    "{}x{} unit: set {} xqd {:?} sse {}",
    width,
    height,
    best.set,
    best.xqd,
    best.sse
  );
  Ok(best)
}

// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use super::integral::test::random_plane;
use super::*;
use crate::frame::{Plane, PlaneOffset};
use crate::util::CastFromPrimitive;
use interpolate_name::interpolate_test;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

/// A plane whose every sample, padding included, is `f(x, y)` in logical
/// coordinates.
pub(crate) fn plane_from_fn<T: Pixel>(
  w: usize, h: usize, f: impl Fn(isize, isize) -> u32,
) -> Plane<T> {
  let mut plane = Plane::new(w, h, 0, 0, 8, 8);
  let (stride, xo, yo) =
    (plane.cfg.stride, plane.cfg.xorigin as isize, plane.cfg.yorigin as isize);
  for (i, v) in plane.data.iter_mut().enumerate() {
    let x = (i % stride) as isize - xo;
    let y = (i / stride) as isize - yo;
    *v = T::cast_from(f(x, y));
  }
  plane
}

fn restore<T: Pixel>(
  plane: &Plane<T>, w: usize, h: usize, set: u8, xqd: [i8; 2],
  bit_depth: usize, cpu: CpuFeatureLevel,
) -> Plane<T> {
  let mut out = Plane::new(w, h, 0, 0, 0, 0);
  let mut scratch = RestorationScratch::new(w * h);
  apply_selfguided_restoration(
    &plane.slice(PlaneOffset::default()),
    w,
    h,
    set,
    xqd,
    bit_depth,
    &mut out.mut_slice(PlaneOffset::default()),
    &mut scratch,
    cpu,
  );
  out
}

fn rows<T: Pixel>(plane: &Plane<T>, w: usize, h: usize) -> Vec<Vec<T>> {
  let s = plane.slice(PlaneOffset::default());
  (0..h).map(|y| s[y][..w].to_vec()).collect()
}

#[test]
fn golden_coefficients_8bit_r2() {
  let plane = plane_from_fn::<u8>(8, 4, |x, y| {
    100 + (x * 3 + y * 5).rem_euclid(4) as u32 * 12
  });
  let dgd = plane.slice(PlaneOffset::default());
  let ii = IntegralImages::build(&dgd, 8, 4);
  assert_eq!(ii.box_sum(0, 0, 2), 2932);
  assert_eq!(ii.box_sum_sq(0, 0, 2), 348496);

  let mut a: BorderedGrid<u32> = BorderedGrid::new(8, 4, 1, 8);
  let mut b: BorderedGrid<u32> = BorderedGrid::new(8, 4, 1, 8);
  // set 9, slot 0: r = 2, s = 25
  calc_ab(&mut a, &mut b, &ii, 2, 25, 8, CpuFeatureLevel::RUST);
  assert_eq!((a.at(0, 0), b.at(0, 0)), (192, 7513));
  assert_eq!((a.at(3, 1), b.at(3, 1)), (192, 7575));
  assert_eq!((a.at(-1, -1), b.at(-1, -1)), (192, 7513));

  // A stronger filter flattens harder.
  calc_ab(&mut a, &mut b, &ii, 2, 140, 8, CpuFeatureLevel::RUST);
  assert_eq!((a.at(0, 0), b.at(0, 0)), (240, 1878));
}

#[test]
fn calc_ab_fast_fills_every_other_row() {
  let mut rng = ChaChaRng::from_seed([3; 32]);
  let (w, h) = (13, 9);
  let plane = random_plane::<u8>(&mut rng, w, h, 8);
  let ii = IntegralImages::build(&plane.slice(PlaneOffset::default()), w, h);
  let mut a: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
  let mut b: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
  a.fill(u32::MAX);
  b.fill(u32::MAX);
  calc_ab_fast(&mut a, &mut b, &ii, 2, 140, 8, CpuFeatureLevel::RUST);

  for y in -1..=h as isize {
    let row = &a.row(y)[..w + 2];
    if y & 1 != 0 {
      assert!(row.iter().all(|&v| (1..=256).contains(&v)), "row {y}");
    } else {
      assert!(row.iter().all(|&v| v == u32::MAX), "row {y}");
    }
  }
}

#[interpolate_test(bd8, 8)]
#[interpolate_test(bd10, 10)]
#[interpolate_test(bd12, 12)]
fn deterministic(bit_depth: usize) {
  let mut rng = ChaChaRng::from_seed([bit_depth as u8; 32]);
  let (w, h) = (24, 17);
  let plane = random_plane::<u16>(&mut rng, w, h, bit_depth);
  for set in 0..16 {
    let cpu = CpuFeatureLevel::RUST;
    let a = restore(&plane, w, h, set, [-32, 31], bit_depth, cpu);
    let b = restore(&plane, w, h, set, [-32, 31], bit_depth, cpu);
    assert_eq!(rows(&a, w, h), rows(&b, w, h));
  }
}

#[test]
fn every_cpu_level_is_bit_exact() {
  let mut rng = ChaChaRng::from_seed([9; 32]);
  let (w, h) = (45, 19);
  let p8 = random_plane::<u8>(&mut rng, w, h, 8);
  let p10 = random_plane::<u16>(&mut rng, w, h, 10);
  for &cpu in CpuFeatureLevel::available().iter() {
    for set in 0..16 {
      let xqd = [-20, 40];
      assert_eq!(
        rows(&restore(&p8, w, h, set, xqd, 8, cpu), w, h),
        rows(&restore(&p8, w, h, set, xqd, 8, CpuFeatureLevel::RUST), w, h),
        "8-bit set {set} on {cpu}"
      );
      assert_eq!(
        rows(&restore(&p10, w, h, set, xqd, 10, cpu), w, h),
        rows(&restore(&p10, w, h, set, xqd, 10, CpuFeatureLevel::RUST), w, h),
        "10-bit set {set} on {cpu}"
      );
    }
  }
}

#[test]
fn output_stays_in_range() {
  let mut rng = ChaChaRng::from_seed([4; 32]);
  let (w, h) = (32, 32);
  for bit_depth in [8, 10, 12] {
    let plane = random_plane::<u16>(&mut rng, w, h, bit_depth);
    let max = (1u16 << bit_depth) - 1;
    for set in 0..16 {
      for xqd in [SGRPROJ_XQD_MIN, SGRPROJ_XQD_MAX, [-96, 95]] {
        let cpu = CpuFeatureLevel::RUST;
        let out = restore(&plane, w, h, set, xqd, bit_depth, cpu);
        assert!(rows(&out, w, h).iter().flatten().all(|&v| v <= max));
      }
    }
  }
}

#[test]
fn uniform_input_is_preserved() {
  let (w, h) = (16, 16);
  let cpu = CpuFeatureLevel::RUST;
  let cases = [(8, [0u32, 1, 77, 128, 255]), (10, [0, 3, 512, 900, 1023])];
  for (bit_depth, values) in cases {
    for v in values {
      let plane = plane_from_fn::<u16>(w, h, |_, _| v);
      for set in 0..16 {
        let out =
          restore(&plane, w, h, set, SGRPROJ_XQD_MID, bit_depth, cpu);
        for px in rows(&out, w, h).into_iter().flatten() {
          // high bit depth statistics are rounded before the variance
          let tolerance = if bit_depth == 8 { 0 } else { 1 };
          let d = (i32::cast_from(px) - v as i32).abs();
          assert!(
            d <= tolerance,
            "{bit_depth}-bit value {v} set {set} gave {px}"
          );
        }
      }
    }
  }
}

#[test]
fn inactive_slot_is_ignored() {
  let mut rng = ChaChaRng::from_seed([5; 32]);
  let (w, h) = (20, 12);
  let plane = random_plane::<u8>(&mut rng, w, h, 8);
  let cpu = CpuFeatureLevel::RUST;

  // set 14 has no r1: xqd[1] is never read
  let base = rows(&restore(&plane, w, h, 14, [-10, 0], 8, cpu), w, h);
  for xqd1 in [-32, 17, 95] {
    let out = restore(&plane, w, h, 14, [-10, xqd1], 8, cpu);
    assert_eq!(base, rows(&out, w, h));
  }
  // set 10 has no r0: xqd[0] is never read
  let base = rows(&restore(&plane, w, h, 10, [0, 40], 8, cpu), w, h);
  for xqd0 in [-96, -5, 31] {
    let out = restore(&plane, w, h, 10, [xqd0, 40], 8, cpu);
    assert_eq!(base, rows(&out, w, h));
  }

  let dgd = plane.slice(PlaneOffset::default());
  let mut flt0 = vec![i32::MIN; w * h];
  let mut flt1 = vec![i32::MIN; w * h];
  let params = &SGRPROJ_PARAMS[14];
  selfguided_restoration(&dgd, w, h, params, 8, &mut flt0, &mut flt1, w, cpu);
  assert!(flt1.iter().all(|&v| v == i32::MIN));
  assert!(flt0.iter().all(|&v| v != i32::MIN));

  let mut flt0 = vec![i32::MIN; w * h];
  let mut flt1 = vec![i32::MIN; w * h];
  let params = &SGRPROJ_PARAMS[10];
  selfguided_restoration(&dgd, w, h, params, 8, &mut flt0, &mut flt1, w, cpu);
  assert!(flt0.iter().all(|&v| v == i32::MIN));
  assert!(flt1.iter().all(|&v| v != i32::MIN));
}

#[test]
fn high_bit_depth_coefficients_track_8bit() {
  let (w, h) = (17, 11);
  // Stride and origin differ between u8 and u16 planes, so both are built
  // from the same function of the logical position.
  let noise = |x: isize, y: isize| {
    let k = (x as u32).wrapping_mul(0x9e37_79b9)
      ^ (y as u32).wrapping_mul(0x85eb_ca6b);
    k.wrapping_mul(0xc2b2_ae35) >> 24
  };
  let p8 = plane_from_fn::<u8>(w, h, noise);
  let p10 = plane_from_fn::<u16>(w, h, |x, y| noise(x, y) << 2);
  let ii8 = IntegralImages::build(&p8.slice(PlaneOffset::default()), w, h);
  let ii10 = IntegralImages::build(&p10.slice(PlaneOffset::default()), w, h);

  for params in &SGRPROJ_PARAMS[..10] {
    for pass in 0..2 {
      let (r, s) = (params.r[pass], params.s[pass]);
      let mut a8: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
      let mut b8: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
      let mut a10: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
      let mut b10: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
      calc_ab(&mut a8, &mut b8, &ii8, r, s, 8, CpuFeatureLevel::RUST);
      calc_ab(&mut a10, &mut b10, &ii10, r, s, 10, CpuFeatureLevel::RUST);
      for y in -1..=h as isize {
        for x in -1..=w as isize {
          assert_eq!(a8.at(x, y), a10.at(x, y), "A at ({x}, {y}) r={r}");
          let (b8, b10) = (b8.at(x, y) as i64, b10.at(x, y) as i64);
          assert!((b10 - 4 * b8).abs() <= 4, "b at ({x}, {y}) r={r}");
        }
      }
    }
  }
}

#[test]
fn radius_must_fit_the_border() {
  let params = SgrParams { r: [3, 1], s: [100, 100] };
  assert_eq!(
    params.validate(),
    Err(SgrprojError::RadiusExceedsBorder { radius: 3, border: 3 })
  );
  assert_eq!(
    SgrParams { r: [0, 0], s: [0, 0] }.validate(),
    Err(SgrprojError::BothRadiiZero)
  );
  for params in &SGRPROJ_PARAMS {
    assert_eq!(params.validate(), Ok(()));
  }
}

#[test]
#[should_panic]
fn radius_equal_to_border_panics() {
  let plane = plane_from_fn::<u8>(8, 8, |x, y| (x + y).unsigned_abs() as u32);
  let params = SgrParams { r: [3, 1], s: [100, 100] };
  let mut flt0 = vec![0; 64];
  let mut flt1 = vec![0; 64];
  selfguided_restoration(
    &plane.slice(PlaneOffset::default()),
    8,
    8,
    &params,
    8,
    &mut flt0,
    &mut flt1,
    8,
    CpuFeatureLevel::RUST,
  );
}

#[test]
fn xq_coding() {
  for (set, params) in SGRPROJ_PARAMS.iter().enumerate() {
    for xqd0 in SGRPROJ_XQD_MIN[0]..=SGRPROJ_XQD_MAX[0] {
      for xqd1 in [SGRPROJ_XQD_MIN[1], 0, SGRPROJ_XQD_MAX[1]] {
        let xq = decode_xq([xqd0, xqd1], params);
        let enc = encode_xq(xq, params);
        match (params.is_active(0), params.is_active(1)) {
          (true, true) => assert_eq!(enc, [xqd0, xqd1], "set {set}"),
          (false, true) => assert_eq!(enc, [0, xqd1], "set {set}"),
          (true, false) => assert_eq!(enc[0], xqd0, "set {set}"),
          (false, false) => unreachable!(),
        }
      }
    }
  }
  assert_eq!(decode_xq([-32, 31], &SGRPROJ_PARAMS[0]), [-32, 129]);
  assert_eq!(decode_xq([-32, 31], &SGRPROJ_PARAMS[10]), [0, 97]);
  assert_eq!(decode_xq([-32, 31], &SGRPROJ_PARAMS[14]), [-32, 0]);
  // out of range weights are clamped
  assert_eq!(encode_xq([-500, 500], &SGRPROJ_PARAMS[0]), [-96, -32]);
}

#[test]
fn checked_entry_point() {
  let mut rng = ChaChaRng::from_seed([7; 32]);
  let (w, h) = (16, 8);
  let plane = random_plane::<u8>(&mut rng, w, h, 8);
  let dgd = plane.slice(PlaneOffset::default());
  let cfg = RestorationConfig::new(8);
  let mut scratch = RestorationScratch::new(w * h);

  let mut out: Plane<u8> = Plane::new(w, h, 0, 0, 0, 0);
  try_apply_selfguided_restoration(
    &dgd,
    w,
    h,
    3,
    [-10, 20],
    &cfg,
    &mut out.mut_slice(PlaneOffset::default()),
    &mut scratch,
  )
  .unwrap();
  let expected = restore(&plane, w, h, 3, [-10, 20], 8, cfg.cpu_feature_level);
  assert_eq!(rows(&out, w, h), rows(&expected, w, h));

  assert_eq!(
    try_unit(&dgd, w, h, 16, &cfg, &mut scratch),
    Err(SgrprojError::InvalidParamSet(16))
  );
  assert_eq!(
    try_unit(&dgd, 0, h, 0, &cfg, &mut scratch),
    Err(SgrprojError::InvalidDimensions { width: 0, height: h })
  );
  assert_eq!(
    try_unit(&dgd, w, h, 0, &RestorationConfig::new(10), &mut scratch),
    Err(SgrprojError::InvalidConfig(InvalidConfig::PixelTypeMismatch {
      bit_depth: 10,
      pixel_bits: 8
    }))
  );
  assert_eq!(
    try_unit(&dgd, w, h, 0, &cfg, &mut RestorationScratch::new(w)),
    Err(SgrprojError::BufferTooSmall { required: w * h, actual: w })
  );

  let unpadded: Plane<u8> = Plane::new(w, h, 0, 0, 0, 0);
  let dgd = unpadded.slice(PlaneOffset::default());
  assert_eq!(
    try_unit(&dgd, w, h, 0, &cfg, &mut scratch),
    Err(SgrprojError::InsufficientBorder { required: 3, available: 0 })
  );
}

fn try_unit(
  dgd: &PlaneSlice<'_, u8>, w: usize, h: usize, set: u8,
  cfg: &RestorationConfig, scratch: &mut RestorationScratch,
) -> Result<(), SgrprojError> {
  let mut out: Plane<u8> = Plane::new(w.max(1), h.max(1), 0, 0, 0, 0);
  let mut dst = out.mut_slice(PlaneOffset::default());
  let xqd = [0, 0];
  try_apply_selfguided_restoration(dgd, w, h, set, xqd, cfg, &mut dst, scratch)
}

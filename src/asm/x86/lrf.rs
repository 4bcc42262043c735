// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use crate::cpu_features::CpuFeatureLevel;
use crate::lrf::grid::BorderedGrid;
use crate::lrf::integral::IntegralImages;
use crate::lrf::tables::{ONE_BY_X, X_BY_XPLUS1};
use crate::lrf::*;
use crate::util::Pixel;
use std::arch::x86_64::*;
use std::mem;

// computes an (A, b) row for columns -1..=w at row y
#[inline]
pub fn sgrproj_box_ab_row(
  a_row: &mut [u32], b_row: &mut [u32], ii: &IntegralImages, y: isize,
  r: usize, s: u32, bit_depth: usize, cpu: CpuFeatureLevel,
) {
  if cpu >= CpuFeatureLevel::AVX2 {
    // SAFETY: a level of at least AVX2 means the CPU supports it. Every
    // 8-lane load and store goes through a bounds-checked subslice.
    return unsafe {
      sgrproj_box_ab_row_avx2(a_row, b_row, ii, y, r, s, bit_depth);
    };
  }

  rust::sgrproj_box_ab_row(a_row, b_row, ii, y, r, s, bit_depth, cpu);
}

#[inline]
pub fn sgrproj_box_f_row<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, w: usize, cpu: CpuFeatureLevel,
) {
  if cpu >= CpuFeatureLevel::AVX2 {
    // SAFETY: a level of at least AVX2 means the CPU supports it. Every
    // 8-lane load and store goes through a bounds-checked subslice.
    return unsafe {
      sgrproj_box_f_row_avx2(flt, a, b, dgd, y, w);
    };
  }

  rust::sgrproj_box_f_row(flt, a, b, dgd, y, w, cpu);
}

#[inline]
pub fn sgrproj_box_f_fast_row<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, w: usize, cpu: CpuFeatureLevel,
) {
  if cpu >= CpuFeatureLevel::AVX2 {
    // SAFETY: a level of at least AVX2 means the CPU supports it. Every
    // 8-lane load and store goes through a bounds-checked subslice.
    return unsafe {
      sgrproj_box_f_fast_row_avx2(flt, a, b, dgd, y, w);
    };
  }

  rust::sgrproj_box_f_fast_row(flt, a, b, dgd, y, w, cpu);
}

#[inline(always)]
unsafe fn loadu(p: &[u32]) -> __m256i {
  _mm256_loadu_si256(p[..8].as_ptr() as *const _)
}

// Using an integral image, compute the sums of 8 horizontally adjacent
// (2r+1)x(2r+1) boxes
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn box_sum_8_avx2(
  ii: &BorderedGrid<u32>, x: isize, y: isize, r: usize,
) -> __m256i {
  let r = r as isize;
  let top = ii.row_from(x - r, y - r);
  let bottom = ii.row_from(x - r, y + r + 1);
  let d = (2 * r + 1) as usize;
  // Cancel out overflow in the integral image by using wrapping arithmetic
  _mm256_add_epi32(
    _mm256_sub_epi32(loadu(&bottom[d..]), loadu(bottom)),
    _mm256_sub_epi32(loadu(top), loadu(&top[d..])),
  )
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn sgrproj_box_ab_8_avx2(
  a_row: &mut [u32], b_row: &mut [u32], ii: &IntegralImages, x: isize,
  y: isize, r: usize, s: u32, bit_depth: usize,
) {
  let d = 2 * r + 1;
  let n = (d * d) as i32;
  let one_over_n = ONE_BY_X[d * d - 1] as i32;

  let sum = box_sum_8_avx2(&ii.sum, x, y, r);
  let ssq = box_sum_8_avx2(&ii.sum_sq, x, y, r);
  let p = if bit_depth == 8 {
    _mm256_sub_epi32(
      _mm256_mullo_epi32(ssq, _mm256_set1_epi32(n)),
      _mm256_mullo_epi32(sum, sum),
    )
  } else {
    let bdm8 = (bit_depth - 8) as i32;
    let scaled_ssq = _mm256_srlv_epi32(
      _mm256_add_epi32(ssq, _mm256_set1_epi32(1 << (2 * bdm8) >> 1)),
      _mm256_set1_epi32(2 * bdm8),
    );
    let scaled_sum = _mm256_srlv_epi32(
      _mm256_add_epi32(sum, _mm256_set1_epi32(1 << bdm8 >> 1)),
      _mm256_set1_epi32(bdm8),
    );
    let b2 = _mm256_mullo_epi32(scaled_sum, scaled_sum);
    _mm256_sub_epi32(
      _mm256_max_epu32(
        _mm256_mullo_epi32(scaled_ssq, _mm256_set1_epi32(n)),
        b2,
      ),
      b2,
    )
  };
  let z = _mm256_min_epu32(
    _mm256_srli_epi32(
      _mm256_add_epi32(
        _mm256_mullo_epi32(p, _mm256_set1_epi32(s as i32)),
        _mm256_set1_epi32(1 << SGRPROJ_MTABLE_BITS >> 1),
      ),
      SGRPROJ_MTABLE_BITS as i32,
    ),
    _mm256_set1_epi32(255),
  );
  // z <= 255 keeps the gather inside the table.
  let a = _mm256_i32gather_epi32(X_BY_XPLUS1.as_ptr() as *const i32, z, 4);
  // (SGR - A) * (1/n) is small, so it is formed before scaling the sum
  let b = _mm256_mullo_epi32(
    _mm256_mullo_epi32(
      _mm256_sub_epi32(_mm256_set1_epi32(SGRPROJ_SGR as i32), a),
      _mm256_set1_epi32(one_over_n),
    ),
    sum,
  );
  let b = _mm256_srli_epi32(
    _mm256_add_epi32(b, _mm256_set1_epi32(1 << SGRPROJ_RECIP_BITS >> 1)),
    SGRPROJ_RECIP_BITS as i32,
  );
  let i = (x + 1) as usize;
  _mm256_storeu_si256(a_row[i..i + 8].as_mut_ptr() as *mut _, a);
  _mm256_storeu_si256(b_row[i..i + 8].as_mut_ptr() as *mut _, b);
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn sgrproj_box_ab_row_avx2(
  a_row: &mut [u32], b_row: &mut [u32], ii: &IntegralImages, y: isize,
  r: usize, s: u32, bit_depth: usize,
) {
  let w = ii.width() as isize;
  for x in (-1..=w).step_by(8) {
    if x + 8 <= w + 1 {
      sgrproj_box_ab_8_avx2(a_row, b_row, ii, x, y, r, s, bit_depth);
    } else {
      // finish using scalar
      rust::sgrproj_box_ab_internal(a_row, b_row, ii, y, x, r, s, bit_depth);
      break;
    }
  }

  #[cfg(feature = "check_asm")]
  {
    let cols = ii.width() + 2;
    let mut a_ref: Vec<u32> = vec![0; cols];
    let mut b_ref: Vec<u32> = vec![0; cols];
    rust::sgrproj_box_ab_internal(
      &mut a_ref, &mut b_ref, ii, y, -1, r, s, bit_depth,
    );
    assert_eq!(&a_row[..cols], &a_ref[..]);
    assert_eq!(&b_row[..cols], &b_ref[..]);
  }
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load_px_8<T: Pixel>(dgd: &[T], x: usize) -> __m256i {
  if mem::size_of::<T>() == 1 {
    _mm256_cvtepu8_epi32(_mm_loadl_epi64(dgd[x..x + 8].as_ptr() as *const _))
  } else {
    _mm256_cvtepu16_epi32(_mm_loadu_si128(dgd[x..x + 8].as_ptr() as *const _))
  }
}

// Weighted 3x3 sum of 8 adjacent positions: corners weigh 3, the rest 4.
//   4 * fours + 3 * threes = ((fours + threes) << 2) - threes
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn cross_sum_8_avx2(
  g: &BorderedGrid<u32>, x: isize, y: isize,
) -> __m256i {
  let t = g.row_from(x - 1, y - 1);
  let m = g.row_from(x - 1, y);
  let bt = g.row_from(x - 1, y + 1);
  let fours = _mm256_add_epi32(
    _mm256_add_epi32(loadu(m), loadu(&m[1..])),
    _mm256_add_epi32(
      _mm256_add_epi32(loadu(&m[2..]), loadu(&t[1..])),
      loadu(&bt[1..]),
    ),
  );
  let threes = _mm256_add_epi32(
    _mm256_add_epi32(loadu(t), loadu(&t[2..])),
    _mm256_add_epi32(loadu(bt), loadu(&bt[2..])),
  );
  _mm256_sub_epi32(
    _mm256_slli_epi32(_mm256_add_epi32(fours, threes), 2),
    threes,
  )
}

// Even rows: verticals weigh 6, diagonals 5.
//   6 * sixes + 5 * fives = ((sixes + fives) << 2) + (sixes << 1) + fives
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn cross_sum_fast_even_8_avx2(
  g: &BorderedGrid<u32>, x: isize, y: isize,
) -> __m256i {
  let t = g.row_from(x - 1, y - 1);
  let bt = g.row_from(x - 1, y + 1);
  let sixes = _mm256_add_epi32(loadu(&t[1..]), loadu(&bt[1..]));
  let fives = _mm256_add_epi32(
    _mm256_add_epi32(loadu(t), loadu(&t[2..])),
    _mm256_add_epi32(loadu(bt), loadu(&bt[2..])),
  );
  six_five_8_avx2(sixes, fives)
}

// Odd rows: horizontal 5-6-5 triple.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn cross_sum_fast_odd_8_avx2(
  g: &BorderedGrid<u32>, x: isize, y: isize,
) -> __m256i {
  let m = g.row_from(x - 1, y);
  let sixes = loadu(&m[1..]);
  let fives = _mm256_add_epi32(loadu(m), loadu(&m[2..]));
  six_five_8_avx2(sixes, fives)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn six_five_8_avx2(sixes: __m256i, fives: __m256i) -> __m256i {
  _mm256_add_epi32(
    _mm256_slli_epi32(_mm256_add_epi32(sixes, fives), 2),
    _mm256_add_epi32(_mm256_slli_epi32(sixes, 1), fives),
  )
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn filter_8_avx2<const SHIFT: i32>(
  a: __m256i, b: __m256i, src: __m256i,
) -> __m256i {
  let v = _mm256_add_epi32(_mm256_mullo_epi32(a, src), b);
  _mm256_srai_epi32::<SHIFT>(_mm256_add_epi32(
    v,
    _mm256_set1_epi32(1 << SHIFT >> 1),
  ))
}

const SHIFT_FULL: i32 = (SGRPROJ_SGR_BITS + 5 - SGRPROJ_RST_BITS) as i32;
const SHIFT_ODD: i32 = (SGRPROJ_SGR_BITS + 4 - SGRPROJ_RST_BITS) as i32;

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn sgrproj_box_f_row_avx2<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, w: usize,
) {
  for x in (0..w).step_by(8) {
    if x + 8 <= w {
      let xi = x as isize;
      let v = filter_8_avx2::<SHIFT_FULL>(
        cross_sum_8_avx2(a, xi, y),
        cross_sum_8_avx2(b, xi, y),
        load_px_8(dgd, x),
      );
      _mm256_storeu_si256(flt[x..x + 8].as_mut_ptr() as *mut _, v);
    } else {
      // finish using scalar
      rust::sgrproj_box_f_internal(flt, a, b, dgd, y, x, w);
      break;
    }
  }

  #[cfg(feature = "check_asm")]
  {
    let mut flt_ref: Vec<i32> = vec![0; w];
    rust::sgrproj_box_f_internal(&mut flt_ref, a, b, dgd, y, 0, w);
    assert_eq!(&flt[..w], &flt_ref[..]);
  }
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn sgrproj_box_f_fast_row_avx2<T: Pixel>(
  flt: &mut [i32], a: &BorderedGrid<u32>, b: &BorderedGrid<u32>, dgd: &[T],
  y: isize, w: usize,
) {
  let even = y & 1 == 0;
  for x in (0..w).step_by(8) {
    if x + 8 <= w {
      let xi = x as isize;
      let src = load_px_8(dgd, x);
      let v = if even {
        filter_8_avx2::<SHIFT_FULL>(
          cross_sum_fast_even_8_avx2(a, xi, y),
          cross_sum_fast_even_8_avx2(b, xi, y),
          src,
        )
      } else {
        filter_8_avx2::<SHIFT_ODD>(
          cross_sum_fast_odd_8_avx2(a, xi, y),
          cross_sum_fast_odd_8_avx2(b, xi, y),
          src,
        )
      };
      _mm256_storeu_si256(flt[x..x + 8].as_mut_ptr() as *mut _, v);
    } else {
      // finish using scalar
      rust::sgrproj_box_f_fast_internal(flt, a, b, dgd, y, x, w);
      break;
    }
  }

  #[cfg(feature = "check_asm")]
  {
    let mut flt_ref: Vec<i32> = vec![0; w];
    rust::sgrproj_box_f_fast_internal(&mut flt_ref, a, b, dgd, y, 0, w);
    assert_eq!(&flt[..w], &flt_ref[..]);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::frame::PlaneOffset;
  use crate::lrf::integral::test::random_plane;
  use rand::SeedableRng;
  use rand_chacha::ChaChaRng;

  fn avx2_matches_rust<T: Pixel>(bit_depth: usize, w: usize, h: usize) {
    let cpu = CpuFeatureLevel::default();
    if cpu < CpuFeatureLevel::AVX2 {
      return;
    }
    let mut rng = ChaChaRng::from_seed([w as u8; 32]);
    let plane = random_plane::<T>(&mut rng, w, h, bit_depth);
    let dgd = plane.slice(PlaneOffset::default());
    let ii = IntegralImages::build(&dgd, w, h);

    for set in 0..SGRPROJ_PARAMS.len() {
      let params = SGRPROJ_PARAMS[set];
      for pass in 0..2 {
        if !params.is_active(pass) {
          continue;
        }
        let (r, s) = (params.r[pass], params.s[pass]);
        let mut a_simd: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
        let mut b_simd: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
        let mut a_ref: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
        let mut b_ref: BorderedGrid<u32> = BorderedGrid::new(w, h, 1, 8);
        for y in -1..=h as isize {
          sgrproj_box_ab_row(
            a_simd.row_from_mut(-1, y),
            b_simd.row_from_mut(-1, y),
            &ii,
            y,
            r,
            s,
            bit_depth,
            cpu,
          );
          rust::sgrproj_box_ab_row(
            a_ref.row_from_mut(-1, y),
            b_ref.row_from_mut(-1, y),
            &ii,
            y,
            r,
            s,
            bit_depth,
            CpuFeatureLevel::RUST,
          );
          assert_eq!(
            &a_simd.row(y)[..w + 2],
            &a_ref.row(y)[..w + 2],
            "A set {set} row {y}"
          );
          assert_eq!(
            &b_simd.row(y)[..w + 2],
            &b_ref.row(y)[..w + 2],
            "b set {set} row {y}"
          );
        }

        let mut flt_simd = vec![0i32; w];
        let mut flt_ref = vec![0i32; w];
        for y in 0..h {
          let yi = y as isize;
          sgrproj_box_f_row(
            &mut flt_simd, &a_ref, &b_ref, &dgd[y], yi, w, cpu,
          );
          rust::sgrproj_box_f_row(
            &mut flt_ref,
            &a_ref,
            &b_ref,
            &dgd[y],
            yi,
            w,
            CpuFeatureLevel::RUST,
          );
          assert_eq!(flt_simd, flt_ref, "full set {set} row {y}");

          sgrproj_box_f_fast_row(
            &mut flt_simd, &a_ref, &b_ref, &dgd[y], yi, w, cpu,
          );
          rust::sgrproj_box_f_fast_row(
            &mut flt_ref,
            &a_ref,
            &b_ref,
            &dgd[y],
            yi,
            w,
            CpuFeatureLevel::RUST,
          );
          assert_eq!(flt_simd, flt_ref, "fast set {set} row {y}");
        }
      }
    }
  }

  #[test]
  fn avx2_matches_rust_8bit() {
    avx2_matches_rust::<u8>(8, 64, 64);
    avx2_matches_rust::<u8>(8, 37, 11);
  }

  #[test]
  fn avx2_matches_rust_10bit() {
    avx2_matches_rust::<u16>(10, 64, 64);
    avx2_matches_rust::<u16>(10, 29, 7);
  }

  #[test]
  fn avx2_matches_rust_12bit() {
    avx2_matches_rust::<u16>(12, 64, 64);
    avx2_matches_rust::<u16>(12, 5, 3);
  }
}

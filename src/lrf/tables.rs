// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

/// `round(2^SGRPROJ_RECIP_BITS / n)`, indexed by `n - 1` for windows of up
/// to 5x5 pixels.
pub static ONE_BY_X: [u32; 25] = [
  4096, 2048, 1365, 1024, 819, 683, 585, 512, 455, 410, 372, 341, 315,
  293, 273, 256, 241, 228, 216, 205, 195, 186, 178, 171, 164,
];

/// `round(2^SGRPROJ_SGR_BITS * z / (z + 1))`, indexed by the clamped noise
/// ratio `z`.
pub static X_BY_XPLUS1: [u32; 256] = [
  // Map 0 -> 1 (a slope of 1/256) instead of 0 so that the filter never
  // fully discards the source pixel, and 255 -> 256 so that it can.
  1, 128, 171, 192, 205, 213, 219, 224, 228, 230, 233, 235, 236, 238, 239,
  240, 241, 242, 243, 243, 244, 244, 245, 245, 246, 246, 247, 247, 247, 247,
  248, 248, 248, 248, 249, 249, 249, 249, 249, 250, 250, 250, 250, 250, 250,
  250, 251, 251, 251, 251, 251, 251, 251, 251, 251, 251, 252, 252, 252, 252,
  252, 252, 252, 252, 252, 252, 252, 252, 252, 252, 252, 252, 252, 253, 253,
  253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253,
  253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 253, 254, 254, 254,
  254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254,
  254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254,
  254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254,
  254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254, 254,
  254, 254, 254, 254, 254, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
  255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
  255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
  255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
  255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
  255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
  256,
];

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn one_by_x_matches_rounded_reciprocal() {
    for (i, &v) in ONE_BY_X.iter().enumerate() {
      let n = i as u32 + 1;
      assert_eq!(v, (4096 + n / 2) / n, "n = {n}");
    }
  }

  #[test]
  fn x_by_xplus1_matches_rounded_ratio() {
    assert_eq!(X_BY_XPLUS1[0], 1);
    assert_eq!(X_BY_XPLUS1[255], 256);
    for z in 1..255u32 {
      assert_eq!(X_BY_XPLUS1[z as usize], ((z << 8) + z / 2) / (z + 1));
    }
    assert!(X_BY_XPLUS1.windows(2).all(|w| w[0] <= w[1]));
  }
}

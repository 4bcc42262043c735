// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

mod align;

pub use self::align::*;
pub use v_frame::math::{clamp, Fixed};
pub use v_frame::pixel::*;

/// Round-half-up rounding term for a right shift by `shift` bits.
#[inline(always)]
pub const fn round_for_shift(shift: usize) -> u32 {
  (1 << shift) >> 1
}

/// Unsigned right shift with round-half-up. The rounding term wraps like
/// the rest of the restoration arithmetic.
#[inline(always)]
pub const fn round_power_of_two(value: u32, shift: usize) -> u32 {
  value.wrapping_add(round_for_shift(shift)) >> shift
}

/// Arithmetic right shift with round-half-up.
#[inline(always)]
pub const fn round_shift_signed(value: i32, shift: usize) -> i32 {
  value.wrapping_add(round_for_shift(shift) as i32) >> shift
}

// Copyright (c) 2020-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use thiserror::Error;

use crate::cpu_features::CpuFeatureLevel;
use crate::util::Pixel;

/// Enumeration of possible invalid configuration errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum InvalidConfig {
  /// The bit depth is not one of 8, 10 or 12.
  #[error("invalid bit depth {0} (expected 8, 10 or 12)")]
  InvalidBitDepth(usize),
  /// The pixel type cannot hold samples of the configured bit depth.
  #[error("{pixel_bits}-bit pixel type cannot hold {bit_depth}-bit samples")]
  PixelTypeMismatch {
    /// The configured bit depth.
    bit_depth: usize,
    /// The width of the pixel type.
    pixel_bits: usize,
  },
}

/// Settings shared by every restoration call on a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
  feature = "serialize",
  derive(serde::Serialize, serde::Deserialize)
)]
pub struct RestorationConfig {
  /// Sample bit depth: 8, 10 or 12.
  pub bit_depth: usize,
  /// Highest instruction set the kernels may use.
  #[cfg_attr(feature = "serialize", serde(skip, default))]
  pub cpu_feature_level: CpuFeatureLevel,
}

impl Default for RestorationConfig {
  fn default() -> Self {
    RestorationConfig {
      bit_depth: 8,
      cpu_feature_level: CpuFeatureLevel::default(),
    }
  }
}

impl RestorationConfig {
  pub fn new(bit_depth: usize) -> Self {
    RestorationConfig { bit_depth, ..Default::default() }
  }

  /// Forces the kernels down to `cpu`.
  pub const fn with_cpu_feature_level(self, cpu: CpuFeatureLevel) -> Self {
    RestorationConfig { cpu_feature_level: cpu, ..self }
  }

  /// Largest sample value at this bit depth.
  #[inline]
  pub const fn pixel_max(&self) -> i32 {
    (1 << self.bit_depth) - 1
  }

  /// Validates the configuration.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidBitDepth` if the bit depth is not 8, 10 or 12.
  pub fn validate(&self) -> Result<(), InvalidConfig> {
    use InvalidConfig::*;

    if !matches!(self.bit_depth, 8 | 10 | 12) {
      return Err(InvalidBitDepth(self.bit_depth));
    }

    Ok(())
  }

  /// Validates the configuration for samples stored as `T`.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidBitDepth` if the bit depth is not 8, 10 or 12.
  /// - Returns `PixelTypeMismatch` if `T` is narrower than the bit depth.
  pub fn validate_for<T: Pixel>(&self) -> Result<(), InvalidConfig> {
    self.validate()?;

    let pixel_bits = 8 * std::mem::size_of::<T>();
    if pixel_bits < self.bit_depth {
      return Err(InvalidConfig::PixelTypeMismatch {
        bit_depth: self.bit_depth,
        pixel_bits,
      });
    }

    Ok(())
  }
}

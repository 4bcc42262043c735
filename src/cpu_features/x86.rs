// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use arg_enum_proc_macro::ArgEnum;
use std::env;
use std::str::FromStr;

use super::CPU_TARGET_ENV;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, ArgEnum)]
#[cfg_attr(
  feature = "serialize",
  derive(serde::Serialize, serde::Deserialize)
)]
pub enum CpuFeatureLevel {
  RUST,
  AVX2,
}

impl CpuFeatureLevel {
  pub const fn all() -> &'static [Self] {
    use CpuFeatureLevel::*;
    &[RUST, AVX2]
  }

  /// Levels that can run on the current machine.
  pub fn available() -> Vec<Self> {
    let detected = Self::detected();
    Self::all().iter().copied().filter(|&cpu| cpu <= detected).collect()
  }

  fn detected() -> CpuFeatureLevel {
    if is_x86_feature_detected!("avx2") {
      CpuFeatureLevel::AVX2
    } else {
      CpuFeatureLevel::RUST
    }
  }
}

impl Default for CpuFeatureLevel {
  fn default() -> CpuFeatureLevel {
    let detected = Self::detected();
    let manual: CpuFeatureLevel = match env::var(CPU_TARGET_ENV) {
      Ok(feature) => CpuFeatureLevel::from_str(&feature).unwrap_or_else(|_| {
        log::warn!(
          "{}={} is not a known feature level, using {}",
          CPU_TARGET_ENV,
          feature,
          detected
        );
        detected
      }),
      Err(_e) => detected,
    };
    if manual > detected {
      log::warn!(
        "{}={} is not supported by this CPU, using {}",
        CPU_TARGET_ENV,
        manual,
        detected
      );
      detected
    } else {
      manual
    }
  }
}

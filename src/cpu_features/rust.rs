// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use arg_enum_proc_macro::ArgEnum;

/// Only the portable kernels exist on this architecture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, ArgEnum, Default)]
#[cfg_attr(
  feature = "serialize",
  derive(serde::Serialize, serde::Deserialize)
)]
pub enum CpuFeatureLevel {
  #[default]
  RUST,
}

impl CpuFeatureLevel {
  pub const fn all() -> &'static [Self] {
    use CpuFeatureLevel::*;
    &[RUST]
  }

  /// Levels that can run on the current machine.
  pub fn available() -> Vec<Self> {
    Self::all().to_vec()
  }
}

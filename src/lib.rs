// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The AV1 self-guided restoration filter.
//!
//! Given a decoded processing unit with a few pixels of border, the filter
//! runs up to two box filters of different radius over it and blends their
//! outputs with the decoded pixels using per-unit projection weights. The
//! [`lrf`] module holds the kernels, the encoder-side weight solver and a
//! plane driver that restores whole planes in parallel.
//!
//! ```
//! use sgrproj::frame::{Plane, PlaneOffset};
//! use sgrproj::lrf::{try_apply_selfguided_restoration, RestorationScratch};
//! use sgrproj::RestorationConfig;
//!
//! let mut dgd: Plane<u8> = Plane::new(32, 32, 0, 0, 8, 8);
//! dgd.pad(32, 32);
//! let mut out: Plane<u8> = Plane::new(32, 32, 0, 0, 0, 0);
//! let mut scratch = RestorationScratch::default();
//!
//! try_apply_selfguided_restoration(
//!   &dgd.slice(PlaneOffset::default()),
//!   32,
//!   32,
//!   0,
//!   [-32, 31],
//!   &RestorationConfig::new(8),
//!   &mut out.mut_slice(PlaneOffset::default()),
//!   &mut scratch,
//! )
//! .unwrap();
//! ```

#![deny(bare_trait_objects)]
#![deny(missing_debug_implementations)]

#[cfg(target_arch = "x86_64")]
mod asm;

mod config;
pub mod cpu_features;
pub mod frame;
pub mod lrf;
pub mod util;

pub use crate::config::{InvalidConfig, RestorationConfig};
pub use crate::cpu_features::CpuFeatureLevel;
pub use crate::lrf::SgrprojError;

// Copyright (c) 2017-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::ops::{Index, IndexMut};

use rayon::prelude::*;

use super::*;
use crate::frame::{AsRegion, Plane, PlaneOffset, Rect};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
  feature = "serialize",
  derive(serde::Serialize, serde::Deserialize)
)]
pub enum RestorationFilter {
  #[default]
  None,
  Sgrproj {
    set: u8,
    xqd: [i8; 2],
  },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
  feature = "serialize",
  derive(serde::Serialize, serde::Deserialize)
)]
pub struct RestorationUnit {
  pub filter: RestorationFilter,
}

#[derive(Clone, Debug)]
pub struct FrameRestorationUnits {
  units: Box<[RestorationUnit]>,
  pub cols: usize,
  pub rows: usize,
}

impl FrameRestorationUnits {
  pub fn new(cols: usize, rows: usize) -> Self {
    Self {
      units: vec![RestorationUnit::default(); cols * rows].into_boxed_slice(),
      cols,
      rows,
    }
  }
}

impl Index<usize> for FrameRestorationUnits {
  type Output = [RestorationUnit];
  #[inline(always)]
  fn index(&self, index: usize) -> &Self::Output {
    &self.units[index * self.cols..(index + 1) * self.cols]
  }
}

impl IndexMut<usize> for FrameRestorationUnits {
  #[inline(always)]
  fn index_mut(&mut self, index: usize) -> &mut Self::Output {
    &mut self.units[index * self.cols..(index + 1) * self.cols]
  }
}

#[derive(Clone, Debug)]
pub struct RestorationPlaneConfig {
  pub unit_size: usize,
  pub cols: usize,
  pub rows: usize,
}

#[derive(Clone, Debug)]
pub struct RestorationPlane {
  pub cfg: RestorationPlaneConfig,
  pub units: FrameRestorationUnits,
}

// One piece of work handed to the thread pool.
#[derive(Clone, Copy, Debug)]
struct ProcessingUnit {
  rect: Rect,
  set: u8,
  xqd: [i8; 2],
}

impl RestorationPlane {
  pub fn new(unit_size: usize, cols: usize, rows: usize) -> RestorationPlane {
    RestorationPlane {
      cfg: RestorationPlaneConfig { unit_size, cols, rows },
      units: FrameRestorationUnits::new(cols, rows),
    }
  }

  /// Lays out units of `unit_size` over a `width`x`height` plane. Units on
  /// the right and bottom edge absorb any remainder of less than half a
  /// unit.
  pub fn for_plane_size(
    width: usize, height: usize, unit_size: usize,
  ) -> RestorationPlane {
    let cols = ((width + (unit_size >> 1)) / unit_size).max(1);
    let rows = ((height + (unit_size >> 1)) / unit_size).max(1);
    Self::new(unit_size, cols, rows)
  }

  /// Area covered by unit `(col, row)` of a `width`x`height` plane. The last
  /// column and row are stretched to the plane edge.
  pub fn unit_rect(
    &self, col: usize, row: usize, width: usize, height: usize,
  ) -> Rect {
    let size = self.cfg.unit_size;
    let x = col * size;
    let y = row * size;
    debug_assert!(x < width && y < height);
    Rect {
      x,
      y,
      width: if col == self.cfg.cols - 1 { width - x } else { size },
      height: if row == self.cfg.rows - 1 { height - y } else { size },
    }
  }

  fn processing_units(
    &self, width: usize, height: usize,
  ) -> Vec<ProcessingUnit> {
    let mut jobs = Vec::new();
    for row in 0..self.cfg.rows {
      for col in 0..self.cfg.cols {
        let unit = &self.units[row][col];
        let RestorationFilter::Sgrproj { set, xqd } = unit.filter else {
          continue;
        };
        let unit = self.unit_rect(col, row, width, height);
        for y in (0..unit.height).step_by(RESTORATION_PROC_UNIT_SIZE) {
          for x in (0..unit.width).step_by(RESTORATION_PROC_UNIT_SIZE) {
            let rect = Rect {
              x: unit.x + x,
              y: unit.y + y,
              width: RESTORATION_PROC_UNIT_SIZE.min(unit.width - x),
              height: RESTORATION_PROC_UNIT_SIZE.min(unit.height - y),
            };
            jobs.push(ProcessingUnit { rect, set, xqd });
          }
        }
      }
    }
    jobs
  }

  /// Restores `input` into `out` unit by unit. Units without a filter are
  /// copied unchanged.
  ///
  /// `input` must carry at least `RESTORATION_BORDER` pixels of padding on
  /// every side, typically filled by [`Plane::pad`].
  ///
  /// # Errors
  ///
  /// - Returns `PlaneSizeMismatch` if the planes differ in size.
  /// - Returns the first configuration or parameter error found; see
  ///   [`validate_unit`].
  pub fn filter_plane<T: Pixel>(
    &self, input: &Plane<T>, out: &mut Plane<T>, cfg: &RestorationConfig,
  ) -> Result<(), SgrprojError> {
    let (width, height) = (input.cfg.width, input.cfg.height);
    if (out.cfg.width, out.cfg.height) != (width, height) {
      return Err(SgrprojError::PlaneSizeMismatch {
        expected: (width, height),
        actual: (out.cfg.width, out.cfg.height),
      });
    }

    let jobs = self.processing_units(width, height);
    let scratch_pels = RESTORATION_PROC_UNIT_SIZE * RESTORATION_PROC_UNIT_SIZE;
    let probe = RestorationScratch::new(scratch_pels);
    for job in &jobs {
      let dgd = input.region(job.rect);
      let Rect { width: w, height: h, .. } = job.rect;
      validate_unit(&dgd, w, h, job.set, cfg, &probe)?;
    }

    {
      let src = input.slice(PlaneOffset::default());
      let mut dst = out.mut_slice(PlaneOffset::default());
      for y in 0..height {
        dst[y][..width].copy_from_slice(&src[y][..width]);
      }
    }

    let restored: Vec<(Rect, Plane<T>)> = jobs
      .par_iter()
      .map_init(
        || RestorationScratch::new(scratch_pels),
        |scratch, job| {
          let Rect { width: w, height: h, .. } = job.rect;
          log::trace!(
            "restoring {}x{} at ({}, {}) with set {}",
            w,
            h,
            job.rect.x,
            job.rect.y,
            job.set
          );
          let mut tile = Plane::new(w, h, 0, 0, 0, 0);
          apply_selfguided_restoration(
            &input.region(job.rect),
            w,
            h,
            job.set,
            job.xqd,
            cfg.bit_depth,
            &mut tile.mut_slice(PlaneOffset::default()),
            scratch,
            cfg.cpu_feature_level,
          );
          (job.rect, tile)
        },
      )
      .collect();

    for (rect, tile) in &restored {
      let tile = tile.slice(PlaneOffset::default());
      let mut dst = out.mut_slice(rect.offset());
      for y in 0..rect.height {
        dst[y][..rect.width].copy_from_slice(&tile[y][..rect.width]);
      }
    }

    Ok(())
  }
}

use crate::colors::rd_yl_gn;
use crate::config::output_stem;
use crate::error::{HeatmapError, Result};
use crate::grid::{Grid, Metric};
use crate::traits::Render;
use log::info;
use plotters::prelude::*;
use std::path::Path;

/// Side of one cell in the counts image, in pixels
pub const CELL_PIXELS: u32 = 6;

/// Raster of how many samples landed in each cell, north at the top.
/// Suppressed cells are drawn too, empty ones stay white.
#[derive(Debug, Clone, Copy)]
pub struct CountsImage {
    pub metric: Metric,
    pub divider: Option<Metric>,
}

impl CountsImage {
    pub fn new(metric: Metric, divider: Option<Metric>) -> Self {
        Self { metric, divider }
    }
}

/// Log scale so a few crowded cells do not wash out the rest.
/// Sparse cells are red, crowded ones green.
pub fn count_color(count: usize, max_count: usize) -> Option<RGBColor> {
    if count == 0 {
        return None;
    }
    let denom = (max_count as f64).ln_1p();
    let intensity = if denom > 0.0 {
        ((count as f64).ln_1p() / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(rd_yl_gn(intensity))
}

impl Render for CountsImage {
    fn file_name(&self) -> String {
        format!("{}-counts.png", output_stem(self.metric, self.divider))
    }

    fn render_to_file(&self, grid: &Grid, path: &Path) -> Result<()> {
        let width = grid.cols() as u32 * CELL_PIXELS;
        let height = grid.rows() as u32 * CELL_PIXELS;
        let max_count = grid.max_count();

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(HeatmapError::plot)?;

        let side = CELL_PIXELS as i32;
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let Some(color) = count_color(grid.get(row, col).count, max_count) else {
                    continue;
                };
                let (x, y) = (col as i32 * side, row as i32 * side);
                root.draw(&Rectangle::new([(x, y), (x + side, y + side)], color.filled()))
                    .map_err(HeatmapError::plot)?;
            }
        }

        root.present().map_err(HeatmapError::plot)?;
        info!("counts image saved to {}", path.display());
        Ok(())
    }
}

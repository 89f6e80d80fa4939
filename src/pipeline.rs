use crate::config::Config;
use crate::distance::attach_distances;
use crate::error::Result;
use crate::export::CellTable;
use crate::grid::{Aggregation, Grid};
use crate::map::LeafletMap;
use crate::plotting::CountsImage;
use crate::points::load_points;
use crate::traits::Render;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub html: PathBuf,
    /// Every file written, the map first
    pub outputs: Vec<PathBuf>,
    pub points: usize,
    pub binned: usize,
    pub occupied_cells: usize,
    pub rendered_cells: usize,
}

impl Config {
    pub fn aggregation(&self) -> Aggregation {
        Aggregation {
            metric: self.metric,
            divider: self.divider,
            bins: self.bins,
            min_count: self.min_count,
        }
    }

    fn renderers(&self) -> Vec<Box<dyn Render>> {
        let mut renderers: Vec<Box<dyn Render>> =
            vec![Box::new(LeafletMap::new(self.metric, self.divider))];
        if self.counts_image {
            renderers.push(Box::new(CountsImage::new(self.metric, self.divider)));
        }
        if self.cell_table {
            renderers.push(Box::new(CellTable::new(self.metric, self.divider)));
        }
        renderers
    }
}

/// Load, bin, aggregate, render and write, in one pass.
/// Nothing is written unless every step before writing succeeded.
pub fn run(config: &Config) -> Result<Report> {
    config.validate()?;

    let mut points = load_points(&config.database)?;

    info!("computing distances...");
    attach_distances(&mut points);

    info!("binning...");
    let aggregation = config.aggregation();
    let binned = aggregation.select(&points).len();
    let grid = aggregation.aggregate(&points)?;
    log_grid(&grid, config.min_count);

    fs::create_dir_all(&config.out_dir)?;
    let mut outputs = Vec::new();
    for renderer in config.renderers() {
        outputs.push(renderer.render_into(&grid, &config.out_dir)?);
    }

    Ok(Report {
        html: outputs[0].clone(),
        outputs,
        points: points.len(),
        binned,
        occupied_cells: grid.cells().filter(|c| c.count > 0).count(),
        rendered_cells: grid.rendered_cells().count(),
    })
}

fn log_grid(grid: &Grid, min_count: usize) {
    let occupied = grid.cells().filter(|c| c.count > 0).count();
    let rendered = grid.rendered_cells().count();
    info!(
        "{} of {} cells occupied, {} with at least {} samples",
        occupied,
        grid.rows() * grid.cols(),
        rendered,
        min_count
    );

    let non_finite = grid
        .cells()
        .filter(|c| c.count >= min_count && c.value.is_none())
        .count();
    if non_finite > 0 {
        warn!("{} cells dropped because their ratio is not finite", non_finite);
    }
}

use crate::config::output_stem;
use crate::error::Result;
use crate::grid::{Grid, Metric};
use crate::traits::Render;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CellRow {
    lat_left: f64,
    lat_right: f64,
    lon_left: f64,
    lon_right: f64,
    value: Option<f64>,
    count: usize,
}

/// Every cell of the grid as a csv table, in display order.
/// Suppressed cells keep their count but have an empty value.
#[derive(Debug, Clone, Copy)]
pub struct CellTable {
    pub metric: Metric,
    pub divider: Option<Metric>,
}

impl CellTable {
    pub fn new(metric: Metric, divider: Option<Metric>) -> Self {
        Self { metric, divider }
    }

    pub fn write<W: Write>(&self, grid: &Grid, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for cell in grid.cells() {
            wtr.serialize(CellRow {
                lat_left: cell.lat.left,
                lat_right: cell.lat.right,
                lon_left: cell.lon.left,
                lon_right: cell.lon.right,
                value: cell.value,
                count: cell.count,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Render for CellTable {
    fn file_name(&self) -> String {
        format!("{}.csv", output_stem(self.metric, self.divider))
    }

    fn render_to_file(&self, grid: &Grid, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(grid, file)?;
        info!("cell table saved to {}", path.display());
        Ok(())
    }
}

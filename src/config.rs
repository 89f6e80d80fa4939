use crate::error::{HeatmapError, Result};
use crate::grid::{Metric, MIN_COUNT, N_BINS};
use std::path::{Path, PathBuf};

/// Preferred database, a copy of the production data
pub const PROD_DATABASE: &str = "prod-points.sqlite";
/// Fallback database for local development
pub const DEV_DATABASE: &str = "points.sqlite";

/// `heatmap-{metric}` or `heatmap-{metric}-per-{divider}`
pub fn output_stem(metric: Metric, divider: Option<Metric>) -> String {
    match divider {
        Some(divider) => format!("heatmap-{}-per-{}", metric, divider),
        None => format!("heatmap-{}", metric),
    }
}

/// Picks the production database in `db_dir` if present, the dev one otherwise
pub fn resolve_database(db_dir: &Path) -> PathBuf {
    let prod = db_dir.join(PROD_DATABASE);
    if prod.exists() {
        prod
    } else {
        db_dir.join(DEV_DATABASE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub metric: Metric,
    pub divider: Option<Metric>,
    pub database: PathBuf,
    pub out_dir: PathBuf,
    pub bins: usize,
    pub min_count: usize,
    /// Also write the per-cell sample counts as a png
    pub counts_image: bool,
    /// Also write every cell as a csv row
    pub cell_table: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric: Metric::Distance,
            divider: Some(Metric::Wait),
            database: resolve_database(Path::new("db")),
            out_dir: PathBuf::from("dist"),
            bins: N_BINS,
            min_count: MIN_COUNT,
            counts_image: false,
            cell_table: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(HeatmapError::InvalidConfiguration(
                "at least one bin per axis is needed".to_string(),
            ));
        }
        // If the output path already exists but is not a directory, reject early.
        if self.out_dir.exists() && !self.out_dir.is_dir() {
            return Err(HeatmapError::InvalidConfiguration(format!(
                "Output path is not a directory: {}",
                self.out_dir.display()
            )));
        }
        Ok(())
    }

    pub fn html_file_name(&self) -> String {
        format!("{}.html", output_stem(self.metric, self.divider))
    }

    pub fn html_path(&self) -> PathBuf {
        self.out_dir.join(self.html_file_name())
    }
}

use crate::error::Result;
use crate::grid::Grid;
use std::path::Path;

/// Describes an artifact drawn from an aggregated grid and saved to disk,
/// such as the interactive map or the counts image
pub trait Render {
    /// File name of the artifact, without directory
    fn file_name(&self) -> String;

    /// Draw the grid and write it to `path`, overwriting it
    fn render_to_file(&self, grid: &Grid, path: &Path) -> Result<()>;

    /// Write into `dir`, which has to exist, and return the full path
    fn render_into(&self, grid: &Grid, dir: &Path) -> Result<std::path::PathBuf> {
        let path = dir.join(self.file_name());
        self.render_to_file(grid, &path)?;
        Ok(path)
    }
}

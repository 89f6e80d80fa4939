use crate::error::{HeatmapError, Result};
use log::{debug, info};
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;

/// Every non-banned point, newest first, undated points last.
pub const POINTS_QUERY: &str =
    "select * from points where not banned order by datetime is not null desc, datetime desc";

/// One row of the `points` table.
/// geo points are (x, y) so lon is x and lat is y
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub origin: geo::Point,
    /// Missing when the traveller did not record where the ride went
    pub destination: Option<geo::Point>,
    /// Minutes
    pub wait: Option<f64>,
    pub datetime: Option<String>,
    /// Kilometers, filled in by [`crate::distance::attach_distances`]
    pub distance: Option<f64>,
}

impl PointRecord {
    pub fn new(origin: geo::Point, destination: Option<geo::Point>) -> Self {
        Self {
            origin,
            destination,
            wait: None,
            datetime: None,
            distance: None,
        }
    }

    pub fn with_wait(mut self, wait: f64) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn lat(&self) -> f64 {
        self.origin.y()
    }

    pub fn lon(&self) -> f64 {
        self.origin.x()
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let lat: f64 = row.get("lat")?;
        let lon: f64 = row.get("lon")?;
        let dest_lat: Option<f64> = row.get("dest_lat")?;
        let dest_lon: Option<f64> = row.get("dest_lon")?;

        let destination = match (dest_lat, dest_lon) {
            (Some(lat), Some(lon)) => Some(geo::Point::new(lon, lat)),
            _ => None,
        };

        Ok(Self {
            origin: geo::Point::new(lon, lat),
            destination,
            wait: row.get("wait")?,
            datetime: row.get("datetime")?,
            distance: None,
        })
    }
}

/// Reads all non-banned points from the SQLite database at `path`.
/// The database is opened read-only and is never created.
pub fn load_points(path: &Path) -> Result<Vec<PointRecord>> {
    if !path.is_file() {
        return Err(HeatmapError::DatabaseNotFound(path.to_path_buf()));
    }

    info!("loading points from {}", path.display());
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(POINTS_QUERY)?;
    let points = stmt
        .query_map([], |row| PointRecord::from_row(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(
        "{} points loaded, {} with a destination",
        points.len(),
        points.iter().filter(|p| p.destination.is_some()).count()
    );
    Ok(points)
}

pub mod colors;
pub mod config;
pub mod distance;
pub mod error;
pub mod export;
pub mod grid;
pub mod map;
pub mod pipeline;
pub mod plotting;
pub mod points;
pub mod traits;

pub use config::{output_stem, resolve_database, Config};
pub use distance::{attach_distances, haversine_columns, haversine_km, EARTH_RADIUS_KM};
pub use error::{HeatmapError, Result};
pub use grid::{Aggregation, Bins, Cell, Grid, Interval, Metric, MIN_COUNT, N_BINS};
pub use pipeline::{run, Report};
pub use points::{load_points, PointRecord, POINTS_QUERY};
pub use traits::Render;

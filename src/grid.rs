use crate::error::{HeatmapError, Result};
use crate::points::PointRecord;
use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Bins per axis
pub const N_BINS: usize = 100;

/// Cells with fewer samples than this are never rendered
pub const MIN_COUNT: usize = 4;

/// A per-point quantity that can be averaged over a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// km between origin and destination
    Distance,
    /// minutes spent waiting
    Wait,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Distance => "distance",
            Metric::Wait => "wait",
        }
    }

    pub fn value(&self, point: &PointRecord) -> Option<f64> {
        let value = match self {
            Metric::Distance => point.distance,
            Metric::Wait => point.wait,
        };
        value.filter(|v| !v.is_nan())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "distance" => Ok(Metric::Distance),
            "wait" => Ok(Metric::Wait),
            _ => Err(HeatmapError::UnknownMetric(s.to_string())),
        }
    }
}

/// A bin on one axis. Bins are `[left, right)` except the last one,
/// which also holds `right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub left: f64,
    pub right: f64,
}

/// Equal-width binning of one axis between its observed min and max
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    edges: Vec<f64>,
}

impl Bins {
    /// Splits `[min, max]` of `values` into `n` equal-width bins.
    /// Returns `None` if there is no finite value or `n` is zero.
    pub fn cut(values: impl IntoIterator<Item = f64>, n: usize) -> Option<Self> {
        if n == 0 {
            return None;
        }
        let (mut lo, mut hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        // a single distinct value still needs a non-empty range
        if lo == hi {
            let adj = if lo == 0.0 { 0.001 } else { 0.001 * lo.abs() };
            lo -= adj;
            hi += adj;
        }

        let width = hi - lo;
        let mut edges: Vec<f64> = (0..=n).map(|i| lo + width * i as f64 / n as f64).collect();
        edges[n] = hi;
        Some(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn interval(&self, index: usize) -> Interval {
        Interval {
            left: self.edges[index],
            right: self.edges[index + 1],
        }
    }

    /// Index of the bin holding `value`, `None` if it falls outside
    pub fn index(&self, value: f64) -> Option<usize> {
        let n = self.len();
        let lo = self.edges[0];
        let hi = self.edges[n];
        if !(lo..=hi).contains(&value) {
            return None;
        }

        let mut i = (((value - lo) / (hi - lo)) * n as f64).floor() as usize;
        i = i.min(n - 1);
        // the float division can land one bin off near an edge
        if i > 0 && value < self.edges[i] {
            i -= 1;
        } else if i + 1 < n && value >= self.edges[i + 1] {
            i += 1;
        }
        Some(i)
    }
}

/// One lat bin crossed with one lon bin
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub lat: Interval,
    pub lon: Interval,
    /// `None` means no data: too few samples or a non-finite ratio
    pub value: Option<f64>,
    pub count: usize,
}

/// Cells in display order: row 0 is the northernmost lat bin
#[derive(Debug, Clone)]
pub struct Grid {
    pub lat_bins: Bins,
    pub lon_bins: Bins,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.lat_bins.len()
    }

    pub fn cols(&self) -> usize {
        self.lon_bins.len()
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row * self.cols() + col]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells that have a value to show
    pub fn rendered_cells(&self) -> impl Iterator<Item = (&Cell, f64)> {
        self.cells.iter().filter_map(|c| c.value.map(|v| (c, v)))
    }

    pub fn max_count(&self) -> usize {
        self.cells.iter().map(|c| c.count).max().unwrap_or(0)
    }

    /// (south, west, north, east) over all bins
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let south = self.lat_bins.interval(0).left;
        let north = self.lat_bins.interval(self.rows() - 1).right;
        let west = self.lon_bins.interval(0).left;
        let east = self.lon_bins.interval(self.cols() - 1).right;
        (south, west, north, east)
    }
}

#[derive(Debug, Default)]
struct Samples {
    metric: Vec<f64>,
    divider: Vec<f64>,
}

/// Sorted before summing so the mean does not depend on input order
fn mean(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_unstable_by(f64::total_cmp);
    values.iter().sum::<f64>() / values.len() as f64
}

/// How points are reduced to a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregation {
    pub metric: Metric,
    pub divider: Option<Metric>,
    pub bins: usize,
    pub min_count: usize,
}

impl Aggregation {
    pub fn new(metric: Metric, divider: Option<Metric>) -> Self {
        Self {
            metric,
            divider,
            bins: N_BINS,
            min_count: MIN_COUNT,
        }
    }

    fn uses(&self, metric: Metric) -> bool {
        self.metric == metric || self.divider == Some(metric)
    }

    /// Points that take part in the binning. When distance is involved
    /// only points that actually went somewhere are kept.
    pub fn select<'a>(&self, points: &'a [PointRecord]) -> Vec<&'a PointRecord> {
        let needs_distance = self.uses(Metric::Distance);
        points
            .par_iter()
            .filter(|p| p.lat().is_finite() && p.lon().is_finite())
            .filter(|p| !needs_distance || p.distance.map_or(false, |d| d > 0.0))
            .collect()
    }

    pub fn aggregate(&self, points: &[PointRecord]) -> Result<Grid> {
        let selected = self.select(points);

        let lat_bins = Bins::cut(selected.iter().map(|p| p.lat()), self.bins)
            .ok_or(HeatmapError::EmptyDataset)?;
        let lon_bins = Bins::cut(selected.iter().map(|p| p.lon()), self.bins)
            .ok_or(HeatmapError::EmptyDataset)?;
        debug!(
            "binning {} points over lat {:?} and lon {:?}",
            selected.len(),
            lat_bins.interval(0).left..lat_bins.interval(lat_bins.len() - 1).right,
            lon_bins.interval(0).left..lon_bins.interval(lon_bins.len() - 1).right,
        );

        let keyed: Vec<_> = selected
            .par_iter()
            .filter_map(|p| Some(((lat_bins.index(p.lat())?, lon_bins.index(p.lon())?), *p)))
            .collect();

        let mut samples: BTreeMap<(usize, usize), Samples> = BTreeMap::new();
        for (key, point) in keyed {
            let cell = samples.entry(key).or_default();
            if let Some(v) = self.metric.value(point) {
                cell.metric.push(v);
            }
            if let Some(v) = self.divider.and_then(|d| d.value(point)) {
                cell.divider.push(v);
            }
        }

        let rows = lat_bins.len();
        let cols = lon_bins.len();
        let mut cells = Vec::with_capacity(rows * cols);
        // north at the top
        for lat_index in (0..rows).rev() {
            for lon_index in 0..cols {
                let (value, count) = match samples.get_mut(&(lat_index, lon_index)) {
                    Some(s) => (self.finalize(s), s.metric.len()),
                    None => (None, 0),
                };
                cells.push(Cell {
                    lat: lat_bins.interval(lat_index),
                    lon: lon_bins.interval(lon_index),
                    value,
                    count,
                });
            }
        }

        Ok(Grid {
            lat_bins,
            lon_bins,
            cells,
        })
    }

    /// Mean of the metric, divided by the mean of the divider if any.
    fn finalize(&self, samples: &mut Samples) -> Option<f64> {
        if samples.metric.len() < self.min_count {
            return None;
        }
        let mut value = mean(&mut samples.metric);
        if self.divider.is_some() {
            value /= mean(&mut samples.divider);
        }
        Some(value).filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::point;

    fn trip(lat: f64, lon: f64, distance: f64, wait: f64) -> PointRecord {
        let mut p = PointRecord::new(point!(x: lon, y: lat), Some(point!(x: lon, y: lat)))
            .with_wait(wait);
        p.distance = Some(distance);
        p
    }

    fn find(grid: &Grid, lat: f64, lon: f64) -> &Cell {
        grid.cells()
            .find(|c| {
                let i = grid.lat_bins.index(lat).unwrap();
                let j = grid.lon_bins.index(lon).unwrap();
                c.lat == grid.lat_bins.interval(i) && c.lon == grid.lon_bins.interval(j)
            })
            .unwrap()
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("distance".parse::<Metric>().unwrap(), Metric::Distance);
        assert_eq!(" Wait ".parse::<Metric>().unwrap(), Metric::Wait);
        assert!(matches!(
            "speed".parse::<Metric>(),
            Err(HeatmapError::UnknownMetric(_))
        ));
        assert_eq!(Metric::Wait.to_string(), "wait");
    }

    #[test]
    fn test_bins_edges() {
        let bins = Bins::cut([0.0, 10.0, 5.0], 10).unwrap();
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.interval(0), Interval { left: 0.0, right: 1.0 });
        assert_eq!(bins.interval(9).right, 10.0);

        assert_eq!(bins.index(0.0), Some(0));
        // half-open
        assert_eq!(bins.index(1.0), Some(1));
        assert_eq!(bins.index(0.999), Some(0));
        // the last bin is closed
        assert_eq!(bins.index(10.0), Some(9));
        assert_eq!(bins.index(10.5), None);
        assert_eq!(bins.index(-0.1), None);
        assert_eq!(bins.index(f64::NAN), None);
    }

    #[test]
    fn test_bins_every_edge_lands_in_its_bin() {
        let bins = Bins::cut([-33.7, 61.2], N_BINS).unwrap();
        for i in 0..N_BINS {
            assert_eq!(bins.index(bins.interval(i).left), Some(i));
        }
    }

    #[test]
    fn test_bins_single_value() {
        let bins = Bins::cut([50.0, 50.0], 100).unwrap();
        assert!(bins.interval(0).left < 50.0);
        assert!(bins.interval(99).right > 50.0);
        assert!(bins.index(50.0).is_some());

        let zero = Bins::cut([0.0], 4).unwrap();
        assert_eq!(zero.interval(0).left, -0.001);
        assert_eq!(zero.interval(3).right, 0.001);
    }

    #[test]
    fn test_bins_empty() {
        assert!(Bins::cut(Vec::new(), 10).is_none());
        assert!(Bins::cut([f64::NAN], 10).is_none());
    }

    #[test]
    fn test_ratio_of_means() {
        let mut points = Vec::new();
        for _ in 0..2 {
            points.push(trip(10.0, 10.0, 10.0, 1.0));
            points.push(trip(10.0, 10.0, 20.0, 4.0));
        }
        // spread the axes so the cell is well defined
        points.extend((0..4).map(|_| trip(20.0, 20.0, 1.0, 1.0)));

        let agg = Aggregation::new(Metric::Distance, Some(Metric::Wait));
        let grid = agg.aggregate(&points).unwrap();
        let cell = find(&grid, 10.0, 10.0);
        assert_eq!(cell.count, 4);
        assert_eq!(cell.value, Some(6.0));
    }

    #[test]
    fn test_plain_mean() {
        let points: Vec<_> = [10.0, 20.0, 30.0, 40.0]
            .iter()
            .map(|w| trip(1.0, 1.0, 5.0, *w))
            .chain([trip(2.0, 2.0, 5.0, 1.0)])
            .collect();
        let agg = Aggregation::new(Metric::Wait, None);
        let grid = agg.aggregate(&points).unwrap();
        assert_eq!(find(&grid, 1.0, 1.0).value, Some(25.0));
        assert_eq!(find(&grid, 2.0, 2.0).value, None);
        assert_eq!(find(&grid, 2.0, 2.0).count, 1);
    }

    #[test]
    fn test_suppression_below_min_count() {
        let mut points: Vec<_> = (0..3).map(|_| trip(1.0, 1.0, 5.0, 10.0)).collect();
        points.extend((0..4).map(|_| trip(9.0, 9.0, 5.0, 10.0)));

        let agg = Aggregation::new(Metric::Wait, None);
        let grid = agg.aggregate(&points).unwrap();
        for cell in grid.cells() {
            if cell.count < MIN_COUNT {
                assert_eq!(cell.value, None);
            }
        }
        assert_eq!(find(&grid, 1.0, 1.0).count, 3);
        assert_eq!(find(&grid, 9.0, 9.0).value, Some(10.0));
        assert_eq!(grid.rendered_cells().count(), 1);
    }

    #[test]
    fn test_count_ignores_missing_metric() {
        let mut points: Vec<_> = (0..4).map(|_| trip(1.0, 1.0, 5.0, 10.0)).collect();
        points[0].wait = None;
        points.push(trip(3.0, 3.0, 5.0, 10.0));

        let grid = Aggregation::new(Metric::Wait, None).aggregate(&points).unwrap();
        let cell = find(&grid, 1.0, 1.0);
        assert_eq!(cell.count, 3);
        assert_eq!(cell.value, None);
    }

    #[test]
    fn test_zero_divider_is_no_data() {
        let mut points: Vec<_> = (0..4).map(|_| trip(1.0, 1.0, 5.0, 0.0)).collect();
        points.extend((0..4).map(|_| trip(3.0, 3.0, 5.0, 1.0)));

        let agg = Aggregation::new(Metric::Distance, Some(Metric::Wait));
        let grid = agg.aggregate(&points).unwrap();
        assert_eq!(find(&grid, 1.0, 1.0).count, 4);
        assert_eq!(find(&grid, 1.0, 1.0).value, None);
        assert_eq!(find(&grid, 3.0, 3.0).value, Some(5.0));
        assert!(grid.rendered_cells().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_zero_distance_excluded() {
        let mut points: Vec<_> = (0..4).map(|_| trip(1.0, 1.0, 0.0, 10.0)).collect();
        points.extend((0..4).map(|_| trip(3.0, 3.0, 5.0, 10.0)));
        points.push(PointRecord::new(point!(x: 7.0, y: 7.0), None).with_wait(3.0));

        let agg = Aggregation::new(Metric::Distance, None);
        assert_eq!(agg.select(&points).len(), 4);
        let grid = agg.aggregate(&points).unwrap();
        // only one location left, so every point sits in one cell
        assert_eq!(grid.cells().map(|c| c.count).sum::<usize>(), 4);

        // wait alone keeps them all
        let agg = Aggregation::new(Metric::Wait, None);
        assert_eq!(agg.select(&points).len(), 9);
    }

    #[test]
    fn test_empty_dataset() {
        let points = vec![trip(1.0, 1.0, 0.0, 10.0)];
        let err = Aggregation::new(Metric::Distance, None)
            .aggregate(&points)
            .unwrap_err();
        assert!(matches!(err, HeatmapError::EmptyDataset));
    }

    #[test]
    fn test_north_at_top() {
        let mut points: Vec<_> = (0..4).map(|_| trip(-10.0, 0.0, 5.0, 1.0)).collect();
        points.extend((0..4).map(|_| trip(10.0, 0.0, 5.0, 2.0)));

        let grid = Aggregation::new(Metric::Wait, None).aggregate(&points).unwrap();
        assert_eq!(grid.rows(), N_BINS);
        assert_eq!(grid.cols(), N_BINS);

        let col = grid.lon_bins.index(0.0).unwrap();
        let top = grid.get(0, col);
        let bottom = grid.get(grid.rows() - 1, col);
        assert!(top.lat.left > bottom.lat.left);
        assert_eq!(top.value, Some(2.0));
        assert_eq!(bottom.value, Some(1.0));
        assert_eq!(grid.bounds().0, -10.0);
        assert_eq!(grid.bounds().2, 10.0);
    }

    #[test]
    fn test_order_independent() {
        let mut points = Vec::new();
        for i in 0..200 {
            let f = i as f64;
            points.push(trip(
                (f * 0.37) % 5.0,
                (f * 0.71) % 7.0,
                0.1 + (f * 1.3) % 11.0,
                1.0 + (f * 0.9) % 13.0,
            ));
        }
        let agg = Aggregation {
            bins: 3,
            ..Aggregation::new(Metric::Distance, Some(Metric::Wait))
        };
        let before = agg.aggregate(&points).unwrap();

        // deterministic shuffle
        let mut shuffled = points.clone();
        let len = shuffled.len();
        for i in 0..len {
            shuffled.swap(i, (i * 7919 + 13) % len);
        }
        shuffled.reverse();
        let after = agg.aggregate(&shuffled).unwrap();

        let a: Vec<_> = before.cells().cloned().collect();
        let b: Vec<_> = after.cells().cloned().collect();
        assert_eq!(a, b);
        assert!(before.rendered_cells().count() > 0);
    }
}

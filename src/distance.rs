use crate::error::{HeatmapError, Result};
use crate::points::PointRecord;
use rayon::prelude::*;

/// Earth radius used for every distance in the reports
pub const EARTH_RADIUS_KM: f64 = 6367.0;

/// Great-circle distance in km between two points given in degrees.
/// Identical points give exactly 0.
pub fn haversine_km(origin: geo::Point, destination: geo::Point) -> f64 {
    haversine(
        origin.x().to_radians(),
        origin.y().to_radians(),
        destination.x().to_radians(),
        destination.y().to_radians(),
        EARTH_RADIUS_KM,
    )
}

/// All angles already in radians
fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64, radius: f64) -> f64 {
    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * radius * a.sqrt().asin()
}

/// Column-wise haversine over four equally long slices.
/// With `to_radians` the inputs are taken as degrees, otherwise as radians.
pub fn haversine_columns(
    lon1: &[f64],
    lat1: &[f64],
    lon2: &[f64],
    lat2: &[f64],
    to_radians: bool,
) -> Result<Vec<f64>> {
    let expected = lon1.len();
    for column in [lat1, lon2, lat2] {
        if column.len() != expected {
            return Err(HeatmapError::LengthMismatch {
                expected,
                got: column.len(),
            });
        }
    }

    let factor = if to_radians {
        std::f64::consts::PI / 180.0
    } else {
        1.0
    };

    Ok((0..expected)
        .into_par_iter()
        .map(|i| {
            haversine(
                lon1[i] * factor,
                lat1[i] * factor,
                lon2[i] * factor,
                lat2[i] * factor,
                EARTH_RADIUS_KM,
            )
        })
        .collect())
}

/// Fills in `distance` for every record that has a destination.
pub fn attach_distances(points: &mut [PointRecord]) {
    points.par_iter_mut().for_each(|point| {
        point.distance = point
            .destination
            .map(|destination| haversine_km(point.origin, destination));
    });
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{point, HaversineDistance};

    #[test]
    fn test_same_point_is_zero() {
        for (lon, lat) in [(0.0, 0.0), (8.68, 50.11), (-179.9, -89.5), (139.7, 35.7)] {
            let p = point!(x: lon, y: lat);
            assert_eq!(haversine_km(p, p), 0.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (point!(x: 8.68, y: 50.11), point!(x: 2.35, y: 48.86)),
            (point!(x: -73.9, y: 40.7), point!(x: 139.7, y: 35.7)),
            (point!(x: 0.0, y: -45.0), point!(x: 179.0, y: 45.0)),
        ];
        for (a, b) in pairs {
            assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_quarter_circumference() {
        let a = point!(x: 0.0, y: 0.0);
        let b = point!(x: 90.0, y: 0.0);
        let quarter = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KM;
        assert!((haversine_km(a, b) - quarter).abs() < 1e-6);

        // with geo's mean earth radius this is the usual 10007.5 km
        let mean = haversine(0.0, 0.0, 90f64.to_radians(), 0.0, 6371.0088);
        assert!((mean - 10007.5).abs() < 0.1);
    }

    #[test]
    fn test_agrees_with_geo() {
        let a = point!(x: 8.68, y: 50.11);
        let b = point!(x: 2.35, y: 48.86);
        let geo_km = a.haversine_distance(&b) / 1000.0;
        let ours = haversine_km(a, b) * 6371.0088 / EARTH_RADIUS_KM;
        assert!((geo_km - ours).abs() < 1e-3);
    }

    #[test]
    fn test_columns_match_pointwise() {
        let lon1 = [8.68, 0.0, 10.0];
        let lat1 = [50.11, 0.0, 10.0];
        let lon2 = [2.35, 90.0, 10.0];
        let lat2 = [48.86, 0.0, 10.0];

        let degrees = haversine_columns(&lon1, &lat1, &lon2, &lat2, true).unwrap();
        for i in 0..3 {
            let expected = haversine_km(
                point!(x: lon1[i], y: lat1[i]),
                point!(x: lon2[i], y: lat2[i]),
            );
            assert!((degrees[i] - expected).abs() < 1e-9);
        }
        assert_eq!(degrees[2], 0.0);

        let radians: Vec<_> = [lon1, lat1, lon2, lat2]
            .iter()
            .map(|c| c.iter().map(|d| d.to_radians()).collect::<Vec<_>>())
            .collect();
        let from_radians =
            haversine_columns(&radians[0], &radians[1], &radians[2], &radians[3], false)
                .unwrap();
        for (a, b) in degrees.iter().zip(&from_radians) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_columns_length_mismatch() {
        let err = haversine_columns(&[1.0, 2.0], &[1.0, 2.0], &[1.0], &[1.0, 2.0], true)
            .unwrap_err();
        assert!(matches!(
            err,
            HeatmapError::LengthMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn test_attach_distances() {
        let mut points = vec![
            PointRecord::new(point!(x: 0.0, y: 0.0), Some(point!(x: 90.0, y: 0.0))),
            PointRecord::new(point!(x: 5.0, y: 5.0), Some(point!(x: 5.0, y: 5.0))),
            PointRecord::new(point!(x: 5.0, y: 5.0), None),
        ];
        attach_distances(&mut points);

        let quarter = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KM;
        assert!((points[0].distance.unwrap() - quarter).abs() < 1e-6);
        assert_eq!(points[1].distance, Some(0.0));
        assert_eq!(points[2].distance, None);
    }
}

use crate::{
    math::geodesic::{self, GeodesicIntermediates},
    ChainError,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// A point on the densified route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,

    /// Zero-based position along the dense route.
    pub index: usize,
}

impl RoutePoint {
    pub fn coord(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// A densified route. Indices are contiguous and match positions in
/// `points`.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<RoutePoint>,
}

impl Route {
    /// Builds a route from already-dense `(lat, lng)` vertices.
    pub fn from_dense(vertices: &[(f64, f64)]) -> Result<Self, ChainError> {
        if vertices.is_empty() {
            return Err(ChainError::EmptyRoute);
        }
        let points = vertices
            .iter()
            .enumerate()
            .map(|(index, &(lat, lng))| RoutePoint { lat, lng, index })
            .collect();
        Ok(Self { points })
    }

    /// Densifies `vertices` so consecutive points are about
    /// `spacing_m` apart along the geodesic between each vertex pair.
    ///
    /// Each segment longer than `spacing_m` is split into
    /// `round(distance / spacing_m)` equal parts. Input vertices are
    /// kept as-is.
    pub fn densify(vertices: &[(f64, f64)], spacing_m: f64) -> Result<Self, ChainError> {
        if !(spacing_m > 0.0) {
            return Err(ChainError::Config(format!(
                "densify spacing must be positive, got {spacing_m}"
            )));
        }
        let (first, rest) = vertices.split_first().ok_or(ChainError::EmptyRoute)?;

        let mut dense = Vec::with_capacity(vertices.len());
        dense.push(*first);
        let mut prev = *first;
        for &vertex in rest {
            let distance_m = geodesic::distance(prev, vertex);
            if distance_m > spacing_m {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let segments = (distance_m / spacing_m).round() as usize;
                dense.extend(GeodesicIntermediates::new(prev, vertex, segments));
            }
            dense.push(vertex);
            prev = vertex;
        }

        debug!("densified {} vertices into {}", vertices.len(), dense.len());
        Self::from_dense(&dense)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RoutePoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    /// Returns the index of the last point.
    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Returns the bearing from point `index` to point `index + 1`,
    /// if both exist.
    pub fn forward_bearing(&self, index: usize) -> Option<f64> {
        let here = self.points.get(index)?;
        let next = self.points.get(index + 1)?;
        Some(geodesic::bearing(here.coord(), next.coord()))
    }

    /// Returns the route point closest to `coord`, looking no earlier
    /// than `from`.
    ///
    /// Distance along the route is assumed to be locally unimodal:
    /// the scan stops once distances are growing again, the current
    /// point is at least `proximity_m` away and the best match so far
    /// is within `proximity_m`.
    pub fn nearest(
        &self,
        coord: (f64, f64),
        from: usize,
        proximity_m: f64,
    ) -> Option<(f64, &RoutePoint)> {
        let mut best: Option<(f64, &RoutePoint)> = None;
        for point in self.points.get(from..)? {
            let dist = geodesic::distance(point.coord(), coord);
            let smallest = match best {
                Some((smallest, _)) if smallest <= dist => smallest,
                _ => {
                    best = Some((dist, point));
                    dist
                }
            };
            if dist > smallest && dist >= proximity_m && smallest < proximity_m {
                break;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::Route;
    use crate::{fixtures, math::geodesic, ChainError};
    use approx::assert_relative_eq;

    #[test]
    fn test_collinear_densify() {
        let vertices = fixtures::straight_vertices(&[50.0, 50.0]);
        let route = Route::densify(&vertices, 10.0).unwrap();
        // round(50 / 10) - 1 = 4 new points per segment.
        assert_eq!(route.len(), 3 + 2 * 4);
        assert_eq!(route.get(0).unwrap().coord(), vertices[0]);
        assert_eq!(route.get(5).unwrap().coord(), vertices[1]);
        assert_eq!(route.get(10).unwrap().coord(), vertices[2]);
        for pair in route.points().windows(2) {
            assert_relative_eq!(
                geodesic::distance(pair[0].coord(), pair[1].coord()),
                10.0,
                epsilon = 0.2
            );
        }
    }

    #[test]
    fn test_indices_are_contiguous() {
        let vertices = fixtures::straight_vertices(&[37.0, 3.0, 120.0]);
        let route = Route::densify(&vertices, 7.5).unwrap();
        for (i, point) in route.points().iter().enumerate() {
            assert_eq!(point.index, i);
        }
    }

    #[test]
    fn test_spacing_bound() {
        let vertices = fixtures::straight_vertices(&[33.0, 41.0, 18.0, 102.0]);
        let spacing = 10.0;
        let route = Route::densify(&vertices, spacing).unwrap();
        // `round` allows a segment to be up to half a step long before
        // it gets split.
        for pair in route.points().windows(2) {
            let d = geodesic::distance(pair[0].coord(), pair[1].coord());
            assert!(d <= spacing * 1.5 + 0.2, "{d}");
        }
    }

    #[test]
    fn test_duplicate_vertices() {
        let v = fixtures::ORIGIN;
        let route = Route::densify(&[v, v, v], 1.0).unwrap();
        assert_eq!(route.len(), 3);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            Route::densify(&[], 1.0),
            Err(ChainError::EmptyRoute)
        ));
        assert!(matches!(
            Route::densify(&[fixtures::ORIGIN], 0.0),
            Err(ChainError::Config(_))
        ));
    }

    #[test]
    fn test_nearest() {
        let route = fixtures::straight_route(100.0, 1.0);
        let target = geodesic::destination(route.get(40).unwrap().coord(), 90.0, 2.0);
        let (dist, point) = route.nearest(target, 0, 10.0).unwrap();
        assert_eq!(point.index, 40);
        assert_relative_eq!(dist, 2.0, epsilon = 0.1);
    }

    #[test]
    fn test_nearest_never_looks_back() {
        let route = fixtures::straight_route(100.0, 1.0);
        let target = route.get(20).unwrap().coord();
        let (dist, point) = route.nearest(target, 30, 10.0).unwrap();
        assert_eq!(point.index, 30);
        assert_relative_eq!(dist, 10.0, epsilon = 0.1);
        assert!(route.nearest(target, 500, 10.0).is_none());
    }

    #[test]
    fn test_nearest_stops_early() {
        // A route that comes back past the same spot: the first pass is
        // what a forward walk wants.
        let mut vertices = fixtures::straight_vertices(&[50.0]);
        vertices.push(fixtures::ORIGIN);
        let route = Route::densify(&vertices, 1.0).unwrap();
        let target = route.get(10).unwrap().coord();
        let (_, point) = route.nearest(target, 0, 10.0).unwrap();
        assert_eq!(point.index, 10);
    }
}

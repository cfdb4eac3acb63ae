//! Thin wrappers around [geo]'s WGS84 geodesic routines.
//!
//! Everything in this crate passes coordinates around as `(lat, lng)`
//! pairs, while [geo] wants `x = lng, y = lat` points. These helpers
//! keep that conversion in one place.

use super::{normalize_degrees, round_to};
use geo::{point, GeodesicBearing, GeodesicDestination, GeodesicDistance, Point};

/// Decimal digits kept for generated coordinates (~0.1m).
pub const COORD_DIGITS: i32 = 6;

fn to_point(lat: f64, lng: f64) -> Point<f64> {
    point!(x: lng, y: lat)
}

/// Returns the geodesic distance in meters between two `(lat, lng)`
/// pairs.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    to_point(a.0, a.1).geodesic_distance(&to_point(b.0, b.1))
}

/// Returns the initial bearing in degrees, `[0, 360)`, from `a` to
/// `b`.
pub fn bearing(a: (f64, f64), b: (f64, f64)) -> f64 {
    normalize_degrees(to_point(a.0, a.1).geodesic_bearing(to_point(b.0, b.1)))
}

/// Returns the bearing in degrees, `[0, 360)`, a traveller has when
/// arriving at `b` from `a`.
pub fn final_bearing(a: (f64, f64), b: (f64, f64)) -> f64 {
    normalize_degrees(to_point(b.0, b.1).geodesic_bearing(to_point(a.0, a.1)) + 180.0)
}

/// Iterates the interior points that split the geodesic from `start`
/// to `end` into `segments` equal lengths.
///
/// Neither `start` nor `end` are yielded.
pub struct GeodesicIntermediates {
    start: Point<f64>,
    azimuth: f64,
    step_m: f64,
    current: usize,
    segments: usize,
}

impl GeodesicIntermediates {
    pub fn new(start: (f64, f64), end: (f64, f64), segments: usize) -> Self {
        let start = to_point(start.0, start.1);
        let (azimuth, total_m) = start.geodesic_bearing_distance(to_point(end.0, end.1));
        #[allow(clippy::cast_precision_loss)]
        let step_m = if segments == 0 {
            0.0
        } else {
            total_m / segments as f64
        };
        Self {
            start,
            azimuth,
            step_m,
            current: 1,
            segments,
        }
    }
}

impl Iterator for GeodesicIntermediates {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.segments {
            #[allow(clippy::cast_precision_loss)]
            let s = self.step_m * self.current as f64;
            self.current += 1;
            let p = self.start.geodesic_destination(self.azimuth, s);
            Some((round_to(p.y(), COORD_DIGITS), round_to(p.x(), COORD_DIGITS)))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segments.saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GeodesicIntermediates {}

/// Returns the point `distance_m` from `start` along `bearing_deg`.
///
/// Mostly useful for building test routes of a known length.
pub fn destination(start: (f64, f64), bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let p = to_point(start.0, start.1).geodesic_destination(bearing_deg, distance_m);
    (p.y(), p.x())
}

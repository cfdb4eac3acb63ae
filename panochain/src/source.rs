//! External services the pipeline depends on.
//!
//! Implementations are expected to block until the request is done.
//! A source reports "nothing there" as `Ok(None)`; an `Err` means the
//! request itself failed.

use crate::{pano::PanoMeta, FetchError};
use serde::{Deserialize, Serialize};

/// Panorama metadata lookups.
pub trait PanoSource {
    /// Returns a panorama within `radius_m` of `coord`, if any.
    fn near(&self, coord: (f64, f64), radius_m: f64) -> Result<Option<PanoMeta>, FetchError>;

    /// Returns the panorama with the given id, if it exists.
    fn by_id(&self, id: &str) -> Result<Option<PanoMeta>, FetchError>;
}

impl<T: PanoSource + ?Sized> PanoSource for &T {
    fn near(&self, coord: (f64, f64), radius_m: f64) -> Result<Option<PanoMeta>, FetchError> {
        (**self).near(coord, radius_m)
    }

    fn by_id(&self, id: &str) -> Result<Option<PanoMeta>, FetchError> {
        (**self).by_id(id)
    }
}

/// A batch of locations for an [`ElevationSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationBatch {
    /// `(lat, lng)` of every location, in request order.
    pub coords: Vec<(f64, f64)>,

    /// The same locations as a precision 5 encoded polyline.
    pub polyline: String,
}

/// Bulk elevation lookups.
pub trait ElevationSource {
    /// Returns one value per location in `batch`, in the same order.
    ///
    /// A `None` entry means the service had no value for that
    /// location.
    fn elevations(&self, batch: &ElevationBatch) -> Result<Vec<Option<f64>>, FetchError>;
}

impl<T: ElevationSource + ?Sized> ElevationSource for &T {
    fn elevations(&self, batch: &ElevationBatch) -> Result<Vec<Option<f64>>, FetchError> {
        (**self).elevations(batch)
    }
}

/// Where a route should go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    /// `[lat, lng]`
    pub origin: [f64; 2],

    /// `[lat, lng]`
    pub destination: [f64; 2],

    /// Pass-through points, `[lat, lng]` each.
    #[serde(default)]
    pub waypoints: Vec<[f64; 2]>,
}

/// Route lookups.
pub trait DirectionsSource {
    /// Returns the encoded polyline (precision 5) of every step of
    /// the first route found, in travel order.
    fn step_polylines(&self, request: &DirectionsRequest) -> Result<Vec<String>, FetchError>;
}

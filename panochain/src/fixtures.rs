//! Shared test data: straight routes, a fake panorama graph and a fake
//! elevation service.

use crate::{
    error::Service,
    math::geodesic,
    pano::{Link, PanoMeta, Panorama},
    route::Route,
    source::{ElevationBatch, ElevationSource, PanoSource},
    FetchError,
};
use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
};

pub const ORIGIN: (f64, f64) = (44.2705, -71.30325);

/// Vertices heading due north from [`ORIGIN`], separated by
/// `segments_m`.
pub fn straight_vertices(segments_m: &[f64]) -> Vec<(f64, f64)> {
    let mut vertices = vec![ORIGIN];
    let mut total = 0.0;
    for segment in segments_m {
        total += segment;
        vertices.push(geodesic::destination(ORIGIN, 0.0, total));
    }
    vertices
}

pub fn route_towards(bearing: f64, length_m: f64, spacing_m: f64) -> Route {
    let end = geodesic::destination(ORIGIN, bearing, length_m);
    Route::densify(&[ORIGIN, end], spacing_m).unwrap()
}

/// A route heading due north from [`ORIGIN`].
pub fn straight_route(length_m: f64, spacing_m: f64) -> Route {
    route_towards(0.0, length_m, spacing_m)
}

pub fn pano(id: &str, route_index: usize) -> Panorama {
    Panorama {
        id: id.to_string(),
        lat: ORIGIN.0,
        lng: ORIGIN.1,
        description: format!("{id} street"),
        elevation: None,
        links: vec![],
        route_index,
    }
}

/// Returns a per-process path in the system temp dir.
pub fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("panochain-{}-{name}", std::process::id()))
}

/// An in-memory panorama graph.
#[derive(Debug, Default)]
pub struct PanoGraph {
    panos: Vec<(usize, PanoMeta)>,
    calls: Cell<usize>,
    near_calls: Cell<usize>,
    fail_after: Cell<Option<usize>>,
}

impl PanoGraph {
    /// One panorama every `every` route points, `offset_m` east of the
    /// route, each linked to its neighbours.
    ///
    /// The forward link, when there is one, is always `links[0]`.
    pub fn along(route: &Route, every: usize, offset_m: f64) -> Self {
        let indices: Vec<usize> = (0..route.len()).step_by(every).collect();
        let coords: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| geodesic::destination(route.points()[i].coord(), 90.0, offset_m))
            .collect();
        let panos = indices
            .iter()
            .enumerate()
            .map(|(n, &index)| {
                let mut links = Vec::new();
                if let Some(&next) = indices.get(n + 1) {
                    links.push(Link {
                        pano_id: Self::id(next),
                        yaw: geodesic::bearing(coords[n], coords[n + 1]),
                    });
                }
                if n > 0 {
                    links.push(Link {
                        pano_id: Self::id(indices[n - 1]),
                        yaw: geodesic::bearing(coords[n], coords[n - 1]),
                    });
                }
                let meta = PanoMeta {
                    id: Self::id(index),
                    lat: coords[n].0,
                    lng: coords[n].1,
                    description: format!("Route point {index}"),
                    elevation: None,
                    links,
                };
                (index, meta)
            })
            .collect();
        Self {
            panos,
            ..Self::default()
        }
    }

    fn id(index: usize) -> String {
        format!("pano-{index}")
    }

    pub fn id_at(&self, index: usize) -> String {
        Self::id(index)
    }

    fn meta_mut(&mut self, index: usize) -> &mut PanoMeta {
        self.panos
            .iter_mut()
            .find(|(i, _)| *i == index)
            .map(|(_, meta)| meta)
            .unwrap()
    }

    pub fn set_link_yaw(&mut self, index: usize, yaw: f64) {
        self.meta_mut(index).links[0].yaw = yaw;
    }

    pub fn set_link_target(&mut self, index: usize, target: &str) {
        self.meta_mut(index).links[0].pano_id = target.to_string();
    }

    pub fn set_elevation(&mut self, index: usize, elevation: f64) {
        self.meta_mut(index).elevation = Some(elevation);
    }

    /// Moves a panorama without touching any link yaws.
    pub fn shift(&mut self, index: usize, bearing: f64, distance_m: f64) {
        let meta = self.meta_mut(index);
        let (lat, lng) = geodesic::destination((meta.lat, meta.lng), bearing, distance_m);
        meta.lat = lat;
        meta.lng = lng;
    }

    pub fn remove_where<F: Fn(usize) -> bool>(&mut self, f: F) {
        self.panos.retain(|(index, _)| !f(*index));
    }

    /// Every request after the first `n` fails.
    pub fn fail_after(&self, n: usize) {
        self.fail_after.set(Some(n));
    }

    pub fn near_calls(&self) -> usize {
        self.near_calls.get()
    }

    fn tick(&self) -> Result<(), FetchError> {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        match self.fail_after.get() {
            Some(n) if calls > n => Err(FetchError::new(Service::Panorama, "connection reset")),
            _ => Ok(()),
        }
    }
}

impl PanoSource for PanoGraph {
    fn near(&self, coord: (f64, f64), radius_m: f64) -> Result<Option<PanoMeta>, FetchError> {
        self.tick()?;
        self.near_calls.set(self.near_calls.get() + 1);
        let found = self
            .panos
            .iter()
            .map(|(_, meta)| (geodesic::distance(coord, (meta.lat, meta.lng)), meta))
            .filter(|(d, _)| *d <= radius_m)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, meta)| meta.clone());
        Ok(found)
    }

    fn by_id(&self, id: &str) -> Result<Option<PanoMeta>, FetchError> {
        self.tick()?;
        Ok(self
            .panos
            .iter()
            .find(|(_, meta)| meta.id == id)
            .map(|(_, meta)| meta.clone()))
    }
}

/// Elevation service backed by a function of `(lat, lng)`.
pub struct Terrain<F> {
    f: F,

    /// Size of every batch requested so far.
    pub batches: RefCell<Vec<usize>>,
    fail_after: Cell<Option<usize>>,
}

impl<F> Terrain<F>
where
    F: Fn((f64, f64)) -> Option<f64>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            batches: RefCell::new(Vec::new()),
            fail_after: Cell::new(None),
        }
    }

    pub fn fail(&self) {
        self.fail_after(0);
    }

    /// Answers `batches` more batches, then fails every request.
    pub fn fail_after(&self, batches: usize) {
        self.fail_after.set(Some(self.batches.borrow().len() + batches));
    }

    pub fn requested(&self) -> usize {
        self.batches.borrow().iter().sum()
    }
}

impl<F> ElevationSource for Terrain<F>
where
    F: Fn((f64, f64)) -> Option<f64>,
{
    fn elevations(&self, batch: &ElevationBatch) -> Result<Vec<Option<f64>>, FetchError> {
        if self.fail_after.get().is_some_and(|limit| self.batches.borrow().len() >= limit) {
            return Err(FetchError::new(Service::Elevation, "quota exceeded"));
        }
        self.batches.borrow_mut().push(batch.coords.len());
        Ok(batch.coords.iter().map(|&c| (self.f)(c)).collect())
    }
}

//! Attaches elevations to waypoints that lack one.

use crate::{
    config::ElevationConfig,
    directions,
    source::{ElevationBatch, ElevationSource},
    waypoint::Waypoint,
    ChainError,
};
use log::{debug, info, warn};

/// Queries `source` for every point without an elevation, in batches
/// of at most `config.batch_size`, and returns how many points were
/// queried.
///
/// Points that already carry an elevation are never queried. When a
/// batch fails, the elevations of earlier batches stay attached.
pub fn augment<E: ElevationSource>(
    points: &mut [Waypoint],
    source: &E,
    config: &ElevationConfig,
) -> Result<usize, ChainError> {
    let missing: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.elevation.is_none())
        .map(|(i, _)| i)
        .collect();
    if missing.is_empty() {
        debug!("all {} points have elevations", points.len());
        return Ok(0);
    }
    info!(
        "fetching {} elevations in {} batches",
        missing.len(),
        missing.len().div_ceil(config.batch_size)
    );

    for batch_indices in missing.chunks(config.batch_size) {
        let coords: Vec<(f64, f64)> = batch_indices.iter().map(|&i| points[i].coord()).collect();
        let batch = ElevationBatch {
            polyline: directions::encode(&coords)?,
            coords,
        };
        let elevations = source.elevations(&batch)?;
        if elevations.len() != batch_indices.len() {
            return Err(ChainError::ElevationCount {
                expected: batch_indices.len(),
                got: elevations.len(),
            });
        }
        for (&i, elevation) in batch_indices.iter().zip(elevations) {
            if elevation.is_none() {
                debug!("no elevation for route index {}", points[i].route_index);
            }
            points[i].elevation = elevation;
        }
    }
    Ok(missing.len())
}

/// Fills elevations the service had no value for, interpolating
/// linearly by position between known neighbours and repeating the
/// nearest known value at the ends.
///
/// Fails if no point has an elevation.
pub fn fill_missing(points: &mut [Waypoint]) -> Result<(), ChainError> {
    let known: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.elevation.map(|e| (i, e)))
        .collect();
    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return Err(ChainError::MissingField {
            field: "elevation",
            index: 0,
        });
    };
    if known.len() == points.len() {
        return Ok(());
    }
    warn!(
        "{} points without elevation, interpolating",
        points.len() - known.len()
    );

    for point in &mut points[..first.0] {
        point.elevation = Some(first.1);
    }
    for point in &mut points[last.0 + 1..] {
        point.elevation = Some(last.1);
    }
    for pair in known.windows(2) {
        let ((i0, e0), (i1, e1)) = (pair[0], pair[1]);
        for (k, point) in points[i0 + 1..i1].iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let t = (k + 1) as f64 / (i1 - i0) as f64;
            point.elevation = Some(e0 + (e1 - e0) * t);
        }
    }
    Ok(())
}

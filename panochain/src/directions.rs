use crate::{
    source::{DirectionsRequest, DirectionsSource},
    ChainError,
};
use geo::Coord;

/// Precision used by the directions and elevation services' encoded
/// polylines.
pub const POLYLINE_PRECISION: u32 = 5;

/// Decodes a single encoded polyline into `(lat, lng)` pairs.
pub fn decode(encoded: &str) -> Result<Vec<(f64, f64)>, ChainError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| ChainError::Polyline(e.to_string()))?;
    Ok(line.coords().map(|c| (c.y, c.x)).collect())
}

/// Encodes `(lat, lng)` pairs as a polyline.
pub fn encode(coords: &[(f64, f64)]) -> Result<String, ChainError> {
    polyline::encode_coordinates(
        coords.iter().map(|&(lat, lng)| Coord { x: lng, y: lat }),
        POLYLINE_PRECISION,
    )
    .map_err(|e| ChainError::Polyline(e.to_string()))
}

/// Joins the decoded steps of a route into one vertex list.
///
/// Every step after the first starts where the previous one ended,
/// so its first vertex is dropped.
pub fn stitch_steps<S: AsRef<str>>(steps: &[S]) -> Result<Vec<(f64, f64)>, ChainError> {
    let mut vertices = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        let points = decode(step.as_ref())?;
        let skip = usize::from(i != 0);
        vertices.extend(points.into_iter().skip(skip));
    }
    Ok(vertices)
}

/// Fetches a route and returns its sparse vertices.
pub fn route_vertices<D: DirectionsSource>(
    directions: &D,
    request: &DirectionsRequest,
) -> Result<Vec<(f64, f64)>, ChainError> {
    let steps = directions.step_polylines(request)?;
    let vertices = stitch_steps(&steps)?;
    if vertices.is_empty() {
        return Err(ChainError::EmptyRoute);
    }
    Ok(vertices)
}

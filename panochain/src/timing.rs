//! Speed, per-segment durations and frame timing.

use crate::{
    config::TimingConfig,
    math::{geodesic, normalize_degrees, round_to},
    waypoint::Waypoint,
    ChainError,
};
use serde::{Deserialize, Serialize};

/// One output panorama as a renderer needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub pano_id: String,
    pub route_index: usize,

    /// Smoothed yaw, 2 decimals.
    pub heading: f64,

    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub distance_m: f64,

    /// Sum of all frame durations.
    pub duration_s: f64,
    pub frames: usize,
    pub gaps: usize,
}

/// Sets `speed = 1 + smoothed_penalty + smoothed_gradient` on every
/// point.
///
/// A speed at or below zero means the smoothing settings let the
/// penalty terms run away and is an error.
pub fn speeds(points: &mut [Waypoint]) -> Result<(), ChainError> {
    for (index, point) in points.iter_mut().enumerate() {
        let penalty = point.smoothed_penalty.ok_or(ChainError::MissingField {
            field: "smoothed_penalty",
            index,
        })?;
        let gradient = point.smoothed_gradient.ok_or(ChainError::MissingField {
            field: "smoothed_gradient",
            index,
        })?;
        let speed = 1.0 + penalty + gradient;
        if !(speed > 0.0) {
            return Err(ChainError::NonPositiveSpeed { index, speed });
        }
        point.speed = Some(speed);
    }
    Ok(())
}

/// Sets the length and duration of every segment, at the speed of its
/// start point. The last point has a zero-length segment.
pub fn segments(points: &mut [Waypoint], config: &TimingConfig) -> Result<(), ChainError> {
    for i in 0..points.len() {
        let speed = points[i].speed.ok_or(ChainError::MissingField {
            field: "speed",
            index: i,
        })?;
        let segment_m = points
            .get(i + 1)
            .map_or(0.0, |next| geodesic::distance(points[i].coord(), next.coord()));
        points[i].segment_m = Some(segment_m);
        points[i].segment_s = Some(segment_m / (config.base_speed_mps * speed));
    }
    Ok(())
}

/// Folds segment durations into one frame per panorama.
///
/// A frame lasts from its panorama up to the next one, gap points in
/// between included. The last frame repeats the duration of the one
/// before it.
pub fn frames(points: &[Waypoint]) -> Result<(Vec<Frame>, Summary), ChainError> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut summary = Summary::default();
    for (index, point) in points.iter().enumerate() {
        let segment_s = point.segment_s.ok_or(ChainError::MissingField {
            field: "segment_s",
            index,
        })?;
        summary.distance_m += point.segment_m.unwrap_or(0.0);
        match &point.pano_id {
            Some(pano_id) => {
                let heading = point.smoothed_yaw.ok_or(ChainError::MissingField {
                    field: "smoothed_yaw",
                    index,
                })?;
                frames.push(Frame {
                    pano_id: pano_id.clone(),
                    route_index: point.route_index,
                    heading: normalize_degrees(round_to(heading, 2)),
                    duration: segment_s,
                });
            }
            None => {
                summary.gaps += 1;
                if let Some(frame) = frames.last_mut() {
                    frame.duration += segment_s;
                }
            }
        }
    }
    if let [.., before, last] = frames.as_mut_slice() {
        last.duration = before.duration;
    }
    summary.frames = frames.len();
    summary.duration_s = frames.iter().map(|f| f.duration).sum();
    Ok((frames, summary))
}

//! Derived per-point signals, computed and smoothed in dependency
//! order.

use crate::{
    config::{SmoothingConfig, TimingConfig},
    math::{geodesic, normalize_degrees, round_to, signed_delta},
    smooth::{smooth, Kernel, Mode},
    waypoint::Waypoint,
    ChainError,
};
use log::debug;

/// Sets every point's yaw to the bearing towards the next point,
/// rounded to 4 decimals.
///
/// The last point takes the arrival bearing of the final segment and a
/// lone point faces north. A zero-length segment keeps the previous
/// point's yaw.
pub fn assign_yaws(points: &mut [Waypoint]) {
    let mut previous = 0.0;
    for i in 0..points.len() {
        let yaw = match (i.checked_sub(1).and_then(|p| points.get(p)), points.get(i + 1)) {
            (_, Some(next)) if next.coord() != points[i].coord() => {
                geodesic::bearing(points[i].coord(), next.coord())
            }
            (Some(prev), None) if prev.coord() != points[i].coord() => {
                geodesic::final_bearing(prev.coord(), points[i].coord())
            }
            _ => previous,
        };
        let yaw = normalize_degrees(round_to(yaw, 4));
        points[i].yaw = Some(yaw);
        previous = yaw;
    }
}

/// Runs the smoothing stages over points that already carry yaw and
/// elevation:
///
/// 1. smoothed yaw
/// 2. yaw delta from smoothed yaw, smoothed elevation
/// 3. gradient from smoothed elevation, smoothed yaw delta
/// 4. smoothed gradient
/// 5. turn penalty from smoothed yaw delta, smoothed penalty
pub fn derive(
    points: &mut [Waypoint],
    smoothing: &SmoothingConfig,
    timing: &TimingConfig,
) -> Result<(), ChainError> {
    let yaw = Kernel::new(smoothing.yaw)?;
    let elevation = Kernel::new(smoothing.elevation)?;
    let yaw_delta = Kernel::new(smoothing.yaw_delta)?;
    let gradient = Kernel::new(smoothing.gradient)?;
    let penalty = Kernel::new(smoothing.penalty)?;

    smooth(points, "yaw", &yaw, Mode::Circular, |p| p.yaw, |p, v| {
        p.smoothed_yaw = Some(v);
    })?;

    yaw_deltas(points);
    smooth(
        points,
        "elevation",
        &elevation,
        Mode::Linear,
        |p| p.elevation,
        |p, v| p.smoothed_elevation = Some(v),
    )?;

    gradients(points);
    smooth(
        points,
        "yaw_delta",
        &yaw_delta,
        Mode::Linear,
        |p| p.yaw_delta,
        |p, v| p.smoothed_yaw_delta = Some(v),
    )?;

    smooth(
        points,
        "gradient",
        &gradient,
        Mode::Linear,
        |p| p.gradient,
        |p, v| p.smoothed_gradient = Some(v),
    )?;

    for point in points.iter_mut() {
        point.penalty = point
            .smoothed_yaw_delta
            .map(|d| -(d * d) / timing.turn_penalty_divisor);
    }
    smooth(
        points,
        "penalty",
        &penalty,
        Mode::Linear,
        |p| p.penalty,
        |p, v| p.smoothed_penalty = Some(v),
    )?;

    debug!("derived signals for {} points", points.len());
    Ok(())
}

/// Signed change of smoothed yaw to the next point; zero at the end.
fn yaw_deltas(points: &mut [Waypoint]) {
    for i in 0..points.len() {
        let next = points.get(i + 1).and_then(|p| p.smoothed_yaw);
        points[i].yaw_delta = match (points[i].smoothed_yaw, next) {
            (Some(here), Some(next)) => Some(signed_delta(here, next)),
            (Some(_), None) => Some(0.0),
            (None, _) => None,
        };
    }
}

/// Smoothed elevation drop per meter to the next point.
///
/// Zero-length segments have no gradient, and the last point repeats
/// the one before it.
fn gradients(points: &mut [Waypoint]) {
    for i in 0..points.len() {
        let gradient = match (points[i].smoothed_elevation, points.get(i + 1)) {
            (Some(here), Some(next)) => {
                let distance_m = geodesic::distance(points[i].coord(), next.coord());
                match next.smoothed_elevation {
                    Some(there) if distance_m > 0.0 => Some((here - there) / distance_m),
                    Some(_) => Some(0.0),
                    None => None,
                }
            }
            (Some(_), None) => Some(
                i.checked_sub(1)
                    .and_then(|prev| points[prev].gradient)
                    .unwrap_or(0.0),
            ),
            (None, _) => None,
        };
        points[i].gradient = gradient;
    }
}

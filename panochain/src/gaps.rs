//! Synthetic points between panoramas that are too far apart.

use crate::{config::GapConfig, math::geodesic, route::Route, waypoint::Waypoint};
use log::{debug, info};

/// Returns `points` with gap points inserted between every
/// consecutive pair further apart than `config.threshold_m`.
///
/// The pair's route index span is split into `round(span /
/// index_step)` parts and a gap point is placed on the route at each
/// inner split. Already filled sequences come back unchanged.
pub fn fill_gaps(points: &[Waypoint], route: &Route, config: &GapConfig) -> Vec<Waypoint> {
    let mut filled = Vec::with_capacity(points.len());
    let mut inserted = 0;
    for (i, point) in points.iter().enumerate() {
        filled.push(point.clone());
        let Some(next) = points.get(i + 1) else {
            break;
        };
        let distance_m = geodesic::distance(point.coord(), next.coord());
        if distance_m <= config.threshold_m {
            continue;
        }
        let (start, span) = (
            point.route_index,
            next.route_index.saturating_sub(point.route_index),
        );
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let parts = (span as f64 / config.index_step as f64).round() as usize;
        if parts < 2 {
            continue;
        }
        debug!(
            "{distance_m:.1}m gap between route index {start} and {}, {} points",
            next.route_index,
            parts - 1
        );
        for j in 1..parts {
            let index = start + span * j / parts;
            if let Some(route_point) = route.get(index) {
                filled.push(Waypoint::gap(route_point));
                inserted += 1;
            }
        }
    }
    info!("inserted {inserted} gap points");
    filled
}

#[cfg(test)]
mod tests {
    use super::fill_gaps;
    use crate::{config::GapConfig, fixtures, waypoint::Waypoint};

    fn panos_at(route: &crate::route::Route, indices: &[usize]) -> Vec<Waypoint> {
        indices
            .iter()
            .map(|&i| {
                let mut pano = fixtures::pano(&format!("p{i}"), i);
                (pano.lat, pano.lng) = route.get(i).unwrap().coord();
                Waypoint::from_pano(&pano)
            })
            .collect()
    }

    #[test]
    fn test_fills_fifty_meter_gap() {
        let route = fixtures::straight_route(60.0, 1.0);
        let points = panos_at(&route, &[0, 50]);
        let filled = fill_gaps(&points, &route, &GapConfig::default());
        let indices: Vec<usize> = filled.iter().map(|p| p.route_index).collect();
        assert_eq!(indices, [0, 10, 20, 30, 40, 50]);
        assert!(!filled[0].is_gap());
        assert!(filled[1..5].iter().all(Waypoint::is_gap));
        assert_eq!(filled[2].coord(), route.get(20).unwrap().coord());
    }

    #[test]
    fn test_close_points_untouched() {
        let route = fixtures::straight_route(60.0, 1.0);
        let points = panos_at(&route, &[0, 15, 30, 45]);
        let filled = fill_gaps(&points, &route, &GapConfig::default());
        assert_eq!(filled, points);
    }

    #[test]
    fn test_idempotent() {
        let route = fixtures::straight_route(300.0, 1.0);
        let points = panos_at(&route, &[0, 37, 41, 163, 180, 297]);
        let config = GapConfig::default();
        let once = fill_gaps(&points, &route, &config);
        assert!(once.len() > points.len());
        let twice = fill_gaps(&once, &route, &config);
        assert_eq!(once, twice);

        let coarse = fixtures::straight_route(300.0, 4.0);
        let points = panos_at(&coarse, &[0, 9, 31, 75]);
        let once = fill_gaps(&points, &coarse, &config);
        assert_eq!(fill_gaps(&once, &coarse, &config), once);
    }
}

//! Everything after the walk: gap filling, elevation, smoothing and
//! timing.

use crate::{
    config::Config,
    elevation, gaps,
    pano::Panorama,
    route::Route,
    signals,
    source::ElevationSource,
    timing::{self, Frame, Summary},
    waypoint::Waypoint,
    ChainError,
};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flythrough {
    pub waypoints: Vec<Waypoint>,
    pub frames: Vec<Frame>,
    pub summary: Summary,
}

impl Flythrough {
    /// Builds the flythrough for `panoramas`, the walk's filtered
    /// output, over the route they were walked on.
    pub fn build<E: ElevationSource>(
        panoramas: &[Panorama],
        route: &Route,
        elevations: &E,
        config: &Config,
    ) -> Result<Self, ChainError> {
        config.validate()?;
        if panoramas.is_empty() {
            return Err(ChainError::EmptyChain);
        }

        let output: Vec<Waypoint> = panoramas.iter().map(Waypoint::from_pano).collect();
        let mut waypoints = gaps::fill_gaps(&output, route, &config.gaps);
        signals::assign_yaws(&mut waypoints);

        elevation::augment(&mut waypoints, elevations, &config.elevation)?;
        elevation::fill_missing(&mut waypoints)?;

        signals::derive(&mut waypoints, &config.smoothing, &config.timing)?;
        timing::speeds(&mut waypoints)?;
        timing::segments(&mut waypoints, &config.timing)?;
        let (frames, summary) = timing::frames(&waypoints)?;

        info!(
            "{} frames, {} gap points, {:.0}m in {:.1}s",
            summary.frames, summary.gaps, summary.distance_m, summary.duration_s
        );
        Ok(Self {
            waypoints,
            frames,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Flythrough;
    use crate::{
        chain::{ChainRules, MemoryStore},
        config::Config,
        fixtures::{self, PanoGraph, Terrain},
        math::geodesic,
        pano::Panorama,
        route::Route,
        walker::Walker,
        ChainError,
    };
    use approx::assert_relative_eq;

    #[test]
    fn test_walk_then_flythrough() {
        let route = fixtures::straight_route(300.0, 1.0);
        let mut graph = PanoGraph::along(&route, 10, 1.0);
        graph.remove_where(|i| (110..=150).contains(&i));
        graph.set_elevation(0, 500.0);

        let rules = ChainRules {
            excluded: [graph.id_at(200), graph.id_at(210)].into_iter().collect(),
            ..ChainRules::default()
        };
        let config = Config::default();
        let mut walker = Walker::builder()
            .route(&route)
            .source(&graph)
            .store(MemoryStore::default())
            .rules(rules.clone())
            .config(config.walk.clone())
            .build()
            .unwrap();
        let (traversal, _) = walker.run().unwrap();
        let panoramas = traversal.chain().filtered(&rules);
        assert!(panoramas.iter().all(|p| p.id != graph.id_at(200)));

        let terrain = Terrain::new(|_| Some(500.0));
        let flythrough = Flythrough::build(&panoramas, &route, &terrain, &config).unwrap();

        assert_eq!(flythrough.frames.len(), panoramas.len());
        // 60m across the missing panoramas, 30m across the excluded
        // ones.
        assert_eq!(flythrough.summary.gaps, 5 + 2);
        assert_eq!(
            terrain.requested(),
            flythrough.waypoints.len() - 1,
            "the first panorama already had an elevation"
        );
        assert_relative_eq!(flythrough.summary.distance_m, 300.0, epsilon = 2.0);
        // Flat, so nothing runs faster than the base speed over the
        // 10m between panoramas.
        for frame in &flythrough.frames {
            assert!(frame.duration > 0.95, "{frame:?}");
        }
        let indices: Vec<usize> = flythrough.waypoints.iter().map(|w| w.route_index).collect();
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_right_angle_corner() {
        // 200m north, then 200m east, a panorama every 10m.
        let corner = geodesic::destination(fixtures::ORIGIN, 0.0, 200.0);
        let end = geodesic::destination(corner, 90.0, 200.0);
        let route = Route::densify(&[fixtures::ORIGIN, corner, end], 1.0).unwrap();
        let panoramas: Vec<Panorama> = route
            .points()
            .iter()
            .step_by(10)
            .map(|p| Panorama {
                id: format!("pano-{}", p.index),
                lat: p.lat,
                lng: p.lng,
                description: String::new(),
                elevation: None,
                links: vec![],
                route_index: p.index,
            })
            .collect();
        assert_eq!(panoramas.len(), 41);

        let terrain = Terrain::new(|_| Some(100.0));
        let flythrough =
            Flythrough::build(&panoramas, &route, &terrain, &Config::default()).unwrap();

        assert_eq!(flythrough.summary.gaps, 0);
        let speeds: Vec<f64> = flythrough.waypoints.iter().map(|w| w.speed.unwrap()).collect();
        let slowest = speeds.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(slowest > 0.5, "{slowest}");
        assert!(slowest < 0.95, "{slowest}");
        // The corner is slower than the straight either side of it.
        assert!(flythrough.frames[20].duration > flythrough.frames[2].duration);
        assert!(flythrough.frames[20].duration > flythrough.frames[38].duration);
    }

    #[test]
    fn test_empty_chain() {
        let route = fixtures::straight_route(10.0, 1.0);
        let terrain = Terrain::new(|_| Some(0.0));
        assert!(matches!(
            Flythrough::build(&[], &route, &terrain, &Config::default()),
            Err(ChainError::EmptyChain)
        ));
    }
}

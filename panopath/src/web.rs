//! Data file for the web viewer.

use geo::{BoundingRect, MultiPoint, Point};
use panochain::Flythrough;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub southwest: LatLng,
    pub northeast: LatLng,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebInfo {
    pub title: String,
    pub bounds: Option<Bounds>,

    /// `[lat, lng]`
    pub route_points: Vec<[f64; 2]>,

    /// `[time_s, distance_m, lat, lng, elevation]` at the start of
    /// every frame.
    pub video_points: Vec<[f64; 5]>,
}

impl WebInfo {
    pub fn new(title: String, vertices: &[(f64, f64)], flythrough: &Flythrough) -> Self {
        let bounds = vertices
            .iter()
            .map(|&(lat, lng)| Point::new(lng, lat))
            .collect::<MultiPoint<f64>>()
            .bounding_rect()
            .map(|rect| Bounds {
                southwest: LatLng {
                    lat: rect.min().y,
                    lng: rect.min().x,
                },
                northeast: LatLng {
                    lat: rect.max().y,
                    lng: rect.max().x,
                },
            });

        let mut video_points = Vec::with_capacity(flythrough.frames.len());
        let (mut time_s, mut distance_m) = (0.0, 0.0);
        let mut frames = flythrough.frames.iter();
        let mut frame = frames.next();
        for waypoint in &flythrough.waypoints {
            if let (Some(current), Some(pano_id)) = (frame, &waypoint.pano_id) {
                if &current.pano_id == pano_id {
                    video_points.push([
                        time_s,
                        distance_m,
                        waypoint.lat,
                        waypoint.lng,
                        waypoint
                            .smoothed_elevation
                            .or(waypoint.elevation)
                            .unwrap_or_default(),
                    ]);
                    time_s += current.duration;
                    frame = frames.next();
                }
            }
            distance_m += waypoint.segment_m.unwrap_or_default();
        }

        Self {
            title,
            bounds,
            route_points: vertices.iter().map(|&(lat, lng)| [lat, lng]).collect(),
            video_points,
        }
    }
}

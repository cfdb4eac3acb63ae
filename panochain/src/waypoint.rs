use crate::{pano::Panorama, route::RoutePoint};
use serde::{Deserialize, Serialize};

/// One point of the gap-filled sequence, either an output panorama or
/// a synthetic gap point, with every derived value attached as it is
/// computed.
///
/// `None` means "not computed yet".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// `None` for gap points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pano_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub route_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_yaw: Option<f64>,

    /// Signed change of smoothed yaw to the next point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_yaw_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_elevation: Option<f64>,

    /// Elevation drop per meter to the next point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_gradient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Distance to the next point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_m: Option<f64>,

    /// Time spent on the segment to the next point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_s: Option<f64>,
}

impl Waypoint {
    pub fn from_pano(pano: &Panorama) -> Self {
        Self {
            pano_id: Some(pano.id.clone()),
            description: Some(pano.description.clone()),
            lat: pano.lat,
            lng: pano.lng,
            route_index: pano.route_index,
            elevation: pano.elevation,
            ..Self::default()
        }
    }

    pub fn gap(point: &RoutePoint) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            route_index: point.index,
            ..Self::default()
        }
    }

    pub fn is_gap(&self) -> bool {
        self.pano_id.is_none()
    }

    pub fn coord(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

use serde::{Deserialize, Serialize};

/// An edge to an adjacent panorama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "panoId")]
    pub pano_id: String,

    /// Heading, in degrees `[0, 360)`, a viewer faces to reach
    /// `pano_id`.
    pub yaw: f64,
}

/// Panorama metadata as returned by a [`PanoSource`](crate::PanoSource).
#[derive(Debug, Clone, PartialEq)]
pub struct PanoMeta {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub description: String,

    /// WGS84 elevation in meters, when the service provides one.
    pub elevation: Option<f64>,
    pub links: Vec<Link>,
}

/// A panorama accepted into the chain.
///
/// Field names match the on-disk chain format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panorama {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub description: String,

    #[serde(rename = "elv", default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    pub links: Vec<Link>,

    /// Index of the nearest route point.
    #[serde(rename = "i")]
    pub route_index: usize,
}

impl Panorama {
    pub fn new(meta: PanoMeta, route_index: usize) -> Self {
        let PanoMeta {
            id,
            lat,
            lng,
            description,
            elevation,
            links,
        } = meta;
        Self {
            id,
            lat,
            lng,
            description,
            elevation,
            links,
            route_index,
        }
    }

    pub fn coord(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid configuration, {0}")]
    Config(String),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("panorama {pano_id} at route index {route_index} does not fit the current route, {reason}")]
    Resume {
        pano_id: String,
        route_index: usize,
        reason: String,
    },

    #[error("route has no points")]
    EmptyRoute,

    #[error("chain has no panoramas")]
    EmptyChain,

    #[error("invalid polyline, {0}")]
    Polyline(String),

    #[error("elevation service returned {got} values for {expected} locations")]
    ElevationCount { expected: usize, got: usize },

    #[error("{field} missing at point {index}")]
    MissingField { field: &'static str, index: usize },

    #[error("non-positive speed {speed} at point {index}")]
    NonPositiveSpeed { index: usize, speed: f64 },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{1:?}: {0}")]
    Json(serde_json::Error, PathBuf),
}

/// Which external service a request was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Directions,
    Panorama,
    Elevation,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Directions => "directions",
            Self::Panorama => "panorama",
            Self::Elevation => "elevation",
        };
        f.write_str(name)
    }
}

/// A whole-request failure from one of the external services.
#[derive(Error, Debug)]
#[error("{service} request failed: {source}")]
pub struct FetchError {
    pub service: Service,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl FetchError {
    pub fn new<E>(service: Service, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            service,
            source: source.into(),
        }
    }
}

mod chain;
mod config;
mod directions;
mod elevation;
mod error;
mod flythrough;
mod gaps;
pub mod math;
mod pano;
mod route;
mod signals;
mod smooth;
mod source;
mod timing;
mod walker;
mod waypoint;

#[cfg(test)]
mod fixtures;

pub use crate::{
    chain::{Chain, ChainRules, ChainStore, JsonChainStore, MemoryStore},
    config::{
        Config, ElevationConfig, GapConfig, RejectPolicy, SmoothingConfig, TimingConfig,
        WalkConfig, Window,
    },
    directions::{decode, encode, route_vertices, stitch_steps},
    elevation::{augment as augment_elevations, fill_missing as fill_missing_elevations},
    error::{ChainError, FetchError, Service},
    flythrough::Flythrough,
    gaps::fill_gaps,
    pano::{Link, PanoMeta, Panorama},
    route::{Route, RoutePoint},
    signals::{assign_yaws, derive as derive_signals},
    smooth::{smooth, smooth_values, Kernel, Mode},
    source::{DirectionsRequest, DirectionsSource, ElevationBatch, ElevationSource, PanoSource},
    timing::{Frame, Summary},
    walker::{
        select_link, CancelToken, Rejection, Traversal, WalkOutcome, WalkState, Walker,
        WalkerBuilder,
    },
    waypoint::Waypoint,
};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Resolve a route into a smoothed chain of street-level panoramas.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Route directory. Must contain at least `source.json`.
    pub dir: PathBuf,

    /// Output DEBUG messages.
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Key sent with every service request.
    #[arg(long, env = "PANOPATH_API_KEY")]
    pub api_key: Option<String>,

    /// Directions service endpoint.
    #[arg(
        long,
        default_value = "https://maps.googleapis.com/maps/api/directions/json"
    )]
    pub directions_url: String,

    /// Panorama metadata service endpoint.
    #[arg(long, default_value = "https://cbks0.googleapis.com/cbk")]
    pub pano_url: String,

    /// Elevation service endpoint.
    #[arg(
        long,
        default_value = "https://maps.googleapis.com/maps/api/elevation/json"
    )]
    pub elevation_url: String,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum Command {
    /// Fetch (or load the cached) route and densify it.
    Route,

    /// Walk the panorama graph along the route, resuming from
    /// `panos.json`.
    Walk,

    /// Fill gaps, attach elevations and compute headings and timing.
    Flythrough,

    /// Walk, then build the flythrough.
    All,
}

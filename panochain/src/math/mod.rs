mod angle;
pub mod geodesic;

pub use angle::{circular_diff, normalize_degrees, round_to, signed_delta, wrap_to_closest};

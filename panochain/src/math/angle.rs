use num_traits::{Float, FromPrimitive};

fn full_turn<T: Float + FromPrimitive>() -> T {
    T::from_f64(360.0).unwrap_or_else(T::zero)
}

/// Returns `deg` normalized into `[0, 360)`.
pub fn normalize_degrees<T>(deg: T) -> T
where
    T: Float + FromPrimitive,
{
    let turn = full_turn::<T>();
    let wrapped = deg % turn;
    let wrapped = if wrapped < T::zero() {
        wrapped + turn
    } else {
        wrapped
    };
    // `-1e-20 % 360 + 360` rounds up to exactly 360.
    if wrapped >= turn {
        T::zero()
    } else {
        wrapped
    }
}

/// Returns the unsigned angular distance between two headings, in
/// `[0, 180]`.
pub fn circular_diff<T>(a: T, b: T) -> T
where
    T: Float + FromPrimitive,
{
    let turn = full_turn::<T>();
    let d = (normalize_degrees(a) - normalize_degrees(b)).abs();
    d.min(turn - d)
}

/// Returns whichever of `deg`, `deg + 360` or `deg - 360` is closest
/// to `to_deg`.
pub fn wrap_to_closest<T>(deg: T, to_deg: T) -> T
where
    T: Float + FromPrimitive,
{
    let turn = full_turn::<T>();
    [deg, deg + turn, deg - turn]
        .into_iter()
        .fold(deg, |best, candidate| {
            if (to_deg - candidate).abs() < (to_deg - best).abs() {
                candidate
            } else {
                best
            }
        })
}

/// Returns the signed turn from `from` to `to`, in `(-180, 180]` for
/// normalized inputs.
pub fn signed_delta<T>(from: T, to: T) -> T
where
    T: Float + FromPrimitive,
{
    wrap_to_closest(to, from) - from
}

/// Rounds `value` to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10_f64.powi(digits);
    (value * scale).round() / scale
}

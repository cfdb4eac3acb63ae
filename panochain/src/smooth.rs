//! Weighted moving average over a field of a sequence.

use crate::{
    config::Window,
    math::{normalize_degrees, wrap_to_closest},
    ChainError,
};

/// How neighbouring values relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Linear,

    /// Degrees on a circle; 359° and 1° are 2° apart.
    Circular,
}

/// Triangular weights.
///
/// For half window `n` and offset `z` the weights are
/// `z, z+1, …, n+z-1, n+z-1, …, z+1, z`, applied to the values at
/// `i-n … i+n-1` when smoothing index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f64>,
    before: usize,
    sum: f64,
}

impl Kernel {
    pub fn new(window: Window) -> Result<Self, ChainError> {
        let Window {
            half_window: n,
            offset: z,
        } = window;
        #[allow(clippy::cast_precision_loss)]
        let weights: Vec<f64> = (z..n + z)
            .chain((z..n + z).rev())
            .map(|w| w as f64)
            .collect();
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            return Err(ChainError::Config(format!(
                "smoothing window {n}/{z} has no weight"
            )));
        }
        Ok(Self {
            weights,
            before: n,
            sum,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn apply(&self, values: &[f64], i: usize, mode: Mode) -> f64 {
        let last = values.len() - 1;
        let center = values[i];
        let acc: f64 = self
            .weights
            .iter()
            .enumerate()
            .map(|(k, w)| {
                // Clamp to the ends: edge values are repeated.
                let j = (i + k).saturating_sub(self.before).min(last);
                let v = match mode {
                    Mode::Linear => values[j],
                    Mode::Circular => wrap_to_closest(values[j], center),
                };
                w * v
            })
            .sum();
        let avg = acc / self.sum;
        match mode {
            Mode::Linear => avg,
            Mode::Circular => normalize_degrees(avg),
        }
    }
}

/// Smooths one field of `items` in place.
///
/// `get` reads the input value of each item and `set` stores the
/// smoothed result. All inputs are read before anything is written, so
/// `get` and `set` may refer to the same field.
pub fn smooth<T, G, S>(
    items: &mut [T],
    field: &'static str,
    kernel: &Kernel,
    mode: Mode,
    get: G,
    mut set: S,
) -> Result<(), ChainError>
where
    G: Fn(&T) -> Option<f64>,
    S: FnMut(&mut T, f64),
{
    let values = items
        .iter()
        .enumerate()
        .map(|(index, item)| get(item).ok_or(ChainError::MissingField { field, index }))
        .collect::<Result<Vec<f64>, _>>()?;
    for (i, item) in items.iter_mut().enumerate() {
        set(item, kernel.apply(&values, i, mode));
    }
    Ok(())
}

/// Convenience wrapper for plain `f64` slices.
pub fn smooth_values(values: &[f64], kernel: &Kernel, mode: Mode) -> Vec<f64> {
    (0..values.len())
        .map(|i| kernel.apply(values, i, mode))
        .collect()
}

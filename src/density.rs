//! The density field `h(x, y)` that controls local point spacing (spec §3,
//! §4.4 `set_density`). Larger `h` means denser packing at that location.

use crate::error::EngineError;

/// A positive scalar field over the normalized `[0, 1]^2` plane.
///
/// Stored as a boxed closure rather than a parsed expression tree: the
/// engine only ever needs cheap pointwise evaluation (spec §9), and letting
/// the embedding layer supply either a closure or a compiled expression
/// evaluator is its own concern, out of scope for the core.
pub struct DensityField {
    eval: Box<dyn Fn(f64, f64) -> f64 + Send + Sync>,
}

impl DensityField {
    /// The default density field, constant `h ≡ 1`.
    pub fn constant() -> DensityField {
        DensityField {
            eval: Box::new(|_, _| 1.0),
        }
    }

    /// Installs a new density function, validating that it stays positive at
    /// a small grid of sample points.
    ///
    /// A field that goes non-positive somewhere in the sampled grid is
    /// rejected with [`EngineError::InvalidConfiguration`]; fields can still
    /// go non-positive at points the sample grid misses, since this is a
    /// best-effort sanity check, not an exhaustive proof of positivity.
    pub fn new<F>(f: F) -> Result<DensityField, EngineError>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        const SAMPLES: usize = 9;
        for i in 0..SAMPLES {
            for j in 0..SAMPLES {
                let x = i as f64 / (SAMPLES - 1) as f64;
                let y = j as f64 / (SAMPLES - 1) as f64;
                let v = f(x, y);
                if !(v.is_finite() && v > 0.0) {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "density function is not positive at ({x}, {y}): got {v}"
                    )));
                }
            }
        }
        Ok(DensityField { eval: Box::new(f) })
    }

    /// Evaluates `h(x, y)`.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        (self.eval)(x, y)
    }
}

impl Default for DensityField {
    fn default() -> Self {
        DensityField::constant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_density_is_one() {
        let h = DensityField::constant();
        assert_eq!(h.eval(0.3, 0.7), 1.0);
    }

    #[test]
    fn non_positive_density_is_rejected() {
        let h = DensityField::new(|x, _y| x - 0.5);
        assert!(h.is_err());
    }

    #[test]
    fn positive_density_is_accepted() {
        let h = DensityField::new(|x, _y| 1.0 + 4.0 * x);
        assert!(h.is_ok());
    }
}

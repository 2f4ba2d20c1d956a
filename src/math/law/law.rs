use std::fmt;
use std::sync::Arc;

/// A per-segment rule mapping calendar time to an output value.
///
/// Laws know nothing about their neighbours: continuity between segments is
/// the job of the compositor. `Send + Sync` lets a configured model be shared
/// between reader threads.
pub trait Law: Send + Sync {
    fn evaluate(&self, t: f64) -> f64;

    fn evaluate_many(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.evaluate(t)).collect()
    }
}

pub type SharedLaw = Arc<dyn Law>;

/// Adapter turning any closure into a [`Law`].
pub struct FnLaw<F> {
    function: F,
}

impl<F> FnLaw<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    pub fn new(function: F) -> FnLaw<F> {
        FnLaw { function }
    }
}

impl<F> Law for FnLaw<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn evaluate(&self, t: f64) -> f64 {
        (self.function)(t)
    }
}

impl<F> fmt::Debug for FnLaw<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnLaw")
    }
}

pub fn law_fn<F>(function: F) -> SharedLaw
where
    F: Fn(f64) -> f64 + Send + Sync + 'static,
{
    Arc::new(FnLaw::new(function))
}

/// Uniform decay: radiometric age equals calendar age.
pub fn uniform_law() -> SharedLaw {
    law_fn(|t| t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_law_evaluates_pointwise() {
        let law = law_fn(|t| 2.0 * t + 1.0);
        assert_eq!(law.evaluate(3.0), 7.0);
        assert_eq!(law.evaluate_many(&[0.0, 1.0, 2.0]), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn uniform_law_is_identity() {
        let law = uniform_law();
        assert_eq!(law.evaluate(0.0), 0.0);
        assert_eq!(law.evaluate(4321.5), 4321.5);
    }
}

use crate::math::law::law::SharedLaw;
use crate::math::piecewise::forwardevaluator::ForwardEvaluator;
use crate::math::piecewise::segmentlawset::SegmentLawSet;
use crate::rtferror::{
    Result,
    RtfError
};

pub const DEFAULT_POINTS_PER_SEGMENT: usize = 100;

/// Estimates the acceleration factor Ξ = dH/dt.
#[derive(Clone, Debug)]
pub enum DerivativeEstimator {
    /// Forward differences of H. The last sample has no successor and is
    /// dropped from the output.
    ForwardDifference,
    /// User-supplied piecewise derivative laws over the time tiepoints.
    /// Offsets are constant per segment and do not enter the derivative.
    Analytic(SegmentLawSet),
}

impl DerivativeEstimator {
    pub fn analytic(forward: &ForwardEvaluator, laws: Vec<SharedLaw>) -> Result<DerivativeEstimator> {
        let segments = forward.segments();
        if laws.len() != segments.len() {
            return Err(RtfError::configuration(format!(
                "the number of laws ({}) and derivatives ({}) must be the same",
                segments.len(),
                laws.len()
            )));
        }
        let set = SegmentLawSet::with_bounds(segments.tiepoints().to_vec(), laws)?;
        Ok(DerivativeEstimator::Analytic(set))
    }

    pub fn is_analytic(&self) -> bool {
        matches!(self, DerivativeEstimator::Analytic(_))
    }

    /// `points` evenly spaced samples in every segment (right end excluded),
    /// followed by the domain maximum. Every segment gets the same density
    /// regardless of its width.
    pub fn sample_points(tiepoints: &[f64], points: usize) -> Vec<f64> {
        let mut samples = Vec::with_capacity(points * tiepoints.len().saturating_sub(1) + 1);
        for pair in tiepoints.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let step = (b - a) / points as f64;
            samples.extend((0..points).map(|k| a + step * k as f64));
        }
        if let Some(&last) = tiepoints.last() {
            samples.push(last);
        }
        samples
    }

    /// Returns the sample times actually used and Ξ at each of them.
    ///
    /// Without explicit `times` the domain is sampled with
    /// [`sample_points`](Self::sample_points).
    pub fn estimate(
        &self,
        forward: &ForwardEvaluator,
        times: Option<&[f64]>,
        points: usize,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let samples = match times {
            Some(times) => times.to_vec(),
            None => Self::sample_points(forward.segments().tiepoints(), points),
        };

        match self {
            DerivativeEstimator::ForwardDifference => {
                if let Some(pair) = samples.windows(2).find(|pair| !(pair[0] < pair[1])) {
                    return Err(RtfError::configuration(format!(
                        "forward difference needs strictly increasing sample times, got {} then {}",
                        pair[0], pair[1]
                    )));
                }
                let values = forward.values(&samples)?;
                let rates: Vec<f64> = samples
                    .windows(2)
                    .zip(values.windows(2))
                    .map(|(t, h)| (h[1] - h[0]) / (t[1] - t[0]))
                    .collect();
                let mut samples = samples;
                samples.truncate(rates.len());
                Ok((samples, rates))
            }
            DerivativeEstimator::Analytic(set) => {
                if let Some(&t) = samples.iter().find(|&&t| !set.contains(t)) {
                    return Err(RtfError::Domain { time: t, min: set.min(), max: set.max() });
                }
                let rates = samples
                    .iter()
                    .map(|&t| set.law(set.find_segment(t)).evaluate(t))
                    .collect();
                Ok((samples, rates))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::law::law::{
        law_fn,
        uniform_law
    };
    use crate::math::piecewise::continuitycompositor::ContinuityCompositor;

    fn two_law() -> ForwardEvaluator {
        ForwardEvaluator::new(
            ContinuityCompositor::compose(&[100.0], vec![uniform_law(), law_fn(|t| 10.0 * t)], 200.0)
                .unwrap(),
        )
    }

    #[test]
    fn samples_have_equal_density_per_segment() {
        let samples = DerivativeEstimator::sample_points(&[0.0, 100.0, 200.0], 4);
        assert_eq!(samples, vec![0.0, 25.0, 50.0, 75.0, 100.0, 125.0, 150.0, 175.0, 200.0]);

        let uneven = DerivativeEstimator::sample_points(&[0.0, 10.0, 1000.0], 2);
        assert_eq!(uneven, vec![0.0, 5.0, 10.0, 505.0, 1000.0]);
    }

    #[test]
    fn forward_difference_drops_last_sample() {
        let h = two_law();
        let (times, rates) = DerivativeEstimator::ForwardDifference.estimate(&h, None, 4).unwrap();
        assert_eq!(times.len(), 8);
        assert_eq!(rates.len(), 8);
        assert_eq!(times.last(), Some(&175.0));
        assert!((rates[0] - 1.0).abs() < 1e-12);
        assert!((rates[7] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn forward_difference_with_explicit_times() {
        let h = two_law();
        let (times, rates) = DerivativeEstimator::ForwardDifference
            .estimate(&h, Some(&[120.0, 120.5]), DEFAULT_POINTS_PER_SEGMENT)
            .unwrap();
        assert_eq!(times, vec![120.0]);
        assert!((rates[0] - 10.0).abs() < 1e-9);

        let (times, rates) = DerivativeEstimator::ForwardDifference
            .estimate(&h, Some(&[50.0]), DEFAULT_POINTS_PER_SEGMENT)
            .unwrap();
        assert!(times.is_empty() && rates.is_empty());
    }

    #[test]
    fn analytic_derivative_selects_segment_without_offset() {
        let h = two_law();
        let estimator = DerivativeEstimator::analytic(
            &h,
            vec![law_fn(|_| 1.0), law_fn(|_| 10.0)],
        )
        .unwrap();
        assert!(estimator.is_analytic());
        let (times, rates) = estimator.estimate(&h, Some(&[0.0, 99.0, 100.0, 200.0]), 100).unwrap();
        assert_eq!(times.len(), 4);
        assert_eq!(rates, vec![1.0, 1.0, 10.0, 10.0]);
    }

    #[test]
    fn analytic_derivative_keeps_all_default_samples() {
        let h = two_law();
        let estimator = DerivativeEstimator::analytic(&h, vec![law_fn(|_| 1.0), law_fn(|_| 10.0)]).unwrap();
        let (times, rates) = estimator.estimate(&h, None, 10).unwrap();
        assert_eq!(times.len(), 21);
        assert_eq!(rates.len(), 21);
    }

    #[test]
    fn analytic_derivative_count_must_match() {
        let h = two_law();
        let result = DerivativeEstimator::analytic(&h, vec![law_fn(|_| 1.0)]);
        assert!(matches!(result, Err(RtfError::Configuration(_))));
    }

    #[test]
    fn forward_difference_rejects_repeated_or_unordered_times() {
        let h = two_law();
        let repeated = DerivativeEstimator::ForwardDifference.estimate(&h, Some(&[10.0, 10.0, 20.0]), 10);
        assert!(matches!(repeated, Err(RtfError::Configuration(_))));
        let unordered = DerivativeEstimator::ForwardDifference.estimate(&h, Some(&[20.0, 10.0]), 10);
        assert!(matches!(unordered, Err(RtfError::Configuration(_))));
    }

    #[test]
    fn samples_outside_domain_fail() {
        let h = two_law();
        let result = DerivativeEstimator::ForwardDifference.estimate(&h, Some(&[10.0, 250.0]), 10);
        assert!(matches!(result, Err(RtfError::Domain { .. })));
    }
}

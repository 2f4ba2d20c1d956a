use tracing::debug;

use crate::math::law::law::SharedLaw;
use crate::math::piecewise::segmentlawset::SegmentLawSet;
use crate::rtferror::Result;

// ─────────────────────────────────────────────
// ContinuityCompositor
// ─────────────────────────────────────────────
//
// Offsets are accumulated left to right so that both neighbours agree at
// every interior tiepoint t_i:
//
//   offset_0 = 0
//   offset_i = (law_{i-1}(t_i) + offset_{i-1}) − law_i(t_i)
//
// The first segment is never shifted, so H(0) = law_0(0).

#[derive(Clone, Debug)]
pub struct ContinuityCompositor {
    segments: SegmentLawSet,
    offsets: Vec<f64>,
    max_measured_age: f64,
}

impl ContinuityCompositor {
    pub fn new(segments: SegmentLawSet) -> ContinuityCompositor {
        let offsets = Self::compute_offsets(&segments);
        let last = segments.len() - 1;
        let max_measured_age = segments.law(last).evaluate(segments.max()) + offsets[last];
        debug!(
            segments = segments.len(),
            ?offsets,
            max_measured_age,
            "composed continuous transfer function"
        );
        ContinuityCompositor { segments, offsets, max_measured_age }
    }

    /// Validates `interior` against `laws` and composes them over `[0, max_ybp]`.
    pub fn compose(interior: &[f64], laws: Vec<SharedLaw>, max_ybp: f64) -> Result<ContinuityCompositor> {
        let segments = SegmentLawSet::new(interior, laws, max_ybp)?;
        Ok(ContinuityCompositor::new(segments))
    }

    fn compute_offsets(segments: &SegmentLawSet) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(segments.len());
        offsets.push(0.0);
        let tiepoints = segments.tiepoints();
        for i in 1..segments.len() {
            let t = tiepoints[i];
            let left = segments.law(i - 1).evaluate(t) + offsets[i - 1];
            offsets.push(left - segments.law(i).evaluate(t));
        }
        offsets
    }

    pub fn segments(&self) -> &SegmentLawSet {
        &self.segments
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    pub fn offset(&self, segment: usize) -> f64 {
        self.offsets[segment]
    }

    /// H at the domain maximum.
    pub fn max_measured_age(&self) -> f64 {
        self.max_measured_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::law::law::{
        law_fn,
        uniform_law
    };

    #[test]
    fn single_segment_has_zero_offset() {
        let compositor = ContinuityCompositor::compose(&[], vec![uniform_law()], 6000.0).unwrap();
        assert_eq!(compositor.offsets(), &[0.0]);
        assert_eq!(compositor.max_measured_age(), 6000.0);
    }

    #[test]
    fn two_law_offset() {
        let compositor = ContinuityCompositor::compose(
            &[100.0],
            vec![uniform_law(), law_fn(|t| 10.0 * t)],
            200.0,
        )
        .unwrap();
        assert_eq!(compositor.offsets(), &[0.0, -900.0]);
        assert_eq!(compositor.max_measured_age(), 2000.0 - 900.0);
    }

    #[test]
    fn offsets_accumulate_across_segments() {
        let compositor = ContinuityCompositor::compose(
            &[10.0, 20.0],
            vec![uniform_law(), law_fn(|t| 5.0 * t), law_fn(|t| t * t)],
            30.0,
        )
        .unwrap();
        // offset_1 = 10 − 50 = −40; offset_2 = (100 − 40) − 400 = −340
        assert_eq!(compositor.offsets(), &[0.0, -40.0, -340.0]);
        assert_eq!(compositor.max_measured_age(), 900.0 - 340.0);
    }

    #[test]
    fn mismatched_counts_fail() {
        let result = ContinuityCompositor::compose(&[1.0, 2.0], vec![uniform_law()], 10.0);
        assert!(result.is_err());
    }
}

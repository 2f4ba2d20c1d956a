use crate::math::piecewise::continuitycompositor::ContinuityCompositor;
use crate::math::piecewise::segmentlawset::SegmentLawSet;
use crate::rtferror::{
    Result,
    RtfError
};

/// The continuous forward transfer function H: calendar time → radiometric age.
#[derive(Clone, Debug)]
pub struct ForwardEvaluator {
    compositor: ContinuityCompositor,
}

impl ForwardEvaluator {
    pub fn new(compositor: ContinuityCompositor) -> ForwardEvaluator {
        ForwardEvaluator { compositor }
    }

    pub fn compositor(&self) -> &ContinuityCompositor {
        &self.compositor
    }

    pub fn segments(&self) -> &SegmentLawSet {
        self.compositor.segments()
    }

    pub fn domain(&self) -> (f64, f64) {
        let segments = self.segments();
        (segments.min(), segments.max())
    }

    pub fn max_measured_age(&self) -> f64 {
        self.compositor.max_measured_age()
    }

    fn check_domain(&self, t: f64) -> Result<()> {
        if self.segments().contains(t) {
            Ok(())
        } else {
            let (min, max) = self.domain();
            Err(RtfError::Domain { time: t, min, max })
        }
    }

    /// H(t) without the domain check; `t` must already be inside the domain.
    pub(crate) fn value_unchecked(&self, t: f64) -> f64 {
        let i = self.segments().find_segment(t);
        self.segments().law(i).evaluate(t) + self.compositor.offset(i)
    }

    pub fn value(&self, t: f64) -> Result<f64> {
        self.check_domain(t)?;
        Ok(self.value_unchecked(t))
    }

    /// H over a sequence of times, output in input order.
    ///
    /// Times are grouped per segment so each law sees one batch.
    pub fn values(&self, times: &[f64]) -> Result<Vec<f64>> {
        for &t in times {
            self.check_domain(t)?;
        }
        let segments = self.segments();
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); segments.len()];
        for (index, &t) in times.iter().enumerate() {
            buckets[segments.find_segment(t)].push(index);
        }

        let mut result = vec![0.0; times.len()];
        for (segment, indices) in buckets.iter().enumerate() {
            if indices.is_empty() {
                continue;
            }
            let batch: Vec<f64> = indices.iter().map(|&i| times[i]).collect();
            let offset = self.compositor.offset(segment);
            let outputs = segments.law(segment).evaluate_many(&batch);
            for (&i, value) in indices.iter().zip(outputs) {
                result[i] = value + offset;
            }
        }
        Ok(result)
    }
}

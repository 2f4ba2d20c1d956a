use std::fmt;

use crate::math::law::law::SharedLaw;
use crate::rtferror::{
    Result,
    RtfError
};

/// Ordered laws together with the boundaries that delimit them.
///
/// `tiepoints` always holds the outer bounds as well, so
/// `tiepoints.len() == laws.len() + 1`. Segment `i` covers
/// `[tiepoints[i], tiepoints[i + 1])`; the last one is closed on the right.
#[derive(Clone)]
pub struct SegmentLawSet {
    tiepoints: Vec<f64>,
    laws: Vec<SharedLaw>,
}

fn check_strictly_increasing(values: &[f64], what: &str) -> Result<()> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(RtfError::configuration(format!("{} contain a non-finite value ({})", what, bad)));
    }
    if let Some(pair) = values.windows(2).find(|w| w[0] >= w[1]) {
        return Err(RtfError::configuration(format!(
            "{} must be strictly increasing ({} is followed by {})",
            what, pair[0], pair[1]
        )));
    }
    Ok(())
}

impl SegmentLawSet {
    /// Builds the set over `[0, max_ybp]` from the interior boundaries only.
    pub fn new(interior: &[f64], laws: Vec<SharedLaw>, max_ybp: f64) -> Result<SegmentLawSet> {
        if !(max_ybp.is_finite() && max_ybp > 0.0) {
            return Err(RtfError::configuration(format!(
                "domain maximum must be a positive finite number, got {}",
                max_ybp
            )));
        }
        if laws.is_empty() {
            return Err(RtfError::configuration("at least one law is required"));
        }
        if interior.len() + 1 != laws.len() {
            return Err(RtfError::configuration(format!(
                "tiepoint brackets ({}) and laws ({}) do not match in number",
                interior.len() + 1,
                laws.len()
            )));
        }
        check_strictly_increasing(interior, "tiepoints")?;
        if let (Some(&first), Some(&last)) = (interior.first(), interior.last()) {
            if first <= 0.0 || last >= max_ybp {
                return Err(RtfError::configuration(format!(
                    "tiepoints ({}, {}) must lie strictly inside the domain (0, {})",
                    first, last, max_ybp
                )));
            }
        }

        let mut tiepoints = Vec::with_capacity(interior.len() + 2);
        tiepoints.push(0.0);
        tiepoints.extend_from_slice(interior);
        tiepoints.push(max_ybp);
        Ok(SegmentLawSet { tiepoints, laws })
    }

    /// Builds the set from a complete boundary list, outer bounds included.
    pub fn with_bounds(bounds: Vec<f64>, laws: Vec<SharedLaw>) -> Result<SegmentLawSet> {
        if laws.is_empty() {
            return Err(RtfError::configuration("at least one law is required"));
        }
        if bounds.len() != laws.len() + 1 {
            return Err(RtfError::configuration(format!(
                "boundary brackets ({}) and laws ({}) do not match in number",
                bounds.len().saturating_sub(1),
                laws.len()
            )));
        }
        check_strictly_increasing(&bounds, "boundaries")?;
        Ok(SegmentLawSet { tiepoints: bounds, laws })
    }

    pub fn tiepoints(&self) -> &[f64] {
        &self.tiepoints
    }

    pub fn interior_tiepoints(&self) -> &[f64] {
        &self.tiepoints[1..self.tiepoints.len() - 1]
    }

    pub fn laws(&self) -> &[SharedLaw] {
        &self.laws
    }

    pub fn law(&self, segment: usize) -> &SharedLaw {
        &self.laws[segment]
    }

    pub fn len(&self) -> usize {
        self.laws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.tiepoints[0]
    }

    pub fn max(&self) -> f64 {
        self.tiepoints[self.tiepoints.len() - 1]
    }

    pub fn contains(&self, x: f64) -> bool {
        self.min() <= x && x <= self.max()
    }

    /// Index of the segment owning `x`.
    ///
    /// Interior boundaries belong to the segment that starts there; the
    /// domain maximum belongs to the last segment. Values outside the domain
    /// are clamped to the first or last segment, callers check the domain.
    pub fn find_segment(&self, x: f64) -> usize {
        let last = self.laws.len() - 1;
        if x <= self.min() {
            0
        } else if x >= self.max() {
            last
        } else {
            self.tiepoints[1..=last].partition_point(|&tp| tp <= x)
        }
    }
}

impl fmt::Debug for SegmentLawSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentLawSet")
            .field("tiepoints", &self.tiepoints)
            .field("laws", &self.laws.len())
            .finish()
    }
}

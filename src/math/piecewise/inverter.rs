use argmin::core::{
    CostFunction,
    Error as ArgminError,
    Executor,
    State,
    TerminationReason
};
use argmin::solver::brent::BrentRoot;
use tracing::{
    trace,
    warn
};

use crate::math::law::law::SharedLaw;
use crate::math::piecewise::forwardevaluator::ForwardEvaluator;
use crate::math::piecewise::segmentlawset::SegmentLawSet;
use crate::rtferror::{
    Result,
    RtfError
};

pub const DEFAULT_TOLERANCE: f64 = 0.001;
pub const DEFAULT_MAX_ITERATIONS: u64 = 100;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum RootFindingMethod {
    /// Halves `[0, max_ybp]` until `|H(mid) − target| < tolerance`.
    #[default]
    Bisection,
    /// argmin's Brent root finder; `tolerance` bounds the time bracket instead.
    Brent,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InversionSettings {
    pub tolerance: f64,
    pub max_iterations: u64,
    pub method: RootFindingMethod,
}

impl Default for InversionSettings {
    fn default() -> Self {
        InversionSettings {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            method: RootFindingMethod::Bisection,
        }
    }
}

impl InversionSettings {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_method(mut self, method: RootFindingMethod) -> Self {
        self.method = method;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(RtfError::configuration(format!(
                "solver tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Uncertainty attached to a measured age.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasurementError {
    Symmetric(f64),
    TwoSided { lower: f64, upper: f64 },
}

impl MeasurementError {
    /// One value is symmetric, two values are `(lower, upper)`.
    pub fn from_slice(values: &[f64]) -> Result<MeasurementError> {
        match values {
            [e] => Ok(MeasurementError::Symmetric(*e)),
            [lower, upper] => Ok(MeasurementError::TwoSided { lower: *lower, upper: *upper }),
            _ => Err(RtfError::configuration(format!(
                "measurement error takes one or two values, got {}",
                values.len()
            ))),
        }
    }

    pub fn lower(&self) -> f64 {
        match self {
            MeasurementError::Symmetric(e) => *e,
            MeasurementError::TwoSided { lower, .. } => *lower,
        }
    }

    pub fn upper(&self) -> f64 {
        match self {
            MeasurementError::Symmetric(e) => *e,
            MeasurementError::TwoSided { upper, .. } => *upper,
        }
    }
}

/// Calendar time recovered from a measured age.
///
/// `bounds` is `(invert(measured − lower), invert(measured + upper))`: the
/// first entry always comes from the lower measured age. For an increasing H
/// that is also the smaller (more recent) calendar time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Inversion {
    time: f64,
    bounds: Option<(f64, f64)>,
}

impl Inversion {
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }
}

// ─────────────────────────────────────────────
// Brent (argmin)
// ─────────────────────────────────────────────

struct RootProblem {
    forward: ForwardEvaluator,
    target: f64,
}

impl CostFunction for RootProblem {
    type Param = f64;
    type Output = f64;

    fn cost(&self, t: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        let (min, max) = self.forward.domain();
        Ok(self.forward.value_unchecked(t.clamp(min, max)) - self.target)
    }
}

fn brent(forward: &ForwardEvaluator, target: f64, settings: &InversionSettings) -> Result<f64> {
    let (min, max) = forward.domain();
    let problem = RootProblem { forward: forward.clone(), target };
    let solver = BrentRoot::new(min, max, settings.tolerance);
    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(settings.max_iterations))
        .run()
        .map_err(|error| {
            // fails before the first step, only the bracket is known
            let best_estimate = min + (max - min) / 2.0;
            warn!(target, best_estimate, %error, "brent root finder failed");
            RtfError::Convergence { target, best_estimate, iterations: 0 }
        })?;

    let state = result.state();
    let best_estimate = state.get_best_param().copied().unwrap_or(f64::NAN);
    match state.get_termination_reason() {
        Some(TerminationReason::SolverConverged) => {
            trace!(target, best_estimate, iterations = state.get_iter(), "brent converged");
            Ok(best_estimate)
        }
        _ => {
            warn!(target, best_estimate, "brent root finder did not converge");
            Err(RtfError::Convergence { target, best_estimate, iterations: state.get_iter() })
        }
    }
}

// ─────────────────────────────────────────────
// Bisection
// ─────────────────────────────────────────────
//
// Assumes H is increasing on the domain. For a non-monotonic H this still
// terminates but returns one of possibly several roots.

fn bisect(forward: &ForwardEvaluator, target: f64, settings: &InversionSettings) -> Result<f64> {
    let (mut lo, mut hi) = forward.domain();
    let mut best_estimate = lo;
    let mut best_gap = f64::INFINITY;

    for iteration in 1..=settings.max_iterations {
        let mid = lo + (hi - lo) / 2.0;
        let value = forward.value_unchecked(mid);
        let gap = (value - target).abs();
        if gap < best_gap {
            best_estimate = mid;
            best_gap = gap;
        }
        if gap < settings.tolerance {
            trace!(target, mid, iteration, "bisection converged");
            return Ok(mid);
        }
        if value < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    warn!(target, best_estimate, best_gap, "bisection did not converge");
    Err(RtfError::Convergence {
        target,
        best_estimate,
        iterations: settings.max_iterations,
    })
}

// ─────────────────────────────────────────────
// Inverter
// ─────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum Inverter {
    /// Root finding against H.
    Numerical,
    /// User-supplied piecewise inverse laws, selected over the inverse
    /// tiepoints `H(t_i)`.
    Explicit(SegmentLawSet),
}

impl Inverter {
    pub fn explicit(forward: &ForwardEvaluator, laws: Vec<SharedLaw>) -> Result<Inverter> {
        let segments = forward.segments();
        if laws.len() != segments.len() {
            return Err(RtfError::configuration(format!(
                "the number of forward ({}) and inverse ({}) laws must be the same",
                segments.len(),
                laws.len()
            )));
        }
        let inverse_tiepoints = forward.values(segments.tiepoints())?;
        let set = SegmentLawSet::with_bounds(inverse_tiepoints, laws).map_err(|error| {
            RtfError::configuration(format!("inverse tiepoints are unusable, H must be increasing: {}", error))
        })?;
        Ok(Inverter::Explicit(set))
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Inverter::Explicit(_))
    }

    pub fn inverse_tiepoints(&self) -> Option<&[f64]> {
        match self {
            Inverter::Numerical => None,
            Inverter::Explicit(set) => Some(set.tiepoints()),
        }
    }

    /// `[H(0), H(max_ybp)]`.
    pub fn radiometric_range(forward: &ForwardEvaluator) -> (f64, f64) {
        let (min, _) = forward.domain();
        (forward.value_unchecked(min), forward.max_measured_age())
    }

    fn check_range(forward: &ForwardEvaluator, measured: f64) -> Result<()> {
        let (min, max) = Self::radiometric_range(forward);
        if min <= measured && measured <= max {
            Ok(())
        } else {
            Err(RtfError::Range { measured, min, max })
        }
    }

    pub fn invert(&self, forward: &ForwardEvaluator, measured: f64, settings: &InversionSettings) -> Result<f64> {
        Self::check_range(forward, measured)?;
        match self {
            Inverter::Explicit(set) => Ok(set.law(set.find_segment(measured)).evaluate(measured)),
            Inverter::Numerical => {
                settings.validate()?;
                match settings.method {
                    RootFindingMethod::Bisection => bisect(forward, measured, settings),
                    RootFindingMethod::Brent => brent(forward, measured, settings),
                }
            }
        }
    }

    /// Inverts `measured` and, when `error` is given, both ends of its error
    /// bar independently. Each end must lie inside the radiometric range.
    pub fn invert_with_error(
        &self,
        forward: &ForwardEvaluator,
        measured: f64,
        error: Option<MeasurementError>,
        settings: &InversionSettings,
    ) -> Result<Inversion> {
        let time = self.invert(forward, measured, settings)?;
        let bounds = match error {
            None => None,
            Some(error) => {
                let lower = self.invert(forward, measured - error.lower(), settings)?;
                let upper = self.invert(forward, measured + error.upper(), settings)?;
                Some((lower, upper))
            }
        };
        Ok(Inversion { time, bounds })
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
    fn bisection_round_trips() {
        let h = two_law();
        let settings = InversionSettings::default();
        for &t in &[0.0, 12.5, 99.0, 100.0, 150.0, 199.9, 200.0] {
            let measured = h.value(t).unwrap();
            let inverted = Inverter::Numerical.invert(&h, measured, &settings).unwrap();
            assert!((inverted - t).abs() < settings.tolerance, "{} vs {}", inverted, t);
        }
    }

    #[test]
    fn brent_round_trips() {
        let h = two_law();
        let settings = InversionSettings::default()
            .with_method(RootFindingMethod::Brent)
            .with_tolerance(1e-9);
        for &t in &[3.0, 120.0, 180.0] {
            let measured = h.value(t).unwrap();
            let inverted = Inverter::Numerical.invert(&h, measured, &settings).unwrap();
            assert!((inverted - t).abs() < 1e-6, "{} vs {}", inverted, t);
        }
    }

    #[test]
    fn explicit_inverse_uses_inverse_tiepoints() {
        let h = two_law();
        let inverter = Inverter::explicit(
            &h,
            vec![uniform_law(), law_fn(|a| (a + 900.0) / 10.0)],
        )
        .unwrap();
        assert_eq!(inverter.inverse_tiepoints(), Some(&[0.0, 100.0, 1100.0][..]));
        let settings = InversionSettings::default();
        assert_eq!(inverter.invert(&h, 50.0, &settings).unwrap(), 50.0);
        assert_eq!(inverter.invert(&h, 600.0, &settings).unwrap(), 150.0);
        assert_eq!(inverter.invert(&h, 1100.0, &settings).unwrap(), 200.0);
    }

    #[test]
    fn explicit_inverse_count_must_match() {
        let h = two_law();
        let result = Inverter::explicit(&h, vec![uniform_law()]);
        assert!(matches!(result, Err(RtfError::Configuration(_))));
    }

    #[test]
    fn out_of_range_measurements_fail() {
        let h = two_law();
        let settings = InversionSettings::default();
        assert!(matches!(
            Inverter::Numerical.invert(&h, 1100.5, &settings),
            Err(RtfError::Range { .. })
        ));
        assert!(matches!(
            Inverter::Numerical.invert(&h, -1.0, &settings),
            Err(RtfError::Range { .. })
        ));
        assert!(matches!(
            Inverter::Numerical.invert(&h, f64::NAN, &settings),
            Err(RtfError::Range { .. })
        ));
    }

    #[test]
    fn iteration_limit_reports_best_estimate() {
        let h = two_law();
        let settings = InversionSettings::default().with_max_iterations(3);
        let error = Inverter::Numerical.invert(&h, 333.0, &settings).unwrap_err();
        assert!(matches!(error, RtfError::Convergence { iterations: 3, .. }));
        let best = error.best_estimate().unwrap();
        assert!((0.0..=200.0).contains(&best));
    }

    #[test]
    fn failed_brent_falls_back_to_bracket_midpoint() {
        let h = two_law();
        let settings = InversionSettings::default().with_method(RootFindingMethod::Brent);
        // H never reaches 5000 on [0, 200], so the bracket has no sign change
        let error = brent(&h, 5000.0, &settings).unwrap_err();
        assert!(matches!(error, RtfError::Convergence { iterations: 0, .. }));
        assert_eq!(error.best_estimate(), Some(100.0));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let h = two_law();
        let settings = InversionSettings::default().with_tolerance(0.0);
        assert!(matches!(
            Inverter::Numerical.invert(&h, 10.0, &settings),
            Err(RtfError::Configuration(_))
        ));
    }

    #[test]
    fn error_bars_are_ordered_by_measured_age() {
        let h = two_law();
        let settings = InversionSettings::default();
        let inversion = Inverter::Numerical
            .invert_with_error(&h, 600.0, Some(MeasurementError::TwoSided { lower: 100.0, upper: 50.0 }), &settings)
            .unwrap();
        assert!((inversion.time() - 150.0).abs() < 1e-3);
        let (lower, upper) = inversion.bounds().unwrap();
        assert!((lower - 140.0).abs() < 1e-3);
        assert!((upper - 155.0).abs() < 1e-3);
        assert!(lower < inversion.time() && inversion.time() < upper);
    }

    #[test]
    fn error_bar_ends_are_range_checked() {
        let h = two_law();
        let settings = InversionSettings::default();
        let result = Inverter::Numerical.invert_with_error(
            &h,
            1050.0,
            Some(MeasurementError::Symmetric(100.0)),
            &settings,
        );
        assert!(matches!(result, Err(RtfError::Range { .. })));
    }

    #[test]
    fn measurement_error_from_slice() {
        assert_eq!(MeasurementError::from_slice(&[2.0]).unwrap(), MeasurementError::Symmetric(2.0));
        let two = MeasurementError::from_slice(&[1.0, 3.0]).unwrap();
        assert_eq!((two.lower(), two.upper()), (1.0, 3.0));
        assert!(MeasurementError::from_slice(&[]).is_err());
    }
}

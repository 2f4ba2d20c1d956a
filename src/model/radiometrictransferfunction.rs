use std::fmt;

use tracing::{
    debug,
    info
};

use crate::math::law::law::{
    SharedLaw,
    uniform_law
};
use crate::math::piecewise::continuitycompositor::ContinuityCompositor;
use crate::math::piecewise::derivativeestimator::DerivativeEstimator;
use crate::math::piecewise::forwardevaluator::ForwardEvaluator;
use crate::math::piecewise::inverter::{
    Inversion,
    InversionSettings,
    Inverter,
    MeasurementError
};
use crate::model::modelmetadata::ModelMetadata;
use crate::rtferror::{
    Result,
    RtfError
};
use crate::time::calendardate::{
    CalendarDate,
    DAY_IN_YEARS
};
use crate::time::stratigraphy::StratigraphicUnit;

/// Everything `configure` replaces in one step.
#[derive(Clone, Debug)]
struct TransferModel {
    forward: ForwardEvaluator,
    derivative: DerivativeEstimator,
    inverter: Inverter,
}

/// Calendar dates recovered from a measured age, see [`Inversion`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DatedInversion {
    pub date: CalendarDate,
    pub bounds: Option<(CalendarDate, CalendarDate)>,
}

/// A radiometric transfer function: metadata plus the piecewise model H.
///
/// A new instance only carries metadata; every evaluation fails with
/// [`RtfError::NotConfigured`] until [`configure`](Self::configure) succeeds.
/// Read operations take `&self` and may run concurrently, `configure` needs
/// `&mut self`.
#[derive(Clone, Debug, Default)]
pub struct RadiometricTransferFunction {
    metadata: ModelMetadata,
    transfer: Option<TransferModel>,
}

impl RadiometricTransferFunction {
    pub fn new() -> RadiometricTransferFunction {
        RadiometricTransferFunction::default()
    }

    pub fn with_metadata(metadata: ModelMetadata) -> RadiometricTransferFunction {
        RadiometricTransferFunction { metadata, transfer: None }
    }

    // ─────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────

    /// Replaces the whole model.
    ///
    /// `tiepoints` are the interior boundaries only; the domain `[0, max_ybp]`
    /// comes from the metadata. On error the previous model stays in place.
    pub fn configure(
        &mut self,
        tiepoints: &[f64],
        laws: Vec<SharedLaw>,
        inverse: Option<Vec<SharedLaw>>,
        derivative: Option<Vec<SharedLaw>>,
    ) -> Result<()> {
        let compositor = ContinuityCompositor::compose(tiepoints, laws, self.metadata.max_ybp)?;
        let forward = ForwardEvaluator::new(compositor);
        let inverter = match inverse {
            Some(laws) => Inverter::explicit(&forward, laws)?,
            None => Inverter::Numerical,
        };
        let derivative = match derivative {
            Some(laws) => DerivativeEstimator::analytic(&forward, laws)?,
            None => DerivativeEstimator::ForwardDifference,
        };

        self.metadata.max_measured_age = forward.max_measured_age();
        self.metadata.laws = forward.segments().len();
        debug!(
            name = %self.metadata.name,
            laws = self.metadata.laws,
            max_measured_age = self.metadata.max_measured_age,
            explicit_inverse = inverter.is_explicit(),
            analytic_derivative = derivative.is_analytic(),
            "configured transfer function"
        );
        self.transfer = Some(TransferModel { forward, derivative, inverter });
        Ok(())
    }

    /// One uniform-decay segment over the whole domain.
    pub fn configure_uniform(&mut self) -> Result<()> {
        self.configure(&[], vec![uniform_law()], None, None)
    }

    pub fn is_configured(&self) -> bool {
        self.transfer.is_some()
    }

    fn transfer(&self) -> Result<&TransferModel> {
        self.transfer.as_ref().ok_or(RtfError::NotConfigured)
    }

    // ─────────────────────────────────────────
    // Metadata
    // ─────────────────────────────────────────

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn max_ybp(&self) -> f64 {
        self.metadata.max_ybp
    }

    pub fn flood_start_ybp(&self) -> f64 {
        self.metadata.flood_start_ybp
    }

    pub fn flood_end_ybp(&self) -> f64 {
        self.metadata.flood_end_ybp
    }

    pub fn max_measured_age(&self) -> f64 {
        self.metadata.max_measured_age
    }

    pub fn laws(&self) -> usize {
        self.metadata.laws
    }

    /// Overrides the reported regime count, e.g. when one segment is a
    /// primordial signature rather than an acceleration regime.
    pub(crate) fn set_laws(&mut self, laws: usize) {
        self.metadata.laws = laws;
    }

    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.extension(key)
    }

    /// Full tiepoint list, domain bounds included.
    pub fn tiepoints(&self) -> Result<&[f64]> {
        Ok(self.transfer()?.forward.segments().tiepoints())
    }

    pub fn offsets(&self) -> Result<&[f64]> {
        Ok(self.transfer()?.forward.compositor().offsets())
    }

    /// H applied to the tiepoints; only present with an explicit inverse.
    pub fn inverse_tiepoints(&self) -> Option<&[f64]> {
        self.transfer.as_ref()?.inverter.inverse_tiepoints()
    }

    pub fn calendar_date(&self, ybp: f64) -> CalendarDate {
        CalendarDate::new(ybp, self.metadata.calendar_epochs())
    }

    // ─────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────

    /// H(t).
    pub fn evaluate(&self, t: f64) -> Result<f64> {
        self.transfer()?.forward.value(t)
    }

    pub fn evaluate_many(&self, times: &[f64]) -> Result<Vec<f64>> {
        self.transfer()?.forward.values(times)
    }

    /// Acceleration factor Ξ, returned as `(sample times, rates)`.
    ///
    /// Without explicit `times`, `points` samples are taken in every segment.
    /// Forward differencing drops the last sample; an analytic derivative
    /// keeps them all.
    pub fn derivative(&self, times: Option<&[f64]>, points: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        let transfer = self.transfer()?;
        transfer.derivative.estimate(&transfer.forward, times, points)
    }

    /// Calendar time (YBP) for a measured age, plus the error bar ends when
    /// `error` is given.
    pub fn invert(
        &self,
        measured: f64,
        error: Option<MeasurementError>,
        settings: &InversionSettings,
    ) -> Result<Inversion> {
        let transfer = self.transfer()?;
        transfer.inverter.invert_with_error(&transfer.forward, measured, error, settings)
    }

    /// [`invert`](Self::invert) with the results wrapped as calendar dates.
    pub fn invert_date(
        &self,
        measured: f64,
        error: Option<MeasurementError>,
        settings: &InversionSettings,
    ) -> Result<DatedInversion> {
        let inversion = self.invert(measured, error, settings)?;
        Ok(DatedInversion {
            date: self.calendar_date(inversion.time()),
            bounds: inversion
                .bounds()
                .map(|(lower, upper)| (self.calendar_date(lower), self.calendar_date(upper))),
        })
    }

    /// `[H(0), max_measured_age]`.
    pub fn radiometric_range(&self) -> Result<(f64, f64)> {
        Ok(Inverter::radiometric_range(&self.transfer()?.forward))
    }

    /// Samples Ξ and fails if it is not strictly positive everywhere.
    ///
    /// `configure` does not call this: non-monotonic models stay loadable,
    /// but only increasing ones invert reliably.
    pub fn check_monotonic(&self, points: usize) -> Result<()> {
        let (times, rates) = self.derivative(None, points)?;
        match times.iter().zip(&rates).find(|&(_, rate)| !(*rate > 0.0)) {
            Some((t, rate)) => Err(RtfError::configuration(format!(
                "transfer function is not increasing at {} (rate {})",
                t, rate
            ))),
            None => Ok(()),
        }
    }

    // ─────────────────────────────────────────
    // Named ranges
    // ─────────────────────────────────────────

    fn pair(&self, a: f64, b: f64) -> Result<(f64, f64)> {
        let forward = &self.transfer()?.forward;
        Ok((forward.value(a)?, forward.value(b)?))
    }

    /// `(H(flood end), H(flood start))`.
    pub fn flood_radiometric_range(&self) -> Result<(f64, f64)> {
        self.pair(self.metadata.flood_end_ybp, self.metadata.flood_start_ybp)
    }

    /// `(H(max − 7 days), H(max))`.
    pub fn creation_radiometric_range(&self) -> Result<(f64, f64)> {
        let max_ybp = self.metadata.max_ybp;
        self.pair(max_ybp - 7.0 * DAY_IN_YEARS, max_ybp)
    }

    /// `(H(max), H(flood start))`.
    pub fn antediluvian_radiometric_range(&self) -> Result<(f64, f64)> {
        self.pair(self.metadata.max_ybp, self.metadata.flood_start_ybp)
    }

    /// `(H(0), H(flood end))`.
    pub fn modern_radiometric_range(&self) -> Result<(f64, f64)> {
        self.pair(0.0, self.metadata.flood_end_ybp)
    }

    /// `(H(flood midpoint), H(flood end))`: the erosive second half of the flood.
    pub fn erosive_radiometric_range(&self) -> Result<(f64, f64)> {
        let start = self.metadata.flood_start_ybp;
        let end = self.metadata.flood_end_ybp;
        self.pair(end + (start - end) / 2.0, end)
    }

    /// Logs the headline numbers of the model; flood ages only when the flood
    /// boundaries fall inside a configured domain.
    pub fn log_summary(&self) {
        match self.flood_radiometric_range() {
            Ok((end, start)) => info!(
                name = %self.metadata.name,
                laws = self.metadata.laws,
                max_measured_age = self.metadata.max_measured_age,
                flood_start_age = start,
                flood_end_age = end,
                "transfer function summary"
            ),
            Err(error) => info!(
                name = %self.metadata.name,
                laws = self.metadata.laws,
                max_measured_age = self.metadata.max_measured_age,
                %error,
                "transfer function summary without flood ages"
            ),
        }
    }
}

// ─────────────────────────────────────────────
// Display
// ─────────────────────────────────────────────

const RULE_WIDTH: usize = 80;
const LABEL_WIDTH: usize = 29;

fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

fn unit_label(age: f64) -> String {
    StratigraphicUnit::new(age)
        .unit_name(true, None)
        .map(|(name, _)| name)
        .unwrap_or_else(|| "n/a".to_owned())
}

impl fmt::Display for RadiometricTransferFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = &self.metadata;
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "Name: {}", metadata.name)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "{}", wrap(&format!("Reference: {}", metadata.reference), RULE_WIDTH))?;
        writeln!(f)?;
        writeln!(f, "{}", wrap(&metadata.description, RULE_WIDTH))?;
        writeln!(f, "{}", rule)?;

        let header = [
            ("Family:", metadata.family.clone()),
            ("Model Class:", metadata.model_class.clone()),
            ("Termination behavior:", metadata.termination.clone()),
            ("Model Cardinality (Laws):", metadata.laws.to_string()),
            ("Isotope system:", metadata.isotope_system.clone()),
        ];
        for (label, value) in header {
            writeln!(f, "{:<width$}{}", label, value, width = LABEL_WIDTH)?;
        }

        let (Ok((end, start)), Ok((mid, _))) =
            (self.flood_radiometric_range(), self.erosive_radiometric_range())
        else {
            return Ok(());
        };

        writeln!(f)?;
        writeln!(f, "{:<width$}{}", "Pre-Flood/Flood Boundary:", unit_label(start), width = LABEL_WIDTH)?;
        writeln!(f, "{:<width$}{}", "Flood/Post-Flood Boundary:", unit_label(end), width = LABEL_WIDTH)?;
        let ages = [
            ("Start-Flood Radiometric Age:", start),
            ("Mid-Flood Radiometric Age:", mid),
            ("End-Flood Radiometric Age:", end),
            ("Flood Radiometric Range:", start - end),
            ("Radiometric Spectrum Gap:", mid - end),
        ];
        for (label, value) in ages {
            writeln!(f, "{:<width$}{:e}", label, value, width = LABEL_WIDTH)?;
        }
        Ok(())
    }
}

use std::sync::Arc;

use tracing::trace;

use crate::math::piecewise::inverter::InversionSettings;
use crate::model::radiometrictransferfunction::RadiometricTransferFunction;
use crate::rtferror::Result;

// ─────────────────────────────────────────────
// Apparent ages of sampled material
// ─────────────────────────────────────────────
//
// Material is drawn from a source at `sample_time` (YBP) and from then on
// ages along H. A sample may inherit part of its source's apparent age; a
// reservoir additionally relaxes towards the radiometric clock at rate λ:
//
//   age(t) = E·e^{λ(t − s)} + λ·∫ₜˢ e^{−λ(τ − t)}·H(τ) dτ − H(t)
//   E      = H(s) + inheritance · parent.age(s)
//
// which reduces to the plain sample age E − H(t) for λ = 0. Times older
// than `sample_time` are answered by the parent.

/// Panels per segment of the composite Simpson rule. Must be even.
pub const QUADRATURE_INTERVALS: usize = 64;

pub trait ApparentAge {
    /// Apparent radiometric age of the material at calendar time `time`.
    fn apparent_age(&self, model: &RadiometricTransferFunction, time: f64) -> Result<f64>;

    /// Calendar time a naive reading of the apparent age would suggest.
    fn apparent_ybp(
        &self,
        model: &RadiometricTransferFunction,
        time: f64,
        settings: &InversionSettings,
    ) -> Result<f64> {
        let age = self.apparent_age(model, time)?;
        Ok(model.invert(age, None, settings)?.time())
    }
}

/// Root of a sampling tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrimordialSource {
    initial_apparent_age: f64,
    initial_time: Option<f64>,
}

impl PrimordialSource {
    /// A source frozen at `initial_apparent_age`, ignoring the model.
    pub fn constant(initial_apparent_age: f64) -> PrimordialSource {
        PrimordialSource { initial_apparent_age, initial_time: None }
    }

    /// A source holding `initial_apparent_age` at `initial_time` and ageing
    /// along H afterwards.
    pub fn anchored(initial_apparent_age: f64, initial_time: f64) -> PrimordialSource {
        PrimordialSource { initial_apparent_age, initial_time: Some(initial_time) }
    }

    pub fn initial_apparent_age(&self) -> f64 {
        self.initial_apparent_age
    }

    pub fn initial_time(&self) -> Option<f64> {
        self.initial_time
    }

    pub fn into_source(self) -> SharedSource {
        Arc::new(Source::Primordial(self))
    }
}

impl ApparentAge for PrimordialSource {
    fn apparent_age(&self, model: &RadiometricTransferFunction, time: f64) -> Result<f64> {
        match self.initial_time {
            None => Ok(self.initial_apparent_age),
            Some(initial_time) => {
                Ok(self.initial_apparent_age + model.evaluate(initial_time)? - model.evaluate(time)?)
            }
        }
    }
}

/// Anything a sample can be drawn from.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Primordial(PrimordialSource),
    Reservoir(Reservoir),
}

pub type SharedSource = Arc<Source>;

impl ApparentAge for Source {
    fn apparent_age(&self, model: &RadiometricTransferFunction, time: f64) -> Result<f64> {
        match self {
            Source::Primordial(primordial) => primordial.apparent_age(model, time),
            Source::Reservoir(reservoir) => reservoir.apparent_age(model, time),
        }
    }
}

/// Material drawn from `parent` at `sample_time`, carrying `inheritance`
/// times the parent's apparent age at that moment.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    parent: SharedSource,
    sample_time: f64,
    inheritance: f64,
}

impl Sample {
    pub fn new(parent: SharedSource, sample_time: f64, inheritance: f64) -> Sample {
        Sample { parent, sample_time, inheritance }
    }

    pub fn parent(&self) -> &SharedSource {
        &self.parent
    }

    pub fn sample_time(&self) -> f64 {
        self.sample_time
    }

    pub fn inheritance(&self) -> f64 {
        self.inheritance
    }

    fn initial_excess(&self, model: &RadiometricTransferFunction) -> Result<f64> {
        if self.inheritance == 0.0 {
            Ok(0.0)
        } else {
            Ok(self.inheritance * self.parent.apparent_age(model, self.sample_time)?)
        }
    }

    /// `E = H(sample_time) + inherited excess`.
    fn initial_age(&self, model: &RadiometricTransferFunction) -> Result<f64> {
        Ok(model.evaluate(self.sample_time)? + self.initial_excess(model)?)
    }
}

impl ApparentAge for Sample {
    fn apparent_age(&self, model: &RadiometricTransferFunction, time: f64) -> Result<f64> {
        if time > self.sample_time {
            return self.parent.apparent_age(model, time);
        }
        Ok(self.initial_age(model)? - model.evaluate(time)?)
    }
}

/// A sample that keeps exchanging with the radiometric clock at rate
/// `relaxation` (per year) after it was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Reservoir {
    sample: Sample,
    relaxation: f64,
}

impl Reservoir {
    pub fn new(parent: SharedSource, sample_time: f64, inheritance: f64, relaxation: f64) -> Reservoir {
        Reservoir {
            sample: Sample::new(parent, sample_time, inheritance),
            relaxation,
        }
    }

    pub fn sample_time(&self) -> f64 {
        self.sample.sample_time
    }

    pub fn inheritance(&self) -> f64 {
        self.sample.inheritance
    }

    pub fn relaxation(&self) -> f64 {
        self.relaxation
    }

    pub fn into_source(self) -> SharedSource {
        Arc::new(Source::Reservoir(self))
    }
}

impl ApparentAge for Reservoir {
    fn apparent_age(&self, model: &RadiometricTransferFunction, time: f64) -> Result<f64> {
        let sample_time = self.sample.sample_time;
        if time > sample_time {
            return self.sample.parent.apparent_age(model, time);
        }
        let lambda = self.relaxation;
        let initial_age = self.sample.initial_age(model)?;
        let h_time = model.evaluate(time)?;
        if lambda == 0.0 {
            return Ok(initial_age - h_time);
        }

        let initial_relaxation = initial_age * (1.0 - (lambda * (time - sample_time)).exp());
        let episodic_relaxation = -lambda * discounted_integral(model, time, sample_time, lambda)?;
        trace!(time, initial_age, initial_relaxation, episodic_relaxation, "reservoir relaxation");
        Ok(initial_age - initial_relaxation - episodic_relaxation - h_time)
    }
}

/// `∫ₐᵇ e^{−λ(τ − a)}·H(τ) dτ` by composite Simpson, restarted at every
/// tiepoint inside `(a, b)` so the kinks of H sit on panel edges.
fn discounted_integral(model: &RadiometricTransferFunction, a: f64, b: f64, lambda: f64) -> Result<f64> {
    if !(a < b) {
        return Ok(0.0);
    }
    let mut breaks = vec![a];
    breaks.extend(model.tiepoints()?.iter().copied().filter(|&tp| a < tp && tp < b));
    breaks.push(b);

    let n = QUADRATURE_INTERVALS;
    let mut nodes: Vec<f64> = Vec::with_capacity((breaks.len() - 1) * (n + 1));
    let mut weights: Vec<f64> = Vec::with_capacity(nodes.capacity());
    for pair in breaks.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let step = (hi - lo) / n as f64;
        for k in 0..=n {
            let weight = if k == 0 || k == n {
                1.0
            } else if k % 2 == 1 {
                4.0
            } else {
                2.0
            };
            nodes.push(if k == n { hi } else { lo + step * k as f64 });
            weights.push(weight * step / 3.0);
        }
    }

    let values = model.evaluate_many(&nodes)?;
    Ok(nodes
        .iter()
        .zip(&weights)
        .zip(&values)
        .map(|((&tau, &weight), &h)| weight * (-lambda * (tau - a)).exp() * h)
        .sum())
}

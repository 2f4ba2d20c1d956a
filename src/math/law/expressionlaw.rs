use std::sync::Arc;

use serde::{
    Deserialize,
    Serialize
};

use crate::math::law::law::{
    Law,
    SharedLaw
};

// ─────────────────────────────────────────────
// ExpressionLaw
// ─────────────────────────────────────────────
//
// Closed set of closed-form segment laws that a model file may name.
// Nothing here interprets free text: a file picks a variant and its
// parameters, serde does the rest.
//
//   constant      c
//   linear        slope·t + intercept
//   polynomial    c0 + c1·t + c2·t² + ...      (ascending powers)
//   exponential   scale·(e^(rate·t) − 1) + shift
//   power         scale·t^exponent
//   logarithmic   scale·ln(1 + rate·t)
//   reciprocal    scale / (1 + rate·t)

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpressionLaw {
    Constant {
        value: f64,
    },
    Linear {
        slope: f64,
        #[serde(default)]
        intercept: f64,
    },
    Polynomial {
        coefficients: Vec<f64>,
    },
    Exponential {
        scale: f64,
        rate: f64,
        #[serde(default)]
        shift: f64,
    },
    Power {
        scale: f64,
        exponent: f64,
    },
    Logarithmic {
        scale: f64,
        rate: f64,
    },
    Reciprocal {
        scale: f64,
        rate: f64,
    },
}

impl ExpressionLaw {
    pub fn constant(value: f64) -> ExpressionLaw {
        ExpressionLaw::Constant { value }
    }

    pub fn linear(slope: f64, intercept: f64) -> ExpressionLaw {
        ExpressionLaw::Linear { slope, intercept }
    }

    pub fn polynomial(coefficients: Vec<f64>) -> ExpressionLaw {
        ExpressionLaw::Polynomial { coefficients }
    }

    pub fn exponential(scale: f64, rate: f64, shift: f64) -> ExpressionLaw {
        ExpressionLaw::Exponential { scale, rate, shift }
    }

    pub fn power(scale: f64, exponent: f64) -> ExpressionLaw {
        ExpressionLaw::Power { scale, exponent }
    }

    pub fn logarithmic(scale: f64, rate: f64) -> ExpressionLaw {
        ExpressionLaw::Logarithmic { scale, rate }
    }

    pub fn reciprocal(scale: f64, rate: f64) -> ExpressionLaw {
        ExpressionLaw::Reciprocal { scale, rate }
    }

    /// Closed-form derivative with respect to `t`, when the family is closed
    /// under differentiation.
    pub fn derivative(&self) -> Option<ExpressionLaw> {
        match self {
            ExpressionLaw::Constant { .. } => Some(ExpressionLaw::constant(0.0)),
            ExpressionLaw::Linear { slope, .. } => Some(ExpressionLaw::constant(*slope)),
            ExpressionLaw::Polynomial { coefficients } => {
                if coefficients.len() <= 1 {
                    Some(ExpressionLaw::constant(0.0))
                } else {
                    let deriv_coefs = coefficients
                        .iter()
                        .enumerate()
                        .skip(1)
                        .map(|(power, c)| power as f64 * c)
                        .collect();
                    Some(ExpressionLaw::polynomial(deriv_coefs))
                }
            }
            ExpressionLaw::Exponential { scale, rate, .. } => {
                let k = scale * rate;
                Some(ExpressionLaw::exponential(k, *rate, k))
            }
            ExpressionLaw::Power { scale, exponent } => {
                if *exponent == 0.0 {
                    Some(ExpressionLaw::constant(0.0))
                } else {
                    Some(ExpressionLaw::power(scale * exponent, exponent - 1.0))
                }
            }
            ExpressionLaw::Logarithmic { scale, rate } => {
                Some(ExpressionLaw::reciprocal(scale * rate, *rate))
            }
            ExpressionLaw::Reciprocal { .. } => None,
        }
    }

    pub fn into_shared(self) -> SharedLaw {
        Arc::new(self)
    }
}

fn horner(coefficients: &[f64], t: f64) -> f64 {
    let mut iter = coefficients.iter().rev();
    match iter.next() {
        Some(&leading) => iter.fold(leading, |acc, &c| f64::mul_add(acc, t, c)),
        None => 0.0,
    }
}

impl Law for ExpressionLaw {
    fn evaluate(&self, t: f64) -> f64 {
        match self {
            ExpressionLaw::Constant { value } => *value,
            ExpressionLaw::Linear { slope, intercept } => f64::mul_add(*slope, t, *intercept),
            ExpressionLaw::Polynomial { coefficients } => horner(coefficients, t),
            ExpressionLaw::Exponential { scale, rate, shift } => {
                scale * (rate * t).exp_m1() + shift
            }
            ExpressionLaw::Power { scale, exponent } => scale * t.powf(*exponent),
            ExpressionLaw::Logarithmic { scale, rate } => scale * (rate * t).ln_1p(),
            ExpressionLaw::Reciprocal { scale, rate } => scale / (1.0 + rate * t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn polynomial_uses_ascending_powers() {
        let law = ExpressionLaw::polynomial(vec![1.0, 2.0, 3.0]);
        assert!(close(law.evaluate(2.0), 1.0 + 4.0 + 12.0));
        assert_eq!(ExpressionLaw::polynomial(vec![]).evaluate(5.0), 0.0);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let laws = vec![
            ExpressionLaw::linear(3.0, 2.0),
            ExpressionLaw::polynomial(vec![1.0, -2.0, 0.5, 0.1]),
            ExpressionLaw::exponential(2.0, 0.01, 5.0),
            ExpressionLaw::power(1.5, 2.5),
            ExpressionLaw::logarithmic(100.0, 0.3),
        ];
        let h = 1e-6;
        for law in laws {
            let derivative = law.derivative().unwrap();
            for &t in &[1.0, 10.0, 50.0] {
                let numeric = (law.evaluate(t + h) - law.evaluate(t - h)) / (2.0 * h);
                let analytic = derivative.evaluate(t);
                assert!(
                    (numeric - analytic).abs() < 1e-4 * (1.0 + analytic.abs()),
                    "{:?} at {}: {} vs {}", law, t, numeric, analytic
                );
            }
        }
    }

    #[test]
    fn reciprocal_has_no_closed_derivative() {
        assert!(ExpressionLaw::reciprocal(1.0, 1.0).derivative().is_none());
    }

    #[test]
    fn deserializes_tagged_variants() {
        let law: ExpressionLaw =
            serde_json::from_str(r#"{"type": "linear", "slope": 10.0}"#).unwrap();
        assert_eq!(law, ExpressionLaw::linear(10.0, 0.0));

        let law: ExpressionLaw =
            serde_json::from_str(r#"{"type": "exponential", "scale": 1.0, "rate": 0.5}"#).unwrap();
        assert_eq!(law, ExpressionLaw::exponential(1.0, 0.5, 0.0));

        let unknown = serde_json::from_str::<ExpressionLaw>(r#"{"type": "eval", "code": "t"}"#);
        assert!(unknown.is_err());
    }
}

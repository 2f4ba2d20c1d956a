use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::math::law::expressionlaw::ExpressionLaw;
use crate::math::law::law::SharedLaw;
use crate::math::law::lawregistry::LawRegistry;
use crate::model::modelmetadata::ModelMetadata;
use crate::model::radiometrictransferfunction::RadiometricTransferFunction;
use crate::rtferror::{
    Result,
    RtfError
};

/// One segment law in a model file: either a closed-form expression or the
/// name of a law registered in a [`LawRegistry`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LawSpec {
    Named { named: String },
    Expression(ExpressionLaw),
}

impl LawSpec {
    fn resolve(&self, registry: &LawRegistry) -> Result<SharedLaw> {
        match self {
            LawSpec::Named { named } => registry.get(named),
            LawSpec::Expression(expression) => Ok(expression.clone().into_shared()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeKeyword {
    /// Differentiate every expression law of the model symbolically.
    Analytic,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DerivativeSpec {
    Keyword(DerivativeKeyword),
    Laws(Vec<LawSpec>),
}

/// On-disk description of a transfer function.
///
/// ```json
/// {
///   "name": "Two regimes",
///   "max_ybp": 6000,
///   "tiepoints": [4300],
///   "model": [{"named": "uniform"}, {"type": "linear", "slope": 1e6}],
///   "derivative": "analytic"
/// }
/// ```
///
/// Every field besides the law sets is metadata; unknown ones are kept as
/// metadata extensions.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelDefinition {
    #[serde(default)]
    pub tiepoints: Vec<f64>,
    pub model: Vec<LawSpec>,
    #[serde(default)]
    pub inverse: Option<Vec<LawSpec>>,
    #[serde(default)]
    pub derivative: Option<DerivativeSpec>,
    /// Reported regime count, when it differs from the number of laws.
    #[serde(default)]
    pub laws: Option<usize>,
    #[serde(flatten)]
    pub metadata: ModelMetadata,
}

fn resolve_all(specs: &[LawSpec], registry: &LawRegistry) -> Result<Vec<SharedLaw>> {
    specs.iter().map(|spec| spec.resolve(registry)).collect()
}

impl ModelDefinition {
    pub fn from_reader(file_path: impl AsRef<Path>) -> Result<ModelDefinition> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let definition: ModelDefinition = serde_json::from_reader(reader)?;
        Ok(definition)
    }

    pub fn from_json_str(text: &str) -> Result<ModelDefinition> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<ModelDefinition> {
        Ok(serde_json::from_value(value)?)
    }

    fn analytic_derivative(&self) -> Result<Vec<SharedLaw>> {
        self.model
            .iter()
            .enumerate()
            .map(|(segment, spec)| match spec {
                LawSpec::Expression(expression) => expression
                    .derivative()
                    .map(ExpressionLaw::into_shared)
                    .ok_or_else(|| {
                        RtfError::configuration(format!(
                            "law of segment {} has no closed-form derivative",
                            segment
                        ))
                    }),
                LawSpec::Named { named } => Err(RtfError::configuration(format!(
                    "named law '{}' of segment {} cannot be differentiated analytically",
                    named, segment
                ))),
            })
            .collect()
    }

    /// Resolves every law and configures a new transfer function.
    pub fn into_model(self, registry: &LawRegistry) -> Result<RadiometricTransferFunction> {
        let laws = resolve_all(&self.model, registry)?;
        let inverse = match &self.inverse {
            Some(specs) => Some(resolve_all(specs, registry)?),
            None => None,
        };
        let derivative = match &self.derivative {
            Some(DerivativeSpec::Keyword(DerivativeKeyword::Analytic)) => Some(self.analytic_derivative()?),
            Some(DerivativeSpec::Laws(specs)) => Some(resolve_all(specs, registry)?),
            None => None,
        };

        let mut rtf = RadiometricTransferFunction::with_metadata(self.metadata);
        rtf.configure(&self.tiepoints, laws, inverse, derivative)?;
        if let Some(count) = self.laws {
            rtf.set_laws(count);
        }
        debug!(name = rtf.name(), laws = rtf.laws(), "loaded model definition");
        Ok(rtf)
    }
}

/// Reads and configures the model stored at `file_path`.
pub fn load_model(file_path: impl AsRef<Path>, registry: &LawRegistry) -> Result<RadiometricTransferFunction> {
    ModelDefinition::from_reader(file_path)?.into_model(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_regimes() -> serde_json::Value {
        json!({
            "name": "Two regimes",
            "max_ybp": 200.0,
            "flood_start_ybp": 120.0,
            "flood_end_ybp": 110.0,
            "isotope_system": "U-Pb",
            "curator": "lab 7",
            "tiepoints": [100.0],
            "model": [{"named": "uniform"}, {"type": "linear", "slope": 10.0}]
        })
    }

    #[test]
    fn parses_law_specs() {
        let definition = ModelDefinition::from_value(two_regimes()).unwrap();
        assert_eq!(definition.model[0], LawSpec::Named { named: "uniform".to_owned() });
        assert_eq!(definition.model[1], LawSpec::Expression(ExpressionLaw::linear(10.0, 0.0)));
        assert_eq!(definition.metadata.name, "Two regimes");
        assert_eq!(definition.metadata.extension("curator"), Some(&json!("lab 7")));
        assert!(definition.inverse.is_none());
    }

    #[test]
    fn builds_a_configured_model() {
        let rtf = ModelDefinition::from_value(two_regimes())
            .unwrap()
            .into_model(&LawRegistry::new())
            .unwrap();
        assert_eq!(rtf.laws(), 2);
        assert_eq!(rtf.max_measured_age(), 1100.0);
        assert_eq!(rtf.metadata().isotope_system, "U-Pb");
        assert_eq!(rtf.evaluate(150.0).unwrap(), 600.0);
    }

    #[test]
    fn laws_override_is_applied_after_configure() {
        let mut value = two_regimes();
        value["laws"] = json!(1);
        let rtf = ModelDefinition::from_value(value).unwrap().into_model(&LawRegistry::new()).unwrap();
        assert_eq!(rtf.laws(), 1);
        assert_eq!(rtf.tiepoints().unwrap().len(), 3);
    }

    #[test]
    fn analytic_derivative_needs_expressions() {
        let mut value = two_regimes();
        value["derivative"] = json!("analytic");
        let result = ModelDefinition::from_value(value.clone()).unwrap().into_model(&LawRegistry::new());
        assert!(matches!(result, Err(RtfError::Configuration(_))));

        value["model"] = json!([{"type": "linear", "slope": 1.0}, {"type": "linear", "slope": 10.0}]);
        let rtf = ModelDefinition::from_value(value).unwrap().into_model(&LawRegistry::new()).unwrap();
        let (times, rates) = rtf.derivative(Some(&[50.0, 150.0]), 0).unwrap();
        assert_eq!(times, vec![50.0, 150.0]);
        assert_eq!(rates, vec![1.0, 10.0]);
    }

    #[test]
    fn explicit_inverse_and_derivative_laws() {
        let mut value = two_regimes();
        value["inverse"] = json!([
            {"named": "uniform"},
            {"type": "linear", "slope": 0.1, "intercept": 90.0}
        ]);
        value["derivative"] = json!([{"type": "constant", "value": 1.0}, {"type": "constant", "value": 10.0}]);
        let rtf = ModelDefinition::from_value(value).unwrap().into_model(&LawRegistry::new()).unwrap();
        assert_eq!(rtf.inverse_tiepoints(), Some(&[0.0, 100.0, 1100.0][..]));
    }

    #[test]
    fn unknown_named_law_is_reported() {
        let mut value = two_regimes();
        value["model"][0] = json!({"named": "missing"});
        let result = ModelDefinition::from_value(value).unwrap().into_model(&LawRegistry::new());
        assert!(matches!(result, Err(RtfError::UnknownLaw(name)) if name == "missing"));
    }

    #[test]
    fn malformed_files_are_json_errors() {
        assert!(matches!(ModelDefinition::from_json_str("{\"model\": 3}"), Err(RtfError::Json(_))));
        assert!(matches!(
            ModelDefinition::from_reader("/nonexistent/model.json"),
            Err(RtfError::Io(_))
        ));
    }
}

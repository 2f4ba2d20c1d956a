use serde::{
    Deserialize,
    Serialize
};
use serde_json::{
    Map,
    Value
};

use crate::time::calendardate::CalendarEpochs;

pub const DEFAULT_MAX_YBP: f64 = 6000.0;
pub const DEFAULT_FLOOD_START_YBP: f64 = 4301.0;

/// Descriptive record carried by a transfer function.
///
/// Unknown fields of a model file land in `extensions` untouched, so models
/// can carry extra information this crate does not interpret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetadata {
    pub name: String,
    pub reference: String,
    pub description: String,
    pub family: String,
    pub model_class: String,
    pub termination: String,
    /// Number of decay regimes; reset by `configure` unless a model file overrides it.
    pub laws: usize,
    pub isotope_system: String,
    pub max_ybp: f64,
    pub flood_start_ybp: f64,
    pub flood_end_ybp: f64,
    /// H(max_ybp); derived by `configure`.
    pub max_measured_age: f64,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        ModelMetadata {
            name: "User-defined model".to_owned(),
            reference: "n/a".to_owned(),
            description: "This is a default model which does not include accelerated nuclear decay. \
                          Set a model by calling configure."
                .to_owned(),
            family: "n/a".to_owned(),
            model_class: "uniform".to_owned(),
            termination: "n/a".to_owned(),
            laws: 1,
            isotope_system: "generic".to_owned(),
            max_ybp: DEFAULT_MAX_YBP,
            flood_start_ybp: DEFAULT_FLOOD_START_YBP,
            flood_end_ybp: DEFAULT_FLOOD_START_YBP - 1.0,
            max_measured_age: DEFAULT_MAX_YBP,
            extensions: Map::new(),
        }
    }
}

impl ModelMetadata {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_ybp(mut self, max_ybp: f64) -> Self {
        self.max_ybp = max_ybp;
        self.max_measured_age = max_ybp;
        self
    }

    pub fn with_flood(mut self, flood_start_ybp: f64, flood_end_ybp: f64) -> Self {
        self.flood_start_ybp = flood_start_ybp;
        self.flood_end_ybp = flood_end_ybp;
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn calendar_epochs(&self) -> CalendarEpochs {
        CalendarEpochs::new(self.max_ybp, self.flood_start_ybp, self.flood_end_ybp)
    }
}

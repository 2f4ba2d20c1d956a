use thiserror::Error;

pub type Result<T> = std::result::Result<T, RtfError>;

#[derive(Debug, Error)]
pub enum RtfError {
    /// Law sets, tiepoints or metadata that cannot form a model.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("time {time} is outside of the model domain [{min}, {max}]")]
    Domain { time: f64, min: f64, max: f64 },

    #[error("measured age {measured} is outside of the radiometric range [{min}, {max}]")]
    Range { measured: f64, min: f64, max: f64 },

    /// The numerical inverter gave up; `best_estimate` is the closest time it visited.
    #[error("inversion of {target} did not converge after {iterations} iterations (best estimate {best_estimate})")]
    Convergence {
        target: f64,
        best_estimate: f64,
        iterations: u64,
    },

    #[error("the transfer function has not been configured")]
    NotConfigured,

    #[error("law '{0}' not found")]
    UnknownLaw(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RtfError {
    pub fn configuration(message: impl Into<String>) -> RtfError {
        RtfError::Configuration(message.into())
    }

    /// Numerical estimate carried by a `Convergence` error, if any.
    pub fn best_estimate(&self) -> Option<f64> {
        match self {
            RtfError::Convergence { best_estimate, .. } => Some(*best_estimate),
            _ => None,
        }
    }
}

use iso_network::ConfigurationError;
use thiserror::Error;

pub type BindResult<T> = Result<T, BindError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("Scenario '{scenario}' does not bind '{symbol}'")]
    MissingParameter { scenario: String, symbol: String },

    #[error("Scenario '{scenario}' has invalid value {value} for '{symbol}': {reason}")]
    InvalidValue {
        scenario: String,
        symbol: String,
        value: f64,
        reason: &'static str,
    },

    #[error("Duplicate scenario name: {name}")]
    DuplicateScenario { name: String },

    #[error("Scenario '{scenario}' inherits from unknown scenario '{base}'")]
    UnknownScenario { scenario: String, base: String },

    #[error("Scenario '{scenario}' inherits from itself")]
    CyclicBase { scenario: String },

    #[error("Scenario '{scenario}' gives reaction '{reaction}' invalid weights: {reason}")]
    InvalidWeights {
        scenario: String,
        reaction: String,
        reason: String,
    },

    #[error(transparent)]
    Network(#[from] ConfigurationError),
}

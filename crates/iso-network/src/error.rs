//! Network configuration errors.

use thiserror::Error;

use crate::model::Side;

pub type NetworkResult<T> = Result<T, ConfigurationError>;

/// A malformed network: raised while building, parsing or compiling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The network must carry exactly one isotope system.
    #[error("Network must declare exactly one isotope (found {count})")]
    IsotopeCount { count: usize },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("Reaction '{reaction}' has no {side} endpoints")]
    EmptySide { reaction: String, side: Side },

    /// An endpoint or a `component.isotope` symbol names a component that does not exist.
    #[error("Reaction '{reaction}' references unknown component '{component}'")]
    DanglingComponent { reaction: String, component: String },

    #[error(
        "Reaction '{reaction}' references isotope '{isotope}' via '{symbol}', but only '{declared}' is declared"
    )]
    UndeclaredIsotope {
        reaction: String,
        symbol: String,
        isotope: String,
        declared: String,
    },

    #[error("Reaction '{reaction}' lists component '{component}' more than once as a {side}")]
    DuplicateEndpoint {
        reaction: String,
        component: String,
        side: Side,
    },

    /// Several endpoints on one side but no weights to split flux and blend isotopes.
    #[error(
        "Reaction '{reaction}' has {count} {side} endpoints but not all of them declare a weight"
    )]
    AmbiguousRouting {
        reaction: String,
        side: Side,
        count: usize,
    },

    #[error("Reaction '{reaction}' has invalid {side} weights: {reason}")]
    InvalidWeights {
        reaction: String,
        side: Side,
        reason: String,
    },

    #[error("Invalid symbol '{symbol}' in reaction '{reaction}'")]
    InvalidSymbol { reaction: String, symbol: String },

    #[error("Failed to parse '{input}' at position {position}: {message}")]
    Parse {
        input: String,
        position: usize,
        message: String,
    },
}

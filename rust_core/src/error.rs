//! Error types for the marshalling layer.
//!
//! Each variant maps onto one host-language exception class:
//! - `UnsupportedElement` / `UnsupportedValue`: not-implemented
//! - `EmptyInput` / `ArgumentParse`: value errors
//! - `NamingConvention`: attribute errors
//! - `Cast`: type errors
//!
//! Gateway faults are carried through untouched.

use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// An array-like value holds an element of a type that has no tensor counterpart.
    #[error("Generic types in an ndarray are not supported. Was given {0}")]
    UnsupportedElement(String),

    /// A scalar position received something that is neither an array nor a number.
    #[error("Argument t must be either an ndarray or an instance of numbers.Number. Was given {0} instead")]
    UnsupportedValue(String),

    #[error("Cannot infer type because the ndarray is empty")]
    EmptyInput,

    #[error("Can't parse generic argument. Was given {0}")]
    ArgumentParse(String),

    #[error("'{name}' does not follow the {expected} naming convention")]
    NamingConvention { name: String, expected: String },

    #[error("Cannot cast {from} to {to}")]
    Cast { from: String, to: String },

    #[error("Tensor is not a scalar (shape {0:?})")]
    NotScalar(Vec<usize>),

    #[error("A vertex named '{0}' is already registered in this model")]
    DuplicateName(String),

    #[error("Invalid sampling request: {0}")]
    Sampling(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl BridgeError {
    pub fn cast(from: impl Into<String>, to: impl std::fmt::Display) -> Self {
        Self::Cast {
            from: from.into(),
            to: to.to_string(),
        }
    }

    /// True for both flavours of "type has no tensor counterpart".
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedElement(_) | Self::UnsupportedValue(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

use thiserror::Error;

use crate::encoding::families::ConstraintFamily;
use crate::encoding::variable::VariableKind;

#[derive(Error, Debug)]
pub enum PackError {
    // Namespace errors
    #[error("Invalid variable kind: {kind}")]
    InvalidVariableKind { kind: String },

    #[error("Variable kind '{kind}' takes {expected} indices, got {found}")]
    InvalidArity {
        kind: VariableKind,
        expected: usize,
        found: usize,
    },

    #[error("Invalid index in {key}: {reason}")]
    InvalidIndex { key: String, reason: String },

    // Raised by a constraint generator, wraps the namespace error it hit
    #[error("{family} constraints: {source}")]
    InFamily {
        family: ConstraintFamily,
        #[source]
        source: Box<PackError>,
    },

    // Instance errors
    #[error("Axis {axis} out of range for dimension {dimension}")]
    AxisOutOfRange { axis: usize, dimension: usize },

    #[error("Malformed instance: {reason}")]
    MalformedInstance { reason: String },

    // Model interpretation errors
    #[error("Model is inconsistent with the encoding: {reason}")]
    InconsistentModel { reason: String },

    #[error("Invalid packing: {reason}")]
    InvalidPacking { reason: String },

    // Interchange errors
    #[error("DIMACS error on line {line}: {reason}")]
    Dimacs { line: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackError {
    /// Create a malformed instance error
    pub fn malformed(reason: impl Into<String>) -> Self {
        PackError::MalformedInstance {
            reason: reason.into(),
        }
    }

    /// Create an inconsistent model error
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        PackError::InconsistentModel {
            reason: reason.into(),
        }
    }

    /// Attach the constraint family that was being generated
    pub fn in_family(self, family: ConstraintFamily) -> Self {
        PackError::InFamily {
            family,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping family context
    pub fn root(&self) -> &PackError {
        match self {
            PackError::InFamily { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;

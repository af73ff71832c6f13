//! Error type shared by the classifier, the kernels and the dispatcher.
//!
//! Every variant is produced synchronously and before the output buffer is
//! touched by the failing step. Nothing is retried; the caller decides whether
//! the whole inference call is lost.

use briny::prelude::ValidationError;
use thiserror::Error;

/// Failure of a binary elementwise layer.
#[derive(Error, Debug)]
pub enum EltwiseError {
    /// Layer configuration missing or of the wrong kind.
    #[error("layer parameter error: {0}")]
    Param(String),

    /// A shape pair without a specialized loop was not routed to the general engine.
    #[error("unsupported broadcast between {lhs:?} and {rhs:?}")]
    UnsupportedBroadcast {
        /// Shape of the first operand.
        lhs: Vec<usize>,
        /// Shape of the second operand.
        rhs: Vec<usize>,
    },

    /// Operator tag with no compiled kernel.
    #[error("unsupported binary operator: {0}")]
    UnsupportedOperator(String),

    /// Shapes that do not broadcast against each other or against the output.
    #[error("shapes {lhs:?} and {rhs:?} are not broadcast-compatible")]
    IncompatibleShapes {
        /// Left shape.
        lhs: Vec<usize>,
        /// Right shape.
        rhs: Vec<usize>,
    },

    /// Buffer length disagrees with its shape.
    #[error("invalid operand: {0}")]
    InvalidOperand(ValidationError),
}

impl From<ValidationError> for EltwiseError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidOperand(err)
    }
}

impl EltwiseError {
    pub(crate) fn param(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::error!("{msg}");
        Self::Param(msg)
    }

    pub(crate) fn incompatible(lhs: &[usize], rhs: &[usize]) -> Self {
        log::error!("shapes {lhs:?} and {rhs:?} are not broadcast-compatible");
        Self::IncompatibleShapes {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }
}

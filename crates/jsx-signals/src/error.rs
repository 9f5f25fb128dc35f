//! Signal engine error types.

use crate::runtime::NodeId;
use thiserror::Error;

/// An error raised while reading, writing or flushing reactive nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// A computed was read while it was already being evaluated.
    #[error("circular dependency detected while evaluating {node}")]
    CircularDependency {
        /// The node that was re-entered.
        node: NodeId,
    },

    /// The node was disposed before it was read.
    #[error("reactive node {node} has been disposed")]
    Disposed {
        /// The disposed node.
        node: NodeId,
    },

    /// Effects kept re-scheduling each other past the flush limit.
    #[error("effects re-ran more than {limit} times in one flush")]
    RunawayFlush {
        /// The run limit that was exceeded.
        limit: usize,
    },

    /// A computed or effect body reported a failure.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl SignalError {
    /// Creates an [`SignalError::Evaluation`] from any displayable message.
    pub fn evaluation(message: impl std::fmt::Display) -> Self {
        Self::Evaluation(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SignalError::evaluation("boom").to_string(),
            "evaluation failed: boom"
        );
        assert_eq!(
            SignalError::RunawayFlush { limit: 10 }.to_string(),
            "effects re-ran more than 10 times in one flush"
        );
    }
}

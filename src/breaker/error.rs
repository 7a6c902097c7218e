//! Circuit execution errors.

use thiserror::Error;

/// Raised when the action wrapped by a circuit fails.
///
/// The failure has already been counted by the circuit by the time this
/// error exists. The original failure is kept as the error source.
#[derive(Error, Debug)]
#[error("a circuit execution error occurred while executing circuit {circuit}")]
pub struct CircuitExecutionError<E> {
    circuit: String,
    #[source]
    source: E,
}

impl<E> CircuitExecutionError<E> {
    pub(crate) fn new(circuit: impl Into<String>, source: E) -> Self {
        Self {
            circuit: circuit.into(),
            source,
        }
    }

    /// Name of the circuit whose action failed.
    pub fn circuit(&self) -> &str {
        &self.circuit
    }

    /// The failure returned by the action.
    pub fn cause(&self) -> &E {
        &self.source
    }

    /// Unwrap into the failure returned by the action.
    pub fn into_source(self) -> E {
        self.source
    }
}

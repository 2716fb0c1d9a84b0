use thiserror::Error;

/// An error type indicating a network that cannot be
/// built as described, or an evaluation call it rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Neuron counts or evaluation parameters are unusable.
    #[error("invalid network configuration: {0}")]
    InvalidConfiguration(String),
    /// The same ordered neuron pair was connected twice.
    #[error("duplicate connection {from} -> {to}")]
    DuplicateConnection { from: usize, to: usize },
    /// A connection referenced a neuron outside the network.
    #[error("connection {from} -> {to} references a neuron outside 0..{neurons}")]
    InvalidConnection {
        from: usize,
        to: usize,
        neurons: usize,
    },
    /// An activation function was set on a neuron outside the network.
    #[error("activation function set on neuron {neuron}, outside 0..{neurons}")]
    InvalidNeuron { neuron: usize, neurons: usize },
    /// An input vector's length did not match the network's input count.
    #[error("expected {expected} inputs, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
}

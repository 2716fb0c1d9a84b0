use crate::Innovation;

use thiserror::Error;

/// An error type indicating a genome whose I/O structure
/// cannot support the requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GenomeError {
    /// The genome contains no input nodes.
    #[error("genome has no input nodes")]
    MissingInputs,
    /// The genome contains no output nodes.
    #[error("genome has no output nodes")]
    MissingOutputs,
}

/// An error type indicating a failure
/// to carry out a structural mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MutationError {
    /// There was no edge to split.
    #[error("node mutation on genome without edges")]
    EmptyGenome,
    /// No acceptable pair of nodes was found to connect.
    #[error("no viable node pair found for edge mutation after {attempts} attempts")]
    NoViablePair { attempts: usize },
}

/// An error type indicating the edge being
/// added is invalid for the genome.
#[derive(Debug, Error)]
pub(crate) enum EdgeViabilityError {
    #[error("duplicate edge insertion with id {0}")]
    DuplicateEdgeId(Innovation),
    #[error("edge insertion between nonexistent endpoint(s) {0} -> {1}")]
    NonexistentEndpoints(Innovation, Innovation),
    #[error("edge insertion with id {0} shadows edge with endpoints {1} -> {2}")]
    DuplicateEndpoints(Innovation, Innovation, Innovation),
}

/// An error type indicating the node being
/// added is invalid for the genome.
#[derive(Debug, Error)]
pub(crate) enum NodeViabilityError {
    #[error("duplicate node insertion with id {0}")]
    DuplicateNodeId(Innovation),
}

use std::fmt;

/// One end of a weighted connection, as seen from
/// the neuron holding it: the neuron at the other
/// end, and the connection's weight.
#[derive(Clone, Copy, PartialEq)]
pub(crate) struct Dendrite {
    pub neuron: usize,
    pub weight: f32,
}

impl Dendrite {
    /// Creates a new Dendrite reaching the specified
    /// neuron with the specified weight.
    pub fn new(neuron: usize, weight: f32) -> Dendrite {
        Dendrite { neuron, weight }
    }
}

impl fmt::Debug for Dendrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.9}", self.neuron, self.weight)
    }
}

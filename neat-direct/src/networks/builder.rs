use crate::networks::{ActivationType, Dendrite, Network, NetworkConfig, NetworkError};

use ahash::RandomState;

use std::collections::HashSet;

/// Describes a network to be built: neuron counts, weighted
/// connections between dense neuron indices, and evaluation
/// parameters.
///
/// Neurons are indexed as inputs `0..inputs`, then outputs,
/// then hidden neurons. Nothing is validated until
/// [`build`](NetworkBuilder::build), so a malformed description
/// never produces a partially built network.
///
/// # Examples
/// ```
/// use neat_direct::networks::{ActivationType, NetworkBuilder};
///
/// let mut network = NetworkBuilder::new()
///     .inputs(2)
///     .outputs(1)
///     .hidden(1)
///     .connect(0, 3, 1.0)
///     .connect(1, 3, 1.0)
///     .connect(3, 2, 2.0)
///     .set_function(3, ActivationType::ReLU)
///     .set_function(2, ActivationType::Identity)
///     .build()
///     .unwrap();
///
/// assert_eq!(network.calculate(&[0.5, 1.0]).unwrap(), vec![3.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct NetworkBuilder {
    inputs: usize,
    outputs: usize,
    hidden: usize,
    config: NetworkConfig,
    connections: Vec<(usize, usize, f32)>,
    functions: Vec<(usize, ActivationType)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

impl NetworkBuilder {
    /// Starts an empty description with the default [`NetworkConfig`].
    pub fn new() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    /// Sets the number of input neurons.
    pub fn inputs(mut self, count: usize) -> NetworkBuilder {
        self.inputs = count;
        self
    }

    /// Sets the number of output neurons.
    pub fn outputs(mut self, count: usize) -> NetworkBuilder {
        self.outputs = count;
        self
    }

    /// Sets the number of hidden neurons.
    pub fn hidden(mut self, count: usize) -> NetworkBuilder {
        self.hidden = count;
        self
    }

    /// Replaces the whole evaluation configuration.
    pub fn config(mut self, config: NetworkConfig) -> NetworkBuilder {
        self.config = config;
        self
    }

    /// Sets the maximum number of passes of recurrent evaluation.
    pub fn max_recurrent_cycles(mut self, cycles: usize) -> NetworkBuilder {
        self.config.max_recurrent_cycles = cycles;
        self
    }

    /// Sets the convergence threshold of recurrent evaluation.
    pub fn convergence_epsilon(mut self, epsilon: f32) -> NetworkBuilder {
        self.config.convergence_epsilon = epsilon;
        self
    }

    /// Adds a connection carrying `from`'s activation,
    /// times `weight`, into `to`'s input sum.
    pub fn connect(mut self, from: usize, to: usize, weight: f32) -> NetworkBuilder {
        self.connections.push((from, to, weight));
        self
    }

    /// Overrides the activation function of a single neuron.
    /// Later calls for the same neuron take precedence.
    pub fn set_function(mut self, neuron: usize, function: ActivationType) -> NetworkBuilder {
        self.functions.push((neuron, function));
        self
    }

    /// Validates the description and builds the network.
    ///
    /// Whether the network is recurrent is decided here, once.
    /// Connections leaving a neuron that no input can reach are
    /// dropped, since such a neuron never carries a signal.
    ///
    /// # Errors
    /// Returns an error if there are no inputs or outputs, if the
    /// recurrent evaluation parameters are unusable, if a connection
    /// or activation function references a neuron out of range, or
    /// if the same ordered pair of neurons is connected twice.
    pub fn build(self) -> Result<Network, NetworkError> {
        if self.inputs == 0 {
            return Err(NetworkError::InvalidConfiguration(
                "network needs at least one input".into(),
            ));
        }
        if self.outputs == 0 {
            return Err(NetworkError::InvalidConfiguration(
                "network needs at least one output".into(),
            ));
        }
        if self.config.max_recurrent_cycles == 0 {
            return Err(NetworkError::InvalidConfiguration(
                "max_recurrent_cycles must be positive".into(),
            ));
        }
        let epsilon = self.config.convergence_epsilon;
        if epsilon.is_nan() || epsilon < 0.0 {
            return Err(NetworkError::InvalidConfiguration(format!(
                "convergence_epsilon must be non-negative, got {}",
                epsilon
            )));
        }

        let neurons = self.inputs + self.outputs + self.hidden;
        let mut outgoing = vec![vec![]; neurons];
        let mut seen: HashSet<(usize, usize), RandomState> = HashSet::default();
        for &(from, to, weight) in &self.connections {
            if from >= neurons || to >= neurons {
                return Err(NetworkError::InvalidConnection { from, to, neurons });
            }
            if !seen.insert((from, to)) {
                return Err(NetworkError::DuplicateConnection { from, to });
            }
            outgoing[from].push(Dendrite::new(to, weight));
        }

        let (recurrent, reached) = search_from_inputs(self.inputs, &outgoing);
        for (dendrites, reached) in outgoing.iter_mut().zip(&reached) {
            if !reached {
                dendrites.clear();
            }
        }
        let mut incoming = vec![vec![]; neurons];
        for (from, dendrites) in outgoing.iter().enumerate() {
            for dendrite in dendrites {
                incoming[dendrite.neuron].push(Dendrite::new(from, dendrite.weight));
            }
        }
        for dendrites in outgoing.iter_mut().chain(incoming.iter_mut()) {
            dendrites.sort_unstable_by_key(|d| d.neuron);
        }

        let mut activation_functions: Vec<_> = (0..neurons)
            .map(|i| {
                if i < self.inputs {
                    ActivationType::Identity
                } else if i < self.inputs + self.outputs {
                    self.config.output_activation
                } else {
                    self.config.hidden_activation
                }
            })
            .collect();
        for &(neuron, function) in &self.functions {
            match activation_functions.get_mut(neuron) {
                Some(slot) => *slot = function,
                None => return Err(NetworkError::InvalidNeuron { neuron, neurons }),
            }
        }

        Ok(Network {
            input_count: self.inputs,
            output_count: self.outputs,
            input_sums: vec![0.0; neurons].into(),
            activation_levels: vec![0.0; neurons].into(),
            activation_functions: activation_functions.into(),
            outgoing: outgoing.into_iter().map(|v| v.into()).collect(),
            incoming: incoming.into_iter().map(|v| v.into()).collect(),
            recurrent,
            max_recurrent_cycles: self.config.max_recurrent_cycles,
            convergence_epsilon: self.config.convergence_epsilon,
            last_pass_count: 0,
        })
    }
}

/// Depth-first search from every input neuron, with an explicit
/// stack. A connection from a reached neuron into an input, or to a
/// neuron still on the current path, makes the network recurrent.
///
/// Returns the recurrence flag and which neurons were reached.
fn search_from_inputs(input_count: usize, outgoing: &[Vec<Dendrite>]) -> (bool, Vec<bool>) {
    let mut recurrent = false;
    let mut visits = vec![Visit::Unvisited; outgoing.len()];
    for root in 0..input_count {
        if visits[root] != Visit::Unvisited {
            continue;
        }
        visits[root] = Visit::InProgress;
        let mut stack = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let (neuron, cursor) = *top;
            top.1 += 1;
            match outgoing[neuron].get(cursor) {
                Some(dendrite) => {
                    if dendrite.neuron < input_count {
                        recurrent = true;
                    }
                    match visits[dendrite.neuron] {
                        Visit::InProgress => recurrent = true,
                        Visit::Done => {}
                        Visit::Unvisited => {
                            visits[dendrite.neuron] = Visit::InProgress;
                            stack.push((dendrite.neuron, 0));
                        }
                    }
                }
                None => {
                    visits[neuron] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }
    let reached = visits.into_iter().map(|v| v == Visit::Done).collect();
    (recurrent, reached)
}

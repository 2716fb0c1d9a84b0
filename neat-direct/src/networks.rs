//! A Network is the compiled phenotype of a Genome:
//! a simpler, immutable graph of neurons and weighted
//! connections, with disabled genes left out.
//!
//! Networks are evaluated by relaxation passes, breadth-first
//! from the input neurons. Feed-forward networks need a single
//! pass per [`calculate`](Network::calculate) call; recurrent
//! ones are iterated towards a fixed point. For real-time tasks,
//! where each call is a discrete time-step rather than a full
//! input-result mapping, [`step`](Network::step) propagates
//! backwards from the outputs instead.
mod activation;
mod builder;
mod config;
mod dendrite;
mod errors;

pub use activation::ActivationType;
pub use builder::NetworkBuilder;
pub use config::NetworkConfig;
use dendrite::Dendrite;
pub use errors::NetworkError;

use tracing::debug;

use std::collections::VecDeque;
use std::fmt;

/// An arbitrarily-structured neural network.
///
/// Neurons are stored as dense indices: inputs first, then
/// outputs, then hidden neurons. Each neuron carries an input
/// sum, which accumulates weighted activations until the neuron
/// is computed, and its last activation level.
///
/// A network holds mutable evaluation state and so must not be
/// evaluated by more than one caller at a time; distinct
/// networks may be evaluated in parallel.
#[derive(Clone, Debug)]
pub struct Network {
    input_count: usize,
    output_count: usize,
    input_sums: Box<[f32]>,
    activation_levels: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    outgoing: Box<[Box<[Dendrite]>]>,
    incoming: Box<[Box<[Dendrite]>]>,
    recurrent: bool,
    max_recurrent_cycles: usize,
    convergence_epsilon: f32,
    last_pass_count: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// From the inputs, along outgoing connections.
    Forward,
    /// From the outputs, along incoming connections.
    Backward,
}

impl Network {
    /// Evaluates the network on the passed inputs,
    /// returning the activation levels of the output neurons.
    ///
    /// Feed-forward networks run a single relaxation pass: each
    /// neuron is computed once, when first reached breadth-first
    /// from the inputs. Contributions arriving at a neuron after it
    /// was computed stay in its input sum until the next call, or
    /// until [`flush`](Network::flush).
    ///
    /// Recurrent networks repeat the pass with the same inputs,
    /// up to the configured maximum number of passes, stopping
    /// early once no output changed by the convergence epsilon or
    /// more. The last outputs are returned whether or not they
    /// converged.
    ///
    /// # Errors
    /// Returns an error, leaving the network untouched, if the
    /// number of inputs does not match the network's.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::networks::{NetworkBuilder, NetworkError};
    ///
    /// let mut network = NetworkBuilder::new()
    ///     .inputs(2)
    ///     .outputs(1)
    ///     .connect(0, 2, 5.0)
    ///     .connect(1, 2, 5.0)
    ///     .build()
    ///     .unwrap();
    ///
    /// let output = network.calculate(&[1.0, 1.0]).unwrap()[0];
    /// assert!((output - 1.0 / (1.0 + (-10.0f32).exp())).abs() < 1e-4);
    ///
    /// assert_eq!(
    ///     network.calculate(&[1.0]),
    ///     Err(NetworkError::InvalidInput { expected: 2, actual: 1 })
    /// );
    /// ```
    pub fn calculate(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        self.check_inputs(inputs)?;

        self.relax(inputs, Direction::Forward);
        let mut passes = 1;
        if self.recurrent {
            let mut previous = self.outputs();
            let mut converged = false;
            while passes < self.max_recurrent_cycles {
                self.relax(inputs, Direction::Forward);
                passes += 1;
                let current = self.outputs();
                converged = current
                    .iter()
                    .zip(&previous)
                    .all(|(c, p)| (c - p).abs() < self.convergence_epsilon);
                if converged {
                    break;
                }
                previous = current;
            }
            if !converged {
                debug!(passes, "recurrent evaluation stopped before converging");
            }
        }
        self.last_pass_count = passes;

        Ok(self.outputs())
    }

    /// Advances the network by a single time-step.
    ///
    /// Neurons are computed breadth-first backwards from the
    /// outputs, through incoming connections, so that a signal
    /// needs as many steps to reach the outputs as there are
    /// connections along its path.
    ///
    /// # Errors
    /// Returns an error, leaving the network untouched, if the
    /// number of inputs does not match the network's.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::networks::{ActivationType, NetworkBuilder, NetworkConfig};
    ///
    /// let mut network = NetworkBuilder::new()
    ///     .inputs(1)
    ///     .outputs(1)
    ///     .config(NetworkConfig {
    ///         output_activation: ActivationType::Identity,
    ///         ..NetworkConfig::default()
    ///     })
    ///     .connect(0, 1, 2.0)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(network.step(&[1.0]).unwrap(), vec![0.0]);
    /// assert_eq!(network.step(&[1.0]).unwrap(), vec![2.0]);
    /// ```
    pub fn step(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        self.check_inputs(inputs)?;
        self.relax(inputs, Direction::Backward);
        self.last_pass_count = 1;
        Ok(self.outputs())
    }

    fn check_inputs(&self, inputs: &[f32]) -> Result<(), NetworkError> {
        if inputs.len() == self.input_count {
            Ok(())
        } else {
            Err(NetworkError::InvalidInput {
                expected: self.input_count,
                actual: inputs.len(),
            })
        }
    }

    /// Adds the inputs into the input neurons' sums, then computes
    /// every neuron reachable from the seeds in breadth-first order,
    /// each exactly once, propagating its activation along its
    /// outgoing connections.
    fn relax(&mut self, inputs: &[f32], direction: Direction) {
        for (sum, input) in self.input_sums.iter_mut().zip(inputs) {
            *sum += *input;
        }

        let seeds = match direction {
            Direction::Forward => 0..self.input_count,
            Direction::Backward => self.input_count..self.input_count + self.output_count,
        };
        let mut reached = vec![false; self.neuron_count()];
        let mut queue = VecDeque::with_capacity(self.neuron_count());
        for seed in seeds {
            reached[seed] = true;
            queue.push_back(seed);
        }

        while let Some(current) = queue.pop_front() {
            let activation = self.activation_functions[current].apply(self.input_sums[current]);
            self.input_sums[current] = 0.0;
            self.activation_levels[current] = activation;

            for dendrite in self.outgoing[current].iter() {
                self.input_sums[dendrite.neuron] += activation * dendrite.weight;
            }

            let next = match direction {
                Direction::Forward => &self.outgoing[current],
                Direction::Backward => &self.incoming[current],
            };
            for dendrite in next.iter() {
                if !reached[dendrite.neuron] {
                    reached[dendrite.neuron] = true;
                    queue.push_back(dendrite.neuron);
                }
            }
        }
    }

    /// Clears the input sums and activation levels of all neurons,
    /// so the next evaluation behaves as on a freshly built network.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::networks::NetworkBuilder;
    ///
    /// let mut network = NetworkBuilder::new()
    ///     .inputs(1)
    ///     .outputs(1)
    ///     .connect(0, 1, 1.0)
    ///     .connect(1, 1, 1.0)
    ///     .build()
    ///     .unwrap();
    /// network.calculate(&[1.0]).unwrap();
    /// assert_ne!(network.outputs()[0], 0.0);
    ///
    /// network.flush();
    ///
    /// assert_eq!(network.outputs()[0], 0.0);
    /// ```
    pub fn flush(&mut self) {
        for (input_sum, activation) in self
            .input_sums
            .iter_mut()
            .zip(self.activation_levels.iter_mut())
        {
            *input_sum = 0.0;
            *activation = 0.0;
        }
        self.last_pass_count = 0;
    }

    /// Returns the current output neuron activation levels.
    pub fn outputs(&self) -> Vec<f32> {
        self.activation_levels[self.input_count..self.input_count + self.output_count].to_vec()
    }

    /// Returns whether the network was found to be recurrent when built.
    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    /// Returns the number of input neurons.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output neurons.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the total number of neurons, hidden ones included.
    pub fn neuron_count(&self) -> usize {
        self.activation_levels.len()
    }

    /// Returns the number of connections between neurons.
    pub fn connection_count(&self) -> usize {
        self.outgoing.iter().map(|dendrites| dendrites.len()).sum()
    }

    /// Returns the number of relaxation passes run by the last
    /// evaluation, or 0 if there was none since the last flush.
    pub fn last_pass_count(&self) -> usize {
        self.last_pass_count
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}

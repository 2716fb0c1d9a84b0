//! The boundary between networks and the task they are scored on.
//!
//! A [`ScoringFunction`] produces a sequence of inputs, observes the
//! network's response to each, and finally reports a score, which
//! [`evaluate`] stores as the fitness of the genome under test.
use crate::genomics::Genome;
use crate::networks::{Network, NetworkConfig, NetworkError};

/// A task on which networks are scored.
///
/// A fresh scorer is expected for each network evaluated,
/// so implementors may keep per-evaluation state.
pub trait ScoringFunction {
    /// Returns the next input vector to feed the network,
    /// or `None` once the sequence has ended.
    fn next_input(&mut self) -> Option<Vec<f32>>;

    /// Observes the network's outputs for the last input produced.
    fn consume_output(&mut self, output: &[f32]);

    /// Returns the score of the network, once every input was consumed.
    fn final_score(&self) -> f32;

    /// Whether the network should be flushed before each input,
    /// making every input an independent evaluation.
    fn flush_between(&self) -> bool {
        true
    }

    /// Whether the network solved the task outright.
    fn is_solved(&self) -> bool {
        false
    }
}

/// Drives `network` through every input `scorer` produces,
/// and returns the final score.
///
/// # Errors
/// Returns an error if an input has the wrong length for the network.
pub fn run<S>(network: &mut Network, scorer: &mut S) -> Result<f32, NetworkError>
where
    S: ScoringFunction + ?Sized,
{
    let flush = scorer.flush_between();
    while let Some(input) = scorer.next_input() {
        if flush {
            network.flush();
        }
        let output = network.calculate(&input)?;
        scorer.consume_output(&output);
    }
    Ok(scorer.final_score())
}

/// Compiles `genome`, scores the resulting network, and
/// stores the score as the genome's fitness.
///
/// # Errors
/// Returns an error if the genome cannot be compiled with
/// `config`, or if the scorer produces inputs of the wrong length.
///
/// # Examples
/// ```
/// use neat_direct::genomics::{GeneticConfig, Genome, InnovationCache};
/// use neat_direct::networks::NetworkConfig;
/// use neat_direct::scoring::{evaluate, ScoringFunction};
///
/// /// Rewards outputs close to 1.
/// struct Reach {
///     remaining: usize,
///     total: f32,
/// }
///
/// impl ScoringFunction for Reach {
///     fn next_input(&mut self) -> Option<Vec<f32>> {
///         self.remaining = self.remaining.checked_sub(1)?;
///         Some(vec![10.0])
///     }
///
///     fn consume_output(&mut self, output: &[f32]) {
///         self.total += output[0];
///     }
///
///     fn final_score(&self) -> f32 {
///         self.total
///     }
/// }
///
/// let config = GeneticConfig::zero();
/// let mut genome = Genome::new(&config);
/// genome.initialize(&InnovationCache::new(&config)).unwrap();
///
/// let mut scorer = Reach { remaining: 3, total: 0.0 };
/// let score = evaluate(&mut genome, &mut scorer, &NetworkConfig::default()).unwrap();
///
/// assert!(score > 2.99);
/// assert_eq!(genome.fitness(), score);
/// ```
pub fn evaluate<S>(
    genome: &mut Genome,
    scorer: &mut S,
    config: &NetworkConfig,
) -> Result<f32, NetworkError>
where
    S: ScoringFunction + ?Sized,
{
    let mut network = genome.compile_with(config)?;
    let score = run(&mut network, scorer)?;
    genome.set_fitness(score);
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{ActivationType, NetworkBuilder};

    /// Feeds the same input a fixed number of times and
    /// records every output.
    struct Repeat {
        input: Vec<f32>,
        remaining: usize,
        flush: bool,
        seen: Vec<f32>,
    }

    impl Repeat {
        fn new(input: Vec<f32>, times: usize, flush: bool) -> Repeat {
            Repeat {
                input,
                remaining: times,
                flush,
                seen: vec![],
            }
        }
    }

    impl ScoringFunction for Repeat {
        fn next_input(&mut self) -> Option<Vec<f32>> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            Some(self.input.clone())
        }

        fn consume_output(&mut self, output: &[f32]) {
            self.seen.extend_from_slice(output);
        }

        fn final_score(&self) -> f32 {
            self.seen.iter().sum()
        }

        fn flush_between(&self) -> bool {
            self.flush
        }
    }

    /// Output accumulates a late contribution
    /// from a longer path between calls.
    fn stateful() -> Network {
        NetworkBuilder::new()
            .inputs(2)
            .outputs(1)
            .hidden(2)
            .config(NetworkConfig {
                hidden_activation: ActivationType::Identity,
                output_activation: ActivationType::Identity,
                ..NetworkConfig::default()
            })
            .connect(0, 3, 1.0)
            .connect(3, 4, 1.0)
            .connect(4, 2, 1.0)
            .connect(1, 2, 1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn flushing_isolates_inputs() {
        let mut scorer = Repeat::new(vec![1.0, 1.0], 3, true);
        let score = run(&mut stateful(), &mut scorer).unwrap();
        assert_eq!(scorer.seen, vec![1.0, 1.0, 1.0]);
        assert_eq!(score, 3.0);
    }

    #[test]
    fn state_carries_without_flushing() {
        let mut scorer = Repeat::new(vec![1.0, 1.0], 3, false);
        let score = run(&mut stateful(), &mut scorer).unwrap();
        assert_eq!(scorer.seen, vec![1.0, 2.0, 2.0]);
        assert_eq!(score, 5.0);
    }

    #[test]
    fn wrong_input_length_is_reported() {
        let mut scorer = Repeat::new(vec![1.0], 1, true);
        assert_eq!(
            run(&mut stateful(), &mut scorer),
            Err(NetworkError::InvalidInput {
                expected: 2,
                actual: 1
            })
        );
        assert!(scorer.seen.is_empty());
    }

    #[test]
    fn evaluate_sets_fitness() {
        let config = crate::genomics::GeneticConfig::zero();
        let mut genome = Genome::new(&config);
        genome.add_edge(0, 0, 1, 0.0);
        let mut scorer = Repeat::new(vec![4.0], 2, true);

        let score = evaluate(&mut genome, &mut scorer, &NetworkConfig::default()).unwrap();
        assert_eq!(score, 1.0);
        assert_eq!(genome.fitness(), 1.0);
    }

    #[test]
    fn evaluate_reports_bad_config() {
        let mut genome = Genome::new(&crate::genomics::GeneticConfig::zero());
        let config = NetworkConfig {
            max_recurrent_cycles: 0,
            ..NetworkConfig::default()
        };
        let mut scorer = Repeat::new(vec![0.0], 1, true);
        assert!(matches!(
            evaluate(&mut genome, &mut scorer, &config),
            Err(NetworkError::InvalidConfiguration(_))
        ));
        assert_eq!(genome.fitness(), 0.0);
    }
}

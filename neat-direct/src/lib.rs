//! # neat-direct
//! A direct-encoding implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Provides:
//! - [`Genome`]: a graph of node and edge genes tagged with innovation numbers,
//!   supporting initialization, mutation, crossover and compatibility distance.
//! - [`InnovationCache`]: the shared ledger that gives identical structural
//!   mutations identical innovation numbers, safe to use from many threads.
//! - [`Network`]: the compiled phenotype of a genome, evaluated either with a
//!   single breadth-first pass or, for recurrent topologies, by iterating
//!   towards a fixed point.
//! - [`ScoringFunction`]: the boundary through which a fitness harness feeds
//!   a network and reports a score back onto its genome.
//!
//! Population-level concerns (speciation, fitness sharing, replacement) are
//! left to the caller.
//!
//! [`Genome`]: crate::genomics::Genome
//! [`InnovationCache`]: crate::genomics::InnovationCache
//! [`Network`]: crate::networks::Network
//! [`ScoringFunction`]: crate::scoring::ScoringFunction
//!
//! # Example usage
//! ```
//! use neat_direct::genomics::{GeneticConfig, Genome, InnovationCache};
//! use std::num::NonZeroUsize;
//!
//! let config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     ..GeneticConfig::default()
//! };
//! let cache = InnovationCache::new(&config);
//! let mut rng = rand::thread_rng();
//!
//! let mut first = Genome::new(&config);
//! first.initialize(&cache).unwrap();
//! let mut second = first.clone();
//!
//! for _ in 0..10 {
//!     first.mutate(&cache, &config, &mut rng);
//!     second.mutate(&cache, &config, &mut rng);
//! }
//!
//! first.set_fitness(1.0);
//! let child = Genome::mate(&first, &second, &cache, &config, &mut rng);
//! println!("distance to parent: {}", child.compatibility_distance(&first, &config));
//!
//! let mut network = child.compile().unwrap();
//! let outputs = network.calculate(&[0.0, 1.0]).unwrap();
//! assert_eq!(outputs.len(), 1);
//! ```

pub mod genomics;
pub mod networks;
pub mod scoring;

mod rng;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

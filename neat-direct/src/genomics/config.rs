use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Values
/// outside of it saturate: anything ≤ 0 never
/// happens, anything ≥ 1 always does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Chance that a mutation splits an edge with a new node.
    /// Checked first, before any other mutation.
    pub node_addition_chance: f32,
    /// Chance that a mutation adds a new edge, if
    /// no node was added.
    pub edge_addition_chance: f32,
    /// Maximum number of random node pairs tried
    /// during an edge addition before giving up.
    pub max_edge_addition_attempts: usize,
    /// Chance that all edge weights are perturbed during
    /// a non-structural mutation.
    pub weight_mutation_chance: f32,
    /// Chance that a perturbed weight is reset
    /// instead of nudged.
    pub weight_reset_chance: f32,
    /// Chance that one edge has its enabled status flipped
    /// during a non-structural mutation.
    pub edge_toggle_chance: f32,
    /// Whether edge additions may close cycles or
    /// terminate at input nodes.
    pub allow_recurrence: bool,
    /// Chance that a matching edge is disabled in a child
    /// if either parent has it disabled.
    pub cross_disable_chance: f32,
    /// Chance that matching edge weights are averaged during
    /// mating, instead of copied from a randomly chosen parent.
    pub mate_by_averaging_chance: f32,
    /// Chance that a child is mutated after mating.
    pub child_mutation_chance: f32,
    /// Magnitude of the uniform range a reset weight is drawn from.
    pub weight_init_range: f32,
    /// Magnitude of the uniform range a weight nudge is drawn from.
    pub weight_step_max: f32,
    /// Weight of excess genes in compatibility distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in compatibility distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the mean matching-gene weight difference
    /// in compatibility distance.
    pub common_weight_factor: f32,
    /// Whether excess and disjoint counts are divided by the
    /// number of aligned genes. Disabled, the counts are used
    /// as they are.
    pub normalize_distance: bool,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, `false`, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     node_addition_chance: 1.0,
    ///     allow_recurrence: true,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            node_addition_chance: 0.0,
            edge_addition_chance: 0.0,
            max_edge_addition_attempts: 0,
            weight_mutation_chance: 0.0,
            weight_reset_chance: 0.0,
            edge_toggle_chance: 0.0,
            allow_recurrence: false,
            cross_disable_chance: 0.0,
            mate_by_averaging_chance: 0.0,
            child_mutation_chance: 0.0,
            weight_init_range: 0.0,
            weight_step_max: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
            normalize_distance: false,
        }
    }
}

impl Default for GeneticConfig {
    /// A single input and output, with the
    /// usual NEAT mutation rates and distance
    /// coefficients.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            node_addition_chance: 0.03,
            edge_addition_chance: 0.05,
            max_edge_addition_attempts: 30,
            weight_mutation_chance: 0.8,
            weight_reset_chance: 0.1,
            edge_toggle_chance: 0.04,
            allow_recurrence: false,
            cross_disable_chance: 0.75,
            mate_by_averaging_chance: 0.4,
            child_mutation_chance: 0.65,
            weight_init_range: 2.0,
            weight_step_max: 2.0,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            normalize_distance: false,
        }
    }
}

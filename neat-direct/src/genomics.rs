//! Genomes are the focus of evolution in NEAT.
//! They are a collection of node and edge genes that can be compiled
//! into a phenotype (a neural network). Genomes can be progressively
//! mutated, thus adding complexity and functionality, while
//! innovation numbers keep genomes of different lineages comparable.

mod alignment;
mod config;
mod errors;
mod genes;
mod history;
mod nodes;

use alignment::{Aligned, Alignment, Side};
pub use config::GeneticConfig;
use errors::{EdgeViabilityError, NodeViabilityError};
pub use errors::{GenomeError, MutationError};
pub use genes::EdgeGene;
pub use history::{InnovationCache, NodeSplit};
pub use nodes::{NodeGene, NodeKind};

use crate::networks::{Network, NetworkBuilder, NetworkConfig, NetworkError};
use crate::rng::Chance;
use crate::Innovation;

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A summary of what a call to [`Genome::mutate`] changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mutation {
    /// An edge was split by a new node.
    AddNode {
        /// The innovation number of the split, now disabled, edge.
        split_edge: Innovation,
        /// The new node and edges.
        split: NodeSplit,
    },
    /// A new edge was added.
    AddEdge(Innovation),
    /// No structural mutation was chosen; weights may have been
    /// perturbed, and an edge may have been toggled.
    Parametric {
        weights_perturbed: bool,
        toggled_edge: Option<Innovation>,
    },
    /// A structural mutation was chosen but could not be carried out.
    Skipped(MutationError),
}

/// A mutable collection of node and edge genes,
/// each keyed and ordered by innovation number.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Genome {
    nodes: BTreeMap<Innovation, NodeGene>,
    edges: BTreeMap<Innovation, EdgeGene>,
    fitness: f32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl Genome {
    /// Create a new genome with the specified configuration.
    ///
    /// Input nodes are given the innovation numbers `0..input_count`,
    /// and output nodes `input_count..input_count + output_count`,
    /// matching the numbers reserved by [`InnovationCache::new`].
    /// The genome starts without edges; see [`Genome::initialize`].
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome, NodeKind};
    /// use std::num::NonZeroUsize;
    ///
    /// let genome = Genome::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Input).count(), 3);
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Output).count(), 2);
    /// assert_eq!(genome.edges().count(), 0);
    /// ```
    pub fn new(config: &GeneticConfig) -> Genome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let nodes = (0..input_count)
            .map(|i| NodeGene::new(i, NodeKind::Input))
            .chain((input_count..input_count + output_count).map(|o| NodeGene::new(o, NodeKind::Output)))
            .map(|n| (n.innovation(), n))
            .collect();

        Genome {
            nodes,
            edges: BTreeMap::new(),
            fitness: 0.0,
        }
    }

    /// Fully connects every input node to every output node
    /// with weight 1.0, interning each edge through the cache.
    /// Existing connections are left untouched.
    ///
    /// # Errors
    /// Returns an error if the genome lacks input or output nodes.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome, GenomeError, InnovationCache};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let cache = InnovationCache::new(&config);
    ///
    /// let mut genome = Genome::new(&config);
    /// genome.initialize(&cache).unwrap();
    /// assert_eq!(genome.edges().count(), 3 * 2);
    /// assert!(genome.edges().all(|e| e.weight() == 1.0 && e.enabled()));
    ///
    /// // Genomes initialized through the same cache share innovation numbers.
    /// let mut other = Genome::new(&config);
    /// other.initialize(&cache).unwrap();
    /// assert_eq!(genome, other);
    ///
    /// assert_eq!(Genome::default().initialize(&cache), Err(GenomeError::MissingInputs));
    /// ```
    pub fn initialize(&mut self, cache: &InnovationCache) -> Result<(), GenomeError> {
        let inputs = self.ids_of_kind(NodeKind::Input);
        let outputs = self.ids_of_kind(NodeKind::Output);
        if inputs.is_empty() {
            return Err(GenomeError::MissingInputs);
        }
        if outputs.is_empty() {
            return Err(GenomeError::MissingOutputs);
        }

        for &from in &inputs {
            for &to in &outputs {
                if !self.has_edge_between(from, to) {
                    let id = cache.intern_edge(from, to);
                    self.add_edge(id, from, to, 1.0);
                }
            }
        }
        Ok(())
    }

    fn ids_of_kind(&self, kind: NodeKind) -> Vec<Innovation> {
        self.nodes
            .values()
            .filter(|n| n.kind() == kind)
            .map(NodeGene::innovation)
            .collect()
    }

    fn has_edge_between(&self, from: Innovation, to: Innovation) -> bool {
        self.edges.values().any(|e| e.endpoints() == (from, to))
    }

    /// Add a new enabled edge to the genome.
    /// Returns a reference to the new edge.
    ///
    /// # Panics
    ///
    /// This function will panic if an edge with the same
    /// `id` already existed in the genome, if either `from`
    /// or `to` do not correspond to nodes present in the genome,
    /// or if another edge already connects `from` to `to`.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome};
    ///
    /// let mut genome = Genome::new(&GeneticConfig::zero());
    /// genome.add_node(2);
    ///
    /// let edge = genome.add_edge(42, 0, 2, 2.5).clone();
    /// assert_eq!(edge.endpoints(), (0, 2));
    /// assert_eq!(genome.edge(42), Some(&edge));
    ///
    /// // Cycles and self-loops are structurally valid.
    /// genome.add_edge(43, 2, 1, -3.0);
    /// genome.add_edge(44, 1, 2, 1.0);
    /// genome.add_edge(45, 2, 2, -1.0);
    /// ```
    pub fn add_edge(
        &mut self,
        id: Innovation,
        from: Innovation,
        to: Innovation,
        weight: f32,
    ) -> &mut EdgeGene {
        self.check_edge_viability(id, from, to)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.edges
            .entry(id)
            .or_insert_with(|| EdgeGene::new(id, from, to, weight))
    }

    fn check_edge_viability(
        &self,
        id: Innovation,
        from: Innovation,
        to: Innovation,
    ) -> Result<(), EdgeViabilityError> {
        use EdgeViabilityError::*;
        if self.edges.contains_key(&id) {
            Err(DuplicateEdgeId(id))
        } else if !(self.nodes.contains_key(&from) && self.nodes.contains_key(&to)) {
            Err(NonexistentEndpoints(from, to))
        } else if self.has_edge_between(from, to) {
            Err(DuplicateEndpoints(id, from, to))
        } else {
            Ok(())
        }
    }

    /// Add a new hidden node to the genome.
    /// Returns a reference to the newly created node.
    ///
    /// # Panics
    ///
    /// This function panics if a node of the
    /// same id already existed in the genome.
    pub fn add_node(&mut self, id: Innovation) -> &NodeGene {
        self.check_node_viability(id)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.nodes
            .entry(id)
            .or_insert_with(|| NodeGene::new(id, NodeKind::Hidden))
    }

    fn check_node_viability(&self, id: Innovation) -> Result<(), NodeViabilityError> {
        if self.nodes.contains_key(&id) {
            Err(NodeViabilityError::DuplicateNodeId(id))
        } else {
            Ok(())
        }
    }

    /// Applies exactly one class of mutation to the genome.
    ///
    /// A node addition is tried first, with probability
    /// [`node_addition_chance`]; failing that, an edge
    /// addition with probability [`edge_addition_chance`];
    /// otherwise weights are perturbed with probability
    /// [`weight_mutation_chance`] and, independently, one edge is
    /// toggled with probability [`edge_toggle_chance`].
    ///
    /// [`node_addition_chance`]: GeneticConfig::node_addition_chance
    /// [`edge_addition_chance`]: GeneticConfig::edge_addition_chance
    /// [`weight_mutation_chance`]: GeneticConfig::weight_mutation_chance
    /// [`edge_toggle_chance`]: GeneticConfig::edge_toggle_chance
    pub fn mutate<R: Rng>(
        &mut self,
        cache: &InnovationCache,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Mutation {
        let mutation = if rng.chance(config.node_addition_chance) {
            match self.mutate_add_node(cache, rng) {
                Ok((split_edge, split)) => Mutation::AddNode { split_edge, split },
                Err(e) => Mutation::Skipped(e),
            }
        } else if rng.chance(config.edge_addition_chance) {
            match self.mutate_add_edge(cache, config, rng) {
                Ok(edge) => Mutation::AddEdge(edge),
                Err(e) => Mutation::Skipped(e),
            }
        } else {
            let weights_perturbed = rng.chance(config.weight_mutation_chance);
            if weights_perturbed {
                self.mutate_weights(config, rng);
            }
            let toggled_edge = if rng.chance(config.edge_toggle_chance) {
                self.mutate_toggle_edge(rng)
            } else {
                None
            };
            Mutation::Parametric {
                weights_perturbed,
                toggled_edge,
            }
        };
        trace!(?mutation, "mutated genome");
        mutation
    }

    /// Induces a _node mutation_ in the genome: a random edge
    /// is disabled and replaced by a new hidden node and two
    /// new edges. The incoming edge inherits the split edge's
    /// weight, and the outgoing edge gets a weight of 1.0.
    ///
    /// If successful, returns the split edge's innovation
    /// number and the new innovations.
    ///
    /// # Errors
    ///
    /// This function returns an error if there are no edges in the genome.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome, InnovationCache, NodeKind};
    ///
    /// let config = GeneticConfig::zero();
    /// let cache = InnovationCache::new(&config);
    /// let mut genome = Genome::new(&config);
    /// genome.initialize(&cache).unwrap();
    /// genome.edge_mut(0).unwrap().set_weight(0.5);
    ///
    /// let (split_edge, split) = genome.mutate_add_node(&cache, &mut rand::thread_rng()).unwrap();
    ///
    /// assert_eq!(split_edge, 0);
    /// assert!(!genome.edge(0).unwrap().enabled());
    /// assert_eq!(genome.node(split.node).unwrap().kind(), NodeKind::Hidden);
    ///
    /// let edge_to = genome.edge(split.edge_to).unwrap();
    /// assert_eq!(edge_to.endpoints(), (0, split.node));
    /// assert_eq!(edge_to.weight(), 0.5);
    ///
    /// let edge_from = genome.edge(split.edge_from).unwrap();
    /// assert_eq!(edge_from.endpoints(), (split.node, 1));
    /// assert_eq!(edge_from.weight(), 1.0);
    /// ```
    pub fn mutate_add_node<R: Rng>(
        &mut self,
        cache: &InnovationCache,
        rng: &mut R,
    ) -> Result<(Innovation, NodeSplit), MutationError> {
        let split_edge = match self.edges.values_mut().choose(rng) {
            Some(edge) => {
                edge.set_enabled(false);
                edge.clone()
            }
            None => return Err(MutationError::EmptyGenome),
        };

        let mut split = cache.intern_node_split(&split_edge);
        if self.nodes.contains_key(&split.node) {
            // This genome already split the same edge once.
            split = cache.fresh_node_split(&split_edge);
        }

        self.add_node(split.node);
        self.add_edge(
            split.edge_to,
            split_edge.from(),
            split.node,
            split_edge.weight(),
        );
        self.add_edge(split.edge_from, split.node, split_edge.to(), 1.0);

        Ok((split_edge.innovation(), split))
    }

    /// Induces an _edge mutation_ in the genome. Random ordered
    /// node pairs are drawn, up to [`max_edge_addition_attempts`]
    /// times, until one is found that is not already connected in
    /// the same direction and, unless [`allow_recurrence`] is set,
    /// whose edge would neither close a cycle nor end at an input.
    /// The new edge is enabled with weight 1.0.
    ///
    /// If successful, returns the new edge's innovation number.
    ///
    /// [`max_edge_addition_attempts`]: GeneticConfig::max_edge_addition_attempts
    /// [`allow_recurrence`]: GeneticConfig::allow_recurrence
    ///
    /// # Errors
    ///
    /// Returns an error if every attempt was rejected.
    pub fn mutate_add_edge<R: Rng>(
        &mut self,
        cache: &InnovationCache,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let attempts = config.max_edge_addition_attempts;
        for attempt in 0..attempts {
            let (from, to) = match (
                self.nodes.keys().copied().choose(rng),
                self.nodes.keys().copied().choose(rng),
            ) {
                (Some(from), Some(to)) => (from, to),
                _ => break,
            };

            if self.has_edge_between(from, to) {
                trace!(attempt, from, to, "rejected duplicate edge");
                continue;
            }
            if !config.allow_recurrence && self.is_recurrent(from, to) {
                trace!(attempt, from, to, "rejected recurrent edge");
                continue;
            }

            let id = cache.intern_edge(from, to);
            self.add_edge(id, from, to, 1.0);
            return Ok(id);
        }
        Err(MutationError::NoViablePair { attempts })
    }

    /// Induces a _weight mutation_ in the genome. Every edge
    /// is either reset, with probability [`weight_reset_chance`],
    /// to a uniform value in ±[`weight_init_range`], or nudged by
    /// a uniform value in ±[`weight_step_max`].
    ///
    /// [`weight_reset_chance`]: GeneticConfig::weight_reset_chance
    /// [`weight_init_range`]: GeneticConfig::weight_init_range
    /// [`weight_step_max`]: GeneticConfig::weight_step_max
    pub fn mutate_weights<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for edge in self.edges.values_mut() {
            if rng.chance(config.weight_reset_chance) {
                edge.randomize_weight(config, rng);
            } else {
                edge.nudge_weight(config, rng);
            }
        }
    }

    /// Flips the enabled status of a random edge.
    ///
    /// Returns `None` if the genome has no edges, or the
    /// toggled edge's innovation number otherwise.
    pub fn mutate_toggle_edge<R: Rng>(&mut self, rng: &mut R) -> Option<Innovation> {
        let edge = self.edges.values_mut().choose(rng)?;
        edge.toggle();
        Some(edge.innovation())
    }

    /// Returns whether the genome's graph would contain a cycle,
    /// or an edge ending at an input node, once an edge
    /// `from -> to` is added to it. Every edge is considered,
    /// enabled or not, since disabled edges may be re-enabled.
    ///
    /// This is always `true` if the genome is already recurrent.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome};
    ///
    /// let mut genome = Genome::new(&GeneticConfig::zero());
    /// genome.add_node(2);
    /// genome.add_edge(0, 0, 2, 1.0);
    /// genome.add_edge(1, 2, 1, 1.0);
    ///
    /// assert!(genome.is_recurrent(1, 2));
    /// assert!(genome.is_recurrent(2, 2));
    /// assert!(genome.is_recurrent(1, 0));
    /// assert!(!genome.is_recurrent(0, 1));
    /// ```
    pub fn is_recurrent(&self, from: Innovation, to: Innovation) -> bool {
        let ends_at_input =
            |id: Innovation| matches!(self.nodes.get(&id).map(NodeGene::kind), Some(NodeKind::Input));
        if ends_at_input(to) || self.edges.values().any(|e| ends_at_input(e.to())) {
            return true;
        }

        let mut successors: HashMap<Innovation, Vec<Innovation>, RandomState> = HashMap::default();
        for edge in self.edges.values() {
            successors.entry(edge.from()).or_default().push(edge.to());
        }
        if !self.has_edge_between(from, to) {
            successors.entry(from).or_default().push(to);
        }

        let roots = self
            .ids_of_kind(NodeKind::Input)
            .into_iter()
            .chain(self.nodes.keys().copied())
            .chain([from]);
        let mut visits: HashMap<Innovation, Visit, RandomState> = HashMap::default();
        roots.into_iter().any(|root| Self::closes_cycle(root, &successors, &mut visits))
    }

    /// Depth-first search from `root`, with an explicit stack.
    /// Returns `true` if a node still in progress is reached again.
    fn closes_cycle(
        root: Innovation,
        successors: &HashMap<Innovation, Vec<Innovation>, RandomState>,
        visits: &mut HashMap<Innovation, Visit, RandomState>,
    ) -> bool {
        if visits.contains_key(&root) {
            return false;
        }
        visits.insert(root, Visit::InProgress);
        let mut stack = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            top.1 += 1;
            match successors.get(&node).and_then(|s| s.get(cursor)) {
                Some(&next) => match visits.get(&next) {
                    Some(Visit::InProgress) => return true,
                    Some(Visit::Done) => {}
                    None => {
                        visits.insert(next, Visit::InProgress);
                        stack.push((next, 0));
                    }
                },
                None => {
                    visits.insert(node, Visit::Done);
                    stack.pop();
                }
            }
        }
        false
    }

    /// Combines two genomes and returns a child genome.
    ///
    /// The parent with the higher fitness is the _primary_ parent;
    /// on equal fitness the one with fewer genes is, and on equal
    /// gene counts `self` is. Edges are aligned by innovation number:
    /// disjoint and excess edges are inherited from the primary parent
    /// only, and matching edges either from a random parent or, if
    /// `average_weights` is set, with the mean of both weights. A
    /// matching edge disabled in either parent is disabled in the child
    /// with probability [`cross_disable_chance`].
    ///
    /// The child holds every input and output node of the primary
    /// parent, plus those nodes referenced by its edges.
    ///
    /// [`cross_disable_chance`]: GeneticConfig::cross_disable_chance
    pub fn crossover<R: Rng>(
        &self,
        other: &Genome,
        average_weights: bool,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Genome {
        let (primary, secondary) = if self.dominates(other) {
            (self, other)
        } else {
            (other, self)
        };

        let mut child = Genome::default();
        for aligned in Alignment::new(primary, secondary) {
            let edge = match aligned {
                Aligned::Matching(primary_edge, secondary_edge) => {
                    let mut edge = if average_weights {
                        let mut edge = primary_edge.clone();
                        edge.set_weight((primary_edge.weight() + secondary_edge.weight()) / 2.0);
                        edge
                    } else if rng.gen::<bool>() {
                        primary_edge.clone()
                    } else {
                        secondary_edge.clone()
                    };
                    if !primary_edge.enabled() || !secondary_edge.enabled() {
                        edge.set_enabled(!rng.chance(config.cross_disable_chance));
                    }
                    edge
                }
                Aligned::Disjoint(Side::First, edge) | Aligned::Excess(Side::First, edge) => {
                    edge.clone()
                }
                Aligned::Disjoint(Side::Second, _) | Aligned::Excess(Side::Second, _) => continue,
            };
            child.edges.insert(edge.innovation(), edge);
        }

        child.nodes = primary
            .nodes
            .values()
            .filter(|n| n.kind() != NodeKind::Hidden)
            .map(|n| (n.innovation(), *n))
            .collect();
        let referenced: BTreeSet<Innovation> = child
            .edges
            .values()
            .flat_map(|e| [e.from(), e.to()])
            .collect();
        for id in referenced {
            let node = primary
                .nodes
                .get(&id)
                .or_else(|| secondary.nodes.get(&id))
                .unwrap_or_else(|| panic!("edge endpoint {} absent from both parents", id));
            child.nodes.insert(id, *node);
        }

        debug!(
            primary_genes = primary.gene_count(),
            secondary_genes = secondary.gene_count(),
            child_genes = child.gene_count(),
            average_weights,
            "crossed genomes"
        );
        child
    }

    fn dominates(&self, other: &Genome) -> bool {
        match self.fitness.total_cmp(&other.fitness) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.gene_count() <= other.gene_count(),
        }
    }

    /// Mates two genomes as a population controller would during
    /// reproduction: they are crossed, averaging matching weights with
    /// probability [`mate_by_averaging_chance`], and the child is then
    /// mutated with probability [`child_mutation_chance`].
    ///
    /// [`mate_by_averaging_chance`]: GeneticConfig::mate_by_averaging_chance
    /// [`child_mutation_chance`]: GeneticConfig::child_mutation_chance
    pub fn mate<R: Rng>(
        first: &Genome,
        second: &Genome,
        cache: &InnovationCache,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Genome {
        let average_weights = rng.chance(config.mate_by_averaging_chance);
        let mut child = first.crossover(second, average_weights, config, rng);
        if rng.chance(config.child_mutation_chance) {
            child.mutate(cache, config, rng);
        }
        child
    }

    /// Returns the compatibility distance between two genomes:
    /// a weighted sum of their excess edge count, disjoint edge count,
    /// and mean absolute weight difference of matching edges.
    ///
    /// Excess and disjoint counts are divided by the number of aligned
    /// edges only if [`normalize_distance`] is set.
    ///
    /// [`normalize_distance`]: GeneticConfig::normalize_distance
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     excess_gene_factor: 1.0,
    ///     disjoint_gene_factor: 0.5,
    ///     common_weight_factor: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut first = Genome::new(&config);
    /// first.add_edge(0, 0, 2, 1.0);
    /// first.add_edge(2, 2, 2, 1.0);
    /// let mut second = Genome::new(&config);
    /// second.add_edge(0, 0, 2, 3.0);
    /// second.add_edge(1, 1, 2, 1.0);
    /// second.add_edge(3, 2, 1, 1.0);
    ///
    /// // One matching edge (weight difference 2), two disjoint edges (1, 2)
    /// // and one excess edge (3).
    /// let expected = 1.0 * 1.0 + 0.5 * 2.0 + 0.4 * 2.0;
    /// assert_eq!(first.compatibility_distance(&second, &config), expected);
    /// assert_eq!(first.compatibility_distance(&first, &config), 0.0);
    /// ```
    pub fn compatibility_distance(&self, other: &Genome, config: &GeneticConfig) -> f32 {
        let (mut excess, mut disjoint, mut matching) = (0usize, 0usize, 0usize);
        let mut weight_difference = 0.0;

        for aligned in Alignment::new(self, other) {
            match aligned {
                Aligned::Matching(a, b) => {
                    matching += 1;
                    weight_difference += (a.weight() - b.weight()).abs();
                }
                Aligned::Disjoint(..) => disjoint += 1,
                Aligned::Excess(..) => excess += 1,
            }
        }

        let mean_weight_difference = if matching > 0 {
            weight_difference / matching as f32
        } else {
            0.0
        };
        let normalization = if config.normalize_distance {
            (excess + disjoint + matching).max(1) as f32
        } else {
            1.0
        };

        config.excess_gene_factor * excess as f32 / normalization
            + config.disjoint_gene_factor * disjoint as f32 / normalization
            + config.common_weight_factor * mean_weight_difference
    }

    /// Compiles the genome into a network with the default
    /// [`NetworkConfig`]. See [`Genome::compile_with`].
    pub fn compile(&self) -> Result<Network, NetworkError> {
        self.compile_with(&NetworkConfig::default())
    }

    /// Compiles the genome into a network.
    ///
    /// Neurons are laid out as inputs, outputs, then hidden nodes,
    /// each group in ascending innovation order. Every _enabled_
    /// edge becomes a connection; disabled edges are left out.
    ///
    /// # Errors
    /// Returns an error if the genome has no inputs or outputs,
    /// or if the network configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, Genome, InnovationCache};
    /// use neat_direct::networks::NetworkConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = Genome::new(&config);
    /// genome.initialize(&InnovationCache::new(&config)).unwrap();
    ///
    /// let mut network = genome.compile_with(&NetworkConfig::default()).unwrap();
    /// assert_eq!(network.input_count(), 2);
    /// assert_eq!(network.output_count(), 1);
    /// assert!(!network.is_recurrent());
    ///
    /// // sigmoid(1.0 * 0.0 + 1.0 * 0.0)
    /// assert_eq!(network.calculate(&[0.0, 0.0]).unwrap(), vec![0.5]);
    /// ```
    pub fn compile_with(&self, config: &NetworkConfig) -> Result<Network, NetworkError> {
        let inputs = self.ids_of_kind(NodeKind::Input);
        let outputs = self.ids_of_kind(NodeKind::Output);
        let hidden = self.ids_of_kind(NodeKind::Hidden);

        let node_index_from_id: HashMap<_, _, RandomState> = inputs
            .iter()
            .chain(&outputs)
            .chain(&hidden)
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut builder = NetworkBuilder::new()
            .inputs(inputs.len())
            .outputs(outputs.len())
            .hidden(hidden.len())
            .config(config.clone());
        for edge in self.edges.values().filter(|e| e.enabled()) {
            builder = builder.connect(
                node_index_from_id[&edge.from()],
                node_index_from_id[&edge.to()],
                edge.weight(),
            );
        }

        let network = builder.build()?;
        debug!(
            neurons = network.neuron_count(),
            connections = self.edges.values().filter(|e| e.enabled()).count(),
            recurrent = network.is_recurrent(),
            "compiled genome"
        );
        Ok(network)
    }

    /// Returns an iterator over the genome's edges,
    /// in ascending innovation order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeGene> {
        self.edges.values()
    }

    /// Returns an iterator over the genome's nodes,
    /// in ascending innovation order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Returns the edge with the given innovation number, if present.
    pub fn edge(&self, id: Innovation) -> Option<&EdgeGene> {
        self.edges.get(&id)
    }

    /// Returns the edge with the given innovation number, if present,
    /// for modification of its weight or enabled status.
    pub fn edge_mut(&mut self, id: Innovation) -> Option<&mut EdgeGene> {
        self.edges.get_mut(&id)
    }

    /// Returns the node with the given innovation number, if present.
    pub fn node(&self, id: Innovation) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns the total number of node and edge genes.
    pub fn gene_count(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    /// Sets the genome's fitness.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the genome's fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges: Vec<String> = self.edges.values().map(EdgeGene::to_string).collect();
        let nodes: Vec<String> = self.nodes.values().map(NodeGene::to_string).collect();
        f.debug_struct("Genome")
            .field("Edges", &edges)
            .field("Nodes", &nodes)
            .field("Fitness", &self.fitness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::zero()
        }
    }

    fn initialized(config: &GeneticConfig, cache: &InnovationCache) -> Genome {
        let mut genome = Genome::new(config);
        genome.initialize(cache).unwrap();
        genome
    }

    #[test]
    fn initialize_fully_connects() {
        for input_count in 1..6 {
            for output_count in 1..6 {
                let config = config(input_count, output_count);
                let cache = InnovationCache::new(&config);
                let genome = initialized(&config, &cache);

                assert_eq!(genome.edges.len(), input_count * output_count);
                for edge in genome.edges() {
                    assert_eq!(genome.nodes[&edge.from()].kind(), NodeKind::Input);
                    assert_eq!(genome.nodes[&edge.to()].kind(), NodeKind::Output);
                    assert_eq!(cache.edge_innovation(edge.from(), edge.to()), Some(edge.innovation()));
                }
            }
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let config = config(2, 2);
        let cache = InnovationCache::new(&config);
        let mut genome = initialized(&config, &cache);
        let before = genome.clone();
        genome.initialize(&cache).unwrap();
        assert_eq!(genome, before);
    }

    #[test]
    fn initialize_without_outputs() {
        let mut genome = Genome::default();
        genome.nodes.insert(0, NodeGene::new(0, NodeKind::Input));
        let cache = InnovationCache::with_reserved_nodes(1);
        assert_eq!(genome.initialize(&cache), Err(GenomeError::MissingOutputs));
        assert_eq!(genome.edges.len(), 0);
    }

    #[test]
    #[should_panic]
    fn add_edge_duplicate_innovation() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_edge(0, 0, 2, 1.0);
        genome.add_edge(0, 1, 2, 1.0);
    }

    #[test]
    #[should_panic]
    fn add_edge_duplicate_endpoints() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_edge(0, 0, 2, 1.0);
        genome.add_edge(1, 0, 2, 1.0);
    }

    #[test]
    #[should_panic]
    fn add_edge_missing_endpoint() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_edge(0, 0, 500, 1.0);
    }

    #[test]
    #[should_panic]
    fn add_node_duplicate() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_node(1);
    }

    #[test]
    fn add_node_mutation_structure() {
        let config = GeneticConfig {
            node_addition_chance: 1.0,
            ..config(3, 2)
        };
        let cache = InnovationCache::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..20 {
            let mut genome = initialized(&config, &cache);
            for edge in genome.edges.values_mut() {
                edge.set_weight(rng.gen_range(-2.0..2.0));
            }
            let before = genome.clone();

            let mutation = genome.mutate(&cache, &config, &mut rng);
            let (split_edge, split) = match mutation {
                Mutation::AddNode { split_edge, split } => (split_edge, split),
                other => panic!("unexpected mutation {:?}", other),
            };

            let old = &before.edges[&split_edge];
            assert!(!genome.edges[&split_edge].enabled());
            assert_eq!(genome.nodes.len(), before.nodes.len() + 1);
            assert_eq!(genome.nodes[&split.node].kind(), NodeKind::Hidden);
            assert_eq!(genome.edges.len(), before.edges.len() + 2);

            let edge_to = &genome.edges[&split.edge_to];
            let edge_from = &genome.edges[&split.edge_from];
            assert_eq!(edge_to.endpoints(), (old.from(), split.node));
            assert_eq!(edge_from.endpoints(), (split.node, old.to()));
            assert_eq!(edge_to.weight(), old.weight());
            assert_eq!(edge_from.weight(), 1.0);
            assert!(edge_to.enabled() && edge_from.enabled());
        }
    }

    #[test]
    fn same_split_shares_innovations() {
        let config = config(1, 1);
        let cache = InnovationCache::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let mut first = initialized(&config, &cache);
        let mut second = initialized(&config, &cache);
        let (_, first_split) = first.mutate_add_node(&cache, &mut rng).unwrap();
        let (_, second_split) = second.mutate_add_node(&cache, &mut rng).unwrap();

        assert_eq!(first_split, second_split);
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_split_in_one_genome() {
        let config = config(1, 1);
        let cache = InnovationCache::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut genome = initialized(&config, &cache);

        let (_, first) = genome.mutate_add_node(&cache, &mut rng).unwrap();
        // Leave only the original edge to be split again.
        genome.edges.remove(&first.edge_to);
        genome.edges.remove(&first.edge_from);
        genome.edges.get_mut(&0).unwrap().set_enabled(true);
        let (_, second) = genome.mutate_add_node(&cache, &mut rng).unwrap();

        assert_ne!(first.node, second.node);
        assert_eq!(cache.node_split(0), Some(first));
        assert_eq!(genome.nodes.len(), 4);
    }

    #[test]
    fn add_node_on_empty_genome() {
        let config = config(1, 1);
        let cache = InnovationCache::new(&config);
        let mut genome = Genome::new(&config);
        assert_eq!(
            genome.mutate_add_node(&cache, &mut ChaCha8Rng::seed_from_u64(0)),
            Err(MutationError::EmptyGenome)
        );
    }

    #[test]
    fn add_edge_mutation_is_acyclic() {
        let config = GeneticConfig {
            max_edge_addition_attempts: 50,
            ..config(2, 2)
        };
        let cache = InnovationCache::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut genome = Genome::new(&config);
        genome.add_node(cache.intern_node_split(&EdgeGene::new(0, 0, 2, 1.0)).node);

        while let Ok(id) = genome.mutate_add_edge(&cache, &config, &mut rng) {
            let edge = &genome.edges[&id];
            assert_eq!(cache.edge_innovation(edge.from(), edge.to()), Some(id));
            assert_ne!(genome.nodes[&edge.to()].kind(), NodeKind::Input);
            assert_ne!(edge.from(), edge.to());
        }
        let network = genome.compile().unwrap();
        assert!(!network.is_recurrent());
    }

    #[test]
    fn add_edge_mutation_recurrent() {
        let config = GeneticConfig {
            max_edge_addition_attempts: 1000,
            allow_recurrence: true,
            ..config(1, 1)
        };
        let cache = InnovationCache::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut genome = Genome::new(&config);

        // Two nodes allow exactly four directed edges, self-loops included.
        for _ in 0..4 {
            genome.mutate_add_edge(&cache, &config, &mut rng).unwrap();
        }
        assert_eq!(
            genome.mutate_add_edge(&cache, &config, &mut rng),
            Err(MutationError::NoViablePair { attempts: 1000 })
        );
        assert!(genome.compile().unwrap().is_recurrent());
    }

    #[test]
    fn add_edge_without_attempts() {
        let config = config(1, 1);
        let cache = InnovationCache::new(&config);
        let mut genome = Genome::new(&config);
        assert_eq!(
            genome.mutate_add_edge(&cache, &config, &mut ChaCha8Rng::seed_from_u64(0)),
            Err(MutationError::NoViablePair { attempts: 0 })
        );
    }

    #[test]
    fn mutate_priority() {
        let cache = InnovationCache::new(&config(1, 1));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let structural = GeneticConfig {
            node_addition_chance: 1.0,
            edge_addition_chance: 1.0,
            weight_mutation_chance: 1.0,
            edge_toggle_chance: 1.0,
            ..config(1, 1)
        };
        let mut genome = initialized(&structural, &cache);
        let before = genome.clone();
        assert!(matches!(
            genome.mutate(&cache, &structural, &mut rng),
            Mutation::AddNode { .. }
        ));
        // Weights of pre-existing edges are untouched by structural mutations.
        assert_eq!(genome.edges[&0].weight(), before.edges[&0].weight());

        let parametric = GeneticConfig {
            weight_mutation_chance: 1.0,
            edge_toggle_chance: 1.0,
            weight_step_max: 1.0,
            ..config(1, 1)
        };
        match genome.mutate(&cache, &parametric, &mut rng) {
            Mutation::Parametric {
                weights_perturbed,
                toggled_edge,
            } => {
                assert!(weights_perturbed);
                assert!(toggled_edge.is_some());
            }
            other => panic!("unexpected mutation {:?}", other),
        }
        assert_eq!(genome.nodes.len(), before.nodes.len() + 1);
    }

    #[test]
    fn mutate_weights_reset_and_nudge() {
        let config = GeneticConfig {
            weight_reset_chance: 1.0,
            weight_init_range: 2.0,
            ..config(3, 3)
        };
        let cache = InnovationCache::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut genome = initialized(&config, &cache);
        genome.mutate_weights(&config, &mut rng);
        assert!(genome.edges().all(|e| e.weight().abs() <= 2.0));

        let nudge = GeneticConfig {
            weight_reset_chance: 0.0,
            weight_step_max: 0.5,
            ..config
        };
        let before = genome.clone();
        genome.mutate_weights(&nudge, &mut rng);
        for (new, old) in genome.edges().zip(before.edges()) {
            assert!((new.weight() - old.weight()).abs() <= 0.5);
        }
    }

    #[test]
    fn toggle_flips_one_edge() {
        let config = config(2, 2);
        let cache = InnovationCache::new(&config);
        let mut genome = initialized(&config, &cache);
        let toggled = genome.mutate_toggle_edge(&mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        assert!(!genome.edges[&toggled].enabled());
        assert_eq!(genome.edges().filter(|e| !e.enabled()).count(), 1);
        assert_eq!(Genome::default().mutate_toggle_edge(&mut ChaCha8Rng::seed_from_u64(8)), None);
    }

    #[test]
    fn recurrence_detection() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_node(3);
        genome.add_node(4);
        genome.add_edge(0, 0, 3, 1.0);
        genome.add_edge(1, 3, 4, 1.0);
        genome.add_edge(2, 4, 2, 1.0);

        // Closing the path 3 -> 4 -> 2 back onto itself.
        assert!(genome.is_recurrent(2, 3));
        assert!(genome.is_recurrent(4, 3));
        assert!(genome.is_recurrent(3, 3));
        // Into an input.
        assert!(genome.is_recurrent(2, 1));
        // Unrelated nodes.
        assert!(!genome.is_recurrent(1, 4));
        assert!(!genome.is_recurrent(0, 2));
        // Already present edges are not counted twice.
        assert!(!genome.is_recurrent(3, 4));

        // A disabled edge still counts.
        genome.add_edge(3, 2, 3, 1.0).set_enabled(false);
        assert!(genome.is_recurrent(1, 4));
    }

    #[test]
    fn recurrence_off_input_paths() {
        let mut genome = Genome::new(&config(1, 1));
        genome.add_node(2);
        genome.add_node(3);
        genome.add_edge(0, 2, 3, 1.0);
        assert!(genome.is_recurrent(3, 2));
        assert!(!genome.is_recurrent(2, 1));
    }

    fn parents() -> (Genome, Genome) {
        let mut first = Genome::new(&config(2, 1));
        let mut second = Genome::new(&config(2, 1));
        first.add_node(3);
        second.add_node(3);
        second.add_node(4);

        first.add_edge(0, 0, 2, 1.0);
        second.add_edge(0, 0, 2, 3.0);
        first.add_edge(1, 1, 2, 2.0).set_enabled(false);
        second.add_edge(1, 1, 2, -2.0);
        first.add_edge(2, 0, 3, 1.0);
        second.add_edge(2, 0, 3, 1.0);
        first.add_edge(3, 3, 2, 1.0);
        second.add_edge(4, 0, 4, 1.0);
        second.add_edge(5, 4, 2, 1.0);
        second.add_edge(6, 3, 4, 1.0);
        first.add_edge(7, 1, 3, 1.0);
        (first, second)
    }

    #[test]
    fn crossover_inherits_from_fitter_parent() {
        let (mut first, second) = parents();
        first.set_fitness(2.0);
        let config = GeneticConfig {
            cross_disable_chance: 1.0,
            ..config(2, 1)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        for average in [false, true] {
            let child = second.crossover(&first, average, &config, &mut rng);
            let ids: Vec<_> = child.edges.keys().copied().collect();
            assert_eq!(ids, vec![0, 1, 2, 3, 7]);
            assert!(!child.edges[&1].enabled());
            assert!(child.edges[&2].enabled());
            let nodes: Vec<_> = child.nodes.keys().copied().collect();
            assert_eq!(nodes, vec![0, 1, 2, 3]);
            if average {
                assert_eq!(child.edges[&0].weight(), 2.0);
                assert_eq!(child.edges[&1].weight(), 0.0);
            } else {
                assert!([1.0, 3.0].contains(&child.edges[&0].weight()));
                assert!([2.0, -2.0].contains(&child.edges[&1].weight()));
            }
        }
    }

    #[test]
    fn crossover_tie_prefers_smaller_genome() {
        let (first, second) = parents();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let config = GeneticConfig {
            cross_disable_chance: 1.0,
            ..config(2, 1)
        };

        let child = second.crossover(&first, true, &config, &mut rng);
        let ids: Vec<_> = child.edges.keys().copied().collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 7]);

        // Identical fitness and size: the receiver is primary.
        let clone = first.clone();
        let child = first.crossover(&clone, true, &config, &mut rng);
        assert_eq!(child.edges, first.edges);
        assert_eq!(child.nodes, first.nodes);
    }

    #[test]
    fn crossover_nan_fitness_is_order_independent() {
        let (mut first, mut second) = parents();
        first.set_fitness(f32::NAN);
        second.set_fitness(f32::NAN);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let config = GeneticConfig {
            cross_disable_chance: 1.0,
            ..config(2, 1)
        };

        for child in [
            second.crossover(&first, false, &config, &mut rng),
            first.crossover(&second, false, &config, &mut rng),
        ] {
            let ids: Vec<_> = child.edges.keys().copied().collect();
            assert_eq!(ids, vec![0, 1, 2, 3, 7]);
        }
    }

    #[test]
    fn crossover_keeps_io_nodes() {
        let config = config(3, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let first = Genome::new(&config);
        let second = Genome::new(&config);
        let child = first.crossover(&second, false, &config, &mut rng);
        assert_eq!(child.nodes, first.nodes);
        assert!(child.edges.is_empty());
    }

    #[test]
    fn crossover_enables_matching_if_lucky() {
        let (mut first, second) = parents();
        first.set_fitness(2.0);
        let config = GeneticConfig {
            cross_disable_chance: 0.0,
            ..config(2, 1)
        };
        let child = first.crossover(&second, false, &config, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(child.edges().all(EdgeGene::enabled));
    }

    #[test]
    fn mate_mutates_child() {
        let config = GeneticConfig {
            child_mutation_chance: 1.0,
            node_addition_chance: 1.0,
            ..config(2, 1)
        };
        let cache = InnovationCache::new(&config);
        let first = initialized(&config, &cache);
        let second = initialized(&config, &cache);
        let child = Genome::mate(&first, &second, &cache, &config, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(child.nodes.len(), first.nodes.len() + 1);
        assert_eq!(child.fitness(), 0.0);
    }

    #[test]
    fn compatibility_distance_counts() {
        const WEIGHT_FACTOR: f32 = 0.8;
        const DISJOINT_FACTOR: f32 = 0.6;
        const EXCESS_FACTOR: f32 = 0.4;
        let config = GeneticConfig {
            common_weight_factor: WEIGHT_FACTOR,
            disjoint_gene_factor: DISJOINT_FACTOR,
            excess_gene_factor: EXCESS_FACTOR,
            ..config(2, 1)
        };
        let (first, second) = parents();

        // Matching: 0 (|1 - 3|), 1 (|2 + 2|), 2 (0).
        // Disjoint: 3, 4, 5, 6. Excess: 7.
        let expected =
            EXCESS_FACTOR * 1.0 + DISJOINT_FACTOR * 4.0 + WEIGHT_FACTOR * ((2.0 + 4.0 + 0.0) / 3.0);
        assert_eq!(first.compatibility_distance(&second, &config), expected);
        assert_eq!(second.compatibility_distance(&first, &config), expected);

        let normalized = GeneticConfig {
            normalize_distance: true,
            ..config
        };
        let expected =
            EXCESS_FACTOR * 1.0 / 8.0 + DISJOINT_FACTOR * 4.0 / 8.0 + WEIGHT_FACTOR * 2.0;
        assert!((first.compatibility_distance(&second, &normalized) - expected).abs() < 1e-6);
    }

    #[test]
    fn compatibility_distance_without_matches() {
        let config = GeneticConfig {
            excess_gene_factor: 1.0,
            common_weight_factor: 1.0,
            ..config(2, 1)
        };
        let (first, _) = parents();
        assert_eq!(Genome::default().compatibility_distance(&first, &config), 5.0);
        assert_eq!(Genome::default().compatibility_distance(&Genome::default(), &config), 0.0);
    }

    #[test]
    fn compile_omits_disabled_edges() {
        let (first, _) = parents();
        let network = first.compile().unwrap();
        assert_eq!(network.input_count(), 2);
        assert_eq!(network.output_count(), 1);
        assert_eq!(network.neuron_count(), 4);
        assert_eq!(network.connection_count(), 4);
    }

    #[test]
    fn display_sorts_genes() {
        let mut genome = Genome::new(&config(1, 1));
        genome.add_edge(5, 0, 1, 1.0);
        genome.add_edge(2, 1, 1, 1.0).set_enabled(false);
        let shown = genome.to_string();
        assert!(shown.find("(2[1->1").unwrap() < shown.find("5[0->1").unwrap());
    }
}

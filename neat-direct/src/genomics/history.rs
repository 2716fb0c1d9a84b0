use crate::genomics::{EdgeGene, GeneticConfig};
use crate::Innovation;

use ahash::RandomState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// The innovation numbers assigned to a node mutation:
/// the new node, the edge leading into it, and the
/// edge leading out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeSplit {
    /// The new hidden node.
    pub node: Innovation,
    /// The edge from the split edge's source to the new node.
    pub edge_to: Innovation,
    /// The edge from the new node to the split edge's destination.
    pub edge_from: Innovation,
}

/// An `InnovationCache` keeps track of edge and node innovations
/// in a run, in order to make sure identical mutations
/// are assigned the same innovation numbers.
///
/// For edge innovations the source and destination nodes are used to
/// identify identical mutations. For node innovations the split edge
/// is used, and the whole [`NodeSplit`] is recorded.
///
/// The cache is shared by every genome mutated in the same run,
/// and may be used from several threads at once: every interning
/// call holds a single lock for its whole duration.
#[derive(Debug)]
pub struct InnovationCache {
    ledger: Mutex<Ledger>,
}

#[derive(Debug, Default)]
struct Ledger {
    next_node_innovation: Innovation,
    next_edge_innovation: Innovation,
    edge_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    node_innovations: HashMap<Innovation, NodeSplit, RandomState>,
}

impl Ledger {
    fn intern_edge(&mut self, from: Innovation, to: Innovation) -> Innovation {
        match self.edge_innovations.entry((from, to)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_edge_innovation;
                self.next_edge_innovation += 1;
                *entry.insert(id)
            }
        }
    }

    fn allocate_split(&mut self, split_edge: &EdgeGene) -> NodeSplit {
        let node = self.next_node_innovation;
        self.next_node_innovation += 1;
        // The new node has never been seen, so both
        // edges are guaranteed fresh innovations.
        let edge_to = self.intern_edge(split_edge.from(), node);
        let edge_from = self.intern_edge(node, split_edge.to());
        NodeSplit {
            node,
            edge_to,
            edge_from,
        }
    }
}

impl InnovationCache {
    /// Creates a new cache for genomes of the specified configuration.
    ///
    /// Node innovation numbers `0..input_count` and
    /// `input_count..input_count + output_count` are reserved for
    /// the input and output nodes every genome is created with, so
    /// the first hidden node receives `input_count + output_count`.
    /// Edge innovation numbers start at 0.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, InnovationCache};
    /// use std::num::NonZeroUsize;
    ///
    /// let cache = InnovationCache::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert_eq!(cache.next_node_innovation(), 5);
    /// assert_eq!(cache.next_edge_innovation(), 0);
    /// ```
    pub fn new(config: &GeneticConfig) -> InnovationCache {
        Self::with_reserved_nodes(config.input_count.get() + config.output_count.get())
    }

    /// Creates a new cache whose first `count` node
    /// innovation numbers are considered taken.
    pub fn with_reserved_nodes(count: usize) -> InnovationCache {
        InnovationCache {
            ledger: Mutex::new(Ledger {
                next_node_innovation: count,
                ..Ledger::default()
            }),
        }
    }

    /// Returns the innovation number of the edge `from -> to`,
    /// allocating a new one if the edge was never interned before.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{GeneticConfig, InnovationCache};
    ///
    /// let cache = InnovationCache::new(&GeneticConfig::zero());
    ///
    /// let first = cache.intern_edge(0, 1);
    /// assert_eq!(cache.intern_edge(0, 1), first);
    /// assert_ne!(cache.intern_edge(1, 0), first);
    /// ```
    pub fn intern_edge(&self, from: Innovation, to: Innovation) -> Innovation {
        self.ledger.lock().intern_edge(from, to)
    }

    /// Returns the innovation numbers for splitting `split_edge`
    /// with a new node, allocating new ones if the edge was never
    /// split before.
    ///
    /// The two new edges are also recorded as edge innovations,
    /// so a later edge mutation between the same endpoints
    /// reuses their numbers.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{EdgeGene, GeneticConfig, InnovationCache};
    ///
    /// let cache = InnovationCache::new(&GeneticConfig::zero());
    /// let edge = EdgeGene::new(cache.intern_edge(0, 1), 0, 1, 1.0);
    ///
    /// let split = cache.intern_node_split(&edge);
    /// assert_eq!(cache.intern_node_split(&edge), split);
    /// assert_eq!(cache.intern_edge(0, split.node), split.edge_to);
    /// assert_eq!(cache.intern_edge(split.node, 1), split.edge_from);
    /// ```
    pub fn intern_node_split(&self, split_edge: &EdgeGene) -> NodeSplit {
        let mut ledger = self.ledger.lock();
        if let Some(split) = ledger.node_innovations.get(&split_edge.innovation()) {
            return *split;
        }
        let split = ledger.allocate_split(split_edge);
        ledger
            .node_innovations
            .insert(split_edge.innovation(), split);
        split
    }

    /// Allocates innovation numbers for splitting `split_edge`
    /// as if it had never been split, without recording them
    /// as _the_ split of that edge.
    ///
    /// Used when a genome splits the same edge a second time,
    /// which would otherwise duplicate the node and edges it
    /// already holds from the first split.
    pub fn fresh_node_split(&self, split_edge: &EdgeGene) -> NodeSplit {
        self.ledger.lock().allocate_split(split_edge)
    }

    /// Returns the innovation number previously assigned to
    /// the edge `from -> to`, if any.
    pub fn edge_innovation(&self, from: Innovation, to: Innovation) -> Option<Innovation> {
        self.ledger
            .lock()
            .edge_innovations
            .get(&(from, to))
            .copied()
    }

    /// Returns the split previously recorded for the
    /// edge with innovation number `split_edge`, if any.
    pub fn node_split(&self, split_edge: Innovation) -> Option<NodeSplit> {
        self.ledger
            .lock()
            .node_innovations
            .get(&split_edge)
            .copied()
    }

    /// Returns the innovation number the next new node will receive.
    pub fn next_node_innovation(&self) -> Innovation {
        self.ledger.lock().next_node_innovation
    }

    /// Returns the innovation number the next new edge will receive.
    pub fn next_edge_innovation(&self) -> Innovation {
        self.ledger.lock().next_edge_innovation
    }

    /// Returns the number of recorded edge innovations.
    pub fn edge_innovation_count(&self) -> usize {
        self.ledger.lock().edge_innovations.len()
    }

    /// Returns the number of recorded node innovations.
    pub fn node_innovation_count(&self) -> usize {
        self.ledger.lock().node_innovations.len()
    }

    /// Forgets every recorded mutation, but keeps the
    /// innovation counters, so numbers are never reused.
    ///
    /// Calling this between generations limits the matching
    /// of identical mutations to those arising in the same
    /// generation.
    pub fn clear_mutations(&self) {
        let mut ledger = self.ledger.lock();
        ledger.edge_innovations.clear();
        ledger.node_innovations.clear();
    }
}

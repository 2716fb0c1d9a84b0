use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NodeKind indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Input nodes. Fixed at genome creation.
    Input,
    /// Output nodes. Fixed at genome creation.
    Output,
    /// Hidden nodes, created by splitting edges.
    Hidden,
}

/// Nodes are the structural elements of genomes
/// between which edges are created.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    id: Innovation,
    kind: NodeKind,
}

impl NodeGene {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(5, NodeKind::Hidden);
    /// assert_eq!(node.innovation(), 5);
    /// assert_eq!(node.kind(), NodeKind::Hidden);
    /// ```
    pub fn new(id: Innovation, kind: NodeKind) -> NodeGene {
        NodeGene { id, kind }
    }

    /// Returns the node's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the node's kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{:?}]", self.id, self.kind)
    }
}

use crate::genomics::GeneticConfig;
use crate::Innovation;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Edge genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype
/// while enabled.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EdgeGene {
    id: Innovation,
    from: Innovation,
    to: Innovation,
    weight: f32,
    enabled: bool,
}

impl EdgeGene {
    /// Returns a new _enabled_ edge with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::EdgeGene;
    ///
    /// let edge = EdgeGene::new(42, 3, 9, 2.0);
    /// assert!(edge.enabled());
    /// ```
    pub fn new(id: Innovation, from: Innovation, to: Innovation, weight: f32) -> EdgeGene {
        EdgeGene {
            id,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// Resets the edge's weight to a uniform sample over
    /// ±[`weight_init_range`].
    ///
    /// [`weight_init_range`]: crate::genomics::GeneticConfig::weight_init_range
    pub fn randomize_weight<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        let range = config.weight_init_range.abs();
        self.weight = rng.gen_range(-range..=range);
    }

    /// Nudges the edge's weight by a uniform sample over
    /// ±[`weight_step_max`].
    ///
    /// [`weight_step_max`]: crate::genomics::GeneticConfig::weight_step_max
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::{EdgeGene, GeneticConfig};
    ///
    /// let mut edge = EdgeGene::new(42, 3, 9, 3.0);
    /// edge.nudge_weight(&GeneticConfig {
    ///     weight_step_max: 2.5,
    ///     ..GeneticConfig::zero()
    /// }, &mut rand::thread_rng());
    ///
    /// assert!((edge.weight() - 3.0).abs() <= 2.5);
    /// ```
    pub fn nudge_weight<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        let step = config.weight_step_max.abs();
        self.weight += rng.gen_range(-step..=step);
    }

    /// Returns the edge's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the innovation number of the edge's source node.
    pub fn from(&self) -> Innovation {
        self.from
    }

    /// Returns the innovation number of the edge's destination node.
    pub fn to(&self) -> Innovation {
        self.to
    }

    /// Returns the edge's source and destination, in that order.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.from, self.to)
    }

    /// Returns the edge's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the edge's weight.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::genomics::EdgeGene;
    ///
    /// let mut edge = EdgeGene::new(42, 3, 9, 2.0);
    /// edge.set_weight(-5.0);
    ///
    /// assert_eq!(edge.weight(), -5.0);
    /// ```
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Returns whether the edge is expressed in networks.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the edge's enabled status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flips the edge's enabled status.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

impl fmt::Display for EdgeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.from,
            self.to,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

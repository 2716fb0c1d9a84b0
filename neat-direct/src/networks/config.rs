use crate::networks::ActivationType;

use serde::{Deserialize, Serialize};

/// Configuration data for network compilation and evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum number of relaxation passes run by a single
    /// [`calculate`] call on a recurrent network. Must be positive.
    ///
    /// [`calculate`]: crate::networks::Network::calculate
    pub max_recurrent_cycles: usize,
    /// Recurrent evaluation stops early once no output changes
    /// by this much or more between consecutive passes.
    pub convergence_epsilon: f32,
    /// Activation function of hidden neurons.
    pub hidden_activation: ActivationType,
    /// Activation function of output neurons.
    pub output_activation: ActivationType,
}

impl Default for NetworkConfig {
    fn default() -> NetworkConfig {
        NetworkConfig {
            max_recurrent_cycles: 20,
            convergence_epsilon: 1e-4,
            hidden_activation: ActivationType::Sigmoid,
            output_activation: ActivationType::Sigmoid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: NetworkConfig =
            serde_json::from_str(r#"{ "output_activation": "Tanh" }"#).unwrap();
        assert_eq!(config.output_activation, ActivationType::Tanh);
        assert_eq!(config.max_recurrent_cycles, 20);
        assert_eq!(config.hidden_activation, ActivationType::Sigmoid);
    }
}
